mod snapshot;

pub(crate) use snapshot::BodyFormat;
pub use snapshot::{RequestSnapshot, RequestSnapshotBuilder, UploadedFile};
