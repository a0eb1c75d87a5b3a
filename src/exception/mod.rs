use crate::request::RequestSnapshot;
use axum::response::Response;

mod event;
mod kind;
mod log;
pub mod policy;
mod responder;

pub use event::{ErrorDetail, ErrorEvent, EscapedError, FieldViolation, normalize_field_path};
pub use kind::{Classification, ErrorKind, NotFoundSource};
pub use log::{LogContext, LogSink, TracingLogSink};
pub use responder::ErrorResponder;

#[cfg(test)]
pub(crate) use responder::tests::RecordingSink;

/// The ExceptionFilter trait
///
/// Filters turn an error that escaped request handling into the final
/// response. They must always return a valid response.
pub trait ExceptionFilter: Send + Sync + 'static {
    fn catch(&self, request: &RequestSnapshot, error: &ErrorEvent) -> Response;
}
