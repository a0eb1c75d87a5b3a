//! # rest-error-handle
//!
//! Terminal error handling for axum REST services.
//!
//! Errors that escape a handler are logged once, together with a snapshot of
//! the request and a stack trace, and rendered as a JSON body with a status
//! code chosen from the error kind:
//!
//! | Kind | Status | Title |
//! |---|---|---|
//! | access denied | 403 | `Forbidden` |
//! | authentication failure | 401 | `Unauthorized` |
//! | not found (domain, routing, HTTP) | 404 | `Not found` |
//! | invalid configuration | 500 | `Config error` |
//! | validation failure | 422 | `Unprocessable entity` |
//! | anything else | 500 | `Error!` |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::{Router, extract::Path, routing::get};
//! use rest_error_handle::prelude::*;
//!
//! async fn find_user(Path(id): Path<u32>) -> Result<String, ErrorEvent> {
//!     Err(ErrorEvent::not_found(format!("user {id} does not exist")))
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Reads APP_DEBUG / APP_ENV from the environment
//!     let mut container = Container::new();
//!     RestApiErrorHandleModule::register(&mut container)?;
//!
//!     let app = Router::new()
//!         .route("/users/{id}", get(find_user))
//!         .fallback(route_not_found)
//!         .layer(ErrorHandleLayer::from_container(&container)?);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod di;
pub mod error;
pub mod exception;
pub mod layer;
pub mod module;
pub mod request;

// Re-export core types
pub use common::ErrorResponse;
pub use config::{ConfigService, ResponderConfig};
pub use di::Container;
pub use error::{RestErrorHandleError, Result};
pub use exception::{ErrorEvent, ErrorKind, ErrorResponder, ExceptionFilter, FieldViolation};
pub use layer::{ErrorHandleLayer, route_not_found};
pub use module::{Module, RestApiErrorHandleModule};
pub use request::RequestSnapshot;

/// Prelude module for convenient imports
///
/// ```
/// use rest_error_handle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::{ErrorResponse, FieldError};
    pub use crate::config::{ConfigService, ResponderConfig};
    pub use crate::di::Container;
    pub use crate::error::RestErrorHandleError;
    pub use crate::exception::{
        ErrorEvent, ErrorKind, ErrorResponder, ExceptionFilter, FieldViolation, LogContext,
        LogSink, NotFoundSource, TracingLogSink,
    };
    pub use crate::layer::{ErrorHandleLayer, route_not_found};
    pub use crate::module::{Module, RestApiErrorHandleModule};
    pub use crate::request::{RequestSnapshot, UploadedFile};
    pub use std::sync::Arc;
}
