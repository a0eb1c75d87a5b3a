use super::kind::{ErrorKind, NotFoundSource};
use super::policy;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Raw property path, possibly in bracket notation (`[address][city]`)
    pub field_path: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            message: message.into(),
        }
    }

    /// The path as exposed to clients, in dot notation.
    pub fn field(&self) -> String {
        normalize_field_path(&self.field_path)
    }
}

/// Convert a bracketed property path to dot notation.
///
/// `[address][city]` and `address[city]` both become `address.city`. Paths
/// without brackets are returned unchanged.
pub fn normalize_field_path(path: &str) -> String {
    if !path.contains(['[', ']']) {
        return path.to_string();
    }
    path.trim_matches(['[', ']'])
        .replace("][", ".")
        .replace(['[', ']'], ".")
}

/// Opaque description of the raw error, exposed only in debug mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub kind: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

/// An error that escaped ordinary request handling.
///
/// Handlers return it (or anything convertible into it) and the
/// [`ErrorHandleLayer`](crate::layer::ErrorHandleLayer) turns it into the final
/// JSON response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    kind: ErrorKind,
    message: String,
    violations: Vec<FieldViolation>,
    type_name: String,
    causes: Vec<String>,
}

impl ErrorEvent {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            violations: Vec::new(),
            type_name: std::any::type_name::<Self>().to_string(),
            causes: Vec::new(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccessDenied, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// A domain-level lookup failure.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(NotFoundSource::Domain), message)
    }

    pub fn route_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(NotFoundSource::Routing), message)
    }

    pub fn http_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(NotFoundSource::Http), message)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, message)
    }

    /// A validation failure; the message is left empty so the generic
    /// "User input error" text is used unless one is set later.
    pub fn validation(violations: impl IntoIterator<Item = FieldViolation>) -> Self {
        let mut event = Self::new(ErrorKind::Validation, "");
        event.violations = violations.into_iter().collect();
        event
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Other, message)
    }

    /// Capture an arbitrary error as an unclassified event, keeping its type
    /// name and `source()` chain for debug output.
    pub fn from_error<E: Error + ?Sized>(error: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            kind: ErrorKind::Other,
            message: error.to_string(),
            violations: Vec::new(),
            type_name: std::any::type_name::<E>().to_string(),
            causes,
        }
    }

    /// Recover an event from a type-erased tower error.
    pub fn from_boxed(error: axum::BoxError) -> Self {
        match error.downcast::<ErrorEvent>() {
            Ok(event) => *event,
            Err(error) => Self::from_error(&*error),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// The message, or the kind name when the message is empty.
    pub fn log_message(&self) -> Cow<'_, str> {
        if self.message.is_empty() {
            Cow::Owned(self.kind.to_string())
        } else {
            Cow::Borrowed(&self.message)
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            kind: self.kind.to_string(),
            type_name: self.type_name.clone(),
            message: self.message.clone(),
            causes: self.causes.clone(),
        }
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.log_message())
    }
}

impl Error for ErrorEvent {}

impl From<anyhow::Error> for ErrorEvent {
    fn from(error: anyhow::Error) -> Self {
        if let Some(event) = error.downcast_ref::<ErrorEvent>() {
            return event.clone();
        }
        let mut event = Self::from_error::<dyn Error + Send + Sync>(error.as_ref());
        event.type_name = "anyhow::Error".to_string();
        event
    }
}

/// Response extension marking a response produced from an [`ErrorEvent`].
///
/// The layer looks for it and re-renders the response with the request
/// snapshot, logging and debug settings.
#[derive(Debug, Clone)]
pub struct EscapedError(pub ErrorEvent);

impl IntoResponse for ErrorEvent {
    fn into_response(self) -> Response {
        // Production-safe rendering for routers without the layer installed
        let mut response = policy::render(&self, false).into_response();
        response.extensions_mut().insert(EscapedError(self));
        response
    }
}
