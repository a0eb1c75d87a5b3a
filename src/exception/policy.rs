//! Pure mapping from an [`ErrorEvent`] to the response a client sees.

use super::event::ErrorEvent;
use super::kind::{Classification, ErrorKind};
use crate::common::{ErrorResponse, FieldError};

/// Shape the response for `error` without any side effects.
///
/// The error's own message always wins over the kind's fallback text.
/// Validation failures list their violations in input order; `debug` attaches
/// the raw error detail.
pub fn render(error: &ErrorEvent, debug: bool) -> ErrorResponse {
    let kind = error.kind();
    let classification = Classification::of(&kind);

    let message = if error.message().is_empty() {
        classification.fallback.to_string()
    } else {
        error.message().to_string()
    };

    let errors = match kind {
        ErrorKind::Validation if !error.violations().is_empty() => Some(
            error
                .violations()
                .iter()
                .map(FieldError::from)
                .collect(),
        ),
        _ => None,
    };

    ErrorResponse {
        title: classification.title.to_string(),
        message,
        status_code: classification.status,
        errors,
        debug: debug.then(|| error.detail()),
    }
}
