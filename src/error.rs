use thiserror::Error;

pub type Result<T> = std::result::Result<T, RestErrorHandleError>;

/// Failures while wiring the error handler itself.
///
/// Errors raised by request handlers never surface as this type; they travel as
/// [`ErrorEvent`](crate::exception::ErrorEvent) and end in a JSON response.
#[derive(Debug, Error)]
pub enum RestErrorHandleError {
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("Module registration failed: {message}")]
    ModuleRegistrationFailed { message: String },
}

impl RestErrorHandleError {
    pub fn dependency_not_found<T: ?Sized>() -> Self {
        Self::DependencyNotFound {
            type_name: std::any::type_name::<T>().to_string(),
        }
    }
}
