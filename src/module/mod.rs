use crate::config::{ConfigService, ResponderConfig};
use crate::di::Container;
use crate::error::{RestErrorHandleError, Result};
use crate::exception::{ErrorResponder, ExceptionFilter, LogSink, TracingLogSink};
use std::sync::Arc;

/// Trait for application modules
///
/// A module registers its providers in the application's [`Container`].
pub trait Module {
    /// Register all providers of this module
    fn register(container: &mut Container) -> Result<()>;
}

/// Installs the JSON error responder.
///
/// Picks up, in order of preference, a registered [`ResponderConfig`], a
/// registered [`ConfigService`], or the process environment. A registered
/// `Arc<dyn LogSink>` replaces the default `tracing` sink. Afterwards the
/// container holds the responder both as `ErrorResponder` and as
/// `dyn ExceptionFilter`.
///
/// ```
/// use rest_error_handle::di::Container;
/// use rest_error_handle::config::ResponderConfig;
/// use rest_error_handle::layer::ErrorHandleLayer;
/// use rest_error_handle::module::{Module, RestApiErrorHandleModule};
///
/// let mut container = Container::new();
/// container.register(ResponderConfig::new(false));
/// RestApiErrorHandleModule::register(&mut container).unwrap();
/// let _layer = ErrorHandleLayer::from_container(&container).unwrap();
/// ```
pub struct RestApiErrorHandleModule;

impl RestApiErrorHandleModule {
    pub const NAME: &'static str = "rest-api-error-handle";
}

impl Module for RestApiErrorHandleModule {
    fn register(container: &mut Container) -> Result<()> {
        if container.contains::<dyn ExceptionFilter>() {
            return Err(RestErrorHandleError::ModuleRegistrationFailed {
                message: format!("{}: an ExceptionFilter is already registered", Self::NAME),
            });
        }

        let config = if let Ok(config) = container.resolve::<ResponderConfig>() {
            *config
        } else if let Ok(service) = container.resolve::<ConfigService>() {
            ResponderConfig::try_from_config(&service)?
        } else {
            ResponderConfig::try_from_config(&ConfigService::new())?
        };

        let sink = container
            .resolve::<dyn LogSink>()
            .unwrap_or_else(|_| Arc::new(TracingLogSink));

        let responder = Arc::new(ErrorResponder::new(config, sink));
        container.provide(Arc::clone(&responder));
        container.provide::<dyn ExceptionFilter>(responder);

        tracing::info!(module = Self::NAME, debug = config.debug, "Error handler registered");
        Ok(())
    }
}
