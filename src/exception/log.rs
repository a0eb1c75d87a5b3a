use super::kind::ErrorKind;
use crate::request::RequestSnapshot;
use std::backtrace::Backtrace;

/// Context attached to the error record.
pub struct LogContext<'a> {
    pub kind: ErrorKind,
    pub request: &'a RequestSnapshot,
    pub trace: &'a Backtrace,
}

/// Destination for error records.
///
/// Sinks own their delivery; a failing sink must not bubble anything back
/// into the responder.
pub trait LogSink: Send + Sync + 'static {
    fn error(&self, message: &str, context: &LogContext<'_>);
}

/// Default sink: one `tracing` event at `ERROR` level.
#[derive(Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn error(&self, message: &str, context: &LogContext<'_>) {
        let request = serde_json::to_string(context.request)
            .unwrap_or_else(|e| format!("<unserializable request: {e}>"));
        tracing::error!(
            kind = %context.kind,
            request = %request,
            trace = %context.trace,
            "{}",
            message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_sink_emits_without_panicking() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let request = RequestSnapshot::builder().method("GET").uri("/health").build();
        let trace = Backtrace::disabled();
        TracingLogSink.error(
            "Page not exists!",
            &LogContext {
                kind: ErrorKind::Other,
                request: &request,
                trace: &trace,
            },
        );
    }
}
