use super::event::ErrorEvent;
use super::log::{LogContext, LogSink, TracingLogSink};
use super::{ExceptionFilter, policy};
use crate::common::ErrorResponse;
use crate::config::ResponderConfig;
use crate::request::RequestSnapshot;
use axum::response::{IntoResponse, Response};
use std::backtrace::Backtrace;
use std::sync::Arc;

/// Terminal error handler: logs the error, then renders it as JSON.
///
/// Holds no per-request state, so one instance serves every request.
#[derive(Clone)]
pub struct ErrorResponder {
    config: ResponderConfig,
    sink: Arc<dyn LogSink>,
}

impl ErrorResponder {
    pub fn new(config: ResponderConfig, sink: Arc<dyn LogSink>) -> Self {
        Self { config, sink }
    }

    /// A responder that logs through `tracing`.
    pub fn with_tracing(config: ResponderConfig) -> Self {
        Self::new(config, Arc::new(TracingLogSink))
    }

    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Log `error` once, then classify it.
    pub fn handle(&self, request: &RequestSnapshot, error: &ErrorEvent) -> ErrorResponse {
        let trace = Backtrace::force_capture();
        self.sink.error(
            &error.log_message(),
            &LogContext {
                kind: error.kind(),
                request,
                trace: &trace,
            },
        );

        policy::render(error, self.config.debug)
    }
}

impl ExceptionFilter for ErrorResponder {
    fn catch(&self, request: &RequestSnapshot, error: &ErrorEvent) -> Response {
        self.handle(request, error).into_response()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::exception::{ErrorKind, FieldViolation, NotFoundSource};
    use axum::http::StatusCode;
    use std::sync::Mutex;

    /// Sink that keeps every record for inspection.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) records: Mutex<Vec<(String, ErrorKind, RequestSnapshot, bool)>>,
    }

    impl RecordingSink {
        pub(crate) fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    impl LogSink for RecordingSink {
        fn error(&self, message: &str, context: &LogContext<'_>) {
            let has_trace = !context.trace.to_string().is_empty();
            self.records.lock().unwrap().push((
                message.to_string(),
                context.kind,
                context.request.clone(),
                has_trace,
            ));
        }
    }

    fn responder(debug: bool) -> (ErrorResponder, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let responder = ErrorResponder::new(ResponderConfig::new(debug), sink.clone());
        (responder, sink)
    }

    fn request() -> RequestSnapshot {
        RequestSnapshot::builder()
            .method("POST")
            .uri("/users?page=2")
            .query("page", "2")
            .header("accept", "application/json")
            .build()
    }

    #[test]
    fn test_logs_exactly_once_per_call() {
        let (responder, sink) = responder(false);
        let errors = [
            ErrorEvent::access_denied(""),
            ErrorEvent::unauthorized(""),
            ErrorEvent::not_found(""),
            ErrorEvent::route_not_found(""),
            ErrorEvent::http_not_found(""),
            ErrorEvent::invalid_config("bad"),
            ErrorEvent::validation([FieldViolation::new("a", "b")]),
            ErrorEvent::other(""),
        ];

        for (i, error) in errors.iter().enumerate() {
            responder.handle(&request(), error);
            assert_eq!(sink.len(), i + 1);
        }
    }

    #[test]
    fn test_log_record_contents() {
        let (responder, sink) = responder(false);
        let request = request();

        responder.handle(&request, &ErrorEvent::route_not_found(""));
        responder.handle(&request, &ErrorEvent::other("db down"));

        let records = sink.records.lock().unwrap();
        let (message, kind, logged_request, has_trace) = &records[0];
        assert_eq!(message, "NotFound(Routing)");
        assert_eq!(*kind, ErrorKind::NotFound(NotFoundSource::Routing));
        assert_eq!(logged_request, &request);
        assert!(*has_trace);

        assert_eq!(records[1].0, "db down");
    }

    #[test]
    fn test_handle_validation_failure() {
        let (responder, _) = responder(false);
        let error = ErrorEvent::validation([FieldViolation::new("address[city]", "required")]);

        let response = responder.handle(&request(), &error);
        assert_eq!(response.status_code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.title, "Unprocessable entity");
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(
            body["errors"],
            serde_json::json!([{"field": "address.city", "message": "required"}])
        );
    }

    #[test]
    fn test_debug_mode_from_config() {
        let (production, _) = responder(false);
        let (debug, _) = responder(true);
        let error = ErrorEvent::other("boom");

        let body = serde_json::to_value(production.handle(&request(), &error)).unwrap();
        assert!(body.get("exception").is_none());

        let body = serde_json::to_value(debug.handle(&request(), &error)).unwrap();
        assert_eq!(body["exception"]["message"], "boom");
        assert_eq!(body["exception"]["kind"], "Other");
    }

    #[tokio::test]
    async fn test_catch_renders_http_response() {
        let (responder, sink) = responder(false);
        let response = responder.catch(&request(), &ErrorEvent::access_denied(""));

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": "Forbidden", "message": "Access error"})
        );
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_responder_is_shareable_across_threads() {
        let (responder, sink) = responder(false);
        let responder = Arc::new(responder);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let responder = Arc::clone(&responder);
                std::thread::spawn(move || {
                    responder
                        .handle(&request(), &ErrorEvent::not_found(format!("item {i}")))
                        .message
                })
            })
            .collect();

        let mut messages: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        messages.sort();
        assert_eq!(messages, ["item 0", "item 1", "item 2", "item 3"]);
        assert_eq!(sink.len(), 4);
    }
}
