//! Tower middleware that makes an [`ExceptionFilter`] the terminal error
//! handler of an axum router.
//!
//! Two kinds of failure are intercepted:
//!
//! - the inner service resolving to `Err(e)`, as guard-style middleware does
//! - a handler returning an [`ErrorEvent`], whose response carries the
//!   [`EscapedError`] marker
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/users/{id}", get(find_user))
//!     .fallback(route_not_found)
//!     .layer(ErrorHandleLayer::new(Arc::new(responder)));
//! ```

use crate::di::Container;
use crate::error::Result;
use crate::exception::{ErrorEvent, EscapedError, ExceptionFilter};
use crate::request::{BodyFormat, RequestSnapshot};
use axum::BoxError;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, Uri, header, request::Parts};
use axum::response::Response;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use tower::{Layer, Service};

/// Bodies up to this size are buffered so form and JSON fields can be logged.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Tower Layer for the terminal error handler
#[derive(Clone)]
pub struct ErrorHandleLayer {
    filter: Arc<dyn ExceptionFilter>,
    body_limit: usize,
}

impl ErrorHandleLayer {
    pub fn new(filter: Arc<dyn ExceptionFilter>) -> Self {
        Self {
            filter,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Use the filter registered by
    /// [`RestApiErrorHandleModule`](crate::module::RestApiErrorHandleModule).
    ///
    /// # Errors
    /// Returns `DependencyNotFound` if no `ExceptionFilter` is registered.
    pub fn from_container(container: &Container) -> Result<Self> {
        container.resolve::<dyn ExceptionFilter>().map(Self::new)
    }

    /// Largest body (by `Content-Length`) buffered for the snapshot. Larger or
    /// unsized bodies stream through untouched.
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

impl<S> Layer<S> for ErrorHandleLayer {
    type Service = ErrorHandleService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorHandleService {
            inner,
            filter: Arc::clone(&self.filter),
            body_limit: self.body_limit,
            ready_error: None,
        }
    }
}

pub struct ErrorHandleService<S> {
    inner: S,
    filter: Arc<dyn ExceptionFilter>,
    body_limit: usize,
    // Readiness failure, reported on the next call
    ready_error: Option<BoxError>,
}

impl<S: Clone> Clone for ErrorHandleService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            filter: Arc::clone(&self.filter),
            body_limit: self.body_limit,
            ready_error: None,
        }
    }
}

impl<S> Service<Request<Body>> for ErrorHandleService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Infallible>> {
        if let Err(e) = ready!(self.inner.poll_ready(cx)) {
            self.ready_error = Some(e.into());
        }
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let filter = Arc::clone(&self.filter);
        let body_limit = self.body_limit;
        let ready_error = self.ready_error.take();

        // The instance driven by poll_ready serves this call
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let head = parts.clone();

            if let Some(error) = ready_error {
                return Ok(respond(&*filter, &head, None, &ErrorEvent::from_boxed(error)));
            }

            let (buffered, body) = match buffer_body(&parts, body, body_limit).await {
                Ok(buffered) => buffered,
                Err(error) => {
                    tracing::debug!("failed to buffer request body: {}", error);
                    return Ok(respond(&*filter, &head, None, &ErrorEvent::from_error(&error)));
                }
            };

            match inner.call(Request::from_parts(parts, body)).await {
                Ok(mut response) => match response.extensions_mut().remove::<EscapedError>() {
                    Some(EscapedError(event)) => {
                        Ok(respond(&*filter, &head, buffered.as_deref(), &event))
                    }
                    None => Ok(response),
                },
                Err(error) => {
                    let event = ErrorEvent::from_boxed(error.into());
                    Ok(respond(&*filter, &head, buffered.as_deref(), &event))
                }
            }
        })
    }
}

fn respond(
    filter: &dyn ExceptionFilter,
    head: &Parts,
    body: Option<&[u8]>,
    error: &ErrorEvent,
) -> Response {
    let snapshot = RequestSnapshot::capture(head, body);
    filter.catch(&snapshot, error)
}

async fn buffer_body(
    parts: &Parts,
    body: Body,
    limit: usize,
) -> std::result::Result<(Option<Bytes>, Body), axum::Error> {
    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    match (BodyFormat::of(&parts.headers), declared) {
        (Some(_), Some(len)) if len <= limit => {
            let bytes = axum::body::to_bytes(body, limit).await?;
            Ok((Some(bytes.clone()), Body::from(bytes)))
        }
        _ => Ok((None, body)),
    }
}

/// Router fallback: raises a routing not-found error for the layer to render.
pub async fn route_not_found(method: Method, uri: Uri) -> ErrorEvent {
    ErrorEvent::route_not_found(format!("No route found for \"{method} {}\"", uri.path()))
}
