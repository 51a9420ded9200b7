//! The per-request entrypoint adapter.

use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use futures_util::FutureExt;
use tower::ServiceExt;

use crate::container::Container;
use crate::http::render;
use crate::lifecycle::error::panic_message;
use crate::lifecycle::{App, DEFAULT_START_TIMEOUT, DEFAULT_STOP_TIMEOUT};
use crate::observability::metrics;

/// A resolved output that can serve one request.
#[async_trait]
pub trait Dispatch: Clone + Send + Sync + 'static {
    async fn dispatch(self, request: Request<Body>) -> Response;
}

#[async_trait]
impl Dispatch for Router {
    async fn dispatch(self, request: Request<Body>) -> Response {
        match self.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

type Declare = Arc<dyn Fn() -> Container + Send + Sync>;

/// Serves each request through a freshly declared composition root.
///
/// The start deadline is a fresh budget owned by the entrypoint, not the
/// caller's: the lifecycle runs on a spawned task, so a caller that goes
/// away aborts neither start nor teardown.
pub struct Entrypoint<T> {
    name: &'static str,
    declare: Declare,
    start_timeout: Duration,
    stop_timeout: Duration,
    _output: PhantomData<fn() -> T>,
}

impl<T> Clone for Entrypoint<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            declare: self.declare.clone(),
            start_timeout: self.start_timeout,
            stop_timeout: self.stop_timeout,
            _output: PhantomData,
        }
    }
}

impl<T: Dispatch> Entrypoint<T> {
    /// `declare` is called once per request to build a new root.
    pub fn new<F>(name: &'static str, declare: F) -> Self
    where
        F: Fn() -> Container + Send + Sync + 'static,
    {
        Self {
            name,
            declare: Arc::new(declare),
            start_timeout: DEFAULT_START_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            _output: PhantomData,
        }
    }

    pub fn with_timeouts(mut self, start: Duration, stop: Duration) -> Self {
        self.start_timeout = start;
        self.stop_timeout = stop;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Serve one request: start, dispatch, always stop.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let container = (self.declare)();
        let task = tokio::spawn(serve_one::<T>(
            self.name,
            container,
            self.start_timeout,
            self.stop_timeout,
            request,
        ));

        match task.await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(entrypoint = self.name, error = %err, "Request task failed");
                render::error(StatusCode::INTERNAL_SERVER_ERROR, "request task failed")
            }
        }
    }
}

async fn serve_one<T: Dispatch>(
    name: &'static str,
    container: Container,
    start_timeout: Duration,
    stop_timeout: Duration,
    request: Request<Body>,
) -> Response {
    let mut app = App::new(container).with_timeouts(start_timeout, stop_timeout);

    let response = match app.start::<T>().await {
        Ok(output) => match AssertUnwindSafe(output.dispatch(request)).catch_unwind().await {
            Ok(response) => response,
            Err(payload) => {
                tracing::error!(
                    entrypoint = name,
                    panic = %panic_message(payload.as_ref()),
                    "Dispatch panicked"
                );
                render::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        },
        Err(err) => {
            tracing::error!(entrypoint = name, error = %err, "Start failed; request not dispatched");
            render::error(StatusCode::INTERNAL_SERVER_ERROR, err.public_message())
        }
    };

    if let Err(err) = app.stop().await {
        tracing::warn!(entrypoint = name, error = %err, "Teardown incomplete");
    }

    metrics::record_request(name, response.status());
    response
}
