//! Route aggregation: one composite router out of every declared handler.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::container::{BuildContext, Group};
use crate::lifecycle::BoxError;
use crate::observability::Logger;
use crate::routing::handler::{RouteHandler, Routes};
use crate::routing::middleware::{client_ip, heartbeat, not_found, panic_response};
use crate::routing::table::RouteTable;

pub use crate::routing::middleware::HEARTBEAT_PATH;

/// Every handler declared through `as_route`, in declaration order.
pub type Handlers = Group<Arc<dyn RouteHandler>>;

/// Register every handler and freeze the result behind the baseline middleware.
///
/// Panics raised by a handler's `register_routes` propagate to the caller.
pub fn build_router(handlers: &[Arc<dyn RouteHandler>]) -> Router {
    let mut table = RouteTable::new();
    for handler in handlers {
        handler.register_routes(&mut Routes::new(&mut table, handler.clone()));
    }

    let mut router = Router::new();
    for (path, routes) in table.by_path() {
        let mut methods = MethodRouter::new();
        for entry in routes {
            let Ok(filter) = MethodFilter::try_from(entry.method.clone()) else {
                tracing::warn!(method = %entry.method, path, "Unsupported method; route skipped");
                continue;
            };
            let handler = entry.handler.clone();
            methods = methods.on(filter, move |request: Request<Body>| async move {
                handler.serve(request).await
            });
        }
        router = router.route(path, methods);
    }

    router.fallback(not_found).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(axum::middleware::from_fn(client_ip))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(axum::middleware::from_fn(heartbeat)),
    )
}

/// Composition-root provider for the composite router.
pub async fn provide_router(
    (logger, handlers): (Logger, Handlers),
    _ctx: BuildContext,
) -> Result<Router, BoxError> {
    let router = logger.span().in_scope(|| {
        tracing::debug!(handlers = handlers.len(), "building router");
        build_router(&handlers)
    });
    Ok(router)
}
