//! The handler registration contract.

use std::any::type_name;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;

use crate::container::{BuildContext, Container, Dependencies};
use crate::lifecycle::BoxError;
use crate::routing::table::RouteTable;

/// A unit that plugs into the composite router.
#[async_trait]
pub trait RouteHandler: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Attach this handler's (method, path) pairs.
    fn register_routes(&self, routes: &mut Routes<'_>);

    /// Serve one request routed to this handler.
    async fn serve(&self, request: Request<Body>) -> Response;
}

/// Registration surface handed to one handler.
///
/// Every route registered here dispatches to that handler's `serve`.
pub struct Routes<'a> {
    table: &'a mut RouteTable,
    handler: Arc<dyn RouteHandler>,
}

impl<'a> Routes<'a> {
    pub(crate) fn new(table: &'a mut RouteTable, handler: Arc<dyn RouteHandler>) -> Self {
        Self { table, handler }
    }

    pub fn route(&mut self, method: Method, path: &str) -> &mut Self {
        self.table.insert(method, path, self.handler.clone());
        self
    }

    pub fn get(&mut self, path: &str) -> &mut Self {
        self.route(Method::GET, path)
    }

    pub fn post(&mut self, path: &str) -> &mut Self {
        self.route(Method::POST, path)
    }

    pub fn put(&mut self, path: &str) -> &mut Self {
        self.route(Method::PUT, path)
    }

    pub fn delete(&mut self, path: &str) -> &mut Self {
        self.route(Method::DELETE, path)
    }
}

/// Declare `constructor` as a member of the router's handler group.
///
/// ```ignore
/// Container::new()
///     .with(core_app)
///     .with(core_router)
///     .with(as_route(HealthHandler::provide))
/// ```
pub fn as_route<D, H, F, Fut>(constructor: F) -> impl FnOnce(Container) -> Container
where
    D: Dependencies,
    H: RouteHandler,
    F: Fn(D, BuildContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<H, BoxError>> + Send + 'static,
{
    move |container| {
        container.provide_member::<Arc<dyn RouteHandler>, _, _, _>(
            type_name::<H>(),
            move |deps: D, ctx| {
                let handler = constructor(deps, ctx);
                async move { Ok::<_, BoxError>(Arc::new(handler.await?) as Arc<dyn RouteHandler>) }
            },
        )
    }
}
