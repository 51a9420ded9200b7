//! Composition roots.
//!
//! Modules are plain `Container -> Container` functions composed with
//! [`Container::with`]. Each entrypoint declares a fresh root per request
//! from these building blocks.
//!
//! ```text
//! health_app = core_app + core_router + as_route(HealthHandler)
//! jobs_app   = core_app + JobsEndpoint + invoke(register_example_cron)
//! core_app   = AppConfig + core_resources
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;

use crate::config;
use crate::container::Container;
use crate::handlers::jobs::register_example_cron;
use crate::handlers::{HealthHandler, JobsEndpoint, JOBS_PATH};
use crate::http::Entrypoint;
use crate::observability::logging;
use crate::resources::{cache, database};
use crate::routing::{as_route, provide_router, RouteHandler};

/// Logger, cache and database providers.
pub fn core_resources(container: Container) -> Container {
    container
        .provide(logging::provide)
        .provide(cache::provide)
        .provide(database::provide)
}

/// Configuration from the environment plus [`core_resources`].
pub fn core_app(container: Container) -> Container {
    container.provide(config::provide).with(core_resources)
}

/// The composite router and its (possibly empty) handler group.
pub fn core_router(container: Container) -> Container {
    container
        .group::<Arc<dyn RouteHandler>>()
        .provide(provide_router)
}

/// Root for the health function: resolves to an [`axum::Router`].
pub fn health_app() -> Container {
    Container::new()
        .with(core_app)
        .with(core_router)
        .with(as_route(HealthHandler::provide))
}

/// Root for the jobs function: resolves to a [`JobsEndpoint`].
pub fn jobs_app() -> Container {
    Container::new()
        .with(core_app)
        .provide(JobsEndpoint::provide)
        .invoke(register_example_cron)
}

/// Entrypoint of the deployed health function.
pub fn health_entrypoint() -> Entrypoint<Router> {
    Entrypoint::new("health", health_app)
}

/// Entrypoint of the deployed jobs function.
pub fn jobs_entrypoint() -> Entrypoint<JobsEndpoint> {
    Entrypoint::new("jobs", jobs_app)
}

#[derive(Clone)]
struct Local {
    health: Entrypoint<Router>,
    jobs: Entrypoint<JobsEndpoint>,
}

/// Both entrypoints behind one listener, for running outside the platform.
///
/// Requests still go through a fresh root each, exactly as when deployed.
pub fn local_router() -> Router {
    let state = Local {
        health: health_entrypoint(),
        jobs: jobs_entrypoint(),
    };

    Router::new()
        .route(JOBS_PATH, any(serve_jobs))
        .fallback(serve_health)
        .with_state(state)
}

async fn serve_jobs(State(local): State<Local>, request: Request<Body>) -> Response {
    local.jobs.handle(request).await
}

async fn serve_health(State(local): State<Local>, request: Request<Body>) -> Response {
    local.health.handle(request).await
}

/// Serve [`local_router`] on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "local server starting");

    let app = local_router().into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("local server stopped");
    Ok(())
}
