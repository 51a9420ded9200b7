//! Health check handler.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::json;

use crate::container::BuildContext;
use crate::http::render;
use crate::lifecycle::BoxError;
use crate::routing::{RouteHandler, Routes};

/// Answers `GET /` and `GET /health` with `{"ok": true}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthHandler;

impl HealthHandler {
    pub async fn provide(_: (), _ctx: BuildContext) -> Result<Self, BoxError> {
        Ok(Self)
    }
}

#[async_trait]
impl RouteHandler for HealthHandler {
    fn name(&self) -> &'static str {
        "health"
    }

    fn register_routes(&self, routes: &mut Routes<'_>) {
        routes.get("/").get("/health");
    }

    async fn serve(&self, _request: Request<Body>) -> Response {
        render::json(StatusCode::OK, json!({ "ok": true }))
    }
}
