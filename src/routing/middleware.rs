//! Baseline middleware installed on every composite router.

use std::any::Any;
use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::render;
use crate::lifecycle::error::panic_message;

/// Path answered by the liveness probe, independent of any handler.
pub const HEARTBEAT_PATH: &str = "/ping";

/// Normalized client address, inserted as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Client address from proxy headers.
///
/// `True-Client-IP`, then `X-Real-IP`, then the first `X-Forwarded-For` hop.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let single = |name: &str| -> Option<IpAddr> { headers.get(name)?.to_str().ok()?.trim().parse().ok() };

    single("true-client-ip")
        .or_else(|| single("x-real-ip"))
        .or_else(|| {
            headers
                .get("x-forwarded-for")?
                .to_str()
                .ok()?
                .split(',')
                .next()?
                .trim()
                .parse()
                .ok()
        })
}

pub async fn client_ip(mut request: Request<Body>, next: Next) -> Response {
    let ip = forwarded_ip(request.headers()).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    });

    if let Some(ip) = ip {
        request.extensions_mut().insert(ClientIp(ip));
    }
    next.run(request).await
}

pub async fn heartbeat(request: Request<Body>, next: Next) -> Response {
    let method = request.method();
    if (method == Method::GET || method == Method::HEAD)
        && request.uri().path().eq_ignore_ascii_case(HEARTBEAT_PATH)
    {
        return (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], ".").into_response();
    }
    next.run(request).await
}

/// Converts a panic caught while serving into a 500 envelope.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!(panic = %panic_message(payload.as_ref()), "Handler panicked while serving");
    render::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

pub async fn not_found() -> Response {
    render::error(StatusCode::NOT_FOUND, "not found")
}
