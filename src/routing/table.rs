//! Ordered route table with first-registrant precedence.

use std::sync::Arc;

use axum::http::Method;

use crate::routing::handler::RouteHandler;

pub(crate) struct RouteEntry {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) handler: Arc<dyn RouteHandler>,
}

/// Every (method, path) pair registered so far, in registration order.
#[derive(Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. On an exact (method, path) collision the existing
    /// mapping is kept and `false` is returned.
    pub fn insert(&mut self, method: Method, path: &str, handler: Arc<dyn RouteHandler>) -> bool {
        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| e.method == method && e.path == path)
        {
            tracing::debug!(
                %method,
                path,
                kept = existing.handler.name(),
                superseded = handler.name(),
                "route already registered; keeping first registrant"
            );
            return false;
        }

        self.entries.push(RouteEntry {
            method,
            path: path.to_string(),
            handler,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the handler serving (method, path), if any.
    pub fn owner(&self, method: &Method, path: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.method == *method && e.path == path)
            .map(|e| e.handler.name())
    }

    /// Distinct paths in first-registration order, each with its routes.
    pub(crate) fn by_path(&self) -> Vec<(&str, Vec<&RouteEntry>)> {
        let mut paths: Vec<(&str, Vec<&RouteEntry>)> = Vec::new();
        for entry in &self.entries {
            match paths.iter_mut().find(|(path, _)| *path == entry.path) {
                Some((_, routes)) => routes.push(entry),
                None => paths.push((entry.path.as_str(), vec![entry])),
            }
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::{IntoResponse, Response};

    use crate::routing::handler::Routes;

    struct Named(&'static str);

    #[async_trait]
    impl RouteHandler for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn register_routes(&self, _routes: &mut Routes<'_>) {}

        async fn serve(&self, _request: Request<Body>) -> Response {
            self.0.into_response()
        }
    }

    #[test]
    fn test_first_registrant_wins() {
        let mut table = RouteTable::new();
        assert!(table.insert(Method::GET, "/health", Arc::new(Named("first"))));
        assert!(!table.insert(Method::GET, "/health", Arc::new(Named("second"))));
        assert!(table.insert(Method::POST, "/health", Arc::new(Named("second"))));

        assert_eq!(table.len(), 2);
        assert_eq!(table.owner(&Method::GET, "/health"), Some("first"));
        assert_eq!(table.owner(&Method::POST, "/health"), Some("second"));
    }

    #[test]
    fn test_paths_keep_registration_order() {
        let mut table = RouteTable::new();
        let h: Arc<dyn RouteHandler> = Arc::new(Named("h"));
        table.insert(Method::GET, "/b", h.clone());
        table.insert(Method::GET, "/a", h.clone());
        table.insert(Method::POST, "/b", h);

        let paths: Vec<_> = table
            .by_path()
            .into_iter()
            .map(|(path, routes)| (path, routes.len()))
            .collect();
        assert_eq!(paths, vec![("/b", 2), ("/a", 1)]);
    }
}
