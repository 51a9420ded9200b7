//! Scheduled-job endpoint.
//!
//! The job-scheduling platform calls one endpoint per deployment:
//! `GET` to discover the registered functions and their cron triggers,
//! `POST`/`PUT ?fnId=<id>` to run one of them.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::Query;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::container::BuildContext;
use crate::http::{render, Dispatch};
use crate::lifecycle::BoxError;
use crate::observability::Logger;
use crate::routing::{RouteHandler, Routes};

/// Path the endpoint is mounted on.
pub const JOBS_PATH: &str = "/api/inngest";

const MAX_EVENT_BYTES: usize = 1024 * 1024;

type JobFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JobError {
    #[error("invalid cron expression {0:?}: expected 5 fields")]
    InvalidCron(String),

    #[error("function {0} already registered")]
    Duplicate(String),
}

/// A five-field cron expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CronTrigger(String);

impl CronTrigger {
    pub fn parse(expr: &str) -> Result<Self, JobError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        let valid = fields.len() == 5
            && fields.iter().all(|field| {
                field
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, '*' | '/' | ',' | '-'))
            });
        if !valid {
            return Err(JobError::InvalidCron(expr.to_string()));
        }
        Ok(Self(fields.join(" ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One schedulable function.
#[derive(Clone)]
pub struct JobFunction {
    id: String,
    name: String,
    trigger: CronTrigger,
    run: JobFn,
}

impl JobFunction {
    pub fn new<F, Fut>(id: impl Into<String>, name: impl Into<String>, trigger: CronTrigger, run: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            trigger,
            run: Arc::new(move |event| run(event).boxed()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Discovery view of a registered function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub id: String,
    pub name: String,
    pub triggers: Vec<TriggerInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerInfo {
    pub cron: CronTrigger,
}

#[derive(Debug, Serialize)]
struct Introspection {
    app_id: String,
    function_count: usize,
    functions: Vec<FunctionInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct InvokeQuery {
    #[serde(rename = "fnId")]
    fn_id: Option<String>,
}

/// The endpoint and its function registry for one composition root.
#[derive(Clone)]
pub struct JobsEndpoint {
    app_id: String,
    functions: Arc<Mutex<Vec<JobFunction>>>,
    logger: Logger,
}

impl JobsEndpoint {
    pub fn new(app_id: impl Into<String>, logger: Logger) -> Self {
        Self {
            app_id: app_id.into(),
            functions: Arc::new(Mutex::new(Vec::new())),
            logger,
        }
    }

    pub async fn provide(
        (config, logger): (AppConfig, Logger),
        _ctx: BuildContext,
    ) -> Result<Self, BoxError> {
        Ok(Self::new(config.inngest_app_id, logger))
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn register(&self, function: JobFunction) -> Result<(), JobError> {
        let mut functions = self.functions.lock().unwrap_or_else(PoisonError::into_inner);
        if functions.iter().any(|f| f.id == function.id) {
            return Err(JobError::Duplicate(function.id));
        }
        tracing::debug!(parent: self.logger.span(), id = %function.id, cron = function.trigger.as_str(), "job registered");
        functions.push(function);
        Ok(())
    }

    pub fn functions(&self) -> Vec<FunctionInfo> {
        self.functions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|f| FunctionInfo {
                id: f.id.clone(),
                name: f.name.clone(),
                triggers: vec![TriggerInfo {
                    cron: f.trigger.clone(),
                }],
            })
            .collect()
    }

    fn find(&self, id: &str) -> Option<JobFunction> {
        self.functions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|f| f.id == id)
            .cloned()
    }

    async fn invoke(&self, request: Request<Body>) -> Response {
        let query = Query::<InvokeQuery>::try_from_uri(request.uri())
            .map(|Query(query)| query)
            .unwrap_or_default();
        let Some(fn_id) = query.fn_id.filter(|id| !id.is_empty()) else {
            return render::error(StatusCode::BAD_REQUEST, "missing fnId");
        };
        let Some(function) = self.find(&fn_id) else {
            return render::error(StatusCode::NOT_FOUND, format!("function not found: {fn_id}"));
        };

        let body = match to_bytes(request.into_body(), MAX_EVENT_BYTES).await {
            Ok(body) => body,
            Err(err) => return render::error(StatusCode::BAD_REQUEST, err.to_string()),
        };
        let event = if body.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&body) {
                Ok(event) => event,
                Err(err) => {
                    return render::error(StatusCode::BAD_REQUEST, format!("invalid event payload: {err}"))
                }
            }
        };

        tracing::info!(parent: self.logger.span(), id = %fn_id, "running job");
        match (function.run)(event).await {
            Ok(output) => render::json(StatusCode::OK, output),
            Err(err) => {
                tracing::warn!(parent: self.logger.span(), id = %fn_id, error = %err, "Job failed");
                render::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

#[async_trait]
impl RouteHandler for JobsEndpoint {
    fn name(&self) -> &'static str {
        "jobs"
    }

    fn register_routes(&self, routes: &mut Routes<'_>) {
        routes.get(JOBS_PATH).post(JOBS_PATH).put(JOBS_PATH);
    }

    async fn serve(&self, request: Request<Body>) -> Response {
        match *request.method() {
            Method::GET => render::json(
                StatusCode::OK,
                Introspection {
                    app_id: self.app_id.clone(),
                    function_count: self.functions().len(),
                    functions: self.functions(),
                },
            ),
            Method::POST | Method::PUT => self.invoke(request).await,
            _ => render::error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
        }
    }
}

#[async_trait]
impl Dispatch for JobsEndpoint {
    async fn dispatch(self, request: Request<Body>) -> Response {
        RouteHandler::serve(&self, request).await
    }
}

/// Invocation registering the example hourly function.
pub async fn register_example_cron(
    (endpoint, logger): (JobsEndpoint, Logger),
    _ctx: BuildContext,
) -> Result<(), BoxError> {
    let function = JobFunction::new(
        "example-cron",
        "Example Cron",
        CronTrigger::parse("0 * * * *")?,
        move |_event| {
            let logger = logger.clone();
            async move {
                tracing::info!(parent: logger.span(), "running example cron");
                Ok::<_, BoxError>(json!({ "ok": true }))
            }
        },
    );
    endpoint.register(function)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_parse() {
        assert_eq!(CronTrigger::parse("0 * * * *").unwrap().as_str(), "0 * * * *");
        assert_eq!(CronTrigger::parse(" */5  1-3 * * 1,2 ").unwrap().as_str(), "*/5 1-3 * * 1,2");
        assert!(CronTrigger::parse("* * *").is_err());
        assert!(CronTrigger::parse("@hourly").is_err());
    }

    #[test]
    fn test_duplicate_function_is_rejected() {
        let endpoint = JobsEndpoint::new("app", Logger::new(&AppConfig::default()));
        let make = || {
            JobFunction::new("f", "F", CronTrigger::parse("0 0 * * *").unwrap(), |_| async {
                Ok::<_, BoxError>(Value::Null)
            })
        };
        endpoint.register(make()).unwrap();
        assert_eq!(endpoint.register(make()), Err(JobError::Duplicate("f".into())));
        assert_eq!(endpoint.functions().len(), 1);
    }
}
