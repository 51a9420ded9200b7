//! The lifecycle manager: bounded start and bounded stop of one container.

use std::any::type_name;
use std::time::Duration;

use tokio::time::Instant;

use crate::container::plan;
use crate::container::{BuildContext, Container, Key, Resolved};
use crate::lifecycle::error::{StartError, StopError};
use crate::lifecycle::hooks::{Deadline, Lifecycle};
use crate::observability::metrics;

/// Start budget used by the entrypoints.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(5);

/// Stop budget used by the entrypoints.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle state of an [`App`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Declared,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

/// One composition root being brought up and torn down.
///
/// An `App` serves exactly one request: `start` once, use the output,
/// `stop` once. Nothing in it is shared with other instances.
pub struct App {
    container: Container,
    lifecycle: Lifecycle,
    values: Resolved,
    state: State,
    start_timeout: Duration,
    stop_timeout: Duration,
}

impl App {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            lifecycle: Lifecycle::new(),
            values: Resolved::default(),
            state: State::Declared,
            start_timeout: DEFAULT_START_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, start: Duration, stop: Duration) -> Self {
        self.start_timeout = start;
        self.stop_timeout = stop;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Hooks registered so far and not yet torn down.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Resolve `T` (plus every invocation) within the start budget.
    ///
    /// On failure the app ends in `Failed`, and every stop hook registered
    /// before the failure has already been run within the stop budget.
    pub async fn start<T>(&mut self) -> Result<T, StartError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.start_with(Some(Key::of::<T>())).await?;
        self.values.get::<T>().map_err(StartError::from)
    }

    /// Run the declared invocations only.
    pub async fn start_invocations(&mut self) -> Result<(), StartError> {
        self.start_with(None).await
    }

    async fn start_with(&mut self, target: Option<Key>) -> Result<(), StartError> {
        if self.state != State::Declared {
            return Err(StartError::AlreadyStarted(self.state));
        }
        self.state = State::Starting;

        let started_at = Instant::now();
        let deadline = Deadline::after(self.start_timeout);
        let output = target.map(|key| key.name()).unwrap_or("<invocations>");
        tracing::debug!(output, budget = ?self.start_timeout, "starting");

        let result = match deadline.run(self.resolve(target, deadline)).await {
            Ok(result) => result,
            Err(_) => Err(StartError::Timeout {
                budget: self.start_timeout,
            }),
        };

        match result {
            Ok(()) => {
                self.state = State::Running;
                metrics::record_start("ok", started_at.elapsed());
                tracing::debug!(output, elapsed = ?started_at.elapsed(), "started");
                Ok(())
            }
            Err(err) => {
                self.state = State::Failed;
                metrics::record_start("failed", started_at.elapsed());
                tracing::error!(output, error = %err, "Start failed; tearing down partial state");
                if let Err(stop_err) = self
                    .lifecycle
                    .run_stop_hooks(Deadline::after(self.stop_timeout))
                    .await
                {
                    tracing::warn!(error = %stop_err, "Cleanup after failed start was incomplete");
                }
                self.values = Resolved::default();
                Err(err)
            }
        }
    }

    async fn resolve(&mut self, target: Option<Key>, deadline: Deadline) -> Result<(), StartError> {
        if let Some(err) = self.container.errors.first() {
            return Err(err.clone().into());
        }

        let steps = plan::build(&self.container, target)?;
        let ctx = BuildContext::new(self.lifecycle.clone(), deadline);
        plan::execute(&self.container, &steps, &mut self.values, &ctx).await?;
        self.lifecycle.run_start_hooks(deadline).await
    }

    /// Run every stop hook in reverse registration order within the stop budget.
    ///
    /// Safe to call in any state; after the first call it is a no-op.
    pub async fn stop(&mut self) -> Result<(), StopError> {
        match self.state {
            State::Stopped => return Ok(()),
            State::Declared | State::Failed => {
                self.state = State::Stopped;
                return Ok(());
            }
            State::Starting | State::Running | State::Stopping => {}
        }

        self.state = State::Stopping;
        let hooks = self.lifecycle.len();
        let result = self
            .lifecycle
            .run_stop_hooks(Deadline::after(self.stop_timeout))
            .await;

        self.values = Resolved::default();
        self.state = State::Stopped;
        match &result {
            Ok(()) => tracing::debug!(hooks, "stopped"),
            Err(err) => tracing::warn!(hooks, error = %err, "Stop completed with failures"),
        }
        result
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("state", &self.state)
            .field("providers", &self.container.len())
            .field("hooks", &self.lifecycle.len())
            .finish()
    }
}
