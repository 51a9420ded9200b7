//! Lifecycle hooks and deadlines.
//!
//! Providers append a [`Hook`] to the [`Lifecycle`] handed to them through
//! their build context. The lifecycle is a cheap, cloneable handle onto one
//! ordered list owned by a single App instance.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::time::{error::Elapsed, Instant};

use crate::lifecycle::error::{panic_message, BoxError, HookFailure, StartError, StopError};
use crate::observability::metrics;

type HookAction = Box<dyn FnOnce(Deadline) -> BoxFuture<'static, Result<(), BoxError>> + Send>;

/// A point in time by which a lifecycle phase must finish.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// The total budget this deadline was created with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the deadline; zero once elapsed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Run `future`, giving up when the deadline passes.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Elapsed> {
        tokio::time::timeout_at(self.at, future).await
    }
}

/// Start/stop actions registered by a provider.
pub struct Hook {
    name: String,
    on_start: Option<HookAction>,
    on_stop: Option<HookAction>,
}

impl Hook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_start: None,
            on_stop: None,
        }
    }

    /// Action run after resolution, in registration order.
    pub fn on_start<F, Fut>(mut self, action: F) -> Self
    where
        F: FnOnce(Deadline) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.on_start = Some(Box::new(move |deadline| action(deadline).boxed()));
        self
    }

    /// Action run during teardown, in reverse registration order.
    pub fn on_stop<F, Fut>(mut self, action: F) -> Self
    where
        F: FnOnce(Deadline) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.on_stop = Some(Box::new(move |deadline| action(deadline).boxed()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("on_start", &self.on_start.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .finish()
    }
}

struct Slot {
    hook: Hook,
    // Hooks whose start action has not completed are never stopped.
    started: bool,
}

/// Ordered hook list for one App instance.
#[derive(Clone, Default)]
pub struct Lifecycle {
    slots: Arc<Mutex<Vec<Slot>>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. Registration order defines start order; stop order is the reverse.
    pub fn append(&self, hook: Hook) {
        tracing::trace!(hook = %hook.name, "lifecycle hook registered");
        let started = hook.on_start.is_none();
        self.lock().push(Slot { hook, started });
    }

    /// Number of registered hooks not yet torn down.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of registered hooks, in registration order.
    pub fn hook_names(&self) -> Vec<String> {
        self.lock().iter().map(|slot| slot.hook.name.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run pending start actions in registration order.
    ///
    /// State lives behind the shared handle, so a caller that abandons this
    /// future at its deadline leaves every completed start recorded.
    pub(crate) async fn run_start_hooks(&self, deadline: Deadline) -> Result<(), StartError> {
        let mut index = 0;
        loop {
            let pending = {
                let mut slots = self.lock();
                let Some(slot) = slots.get_mut(index) else {
                    break;
                };
                slot.hook
                    .on_start
                    .take()
                    .map(|action| (slot.hook.name.clone(), action))
            };

            if let Some((name, action)) = pending {
                tracing::debug!(hook = %name, "running start hook");
                match AssertUnwindSafe(action(deadline)).catch_unwind().await {
                    Ok(Ok(())) => {
                        if let Some(slot) = self.lock().get_mut(index) {
                            slot.started = true;
                        }
                    }
                    Ok(Err(source)) => return Err(StartError::StartHook { hook: name, source }),
                    Err(payload) => {
                        return Err(StartError::Panicked {
                            component: name,
                            message: panic_message(payload.as_ref()),
                        })
                    }
                }
            }
            index += 1;
        }
        Ok(())
    }

    /// Run every stop action in reverse registration order.
    ///
    /// Each hook is attempted even when an earlier one fails; failures are
    /// collected. Hooks still pending when the deadline passes are reported
    /// as skipped and dropped.
    pub(crate) async fn run_stop_hooks(&self, deadline: Deadline) -> Result<(), StopError> {
        let slots = std::mem::take(&mut *self.lock());
        let mut pending = slots
            .into_iter()
            .filter(|slot| slot.started)
            .filter_map(|slot| slot.hook.on_stop.map(|action| (slot.hook.name, action)))
            .rev();

        let mut failures = Vec::new();
        while let Some((name, action)) = pending.next() {
            tracing::debug!(hook = %name, "running stop hook");
            let outcome = deadline
                .run(AssertUnwindSafe(action(deadline)).catch_unwind())
                .await;

            let message = match outcome {
                Ok(Ok(Ok(()))) => continue,
                Ok(Ok(Err(err))) => err.to_string(),
                Ok(Err(payload)) => format!("panicked: {}", panic_message(payload.as_ref())),
                Err(_) => {
                    let skipped: Vec<String> = pending.map(|(name, _)| name).collect();
                    tracing::warn!(
                        hook = %name,
                        skipped = skipped.len(),
                        budget = ?deadline.budget(),
                        "Stop budget exhausted"
                    );
                    metrics::record_stop_hook_failure(&name);
                    failures.push(HookFailure {
                        hook: name,
                        message: "timed out".to_string(),
                    });
                    return Err(StopError::Timeout {
                        budget: deadline.budget(),
                        failures,
                        skipped,
                    });
                }
            };

            tracing::warn!(hook = %name, error = %message, "Stop hook failed");
            metrics::record_stop_hook_failure(&name);
            failures.push(HookFailure {
                hook: name,
                message,
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(StopError::Hooks(failures))
        }
    }
}
