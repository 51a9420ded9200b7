//! Provider registry: the declarative half of a composition root.

use std::any::type_name;
use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::container::deps::{assemble, Dependencies, Erased, Group, Key, Resolved};
use crate::container::ContainerError;
use crate::lifecycle::{BoxError, Deadline, Lifecycle};

type Construct = Box<
    dyn Fn(&Resolved, BuildContext) -> Result<BoxFuture<'static, Result<Erased, BoxError>>, ContainerError>
        + Send
        + Sync,
>;

/// What a provider's output is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// Sole provider of its output type.
    Single,
    /// Contributes to `Group<T>`.
    Member,
    /// Run for side effect only.
    Invoke,
}

pub(crate) struct Provider {
    pub(crate) label: &'static str,
    pub(crate) output: Key,
    pub(crate) deps: Vec<Key>,
    pub(crate) role: Role,
    pub(crate) construct: Construct,
}

pub(crate) struct GroupEntry {
    pub(crate) key: Key,
    pub(crate) members: Vec<usize>,
    pub(crate) assemble: fn(Vec<Erased>) -> Erased,
}

/// Handed to every provider while it runs.
#[derive(Clone)]
pub struct BuildContext {
    lifecycle: Lifecycle,
    deadline: Deadline,
}

impl BuildContext {
    pub(crate) fn new(lifecycle: Lifecycle, deadline: Deadline) -> Self {
        Self { lifecycle, deadline }
    }

    /// Where release actions are registered.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// The start-phase deadline; blocking construction should honor it.
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }
}

/// Declaration of every provider needed for one deployment variant.
///
/// Declaring does not construct anything; see [`crate::lifecycle::App`].
#[derive(Default)]
pub struct Container {
    pub(crate) providers: Vec<Provider>,
    pub(crate) groups: Vec<GroupEntry>,
    pub(crate) errors: Vec<ContainerError>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a reusable declaration module.
    pub fn with(self, module: impl FnOnce(Container) -> Container) -> Self {
        module(self)
    }

    /// Declare the provider of `T`.
    pub fn provide<D, T, F, Fut>(mut self, provider: F) -> Self
    where
        D: Dependencies,
        T: Clone + Send + Sync + 'static,
        F: Fn(D, BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        let output = Key::of::<T>();
        let taken = self
            .providers
            .iter()
            .any(|p| p.role == Role::Single && p.output == output);
        if taken {
            self.errors
                .push(ContainerError::DuplicateProvider(output.name()));
            return self;
        }

        self.providers.push(Provider {
            label: output.name(),
            output,
            deps: D::keys(),
            role: Role::Single,
            construct: erase(provider),
        });
        self
    }

    /// Declare a provider that yields an already-built value.
    pub fn supply<T>(self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.provide(move |_: (), _ctx| {
            let value = value.clone();
            async move { Ok(value) }
        })
    }

    /// Declare `Group<T>` so it resolves even when nothing joins it.
    pub fn group<T>(mut self) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.group_entry::<T>();
        self
    }

    fn group_entry<T>(&mut self) -> &mut GroupEntry
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = Key::of::<Group<T>>();
        let index = match self.groups.iter().position(|group| group.key == key) {
            Some(index) => index,
            None => {
                self.groups.push(GroupEntry {
                    key,
                    members: Vec::new(),
                    assemble: assemble::<T>,
                });
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }

    /// Declare a member of `Group<T>`. Members resolve in declaration order.
    pub fn provide_into<T, D, F, Fut>(self, provider: F) -> Self
    where
        D: Dependencies,
        T: Clone + Send + Sync + 'static,
        F: Fn(D, BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        self.provide_member(type_name::<F>(), provider)
    }

    /// Group membership under an explicit label for logs and errors.
    pub(crate) fn provide_member<T, D, F, Fut>(mut self, label: &'static str, provider: F) -> Self
    where
        D: Dependencies,
        T: Clone + Send + Sync + 'static,
        F: Fn(D, BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        let index = self.providers.len();
        self.group_entry::<T>().members.push(index);

        self.providers.push(Provider {
            label,
            output: Key::of::<Group<T>>(),
            deps: D::keys(),
            role: Role::Member,
            construct: erase(provider),
        });
        self
    }

    /// Declare a side-effect action run during start, after its dependencies.
    pub fn invoke<D, F, Fut>(mut self, action: F) -> Self
    where
        D: Dependencies,
        F: Fn(D, BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.providers.push(Provider {
            label: type_name::<F>(),
            output: Key::of::<()>(),
            deps: D::keys(),
            role: Role::Invoke,
            construct: erase(action),
        });
        self
    }

    /// Number of declared providers and invocations.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn erase<D, T, F, Fut>(provider: F) -> Construct
where
    D: Dependencies,
    T: Send + Sync + 'static,
    F: Fn(D, BuildContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
{
    Box::new(move |values, ctx| {
        let deps = D::fetch(values)?;
        let future = provider(deps, ctx);
        Ok(async move {
            let value = future.await?;
            Ok::<_, BoxError>(Box::new(value) as Erased)
        }
        .boxed())
    })
}
