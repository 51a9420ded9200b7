//! Resolution planning and execution.
//!
//! Planning walks provider metadata only; nothing is constructed until the
//! complete, cycle-free order is known.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::container::deps::{Key, Resolved};
use crate::container::registry::{BuildContext, Container, Role};
use crate::container::ContainerError;
use crate::lifecycle::error::panic_message;
use crate::lifecycle::StartError;

/// One unit of work in a resolution plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Run the provider at this declaration index.
    Provide(usize),
    /// Assemble the group at this index from its resolved members.
    Collect(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    Provider(usize),
    Group(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

struct Walk<'a> {
    container: &'a Container,
    marks: HashMap<Node, Mark>,
    path: Vec<(Option<Node>, &'static str)>,
    steps: Vec<Step>,
}

/// Order the work needed to run every invocation and then produce `target`.
///
/// Invocations are visited first, in declaration order. Only providers
/// reachable from an invocation or from `target` are scheduled.
pub fn build(container: &Container, target: Option<Key>) -> Result<Vec<Step>, ContainerError> {
    let mut walk = Walk {
        container,
        marks: HashMap::new(),
        path: Vec::new(),
        steps: Vec::new(),
    };

    for (index, provider) in container.providers.iter().enumerate() {
        if provider.role == Role::Invoke {
            walk.visit(Node::Provider(index))?;
        }
    }

    if let Some(target) = target {
        walk.path.push((None, "<entrypoint>"));
        walk.visit_key(target)?;
        walk.path.pop();
    }

    Ok(walk.steps)
}

impl Walk<'_> {
    fn visit_key(&mut self, key: Key) -> Result<(), ContainerError> {
        let single = self
            .container
            .providers
            .iter()
            .position(|p| p.role == Role::Single && p.output == key);
        if let Some(index) = single {
            return self.visit(Node::Provider(index));
        }

        if let Some(index) = self.container.groups.iter().position(|g| g.key == key) {
            return self.visit(Node::Group(index));
        }

        Err(ContainerError::MissingProvider {
            type_name: key.name(),
            required_by: self.path.last().map_or("<entrypoint>", |(_, label)| *label),
        })
    }

    fn visit(&mut self, node: Node) -> Result<(), ContainerError> {
        let label = match node {
            Node::Provider(index) => self.container.providers[index].label,
            Node::Group(index) => self.container.groups[index].key.name(),
        };

        match self.marks.get(&node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = self
                    .path
                    .iter()
                    .position(|(visiting, _)| *visiting == Some(node))
                    .unwrap_or(0);
                let mut cycle: Vec<&'static str> =
                    self.path[start..].iter().map(|(_, label)| *label).collect();
                cycle.push(label);
                return Err(ContainerError::Cycle(cycle));
            }
            None => {}
        }

        self.marks.insert(node, Mark::Visiting);
        self.path.push((Some(node), label));

        match node {
            Node::Provider(index) => {
                for dep in &self.container.providers[index].deps {
                    self.visit_key(*dep)?;
                }
            }
            Node::Group(index) => {
                for member in &self.container.groups[index].members {
                    self.visit(Node::Provider(*member))?;
                }
            }
        }

        self.path.pop();
        self.marks.insert(node, Mark::Done);
        self.steps.push(match node {
            Node::Provider(index) => Step::Provide(index),
            Node::Group(index) => Step::Collect(index),
        });
        Ok(())
    }
}

/// Run `steps` in order, storing every output in `values`.
pub(crate) async fn execute(
    container: &Container,
    steps: &[Step],
    values: &mut Resolved,
    ctx: &BuildContext,
) -> Result<(), StartError> {
    for step in steps {
        match *step {
            Step::Provide(index) => {
                let provider = &container.providers[index];
                tracing::debug!(provider = provider.label, "resolving");

                let outcome = AssertUnwindSafe(async {
                    let future = (provider.construct)(values, ctx.clone())?;
                    let value = future.await.map_err(|source| StartError::Provider {
                        provider: provider.label,
                        source,
                    })?;
                    Ok::<_, StartError>(value)
                })
                .catch_unwind()
                .await;

                let value = match outcome {
                    Ok(result) => result?,
                    Err(payload) => {
                        return Err(StartError::Panicked {
                            component: provider.label.to_string(),
                            message: panic_message(payload.as_ref()),
                        })
                    }
                };

                match provider.role {
                    Role::Single => values.insert(provider.output, value),
                    Role::Member => values.insert_member(index, value),
                    Role::Invoke => {}
                }
            }
            Step::Collect(index) => {
                let group = &container.groups[index];
                let parts = group
                    .members
                    .iter()
                    .filter_map(|member| values.take_member(*member))
                    .collect();
                values.insert(group.key, (group.assemble)(parts));
            }
        }
    }
    Ok(())
}
