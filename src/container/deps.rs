//! Typed dependency keys, tuples and groups.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::ops::Deref;

use crate::container::ContainerError;

/// Identity of a resolvable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// All values of type `T` contributed by group members, in declaration order.
#[derive(Debug, Clone)]
pub struct Group<T>(Vec<T>);

impl<T> Group<T> {
    pub fn new(members: Vec<T>) -> Self {
        Self(members)
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Deref for Group<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<'a, T> IntoIterator for &'a Group<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub(crate) type Erased = Box<dyn Any + Send + Sync>;

/// Values produced so far while resolving one container.
#[derive(Default)]
pub struct Resolved {
    values: HashMap<TypeId, Erased>,
    members: HashMap<usize, Erased>,
}

impl Resolved {
    /// Clone a resolved value out of the set.
    pub fn get<T: Clone + 'static>(&self) -> Result<T, ContainerError> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
            .ok_or(ContainerError::Unresolved(type_name::<T>()))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub(crate) fn insert(&mut self, key: Key, value: Erased) {
        self.values.insert(key.id, value);
    }

    pub(crate) fn insert_member(&mut self, provider: usize, value: Erased) {
        self.members.insert(provider, value);
    }

    pub(crate) fn take_member(&mut self, provider: usize) -> Option<Erased> {
        self.members.remove(&provider)
    }
}

/// Builds a `Group<T>` out of erased member values.
pub(crate) fn assemble<T: Send + Sync + 'static>(parts: Vec<Erased>) -> Erased {
    let members: Vec<T> = parts
        .into_iter()
        .filter_map(|part| part.downcast::<T>().ok())
        .map(|part| *part)
        .collect();
    Box::new(Group(members))
}

/// A tuple of already-resolved inputs to a provider.
pub trait Dependencies: Sized + Send + 'static {
    /// Keys that must be resolved before the provider runs.
    fn keys() -> Vec<Key>;

    fn fetch(values: &Resolved) -> Result<Self, ContainerError>;
}

impl Dependencies for () {
    fn keys() -> Vec<Key> {
        Vec::new()
    }

    fn fetch(_: &Resolved) -> Result<Self, ContainerError> {
        Ok(())
    }
}

macro_rules! tuple_dependencies {
    ($($name:ident),+) => {
        impl<$($name),+> Dependencies for ($($name,)+)
        where
            $($name: Clone + Send + Sync + 'static),+
        {
            fn keys() -> Vec<Key> {
                vec![$(Key::of::<$name>()),+]
            }

            fn fetch(values: &Resolved) -> Result<Self, ContainerError> {
                Ok(($(values.get::<$name>()?,)+))
            }
        }
    };
}

tuple_dependencies!(A);
tuple_dependencies!(A, B);
tuple_dependencies!(A, B, C);
tuple_dependencies!(A, B, C, D);
tuple_dependencies!(A, B, C, D, E);
tuple_dependencies!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_tuple() {
        let mut values = Resolved::default();
        values.insert(Key::of::<u32>(), Box::new(7u32));
        values.insert(Key::of::<String>(), Box::new("seven".to_string()));

        let (n, s) = <(u32, String)>::fetch(&values).unwrap();
        assert_eq!(n, 7);
        assert_eq!(s, "seven");
        assert_eq!(<(u32, String)>::keys(), vec![Key::of::<u32>(), Key::of::<String>()]);
    }

    #[test]
    fn test_fetch_missing() {
        let values = Resolved::default();
        assert_eq!(
            <(u64,)>::fetch(&values).unwrap_err(),
            ContainerError::Unresolved("u64")
        );
    }

    #[test]
    fn test_assemble_keeps_order() {
        let parts: Vec<Erased> = vec![Box::new(1u8), Box::new(2u8), Box::new(3u8)];
        let group = assemble::<u8>(parts);
        let group = group.downcast_ref::<Group<u8>>().unwrap();
        assert_eq!(&group[..], &[1, 2, 3]);
    }
}
