//! Per-request type-indexed value store.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Holds the most recently produced value of each type for one in-flight
/// request.
///
/// Stage functions never touch the store directly: their return tuples are
/// written into it, and their parameters are read out of it, by the stage
/// adapters. A later write of a type overwrites the earlier value — last
/// writer wins, in stage execution order. There is no removal; the whole
/// store is dropped when the request finishes.
///
/// One store exists per request and is only ever reached through `&mut` from
/// that request's single synchronous run down the chain, so it needs no
/// locking.
#[derive(Default)]
pub struct ValueStore {
    values: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl ValueStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Clones out the current value of type `T`, if any stage produced one.
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    /// Stores `value` as the current value of its type, replacing any
    /// earlier value of the same type.
    pub fn set<T: Any + Send>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Token(u32);

    #[derive(Clone, Debug, PartialEq)]
    struct Label(String);

    #[test]
    fn get_returns_none_until_set() {
        let store = ValueStore::new();
        assert_eq!(store.get::<Token>(), None);
    }

    #[test]
    fn set_then_get_round_trips_by_type() {
        let mut store = ValueStore::new();
        store.set(Token(7));
        store.set(Label("a".into()));
        assert_eq!(store.get::<Token>(), Some(Token(7)));
        assert_eq!(store.get::<Label>(), Some(Label("a".into())));
    }

    #[test]
    fn later_set_of_same_type_overwrites() {
        let mut store = ValueStore::new();
        store.set(Token(1));
        store.set(Token(2));
        assert_eq!(store.get::<Token>(), Some(Token(2)));
    }

    #[test]
    fn get_does_not_consume() {
        let mut store = ValueStore::new();
        store.set(Token(9));
        assert_eq!(store.get::<Token>(), Some(Token(9)));
        assert_eq!(store.get::<Token>(), Some(Token(9)));
    }
}
