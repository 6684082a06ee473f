#![forbid(unsafe_code)]

//! Typed values published upward during a frame.
//!
//! A view publishes a value under a [`PreferenceKey`]; anything rendered
//! later in the same frame (typically the status bar) can read it. Values
//! are cleared at the start of every frame, so a value that is not
//! published again disappears.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

/// Key type naming one preference and its value type.
pub trait PreferenceKey: 'static {
    type Value: Clone + Send + 'static;

    /// Value read when nothing was published.
    fn default_value() -> Self::Value;

    /// Combine an already-published value with a newer one. The default
    /// keeps the newest.
    fn reduce(value: &mut Self::Value, next: Self::Value) {
        *value = next;
    }
}

/// Per-frame preference store.
#[derive(Default)]
pub struct PreferenceValues {
    values: FxHashMap<TypeId, Box<dyn Any + Send>>,
}

impl PreferenceValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `value` under `K`, reducing into an earlier value.
    pub fn set<K: PreferenceKey>(&mut self, value: K::Value) {
        match self
            .values
            .get_mut(&TypeId::of::<K>())
            .and_then(|slot| slot.downcast_mut::<K::Value>())
        {
            Some(existing) => K::reduce(existing, value),
            None => {
                self.values.insert(TypeId::of::<K>(), Box::new(value));
            }
        }
    }

    /// Published value of `K`, or its default.
    pub fn get<K: PreferenceKey>(&self) -> K::Value {
        self.values
            .get(&TypeId::of::<K>())
            .and_then(|slot| slot.downcast_ref::<K::Value>())
            .cloned()
            .unwrap_or_else(K::default_value)
    }

    /// Whether anything was published under `K`.
    pub fn contains<K: PreferenceKey>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<K>())
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl std::fmt::Debug for PreferenceValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceValues")
            .field("count", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Title;
    impl PreferenceKey for Title {
        type Value = String;
        fn default_value() -> String {
            "untitled".into()
        }
    }

    struct Badges;
    impl PreferenceKey for Badges {
        type Value = u32;
        fn default_value() -> u32 {
            0
        }
        fn reduce(value: &mut u32, next: u32) {
            *value += next;
        }
    }

    #[test]
    fn default_when_unpublished() {
        let values = PreferenceValues::new();
        assert_eq!(values.get::<Title>(), "untitled");
        assert!(!values.contains::<Title>());
    }

    #[test]
    fn newest_wins_by_default() {
        let mut values = PreferenceValues::new();
        values.set::<Title>("a".into());
        values.set::<Title>("b".into());
        assert_eq!(values.get::<Title>(), "b");
    }

    #[test]
    fn custom_reduce_and_clear() {
        let mut values = PreferenceValues::new();
        values.set::<Badges>(2);
        values.set::<Badges>(3);
        assert_eq!(values.get::<Badges>(), 5);
        values.clear();
        assert_eq!(values.get::<Badges>(), 0);
    }
}
