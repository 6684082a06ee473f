#![forbid(unsafe_code)]

//! Persisted per-view state.
//!
//! [`StateStorage`] maps `(Identity, slot)` to a boxed value of any
//! `Send + 'static` type. Views never own their state; they derive a key
//! during render and ask the storage for it, which creates the entry with a
//! default on first access.
//!
//! # Garbage collection
//!
//! A render pass is bracketed by [`StateStorage::begin_render_pass`] and
//! [`StateStorage::end_render_pass`], both scoped to a root identity. Every
//! identity touched during the pass is marked active; at the end, entries
//! beneath that root whose identity was not marked are dropped. Entries
//! under other roots are left alone, so the main tree and the status bar
//! collect independently.
//!
//! # Contract errors
//!
//! Reading a slot as a different type than it was created with panics,
//! naming the key and both types.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::identity::Identity;
use crate::render_signal::RenderRequester;

/// Key of one persisted value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    /// Owning view.
    pub identity: Identity,
    /// Slot index, fixed per view type.
    pub slot: u32,
}

impl StateKey {
    /// Build a key.
    pub fn new(identity: Identity, slot: u32) -> Self {
        Self { identity, slot }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.identity, self.slot)
    }
}

pub(crate) struct Entry {
    pub(crate) value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Entry {
    fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// Typed value store keyed by view identity.
#[derive(Default)]
pub struct StateStorage {
    entries: FxHashMap<StateKey, Entry>,
    active: FxHashSet<Identity>,
}

impl StateStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a value exists at `key`.
    pub fn contains(&self, key: &StateKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Access slot `slot` of `identity`, creating it with `default` first.
    ///
    /// Marks the identity active for the current pass.
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds a value of another type.
    pub fn slot<T, F>(&mut self, identity: &Identity, slot: u32, default: F) -> &mut T
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        self.mark_active(identity);
        let key = StateKey::new(identity.clone(), slot);
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| Entry::new(default()));
        let stored = entry.type_name;
        match entry.value.downcast_mut::<T>() {
            Some(value) => value,
            None => type_mismatch(identity, slot, stored, std::any::type_name::<T>()),
        }
    }

    /// Shared access to an existing value.
    ///
    /// # Panics
    ///
    /// Panics if the value has another type.
    pub fn get<T: Any + Send>(&self, key: &StateKey) -> Option<&T> {
        let entry = self.entries.get(key)?;
        match entry.value.downcast_ref::<T>() {
            Some(value) => Some(value),
            None => type_mismatch(
                &key.identity,
                key.slot,
                entry.type_name,
                std::any::type_name::<T>(),
            ),
        }
    }

    /// Mutable access to an existing value.
    ///
    /// # Panics
    ///
    /// Panics if the value has another type.
    pub fn get_mut<T: Any + Send>(&mut self, key: &StateKey) -> Option<&mut T> {
        let entry = self.entries.get_mut(key)?;
        let stored = entry.type_name;
        match entry.value.downcast_mut::<T>() {
            Some(value) => Some(value),
            None => type_mismatch(&key.identity, key.slot, stored, std::any::type_name::<T>()),
        }
    }

    /// Store `value` at `key`, replacing whatever was there.
    pub fn insert<T: Any + Send>(&mut self, key: StateKey, value: T) {
        self.entries.insert(key, Entry::new(value));
    }

    /// Drop the value at `key`. Returns whether one existed.
    pub fn remove(&mut self, key: &StateKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Lift the value at `key` out of storage, type-erased.
    pub(crate) fn take_entry(&mut self, key: &StateKey) -> Option<Entry> {
        self.entries.remove(key)
    }

    /// Put back a value lifted with [`take_entry`](Self::take_entry).
    pub(crate) fn restore_entry(&mut self, key: StateKey, entry: Entry) {
        self.entries.insert(key, entry);
    }

    pub(crate) fn value_mut(&mut self, key: &StateKey) -> Option<&mut (dyn Any + Send)> {
        self.entries.get_mut(key).map(|entry| entry.value.as_mut())
    }

    /// Mark `identity` as rendered in the current pass.
    pub fn mark_active(&mut self, identity: &Identity) {
        if !self.active.contains(identity) {
            self.active.insert(identity.clone());
        }
    }

    /// Whether `identity` was marked during the current pass.
    pub fn is_active(&self, identity: &Identity) -> bool {
        self.active.contains(identity)
    }

    /// Start a pass over the tree under `root`.
    pub fn begin_render_pass(&mut self, root: &Identity) {
        self.active.retain(|identity| !identity.is_within(root));
    }

    /// Finish the pass under `root`, evicting every entry beneath it that was
    /// not marked active. Returns the evicted identities, deduplicated.
    pub fn end_render_pass(&mut self, root: &Identity) -> Vec<Identity> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("state_gc", root = %root).entered();

        let mut gone: FxHashSet<Identity> = FxHashSet::default();
        let active = &self.active;
        self.entries.retain(|key, _| {
            let keep = !key.identity.is_within(root) || active.contains(&key.identity);
            if !keep && !gone.contains(&key.identity) {
                gone.insert(key.identity.clone());
            }
            keep
        });
        let mut evicted: Vec<Identity> = gone.into_iter().collect();
        evicted.sort_by_cached_key(|identity| identity.to_string());

        #[cfg(feature = "tracing")]
        if !evicted.is_empty() {
            tracing::debug!(count = evicted.len(), "evicted view state");
        }

        evicted
    }
}

impl fmt::Debug for StateStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStorage")
            .field("entries", &self.entries.len())
            .field("active", &self.active.len())
            .finish()
    }
}

#[cold]
#[track_caller]
fn type_mismatch(identity: &Identity, slot: u32, stored: &str, requested: &str) -> ! {
    panic!("state slot {identity}#{slot} holds `{stored}` but was accessed as `{requested}`")
}

/// Storage shared between the render thread and background tasks.
///
/// The render loop holds the lock for a whole pass; tasks take it briefly
/// through a [`StateWriter`].
#[derive(Clone, Default)]
pub struct SharedStateStorage {
    inner: Arc<Mutex<StateStorage>>,
}

impl SharedStateStorage {
    /// Wrap a fresh storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the storage. A poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, StateStorage> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A writer that also asks for a frame after each write.
    pub fn writer(&self, requester: RenderRequester) -> StateWriter {
        StateWriter {
            storage: self.clone(),
            requester,
        }
    }
}

impl fmt::Debug for SharedStateStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedStateStorage").field(&*self.lock()).finish()
    }
}

/// Write access for background work.
#[derive(Clone, Debug)]
pub struct StateWriter {
    storage: SharedStateStorage,
    requester: RenderRequester,
}

impl StateWriter {
    /// Mutate the value at `key` and request a render.
    ///
    /// Returns `false` (and does nothing) once the view has been evicted.
    pub fn update<T, F>(&self, key: &StateKey, f: F) -> bool
    where
        T: Any + Send,
        F: FnOnce(&mut T),
    {
        let updated = {
            let mut storage = self.storage.lock();
            match storage.get_mut::<T>(key) {
                Some(value) => {
                    f(value);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.requester.request_render();
        }
        updated
    }

    /// Read a copy of the value at `key`.
    pub fn read<T: Any + Send + Clone>(&self, key: &StateKey) -> Option<T> {
        self.storage.lock().get::<T>(key).cloned()
    }

    /// Request a render without writing.
    pub fn request_render(&self) -> bool {
        self.requester.request_render()
    }
}
