#![forbid(unsafe_code)]

//! Contexts threaded through measure and render.
//!
//! [`RenderContext`] is created once per region per frame by the render
//! loop and re-borrowed for every child. It carries the proposed extent,
//! the inherited [`Environment`], the identity of the view being rendered,
//! and mutable access to the frame's state storage, focus registry,
//! lifecycle and per-frame registries.
//!
//! [`MeasureContext`] is its read-only counterpart for `size_that_fits`.

use std::any::Any;
use std::sync::Arc;

use lumen_core::event::KeyEvent;
use lumen_core::focus::{FocusHandler, FocusRegistry};
use lumen_core::identity::Identity;
use lumen_core::lifecycle::Lifecycle;
use lumen_core::state::{StateKey, StateStorage};
use lumen_layout::{ProposedSize, ViewSize};
use lumen_render::FrameBuffer;

use crate::environment::Environment;
use crate::eval;
use crate::preference::{PreferenceKey, PreferenceValues};
use crate::view::View;

/// Deepest view nesting the evaluator accepts before treating the tree as
/// unbounded recursion.
pub const MAX_VIEW_DEPTH: usize = 256;

/// Key handler registered during render.
pub type KeyHandler = Arc<dyn Fn(&KeyEvent) -> bool + Send + Sync>;

/// Registries rebuilt every frame.
#[derive(Default)]
pub struct FrameRegistries {
    key_handlers: Vec<KeyHandler>,
    preferences: PreferenceValues,
}

impl FrameRegistries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop key handlers and preferences.
    pub fn clear(&mut self) {
        self.key_handlers.clear();
        self.preferences.clear();
    }

    /// Register a global key handler.
    pub fn push_key_handler(&mut self, handler: KeyHandler) {
        self.key_handlers.push(handler);
    }

    /// Number of key handlers registered this frame.
    pub fn key_handler_count(&self) -> usize {
        self.key_handlers.len()
    }

    /// Offer `event` to each handler in registration order until one
    /// consumes it.
    pub fn dispatch_key(&self, event: &KeyEvent) -> bool {
        self.key_handlers.iter().any(|handler| handler(event))
    }

    /// This frame's preferences.
    pub fn preferences(&self) -> &PreferenceValues {
        &self.preferences
    }

    /// Mutable access to this frame's preferences.
    pub fn preferences_mut(&mut self) -> &mut PreferenceValues {
        &mut self.preferences
    }
}

impl std::fmt::Debug for FrameRegistries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRegistries")
            .field("key_handlers", &self.key_handlers.len())
            .field("preferences", &self.preferences)
            .finish()
    }
}

/// Read-only context for measuring.
pub struct MeasureContext<'a> {
    env: &'a Environment,
    identity: Identity,
    depth: usize,
    storage: &'a StateStorage,
}

impl<'a> MeasureContext<'a> {
    /// Context for measuring the view at `identity`.
    pub fn new(env: &'a Environment, identity: Identity, storage: &'a StateStorage) -> Self {
        Self {
            env,
            identity,
            depth: 0,
            storage,
        }
    }

    /// Inherited environment.
    pub fn environment(&self) -> &Environment {
        self.env
    }

    /// Identity of the view being measured.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Read persisted state of the view being measured.
    pub fn state<T: Any + Send>(&self, slot: u32) -> Option<&T> {
        self.storage
            .get::<T>(&StateKey::new(self.identity.clone(), slot))
    }

    /// Context for child `index` described by `view`.
    pub fn child(&self, view: &dyn View, index: usize) -> MeasureContext<'a> {
        let identity = eval::child_identity(&self.identity, view, index);
        eval::check_depth(self.depth + 1, &identity);
        MeasureContext {
            env: self.env,
            identity,
            depth: self.depth + 1,
            storage: self.storage,
        }
    }

    /// Context whose environment is `env`, for modifiers that change it.
    pub fn with_environment<'e>(&self, env: &'e Environment) -> MeasureContext<'e>
    where
        'a: 'e,
    {
        MeasureContext {
            env,
            identity: self.identity.clone(),
            depth: self.depth,
            storage: self.storage,
        }
    }

    /// Measure child `index`.
    pub fn measure_child(&self, view: &dyn View, index: usize, proposal: ProposedSize) -> ViewSize {
        eval::measure_view(view, proposal, &self.child(view, index))
    }
}

/// Mutable context for rendering one view.
pub struct RenderContext<'a> {
    /// Proposed width.
    pub width: u16,
    /// Proposed height.
    pub height: u16,
    env: Environment,
    identity: Identity,
    depth: usize,
    storage: &'a mut StateStorage,
    focus: &'a mut FocusRegistry,
    lifecycle: &'a mut Lifecycle,
    frame: &'a mut FrameRegistries,
}

impl<'a> RenderContext<'a> {
    /// Root context for a region of `width` x `height`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: u16,
        height: u16,
        env: Environment,
        root: Identity,
        storage: &'a mut StateStorage,
        focus: &'a mut FocusRegistry,
        lifecycle: &'a mut Lifecycle,
        frame: &'a mut FrameRegistries,
    ) -> Self {
        Self {
            width,
            height,
            env,
            identity: root,
            depth: 0,
            storage,
            focus,
            lifecycle,
            frame,
        }
    }

    /// Identity of the view being rendered.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Inherited environment.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Change the environment for this view and its descendants.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Context for a child at `identity`, re-borrowing everything.
    pub fn child(&mut self, identity: Identity, width: u16, height: u16) -> RenderContext<'_> {
        eval::check_depth(self.depth + 1, &identity);
        RenderContext {
            width,
            height,
            env: self.env.clone(),
            identity,
            depth: self.depth + 1,
            storage: &mut *self.storage,
            focus: &mut *self.focus,
            lifecycle: &mut *self.lifecycle,
            frame: &mut *self.frame,
        }
    }

    /// Read-only view of this context for measuring the current view.
    pub fn measure_context(&self) -> MeasureContext<'_> {
        MeasureContext {
            env: &self.env,
            identity: self.identity.clone(),
            depth: self.depth,
            storage: &*self.storage,
        }
    }

    /// Measure child `index`.
    pub fn measure_child(&self, view: &dyn View, index: usize, proposal: ProposedSize) -> ViewSize {
        self.measure_context().measure_child(view, index, proposal)
    }

    /// Render child `index` at `width` x `height`.
    pub fn render_child(
        &mut self,
        view: &dyn View,
        index: usize,
        width: u16,
        height: u16,
    ) -> FrameBuffer {
        let identity = eval::child_identity(&self.identity, view, index);
        let mut child = self.child(identity, width, height);
        eval::render_view(view, &mut child)
    }

    /// Key for slot `slot` of the current view.
    pub fn state_key(&self, slot: u32) -> StateKey {
        StateKey::new(self.identity.clone(), slot)
    }

    /// Persisted slot `slot` of the current view, created with `default`.
    pub fn state<T, F>(&mut self, slot: u32, default: F) -> &mut T
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        self.storage.slot(&self.identity, slot, default)
    }

    /// Direct storage access.
    pub fn storage(&mut self) -> &mut StateStorage {
        self.storage
    }

    /// Register the handler persisted in `slot` with the focus registry.
    ///
    /// # Panics
    ///
    /// Panics if the slot is empty or holds another type.
    pub fn register_focus<H: FocusHandler>(&mut self, slot: u32) {
        let key = self.state_key(slot);
        match self.storage.get::<H>(&key) {
            Some(handler) => self.focus.register(key, handler),
            None => panic!("no focus handler stored at {key}"),
        }
    }

    /// Whether `focus_id` owns the keyboard and focus is shown here.
    pub fn is_focused(&self, focus_id: &str) -> bool {
        !self.env.dimmed && self.focus.is_focused(focus_id)
    }

    /// The focus registry.
    pub fn focus(&mut self) -> &mut FocusRegistry {
        self.focus
    }

    /// Appear/disappear bookkeeping and tasks.
    pub fn lifecycle(&mut self) -> &mut Lifecycle {
        self.lifecycle
    }

    /// Register a key handler consulted after the focused control.
    pub fn on_key(&mut self, handler: KeyHandler) {
        self.frame.push_key_handler(handler);
    }

    /// Publish a preference value.
    pub fn set_preference<K: PreferenceKey>(&mut self, value: K::Value) {
        self.frame.preferences_mut().set::<K>(value);
    }

    /// Read a preference published earlier this frame.
    pub fn preference<K: PreferenceKey>(&self) -> K::Value {
        self.frame.preferences().get::<K>()
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("identity", &self.identity)
            .field("depth", &self.depth)
            .finish()
    }
}
