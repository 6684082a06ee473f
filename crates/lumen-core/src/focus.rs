#![forbid(unsafe_code)]

//! Keyboard focus ownership and key routing.
//!
//! Interactive controls register with the [`FocusRegistry`] while they
//! render. Registration order is tree traversal order, which is also the
//! Tab order. The registry only keeps a [`StateKey`] per control plus a
//! dispatch function monomorphized for the handler type; the handler itself
//! lives in [`StateStorage`] and is looked up when a key arrives. The render
//! loop dispatches through [`FocusRegistry::dispatch_key_event_shared`], which
//! runs the handler with the storage lock released.
//!
//! # Invariants
//!
//! - At most one control is focused.
//! - Disabled handlers are registered but never focused by traversal.
//! - The focused id survives [`FocusRegistry::begin_pass`]; if the control
//!   is not registered again, [`FocusRegistry::finish_pass`] falls back to
//!   the first eligible control (or to no focus).
//! - Traversal wraps at both ends.
//! - While a section is active, traversal stays inside that section.
//!
//! # Contract errors
//!
//! Two registrations with the same focus id in one pass panic.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::event::KeyEvent;
use crate::state::{SharedStateStorage, StateKey, StateStorage};

/// Behaviour of a focusable control's persisted handler.
pub trait FocusHandler: Any + Send {
    /// Stable id, unique among the controls rendered in one pass.
    fn focus_id(&self) -> &str;

    /// Disabled controls return `false`.
    fn can_be_focused(&self) -> bool {
        true
    }

    /// Handle a key while focused. Return `true` to consume it.
    fn handle_key_event(&mut self, event: &KeyEvent) -> bool;
}

/// Direction of Tab traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusDirection {
    /// Tab.
    Next,
    /// Shift+Tab.
    Previous,
}

/// Focus state of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FocusState {
    /// No control owns the keyboard.
    #[default]
    Unfocused,
    /// The control with this id owns the keyboard.
    Focused(Arc<str>),
}

impl FocusState {
    /// The focused id, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Unfocused => None,
            Self::Focused(id) => Some(id),
        }
    }
}

/// Name of a focus section: a group of controls that can trap traversal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionId(Arc<str>);

impl SectionId {
    /// Create a section id.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// The section name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type DispatchFn = fn(&mut (dyn Any + Send), &KeyEvent) -> bool;

fn dispatch_to<H: FocusHandler>(handler: &mut (dyn Any + Send), event: &KeyEvent) -> bool {
    handler
        .downcast_mut::<H>()
        .is_some_and(|handler| handler.handle_key_event(event))
}

struct Registration {
    key: StateKey,
    focus_id: Arc<str>,
    eligible: bool,
    section: Option<SectionId>,
    dispatch: DispatchFn,
}

/// Registry of focusable controls for the current pass.
pub struct FocusRegistry {
    registrations: Vec<Registration>,
    ids: FxHashSet<Arc<str>>,
    state: FocusState,
    section_stack: Vec<SectionId>,
    active_section: Option<SectionId>,
    autofocus_pending: bool,
}

impl Default for FocusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusRegistry {
    /// Create an empty registry without autofocus.
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            ids: FxHashSet::default(),
            state: FocusState::Unfocused,
            section_stack: Vec::new(),
            active_section: None,
            autofocus_pending: false,
        }
    }

    /// Focus the first eligible control at the end of the first pass that
    /// registers one.
    #[must_use]
    pub fn with_autofocus(mut self, autofocus: bool) -> Self {
        self.autofocus_pending = autofocus;
        self
    }

    /// Drop all registrations; the focused id is kept.
    pub fn begin_pass(&mut self) {
        self.registrations.clear();
        self.ids.clear();
        self.section_stack.clear();
    }

    /// Alias of [`begin_pass`](Self::begin_pass).
    pub fn clear(&mut self) {
        self.begin_pass();
    }

    /// Register the handler stored at `key`.
    ///
    /// The id and eligibility are read from `handler` now; key dispatch later
    /// looks the handler up again by `key`.
    ///
    /// # Panics
    ///
    /// Panics if a control with the same focus id was already registered in
    /// this pass.
    pub fn register<H: FocusHandler>(&mut self, key: StateKey, handler: &H) {
        let focus_id: Arc<str> = Arc::from(handler.focus_id());
        if !self.ids.insert(Arc::clone(&focus_id)) {
            panic!(
                "focus id `{focus_id}` registered twice in one pass (second at {})",
                key.identity
            );
        }
        self.registrations.push(Registration {
            key,
            focus_id,
            eligible: handler.can_be_focused(),
            section: self.section_stack.last().cloned(),
            dispatch: dispatch_to::<H>,
        });
    }

    /// Number of registrations this pass.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether nothing registered this pass.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Focus ids in registration order.
    pub fn focus_order(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|r| r.focus_id.as_ref())
            .collect()
    }

    /// Current state.
    pub fn state(&self) -> &FocusState {
        &self.state
    }

    /// The focused id, if any.
    pub fn focused_id(&self) -> Option<&str> {
        self.state.id()
    }

    /// Whether `id` is focused.
    pub fn is_focused(&self, id: &str) -> bool {
        self.state.id() == Some(id)
    }

    /// Storage key of the focused control, if it registered this pass.
    pub fn focused_key(&self) -> Option<&StateKey> {
        let id = self.state.id()?;
        self.registrations
            .iter()
            .find(|r| r.focus_id.as_ref() == id)
            .map(|r| &r.key)
    }

    /// Tag subsequent registrations with `section`.
    pub fn enter_section(&mut self, section: SectionId) {
        self.section_stack.push(section);
    }

    /// Stop tagging with the innermost section.
    pub fn exit_section(&mut self) {
        self.section_stack.pop();
    }

    /// Confine traversal to `section`. Focus moves into it when it is
    /// currently elsewhere.
    pub fn activate_section(&mut self, section: SectionId) {
        self.active_section = Some(section);
        if !self.focused_in_scope() {
            self.state = self.first_candidate();
            if matches!(self.state, FocusState::Focused(_)) {
                self.autofocus_pending = false;
            }
        }
    }

    /// Release the traversal trap.
    pub fn deactivate_section(&mut self) {
        self.active_section = None;
    }

    /// The section traversal is confined to, if any.
    pub fn active_section(&self) -> Option<&SectionId> {
        self.active_section.as_ref()
    }

    /// Move focus to the next/previous eligible control, wrapping.
    ///
    /// Returns `false` when no control is eligible.
    pub fn advance_focus(&mut self, direction: FocusDirection) -> bool {
        let candidates: Vec<&Arc<str>> = self.candidates().map(|r| &r.focus_id).collect();
        if candidates.is_empty() {
            return false;
        }
        let n = candidates.len();
        let current = self
            .state
            .id()
            .and_then(|id| candidates.iter().position(|c| c.as_ref() == id));
        let next = match (direction, current) {
            (FocusDirection::Next, Some(i)) => (i + 1) % n,
            (FocusDirection::Previous, Some(i)) => (i + n - 1) % n,
            (FocusDirection::Next, None) => 0,
            (FocusDirection::Previous, None) => n - 1,
        };
        let target = Arc::clone(candidates[next]);

        #[cfg(feature = "tracing")]
        tracing::debug!(from = ?self.state.id(), to = %target, ?direction, "focus advanced");

        self.state = FocusState::Focused(target);
        self.autofocus_pending = false;
        true
    }

    /// Focus `id` explicitly.
    ///
    /// Returns whether `id` is an eligible control in this pass. The request
    /// is kept either way and reconciled by [`finish_pass`](Self::finish_pass).
    pub fn request_focus(&mut self, id: &str) -> bool {
        self.state = FocusState::Focused(Arc::from(id));
        self.autofocus_pending = false;
        self.registrations
            .iter()
            .any(|r| r.eligible && r.focus_id.as_ref() == id)
    }

    /// Drop focus. Autofocus does not take it back.
    pub fn release_focus(&mut self) -> bool {
        self.autofocus_pending = false;
        !matches!(
            std::mem::replace(&mut self.state, FocusState::Unfocused),
            FocusState::Unfocused
        )
    }

    fn dispatch_target(&self, event: &KeyEvent) -> Option<&Registration> {
        if event.is_release() {
            return None;
        }
        let id = self.state.id()?;
        self.registrations
            .iter()
            .find(|r| r.eligible && r.focus_id.as_ref() == id)
    }

    /// Route `event` to the focused handler. `true` means consumed.
    pub fn dispatch_key_event(&self, event: &KeyEvent, storage: &mut StateStorage) -> bool {
        let Some(registration) = self.dispatch_target(event) else {
            return false;
        };
        storage
            .value_mut(&registration.key)
            .is_some_and(|handler| (registration.dispatch)(handler, event))
    }

    /// Like [`dispatch_key_event`](Self::dispatch_key_event), but the
    /// handler runs with the storage unlocked.
    ///
    /// The handler is lifted out of storage for the call and put back
    /// afterwards, so its callbacks may write state through a
    /// [`StateWriter`](crate::state::StateWriter). Its own slot reads as
    /// absent while it runs.
    pub fn dispatch_key_event_shared(&self, event: &KeyEvent, storage: &SharedStateStorage) -> bool {
        let Some(registration) = self.dispatch_target(event) else {
            return false;
        };
        let Some(mut entry) = storage.lock().take_entry(&registration.key) else {
            return false;
        };
        let consumed = (registration.dispatch)(entry.value.as_mut(), event);
        storage
            .lock()
            .restore_entry(registration.key.clone(), entry);
        consumed
    }

    /// Reconcile focus against this pass's registrations.
    pub fn finish_pass(&mut self) {
        if let Some(section) = &self.active_section
            && !self
                .registrations
                .iter()
                .any(|r| r.section.as_ref() == Some(section))
        {
            self.active_section = None;
        }

        let keep = match &self.state {
            FocusState::Unfocused => !self.autofocus_pending,
            FocusState::Focused(_) => self.focused_in_scope(),
        };
        if keep {
            return;
        }

        let fallback = self.first_candidate();
        #[cfg(feature = "tracing")]
        tracing::debug!(from = ?self.state.id(), to = ?fallback.id(), "focus reconciled");
        if matches!(fallback, FocusState::Focused(_)) {
            self.autofocus_pending = false;
        }
        self.state = fallback;
    }

    fn candidates(&self) -> impl Iterator<Item = &Registration> {
        let section = self.active_section.as_ref();
        self.registrations
            .iter()
            .filter(move |r| r.eligible && (section.is_none() || r.section.as_ref() == section))
    }

    fn first_candidate(&self) -> FocusState {
        match self.candidates().next() {
            Some(r) => FocusState::Focused(Arc::clone(&r.focus_id)),
            None => FocusState::Unfocused,
        }
    }

    fn focused_in_scope(&self) -> bool {
        match self.state.id() {
            Some(id) => self.candidates().any(|r| r.focus_id.as_ref() == id),
            None => false,
        }
    }
}

impl fmt::Debug for FocusRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusRegistry")
            .field("order", &self.focus_order())
            .field("state", &self.state)
            .field("active_section", &self.active_section)
            .finish()
    }
}
