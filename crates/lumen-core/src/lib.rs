#![forbid(unsafe_code)]

//! Core: view identity, persisted view state, focus, and input events.
//!
//! # Role in Lumen
//! `lumen-core` holds the pieces of the engine that outlive a single render
//! pass or that every other layer needs to name: the structural [`Identity`]
//! of a view, the [`StateStorage`] keyed by it, the [`FocusRegistry`] that
//! owns keyboard focus, and the lifecycle bookkeeping for appear/disappear
//! callbacks and background tasks.
//!
//! # Primary responsibilities
//! - **Identity**: stable path keys derived from tree position.
//! - **StateStorage**: typed slots per identity with per-pass GC.
//! - **FocusRegistry**: ordered registration, Tab traversal, key dispatch.
//! - **Lifecycle**: appear/disappear tokens and cancellable tasks.
//! - **Render signal**: channel used by background work to request a frame.
//!
//! # How it fits in the system
//! `lumen-widgets` threads these through its `RenderContext` while it
//! evaluates a view tree, and `lumen-runtime` owns them across frames.
//!
//! [`Identity`]: identity::Identity
//! [`StateStorage`]: state::StateStorage
//! [`FocusRegistry`]: focus::FocusRegistry

pub mod cancellation;
pub mod event;
pub mod focus;
pub mod geometry;
pub mod identity;
pub mod lifecycle;
pub mod render_signal;
pub mod state;

pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use focus::{FocusDirection, FocusHandler, FocusRegistry, FocusState, SectionId};
pub use geometry::{Sides, Size};
pub use identity::{Identity, Segment};
pub use lifecycle::{Lifecycle, TaskContext, TaskPriority};
pub use render_signal::{RenderRequester, RenderRequests};
pub use state::{SharedStateStorage, StateKey, StateStorage, StateWriter};
