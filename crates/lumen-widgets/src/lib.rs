#![forbid(unsafe_code)]

//! Widgets: the declarative view model and its evaluator.
//!
//! # Role in Lumen
//! `lumen-widgets` turns an immutable tree of [`View`] descriptions into a
//! [`FrameBuffer`](lumen_render::FrameBuffer). Applications rebuild the tree
//! every frame; everything that must survive between frames (control
//! handlers, cursor positions, spinner phases) lives in state storage keyed
//! by identity.
//!
//! # Primary responsibilities
//! - **View model**: [`View`] with the closed [`Node`] set of primitive,
//!   container and composite views.
//! - **Contexts**: [`RenderContext`] and [`MeasureContext`], carrying the
//!   inherited [`Environment`] and the frame's registries.
//! - **Evaluation**: identity derivation, measure and render dispatch,
//!   depth limit.
//! - **Building blocks**: stacks, spacer, text, modifiers and a few
//!   focusable controls.
//!
//! # How it fits in the system
//! `lumen-runtime` creates one [`RenderContext`] per region per frame and
//! calls [`eval::render_root`]; the result goes to the diff writer in
//! `lumen-render`.

pub mod button;
pub mod context;
pub mod environment;
pub mod eval;
pub mod modifiers;
pub mod picker;
pub mod preference;
pub mod spacer;
pub mod spinner;
pub mod stack;
pub mod text;
pub mod text_field;
pub mod view;

pub use button::{Button, ButtonHandler};
pub use context::{FrameRegistries, KeyHandler, MAX_VIEW_DEPTH, MeasureContext, RenderContext};
pub use environment::{AnimationPhase, Appearance, Environment, Theme};
pub use modifiers::ViewExt;
pub use picker::{Picker, PickerHandler};
pub use preference::{PreferenceKey, PreferenceValues};
pub use spacer::Spacer;
pub use spinner::{Spinner, SpinnerState};
pub use stack::{HStack, VStack, ZStack};
pub use text::Text;
pub use text_field::{TextField, TextFieldHandler};
pub use view::{AnyView, Container, EmptyView, Node, Primitive, View};

/// Everything needed to describe a view tree.
pub mod prelude {
    pub use crate::{
        AnyView, Button, EmptyView, HStack, Picker, Spacer, Spinner, Text, TextField, VStack,
        View, ViewExt, ZStack,
    };
    pub use lumen_core::Sides;
    pub use lumen_layout::Alignment;
}
