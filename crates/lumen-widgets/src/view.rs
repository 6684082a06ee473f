#![forbid(unsafe_code)]

//! The view model.
//!
//! A view is an immutable description, rebuilt by the application every
//! frame. [`View::node`] says what kind of view it is:
//!
//! - [`Node::Primitive`]: a leaf that renders itself (text, controls).
//! - [`Node::Container`]: lays out and renders child views (stacks,
//!   modifiers).
//! - [`Node::Body`]: a composite that is described by another view.
//!
//! Nothing here holds state across frames; persisted state lives in
//! [`StateStorage`](lumen_core::StateStorage), keyed by the identity the
//! evaluator derives from tree position.

use lumen_layout::{ProposedSize, ViewSize};
use lumen_render::FrameBuffer;

use crate::context::{MeasureContext, RenderContext};

/// A view description.
pub trait View: 'static {
    /// What kind of view this is.
    fn node(&self) -> Node<'_>;

    /// Token naming the view's type in identities.
    fn type_token(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Caller-chosen identity key, replacing the positional index.
    fn explicit_id(&self) -> Option<&str> {
        None
    }
}

/// Closed set of view kinds.
pub enum Node<'v> {
    /// Composite view described by another view.
    Body(AnyView),
    /// Leaf view.
    Primitive(&'v dyn Primitive),
    /// View with children.
    Container(&'v dyn Container),
}

/// Leaf rendering contract.
pub trait Primitive {
    /// Preferred size under `proposal`. Must not mutate anything.
    ///
    /// The default fills whatever is offered.
    fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
        let _ = (proposal, ctx);
        ViewSize::flexible(0, 0)
    }

    /// Render at `ctx.width` x `ctx.height`.
    fn render(&self, ctx: &mut RenderContext<'_>) -> FrameBuffer;
}

/// Layout container contract.
pub trait Container {
    /// Preferred size under `proposal`, typically by measuring children.
    fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize;

    /// Render at exactly `width` x `height`.
    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer;
}

/// Type-erased view.
pub struct AnyView(Box<dyn View>);

impl AnyView {
    /// Erase `view`.
    pub fn new(view: impl View) -> Self {
        Self(Box::new(view))
    }

    /// Borrow as a trait object.
    pub fn as_view(&self) -> &dyn View {
        self.0.as_ref()
    }
}

impl View for AnyView {
    fn node(&self) -> Node<'_> {
        self.0.node()
    }

    fn type_token(&self) -> &'static str {
        self.0.type_token()
    }

    fn explicit_id(&self) -> Option<&str> {
        self.0.explicit_id()
    }
}

impl std::fmt::Debug for AnyView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyView")
            .field(&lumen_core::identity::short_type_name(self.type_token()))
            .finish()
    }
}

/// A view that renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyView;

impl View for EmptyView {
    fn node(&self) -> Node<'_> {
        Node::Primitive(self)
    }
}

impl Primitive for EmptyView {
    fn size_that_fits(&self, _proposal: ProposedSize, _ctx: &MeasureContext<'_>) -> ViewSize {
        ViewSize::ZERO
    }

    fn render(&self, _ctx: &mut RenderContext<'_>) -> FrameBuffer {
        FrameBuffer::empty()
    }
}
