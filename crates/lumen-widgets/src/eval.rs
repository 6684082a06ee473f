#![forbid(unsafe_code)]

//! View-tree evaluation.
//!
//! Evaluation is a recursive walk. For each view the evaluator marks its
//! identity active, then dispatches on [`View::node`]:
//!
//! - `Body`: evaluate the body as child 0.
//! - `Primitive`: render directly.
//! - `Container`: the container measures and renders its own children
//!   through [`RenderContext::render_child`], which derives each child's
//!   identity from the parent identity, the child's type token and its
//!   index (or explicit key).
//!
//! Output is clipped to the proposed extent. Recursion deeper than
//! [`MAX_VIEW_DEPTH`] panics.

use lumen_core::identity::Identity;
use lumen_layout::{ProposedSize, ViewSize};
use lumen_render::FrameBuffer;

use crate::context::{MAX_VIEW_DEPTH, MeasureContext, RenderContext};
use crate::view::{Node, View};

/// Identity of child `index` of `parent`, described by `view`.
pub fn child_identity(parent: &Identity, view: &dyn View, index: usize) -> Identity {
    match view.explicit_id() {
        Some(key) => parent.keyed_child(view.type_token(), key),
        None => parent.child(view.type_token(), index),
    }
}

#[track_caller]
pub(crate) fn check_depth(depth: usize, identity: &Identity) {
    if depth > MAX_VIEW_DEPTH {
        panic!(
            "view tree deeper than {MAX_VIEW_DEPTH} levels at {}; a body probably contains itself",
            identity.last()
        );
    }
}

/// Measure `view` under `proposal`. `ctx` must already carry the view's
/// identity.
pub fn measure_view(view: &dyn View, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
    match view.node() {
        Node::Body(body) => ctx.measure_child(&body, 0, proposal),
        Node::Primitive(primitive) => primitive.size_that_fits(proposal, ctx),
        Node::Container(container) => container.size_that_fits(proposal, ctx),
    }
}

/// Render `view` at `ctx.width` x `ctx.height`. `ctx` must already carry the
/// view's identity.
pub fn render_view(view: &dyn View, ctx: &mut RenderContext<'_>) -> FrameBuffer {
    let identity = ctx.identity().clone();
    ctx.storage().mark_active(&identity);
    let (width, height) = (ctx.width, ctx.height);

    let buffer = match view.node() {
        Node::Body(body) => ctx.render_child(&body, 0, width, height),
        Node::Primitive(primitive) => primitive.render(ctx),
        Node::Container(container) => {
            #[cfg(feature = "tracing")]
            let _span = tracing::trace_span!("container_render", view = %identity, width, height).entered();
            container.render(width, height, ctx)
        }
    };
    buffer.clipped(width, height)
}

/// Render `view` as the single child of the region root carried by `ctx`.
///
/// A zero-sized region still evaluates the tree, so state and focus
/// survive a terminal that is briefly collapsed.
pub fn render_root(view: &dyn View, ctx: &mut RenderContext<'_>) -> FrameBuffer {
    let (width, height) = (ctx.width, ctx.height);
    ctx.render_child(view, 0, width, height)
}
