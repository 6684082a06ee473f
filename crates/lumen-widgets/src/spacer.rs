#![forbid(unsafe_code)]

//! Flexible empty space.

use lumen_layout::{ProposedSize, ViewSize};
use lumen_render::FrameBuffer;

use crate::context::{MeasureContext, RenderContext};
use crate::view::{Node, Primitive, View};

/// Expands to take the leftover space of its stack.
///
/// Reports its minimum length and full flexibility; a stack containing a
/// spacer also stretches across its cross axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spacer {
    min_length: u16,
}

impl Spacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never shrink below `length`.
    #[must_use]
    pub fn min_length(mut self, length: u16) -> Self {
        self.min_length = length;
        self
    }
}

impl View for Spacer {
    fn node(&self) -> Node<'_> {
        Node::Primitive(self)
    }
}

impl Primitive for Spacer {
    fn size_that_fits(&self, _proposal: ProposedSize, _ctx: &MeasureContext<'_>) -> ViewSize {
        ViewSize::spacer(self.min_length)
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        FrameBuffer::blank(ctx.width, ctx.height)
    }
}
