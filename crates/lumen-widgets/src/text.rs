#![forbid(unsafe_code)]

//! Static text.

use lumen_layout::{ProposedSize, ViewSize};
use lumen_render::{FrameBuffer, ansi};

use crate::context::{MeasureContext, RenderContext};
use crate::view::{Node, Primitive, View};

/// One or more lines of text, optionally styled.
///
/// Lines split on `\n`. Text reports its natural size and is truncated when
/// given less; under an explicit width it fills that width instead.
#[derive(Debug, Clone, Default)]
pub struct Text {
    content: String,
    style: Option<String>,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: None,
        }
    }

    /// SGR sequence applied to every line.
    #[must_use]
    pub fn style(mut self, code: impl Into<String>) -> Self {
        self.style = Some(code.into());
        self
    }

    /// The raw content.
    pub fn content(&self) -> &str {
        &self.content
    }

    fn natural_size(&self) -> (u16, u16) {
        let mut width = 0;
        let mut height = 0u16;
        for line in self.content.split('\n') {
            width = width.max(ansi::visible_width(line));
            height = height.saturating_add(1);
        }
        (u16::try_from(width).unwrap_or(u16::MAX), height)
    }
}

impl View for Text {
    fn node(&self) -> Node<'_> {
        Node::Primitive(self)
    }
}

impl Primitive for Text {
    fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
        let (width, height) = self.natural_size();
        let fills = ctx.environment().explicit_width;
        ViewSize::fixed(width, height)
            .with_flexibility(fills, false)
            .clamped_to(proposal)
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let lines = self
            .content
            .split('\n')
            .map(|line| match &self.style {
                Some(code) => format!("{code}{line}{}", ansi::RESET),
                None => line.to_owned(),
            })
            .collect();
        FrameBuffer::from_lines(lines).clipped(ctx.width, ctx.height)
    }
}
