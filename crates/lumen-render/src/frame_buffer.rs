#![forbid(unsafe_code)]

//! FrameBuffer = ordered styled lines + declared width.
//!
//! Every view renders into a `FrameBuffer`; containers compose their
//! children's buffers with the operations here.
//!
//! # Invariants
//!
//! - Every line has visible width exactly equal to [`FrameBuffer::width`].
//! - Padding added by any operation carries the background active at the
//!   end of the padded line (see [`ansi::pad_to_width`]).
//! - [`FrameBuffer::overlay`] never changes dimensions.
//!
//! # Usage
//!
//! ```
//! use lumen_render::frame_buffer::FrameBuffer;
//!
//! let mut column = FrameBuffer::from_lines(vec!["title".into()]);
//! column.append_vertically(FrameBuffer::from_lines(vec!["body text".into()]), 1);
//! assert_eq!(column.width(), 9);
//! assert_eq!(column.height(), 3);
//! ```

use lumen_core::geometry::Sides;

use crate::ansi;

/// Rectangular block of styled text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    lines: Vec<String>,
    width: u16,
}

fn blank_line(width: u16) -> String {
    " ".repeat(usize::from(width))
}

fn clamp_width(width: usize) -> u16 {
    u16::try_from(width).unwrap_or(u16::MAX)
}

impl FrameBuffer {
    /// A zero-by-zero buffer.
    pub const fn empty() -> Self {
        Self {
            lines: Vec::new(),
            width: 0,
        }
    }

    /// A `width` x `height` block of spaces.
    pub fn blank(width: u16, height: u16) -> Self {
        Self {
            lines: vec![blank_line(width); usize::from(height)],
            width,
        }
    }

    /// Build from lines; the width is the widest line and shorter lines are
    /// padded.
    pub fn from_lines(lines: Vec<String>) -> Self {
        let width = lines
            .iter()
            .map(|line| ansi::visible_width(line))
            .max()
            .unwrap_or(0);
        Self::with_width(lines, clamp_width(width))
    }

    /// Build from lines padded or truncated to exactly `width`.
    pub fn with_width(lines: Vec<String>, width: u16) -> Self {
        let lines = lines
            .into_iter()
            .map(|line| ansi::pad_to_width(&line, usize::from(width)))
            .collect();
        Self { lines, width }
    }

    /// Declared width in columns.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of lines.
    #[inline]
    pub fn height(&self) -> u16 {
        clamp_width(self.lines.len())
    }

    /// Whether the buffer covers no cells.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.lines.is_empty()
    }

    /// The lines, top to bottom.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consume into lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Lines with escape sequences removed; handy in tests.
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines.iter().map(|line| ansi::strip(line)).collect()
    }

    fn widen(&mut self, width: u16) {
        if width <= self.width {
            return;
        }
        for line in &mut self.lines {
            *line = ansi::pad_to_width(line, usize::from(width));
        }
        self.width = width;
    }

    fn grow_to_height(&mut self, height: u16) {
        while self.lines.len() < usize::from(height) {
            self.lines.push(blank_line(self.width));
        }
    }

    /// Stack `other` below `self`, with `spacing` blank lines between them.
    ///
    /// The result is as wide as the wider of the two. Appending to or from an
    /// empty buffer inserts no spacing.
    pub fn append_vertically(&mut self, mut other: FrameBuffer, spacing: u16) {
        if other.lines.is_empty() {
            self.widen(other.width);
            return;
        }
        if self.lines.is_empty() {
            other.widen(self.width);
            *self = other;
            return;
        }
        let width = self.width.max(other.width);
        self.widen(width);
        other.widen(width);
        for _ in 0..spacing {
            self.lines.push(blank_line(width));
        }
        self.lines.extend(other.lines);
    }

    /// Place `other` to the right of `self`, with `spacing` blank columns
    /// between them.
    ///
    /// The shorter buffer is extended with blank lines of its own width.
    pub fn append_horizontally(&mut self, mut other: FrameBuffer, spacing: u16) {
        if other.width == 0 {
            self.grow_to_height(other.height());
            return;
        }
        if self.width == 0 {
            other.grow_to_height(self.height());
            *self = other;
            return;
        }
        let height = self.height().max(other.height());
        self.grow_to_height(height);
        other.grow_to_height(height);
        let gap = blank_line(spacing);
        for (line, right) in self.lines.iter_mut().zip(other.lines) {
            line.push_str(&gap);
            line.push_str(&right);
        }
        self.width = self
            .width
            .saturating_add(spacing)
            .saturating_add(other.width);
    }

    /// Composite `other` on top of `self`, anchored at the top-left corner.
    ///
    /// Visible non-space characters of `other` replace the columns beneath
    /// them. `other` is clipped to `self`; dimensions never change.
    pub fn overlay(&mut self, other: &FrameBuffer) {
        let width = usize::from(self.width);
        for (line, top) in self.lines.iter_mut().zip(other.lines.iter()) {
            *line = ansi::overlay_line(line, top, width);
        }
    }

    /// Surround with blank space.
    #[must_use]
    pub fn padded(mut self, sides: Sides) -> FrameBuffer {
        let width = self
            .width
            .saturating_add(sides.left)
            .saturating_add(sides.right);
        let left = blank_line(sides.left);
        let mut lines = Vec::with_capacity(self.lines.len() + usize::from(sides.vertical()));
        lines.extend(std::iter::repeat_n(blank_line(width), usize::from(sides.top)));
        for line in self.lines.drain(..) {
            lines.push(ansi::pad_to_width(&format!("{left}{line}"), usize::from(width)));
        }
        lines.extend(std::iter::repeat_n(blank_line(width), usize::from(sides.bottom)));
        FrameBuffer { lines, width }
    }

    /// Place `self` at (`x`, `y`) inside a `width` x `height` blank canvas,
    /// clipping whatever falls outside.
    #[must_use]
    pub fn placed(self, width: u16, height: u16, x: u16, y: u16) -> FrameBuffer {
        let left = blank_line(x.min(width));
        let inner = usize::from(width.saturating_sub(x));
        let mut lines: Vec<String> = Vec::with_capacity(usize::from(height));
        let mut source = self.lines.into_iter();
        for row in 0..height {
            let line = if row >= y {
                source.next().map(|line| ansi::truncate(&line, inner))
            } else {
                None
            };
            let line = match line {
                Some(line) => format!("{left}{line}"),
                None => String::new(),
            };
            lines.push(ansi::pad_to_width(&line, usize::from(width)));
        }
        FrameBuffer { lines, width }
    }

    /// Truncate to at most `width` x `height`.
    #[must_use]
    pub fn clipped(mut self, width: u16, height: u16) -> FrameBuffer {
        self.lines.truncate(usize::from(height));
        if width < self.width {
            for line in &mut self.lines {
                *line = ansi::pad_to_width(line, usize::from(width));
            }
            self.width = width;
        }
        self
    }

    /// Lay `style` under every line, re-applied after each reset.
    #[must_use]
    pub fn styled(mut self, style: &str) -> FrameBuffer {
        for line in &mut self.lines {
            *line = ansi::apply_base_style(line, style);
        }
        self
    }
}
