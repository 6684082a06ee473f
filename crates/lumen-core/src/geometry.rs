#![forbid(unsafe_code)]

//! Geometric primitives.

/// A width/height pair in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Size {
    /// A zero-sized extent.
    pub const ZERO: Size = Size::new(0, 0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Check if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Shrink by the given sides, saturating at zero.
    pub fn inset(&self, sides: Sides) -> Size {
        Size {
            width: self.width.saturating_sub(sides.horizontal()),
            height: self.height.saturating_sub(sides.vertical()),
        }
    }

    /// Grow by the given sides, saturating at `u16::MAX`.
    pub fn outset(&self, sides: Sides) -> Size {
        Size {
            width: self.width.saturating_add(sides.horizontal()),
            height: self.height.saturating_add(sides.vertical()),
        }
    }
}

/// Sides for padding/margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sides {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Sides {
    /// Same amount on every side.
    pub const fn all(amount: u16) -> Self {
        Self {
            top: amount,
            right: amount,
            bottom: amount,
            left: amount,
        }
    }

    /// Vertical amount on top/bottom, horizontal amount on left/right.
    pub const fn symmetric(vertical: u16, horizontal: u16) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    /// Explicit sides.
    pub const fn new(top: u16, right: u16, bottom: u16, left: u16) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Left + right.
    #[inline]
    pub const fn horizontal(&self) -> u16 {
        self.left.saturating_add(self.right)
    }

    /// Top + bottom.
    #[inline]
    pub const fn vertical(&self) -> u16 {
        self.top.saturating_add(self.bottom)
    }
}
