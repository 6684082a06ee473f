#![forbid(unsafe_code)]

//! Value types of the measure-then-render protocol.
//!
//! A parent proposes a size ([`ProposedSize`]); a child answers with the
//! size it wants and whether it can stretch along each axis ([`ViewSize`]).
//! Parents then render each child at a resolved width and height.

use serde::{Deserialize, Serialize};

/// Layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

impl Axis {
    /// The perpendicular axis.
    #[inline]
    pub const fn cross(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Size offered by a parent; `None` on an axis means "unconstrained".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProposedSize {
    pub width: Option<u16>,
    pub height: Option<u16>,
}

impl ProposedSize {
    /// No constraint on either axis.
    pub const UNSPECIFIED: ProposedSize = ProposedSize {
        width: None,
        height: None,
    };

    /// Both axes constrained.
    pub const fn fixed(width: u16, height: u16) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Explicit optional extents.
    pub const fn new(width: Option<u16>, height: Option<u16>) -> Self {
        Self { width, height }
    }

    /// Extent along `axis`.
    #[inline]
    pub const fn along(&self, axis: Axis) -> Option<u16> {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Proposal with `main` along `axis` and `cross` across it.
    pub const fn from_axes(axis: Axis, main: Option<u16>, cross: Option<u16>) -> Self {
        match axis {
            Axis::Horizontal => Self::new(main, cross),
            Axis::Vertical => Self::new(cross, main),
        }
    }

    /// Shrink both constrained axes.
    pub fn inset(&self, horizontal: u16, vertical: u16) -> Self {
        Self {
            width: self.width.map(|w| w.saturating_sub(horizontal)),
            height: self.height.map(|h| h.saturating_sub(vertical)),
        }
    }
}

/// A child's answer to a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ViewSize {
    pub width: u16,
    pub height: u16,
    pub width_flexible: bool,
    pub height_flexible: bool,
    pub is_spacer: bool,
}

impl ViewSize {
    /// Nothing at all.
    pub const ZERO: ViewSize = ViewSize::fixed(0, 0);

    /// Exactly `width` x `height`.
    pub const fn fixed(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            width_flexible: false,
            height_flexible: false,
            is_spacer: false,
        }
    }

    /// At least `width` x `height`, happy to take more on both axes.
    pub const fn flexible(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            width_flexible: true,
            height_flexible: true,
            is_spacer: false,
        }
    }

    /// A spacer of minimum length `min` (on both axes; the stack decides
    /// which one matters).
    pub const fn spacer(min: u16) -> Self {
        Self {
            width: min,
            height: min,
            width_flexible: true,
            height_flexible: true,
            is_spacer: true,
        }
    }

    /// Set per-axis flexibility.
    #[must_use]
    pub const fn with_flexibility(mut self, width: bool, height: bool) -> Self {
        self.width_flexible = width;
        self.height_flexible = height;
        self
    }

    /// Extent along `axis`.
    #[inline]
    pub const fn along(&self, axis: Axis) -> u16 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Whether the view stretches along `axis`.
    #[inline]
    pub const fn flexible_along(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.width_flexible,
            Axis::Vertical => self.height_flexible,
        }
    }

    /// Clamp extents to whatever `proposal` constrains.
    #[must_use]
    pub fn clamped_to(mut self, proposal: ProposedSize) -> Self {
        if let Some(w) = proposal.width {
            self.width = self.width.min(w);
        }
        if let Some(h) = proposal.height {
            self.height = self.height.min(h);
        }
        self
    }

    /// Resolve to a concrete size under `proposal`: flexible axes take the
    /// proposed extent when there is one.
    pub fn resolve(&self, proposal: ProposedSize) -> (u16, u16) {
        let pick = |natural: u16, flexible: bool, proposed: Option<u16>| match proposed {
            Some(p) if flexible => p,
            Some(p) => natural.min(p),
            None => natural,
        };
        (
            pick(self.width, self.width_flexible, proposal.width),
            pick(self.height, self.height_flexible, proposal.height),
        )
    }
}

/// Placement of content within a larger extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left or top.
    #[default]
    Leading,
    /// Centered; odd leftovers go after the content.
    Center,
    /// Right or bottom.
    Trailing,
}

impl Alignment {
    /// Offset of content of length `content` inside `extent`.
    #[inline]
    pub const fn offset(self, content: u16, extent: u16) -> u16 {
        let extra = extent.saturating_sub(content);
        match self {
            Alignment::Leading => 0,
            Alignment::Center => extra / 2,
            Alignment::Trailing => extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_cross_flips() {
        assert_eq!(Axis::Horizontal.cross(), Axis::Vertical);
        assert_eq!(Axis::Vertical.cross(), Axis::Horizontal);
    }

    #[test]
    fn proposal_axes() {
        let p = ProposedSize::from_axes(Axis::Vertical, Some(3), None);
        assert_eq!(p, ProposedSize::new(None, Some(3)));
        assert_eq!(p.along(Axis::Vertical), Some(3));
        assert_eq!(ProposedSize::fixed(10, 4).inset(4, 6), ProposedSize::fixed(6, 0));
    }

    #[test]
    fn resolve_fills_flexible_axes_only() {
        let flex = ViewSize::flexible(2, 1);
        assert_eq!(flex.resolve(ProposedSize::fixed(10, 5)), (10, 5));
        assert_eq!(flex.resolve(ProposedSize::UNSPECIFIED), (2, 1));

        let fixed = ViewSize::fixed(8, 2);
        assert_eq!(fixed.resolve(ProposedSize::fixed(5, 5)), (5, 2));
        assert_eq!(fixed.resolve(ProposedSize::UNSPECIFIED), (8, 2));
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(Alignment::Leading.offset(3, 10), 0);
        assert_eq!(Alignment::Center.offset(3, 10), 3);
        assert_eq!(Alignment::Trailing.offset(3, 10), 7);
        assert_eq!(Alignment::Trailing.offset(12, 10), 0);
    }
}
