#![forbid(unsafe_code)]

//! Space negotiation for linear stacks.
//!
//! # Algorithm
//!
//! 1. Every child reports a [`ViewSize`] for an unconstrained main axis.
//! 2. Fixed children keep their natural main extent.
//! 3. `max(0, available - fixed - spacing * (n - 1))` is split evenly between
//!    flexible children; the remainder goes one cell at a time to the first
//!    flexible children in order. No flexible child drops below its minimum.
//! 4. On the cross axis, flexible children stretch to the available extent
//!    and fixed children keep theirs (clamped to what is available).
//! 5. The stack's cross extent is the widest child, or the full available
//!    extent when the stack holds a spacer.
//!
//! # Invariants
//!
//! - Deterministic: same inputs, same plan.
//! - With a constrained main axis and at least one flexible child, the
//!   flexible shares plus fixed extents plus spacing fill the available
//!   extent exactly (unless minimums or fixed children overflow it).

use crate::measure::{Axis, ProposedSize, ViewSize};

/// One child's demand along the main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisDemand {
    /// Extent the child asks for.
    pub natural: u16,
    /// Whether it takes a share of leftover space.
    pub flexible: bool,
    /// Floor for a flexible child's share.
    pub min: u16,
}

impl AxisDemand {
    /// A child that wants exactly `natural`.
    pub const fn fixed(natural: u16) -> Self {
        Self {
            natural,
            flexible: false,
            min: natural,
        }
    }

    /// A child that takes a share, never less than `min`.
    pub const fn flexible(min: u16) -> Self {
        Self {
            natural: min,
            flexible: true,
            min,
        }
    }

    /// Demand of `size` along `axis`.
    pub const fn of(size: ViewSize, axis: Axis) -> Self {
        let natural = size.along(axis);
        if size.flexible_along(axis) {
            Self::flexible(natural)
        } else {
            Self::fixed(natural)
        }
    }
}

/// Resolve each child's main-axis extent within `available`.
pub fn distribute(available: u16, demands: &[AxisDemand], spacing: u16) -> Vec<u16> {
    let n = demands.len();
    if n == 0 {
        return Vec::new();
    }
    let fixed: u32 = demands
        .iter()
        .filter(|d| !d.flexible)
        .map(|d| u32::from(d.natural))
        .sum();
    let gaps = u32::from(spacing) * (n as u32 - 1);
    let remaining = u32::from(available).saturating_sub(fixed + gaps);
    let flex_count = demands.iter().filter(|d| d.flexible).count() as u32;
    let (share, mut extra) = if flex_count == 0 {
        (0, 0)
    } else {
        (remaining / flex_count, remaining % flex_count)
    };

    demands
        .iter()
        .map(|demand| {
            if !demand.flexible {
                return demand.natural;
            }
            let mut size = share;
            if extra > 0 {
                size += 1;
                extra -= 1;
            }
            u16::try_from(size).unwrap_or(u16::MAX).max(demand.min)
        })
        .collect()
}

/// Resolved layout of a stack's children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackPlan {
    /// Main-axis extent per child.
    pub main: Vec<u16>,
    /// Cross-axis extent per child.
    pub cross: Vec<u16>,
    /// The stack's own size.
    pub size: ViewSize,
}

impl StackPlan {
    /// (width, height) of child `index` under `axis`.
    pub fn child_extent(&self, axis: Axis, index: usize) -> (u16, u16) {
        let (main, cross) = (self.main[index], self.cross[index]);
        match axis {
            Axis::Horizontal => (main, cross),
            Axis::Vertical => (cross, main),
        }
    }
}

/// Plan a stack along `axis` whose children measured as `children`.
pub fn plan_stack(
    axis: Axis,
    children: &[ViewSize],
    available: ProposedSize,
    spacing: u16,
) -> StackPlan {
    if children.is_empty() {
        return StackPlan::default();
    }
    let cross_axis = axis.cross();
    let available_main = available.along(axis);
    let available_cross = available.along(cross_axis);

    let main = match available_main {
        Some(avail) => {
            let demands: Vec<AxisDemand> =
                children.iter().map(|c| AxisDemand::of(*c, axis)).collect();
            distribute(avail, &demands, spacing)
        }
        None => children.iter().map(|c| c.along(axis)).collect(),
    };

    let cross: Vec<u16> = children
        .iter()
        .map(|child| match available_cross {
            Some(avail) if child.flexible_along(cross_axis) => avail,
            Some(avail) => child.along(cross_axis).min(avail),
            None => child.along(cross_axis),
        })
        .collect();

    let has_spacer = children.iter().any(|c| c.is_spacer);
    let gaps = u32::from(spacing) * (children.len() as u32 - 1);
    let total_main: u32 = main.iter().map(|&m| u32::from(m)).sum::<u32>() + gaps;
    let mut main_extent = u16::try_from(total_main).unwrap_or(u16::MAX);
    if let Some(avail) = available_main {
        main_extent = main_extent.min(avail);
    }
    let cross_extent = match available_cross {
        Some(avail) if has_spacer => avail,
        _ => cross.iter().copied().max().unwrap_or(0),
    };

    let main_flexible = children.iter().any(|c| c.flexible_along(axis));
    let cross_flexible = children.iter().any(|c| c.flexible_along(cross_axis));
    let size = match axis {
        Axis::Horizontal => ViewSize::fixed(main_extent, cross_extent)
            .with_flexibility(main_flexible, cross_flexible),
        Axis::Vertical => ViewSize::fixed(cross_extent, main_extent)
            .with_flexibility(cross_flexible, main_flexible),
    };

    StackPlan { main, cross, size }
}
