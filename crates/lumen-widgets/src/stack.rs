#![forbid(unsafe_code)]

//! Linear and layered stacks.
//!
//! [`HStack`] and [`VStack`] run the two-pass protocol: measure every child
//! with the main axis unconstrained, resolve extents with
//! [`plan_stack`](lumen_layout::plan_stack), render each child at its
//! resolved size, then align children on the cross axis and join them
//! with spacing. [`ZStack`] layers its children, later ones on top.

use lumen_layout::{Alignment, Axis, ProposedSize, StackPlan, ViewSize, plan_stack};
use lumen_render::FrameBuffer;

use crate::context::{MeasureContext, RenderContext};
use crate::view::{AnyView, Container, Node, View};

struct Linear {
    axis: Axis,
    spacing: u16,
    alignment: Alignment,
    children: Vec<AnyView>,
}

impl Linear {
    fn new(axis: Axis) -> Self {
        Self {
            axis,
            spacing: 0,
            alignment: Alignment::Leading,
            children: Vec::new(),
        }
    }

    fn child_proposal(&self, cross: Option<u16>) -> ProposedSize {
        ProposedSize::from_axes(self.axis, None, cross)
    }

    fn plan(
        &self,
        proposal: ProposedSize,
        measure: impl Fn(&dyn View, usize, ProposedSize) -> ViewSize,
    ) -> StackPlan {
        let child_proposal = self.child_proposal(proposal.along(self.axis.cross()));
        let sizes: Vec<ViewSize> = self
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| measure(child, index, child_proposal))
            .collect();
        plan_stack(self.axis, &sizes, proposal, self.spacing)
    }

    fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
        self.plan(proposal, |view, index, p| ctx.measure_child(view, index, p))
            .size
    }

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        if self.children.is_empty() {
            return FrameBuffer::empty();
        }
        let plan = {
            let measure = ctx.measure_context();
            self.plan(ProposedSize::fixed(width, height), |view, index, p| {
                measure.measure_child(view, index, p)
            })
        };
        let cross_extent = plan.size.along(self.axis.cross());

        let mut out = FrameBuffer::empty();
        for (index, child) in self.children.iter().enumerate() {
            let (w, h) = plan.child_extent(self.axis, index);
            let rendered = ctx.render_child(child, index, w, h);
            let aligned = match self.axis {
                Axis::Vertical => {
                    let x = self.alignment.offset(rendered.width(), cross_extent);
                    rendered.placed(cross_extent, h, x, 0)
                }
                Axis::Horizontal => {
                    let y = self.alignment.offset(rendered.height(), cross_extent);
                    rendered.placed(w, cross_extent, 0, y)
                }
            };
            match self.axis {
                Axis::Vertical => out.append_vertically(aligned, self.spacing),
                Axis::Horizontal => out.append_horizontally(aligned, self.spacing),
            }
        }
        out
    }
}

macro_rules! linear_stack {
    ($(#[$doc:meta])* $name:ident, $axis:expr) => {
        $(#[$doc])*
        pub struct $name(Linear);

        impl $name {
            pub fn new() -> Self {
                Self(Linear::new($axis))
            }

            /// Cells between adjacent children.
            #[must_use]
            pub fn spacing(mut self, spacing: u16) -> Self {
                self.0.spacing = spacing;
                self
            }

            /// Cross-axis placement of narrower children.
            #[must_use]
            pub fn alignment(mut self, alignment: Alignment) -> Self {
                self.0.alignment = alignment;
                self
            }

            /// Append a child.
            #[must_use]
            pub fn child(mut self, view: impl View) -> Self {
                self.0.children.push(AnyView::new(view));
                self
            }

            /// Append several children.
            #[must_use]
            pub fn children<I, V>(mut self, views: I) -> Self
            where
                I: IntoIterator<Item = V>,
                V: View,
            {
                self.0.children.extend(views.into_iter().map(AnyView::new));
                self
            }

            /// Number of children.
            pub fn len(&self) -> usize {
                self.0.children.len()
            }

            /// Whether there are no children.
            pub fn is_empty(&self) -> bool {
                self.0.children.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl View for $name {
            fn node(&self) -> Node<'_> {
                Node::Container(self)
            }
        }

        impl Container for $name {
            fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
                self.0.size_that_fits(proposal, ctx)
            }

            fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
                self.0.render(width, height, ctx)
            }
        }
    };
}

linear_stack!(
    /// Children left to right.
    HStack,
    Axis::Horizontal
);

linear_stack!(
    /// Children top to bottom.
    VStack,
    Axis::Vertical
);

/// Children layered back to front, each aligned within the stack.
pub struct ZStack {
    horizontal: Alignment,
    vertical: Alignment,
    children: Vec<AnyView>,
}

impl ZStack {
    pub fn new() -> Self {
        Self {
            horizontal: Alignment::Center,
            vertical: Alignment::Center,
            children: Vec::new(),
        }
    }

    /// Placement of children smaller than the stack.
    #[must_use]
    pub fn alignment(mut self, horizontal: Alignment, vertical: Alignment) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }

    /// Add a layer on top.
    #[must_use]
    pub fn child(mut self, view: impl View) -> Self {
        self.children.push(AnyView::new(view));
        self
    }

    fn combine(sizes: &[ViewSize]) -> ViewSize {
        sizes.iter().fold(ViewSize::ZERO, |acc, s| ViewSize {
            width: acc.width.max(s.width),
            height: acc.height.max(s.height),
            width_flexible: acc.width_flexible || s.width_flexible,
            height_flexible: acc.height_flexible || s.height_flexible,
            is_spacer: false,
        })
    }
}

impl Default for ZStack {
    fn default() -> Self {
        Self::new()
    }
}

impl View for ZStack {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl Container for ZStack {
    fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
        let sizes: Vec<ViewSize> = self
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| ctx.measure_child(child, index, proposal))
            .collect();
        Self::combine(&sizes).clamped_to(proposal)
    }

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let proposal = ProposedSize::fixed(width, height);
        let sizes: Vec<ViewSize> = self
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| ctx.measure_child(child, index, proposal))
            .collect();
        let (total_w, total_h) = Self::combine(&sizes).resolve(proposal);

        let mut out: Option<FrameBuffer> = None;
        for (index, (child, size)) in self.children.iter().zip(&sizes).enumerate() {
            let (w, h) = size.resolve(ProposedSize::fixed(total_w, total_h));
            let rendered = ctx.render_child(child, index, w, h);
            let x = self.horizontal.offset(rendered.width(), total_w);
            let y = self.vertical.offset(rendered.height(), total_h);
            let layer = rendered.placed(total_w, total_h, x, y);
            match out.as_mut() {
                Some(base) => base.overlay(&layer),
                None => out = Some(layer),
            }
        }
        out.unwrap_or_default()
    }
}
