#![forbid(unsafe_code)]

//! View modifiers.
//!
//! Every modifier is a container with exactly one child (index 0), so a
//! modified view sits one level deeper in the identity path than the bare
//! view. [`ViewExt`] adds the builder methods to every [`View`].
//!
//! [`Keyed`] is the exception: it replaces the positional segment of the
//! view it wraps instead of adding one.

use std::marker::PhantomData;
use std::sync::Arc;

use lumen_core::event::KeyEvent;
use lumen_core::focus::SectionId;
use lumen_core::geometry::Sides;
use lumen_core::lifecycle::{TaskContext, TaskPriority};
use lumen_layout::{Alignment, ProposedSize, ViewSize};
use lumen_render::{FrameBuffer, ansi};

use crate::context::{MeasureContext, RenderContext};
use crate::preference::PreferenceKey;
use crate::view::{AnyView, Container, Node, View};

/// Builder methods shared by all views.
pub trait ViewExt: View + Sized {
    /// Blank space around the view.
    fn padding(self, sides: Sides) -> Padding<Self> {
        Padding {
            content: self,
            sides,
        }
    }

    /// Fix the width and/or height; content is aligned horizontally inside.
    fn frame(self, width: Option<u16>, height: Option<u16>, alignment: Alignment) -> Frame<Self> {
        Frame {
            content: self,
            width,
            height,
            alignment,
        }
    }

    /// Lay an SGR background under the whole view.
    fn background(self, code: impl Into<String>) -> Background<Self> {
        Background {
            content: self,
            code: code.into(),
        }
    }

    /// Draw faint; controls inside do not show focus.
    fn dimmed(self) -> Dimmed<Self> {
        Dimmed { content: self }
    }

    /// Register a frame-scoped key handler, consulted after the focused
    /// control.
    fn on_key<F>(self, handler: F) -> OnKey<Self>
    where
        F: Fn(&KeyEvent) -> bool + Send + Sync + 'static,
    {
        OnKey {
            content: self,
            handler: Arc::new(handler),
        }
    }

    /// Tag focusable controls inside with `section`.
    fn focus_section(self, section: impl Into<SectionId>) -> FocusSection<Self> {
        FocusSection {
            content: self,
            section: section.into(),
            trap: false,
        }
    }

    /// Like [`focus_section`](Self::focus_section), and confine Tab
    /// traversal to it while it is on screen.
    fn modal_section(self, section: impl Into<SectionId>) -> FocusSection<Self> {
        FocusSection {
            content: self,
            section: section.into(),
            trap: true,
        }
    }

    /// Key the view's identity on `key` instead of its position.
    fn id(self, key: impl Into<Arc<str>>) -> Keyed<Self> {
        Keyed {
            content: self,
            key: key.into(),
        }
    }

    /// Publish `value` under `K` when rendered.
    fn preference<K: PreferenceKey>(self, value: K::Value) -> Preference<Self, K> {
        Preference {
            content: self,
            value,
            key: PhantomData,
        }
    }

    /// Run `action` the first time the view is rendered, once the frame
    /// that rendered it is finished.
    fn on_appear<F>(self, action: F) -> OnAppear<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        OnAppear {
            content: self,
            action: Arc::new(action),
        }
    }

    /// Run `action` once the view is no longer rendered.
    fn on_disappear<F>(self, action: F) -> OnDisappear<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        OnDisappear {
            content: self,
            action: Arc::new(action),
        }
    }

    /// Run `work` on a background thread while the view is on screen. The
    /// task's cancellation token fires when the view disappears.
    fn task<F>(self, priority: TaskPriority, work: F) -> Task<Self>
    where
        F: Fn(TaskContext) + Send + Sync + 'static,
    {
        Task {
            content: self,
            priority,
            work: Arc::new(work),
        }
    }

    /// Erase the concrete type.
    fn boxed(self) -> AnyView {
        AnyView::new(self)
    }
}

impl<V: View> ViewExt for V {}

macro_rules! passthrough_size {
    () => {
        fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
            ctx.measure_child(&self.content, 0, proposal)
        }
    };
}

// ── Padding ──────────────────────────────────────────────────────────────

/// See [`ViewExt::padding`].
pub struct Padding<V> {
    content: V,
    sides: Sides,
}

impl<V: View> View for Padding<V> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View> Container for Padding<V> {
    fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
        let (h, v) = (self.sides.horizontal(), self.sides.vertical());
        let inner = ctx.measure_child(&self.content, 0, proposal.inset(h, v));
        ViewSize {
            width: inner.width.saturating_add(h),
            height: inner.height.saturating_add(v),
            ..inner
        }
        .clamped_to(proposal)
    }

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let inner_w = width.saturating_sub(self.sides.horizontal());
        let inner_h = height.saturating_sub(self.sides.vertical());
        ctx.render_child(&self.content, 0, inner_w, inner_h)
            .padded(self.sides)
    }
}

// ── Frame ────────────────────────────────────────────────────────────────

/// See [`ViewExt::frame`].
pub struct Frame<V> {
    content: V,
    width: Option<u16>,
    height: Option<u16>,
    alignment: Alignment,
}

impl<V> Frame<V> {
    fn child_proposal(&self, proposal: ProposedSize) -> ProposedSize {
        ProposedSize::new(
            self.width.or(proposal.width),
            self.height.or(proposal.height),
        )
    }
}

impl<V: View> View for Frame<V> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View> Container for Frame<V> {
    fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
        let mut env = ctx.environment().clone();
        env.explicit_width |= self.width.is_some();
        let inner = ctx
            .with_environment(&env)
            .measure_child(&self.content, 0, self.child_proposal(proposal));
        ViewSize {
            width: self.width.unwrap_or(inner.width),
            height: self.height.unwrap_or(inner.height),
            width_flexible: self.width.is_none() && inner.width_flexible,
            height_flexible: self.height.is_none() && inner.height_flexible,
            is_spacer: false,
        }
        .clamped_to(proposal)
    }

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        if self.width.is_some() {
            ctx.environment_mut().explicit_width = true;
        }
        let frame_w = self.width.map_or(width, |w| w.min(width));
        let frame_h = self.height.map_or(height, |h| h.min(height));
        let proposal = ProposedSize::fixed(frame_w, frame_h);
        let (w, h) = ctx
            .measure_child(&self.content, 0, proposal)
            .resolve(proposal);
        let rendered = ctx.render_child(&self.content, 0, w, h);
        let x = self.alignment.offset(rendered.width(), frame_w);
        let extent_h = if self.height.is_some() { frame_h } else { h };
        rendered.placed(frame_w, extent_h, x, 0)
    }
}

// ── Background / Dimmed ──────────────────────────────────────────────────

/// See [`ViewExt::background`].
pub struct Background<V> {
    content: V,
    code: String,
}

impl<V: View> View for Background<V> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View> Container for Background<V> {
    passthrough_size!();

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        ctx.render_child(&self.content, 0, width, height)
            .styled(&self.code)
    }
}

/// See [`ViewExt::dimmed`].
pub struct Dimmed<V> {
    content: V,
}

impl<V: View> View for Dimmed<V> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View> Container for Dimmed<V> {
    passthrough_size!();

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        ctx.environment_mut().dimmed = true;
        ctx.render_child(&self.content, 0, width, height)
            .styled(ansi::DIM)
    }
}

// ── Keys and focus ───────────────────────────────────────────────────────

/// See [`ViewExt::on_key`].
pub struct OnKey<V> {
    content: V,
    handler: crate::context::KeyHandler,
}

impl<V: View> View for OnKey<V> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View> Container for OnKey<V> {
    passthrough_size!();

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        ctx.on_key(Arc::clone(&self.handler));
        ctx.render_child(&self.content, 0, width, height)
    }
}

/// See [`ViewExt::focus_section`] and [`ViewExt::modal_section`].
pub struct FocusSection<V> {
    content: V,
    section: SectionId,
    trap: bool,
}

impl<V: View> View for FocusSection<V> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View> Container for FocusSection<V> {
    passthrough_size!();

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        ctx.focus().enter_section(self.section.clone());
        let rendered = ctx.render_child(&self.content, 0, width, height);
        ctx.focus().exit_section();
        // Activation needs the section's registrations, so it runs after
        // the children rendered.
        if self.trap {
            ctx.focus().activate_section(self.section.clone());
        }
        rendered
    }
}

/// See [`ViewExt::id`].
pub struct Keyed<V> {
    content: V,
    key: Arc<str>,
}

impl<V: View> View for Keyed<V> {
    fn node(&self) -> Node<'_> {
        self.content.node()
    }

    fn type_token(&self) -> &'static str {
        self.content.type_token()
    }

    fn explicit_id(&self) -> Option<&str> {
        Some(self.key.as_ref())
    }
}

// ── Preferences ──────────────────────────────────────────────────────────

/// See [`ViewExt::preference`].
pub struct Preference<V, K: PreferenceKey> {
    content: V,
    value: K::Value,
    key: PhantomData<fn() -> K>,
}

impl<V: View, K: PreferenceKey> View for Preference<V, K> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View, K: PreferenceKey> Container for Preference<V, K> {
    passthrough_size!();

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        ctx.set_preference::<K>(self.value.clone());
        ctx.render_child(&self.content, 0, width, height)
    }
}

// ── Lifecycle ────────────────────────────────────────────────────────────

type Action = Arc<dyn Fn() + Send + Sync>;

/// See [`ViewExt::on_appear`].
pub struct OnAppear<V> {
    content: V,
    action: Action,
}

impl<V: View> View for OnAppear<V> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View> Container for OnAppear<V> {
    passthrough_size!();

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let token = ctx.identity().clone();
        if ctx.lifecycle().record_appear(&token) {
            let action = Arc::clone(&self.action);
            ctx.lifecycle().queue_appear(move || action());
        }
        ctx.render_child(&self.content, 0, width, height)
    }
}

/// See [`ViewExt::on_disappear`].
pub struct OnDisappear<V> {
    content: V,
    action: Action,
}

impl<V: View> View for OnDisappear<V> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View> Container for OnDisappear<V> {
    passthrough_size!();

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let token = ctx.identity().clone();
        let action = Arc::clone(&self.action);
        ctx.lifecycle().register_disappear(&token, move || action());
        ctx.render_child(&self.content, 0, width, height)
    }
}

/// See [`ViewExt::task`].
pub struct Task<V> {
    content: V,
    priority: TaskPriority,
    work: Arc<dyn Fn(TaskContext) + Send + Sync>,
}

impl<V: View> View for Task<V> {
    fn node(&self) -> Node<'_> {
        Node::Container(self)
    }
}

impl<V: View> Container for Task<V> {
    passthrough_size!();

    fn render(&self, width: u16, height: u16, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let token = ctx.identity().clone();
        let work = Arc::clone(&self.work);
        ctx.lifecycle()
            .start_task(&token, self.priority, move |task| work(task));
        ctx.render_child(&self.content, 0, width, height)
    }
}
