#![forbid(unsafe_code)]

//! Push button.

use std::sync::Arc;

use lumen_core::event::{KeyCode, KeyEvent};
use lumen_core::focus::FocusHandler;
use lumen_layout::{ProposedSize, ViewSize};
use lumen_render::{FrameBuffer, ansi};

use crate::context::{MeasureContext, RenderContext};
use crate::view::{Node, Primitive, View};

/// Callback run when a button is pressed.
pub type Action = Arc<dyn Fn() + Send + Sync>;

/// A focusable `[ label ]` that runs its action on Enter or Space.
///
/// The focus id defaults to the button's identity, so two buttons in the
/// same position across frames are the same control.
pub struct Button {
    label: String,
    action: Action,
    focus_id: Option<String>,
    disabled: bool,
}

impl Button {
    pub fn new<F>(label: impl Into<String>, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            action: Arc::new(action),
            focus_id: None,
            disabled: false,
        }
    }

    /// Use a fixed focus id, e.g. for [`FocusRegistry::request_focus`].
    ///
    /// [`FocusRegistry::request_focus`]: lumen_core::FocusRegistry::request_focus
    #[must_use]
    pub fn focus_id(mut self, id: impl Into<String>) -> Self {
        self.focus_id = Some(id.into());
        self
    }

    /// Keep the button registered but skip it during traversal.
    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    fn text(&self) -> String {
        format!("[ {} ]", self.label)
    }
}

/// Persisted part of a [`Button`].
pub struct ButtonHandler {
    focus_id: String,
    enabled: bool,
    action: Action,
    presses: u64,
}

impl ButtonHandler {
    /// Times the button was pressed while this view was alive.
    pub fn presses(&self) -> u64 {
        self.presses
    }
}

impl FocusHandler for ButtonHandler {
    fn focus_id(&self) -> &str {
        &self.focus_id
    }

    fn can_be_focused(&self) -> bool {
        self.enabled
    }

    fn handle_key_event(&mut self, event: &KeyEvent) -> bool {
        match event.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.presses += 1;
                (self.action)();
                true
            }
            _ => false,
        }
    }
}

impl View for Button {
    fn node(&self) -> Node<'_> {
        Node::Primitive(self)
    }
}

impl Primitive for Button {
    fn size_that_fits(&self, proposal: ProposedSize, _ctx: &MeasureContext<'_>) -> ViewSize {
        let width = u16::try_from(ansi::visible_width(&self.text())).unwrap_or(u16::MAX);
        ViewSize::fixed(width, 1).clamped_to(proposal)
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let focus_id = match &self.focus_id {
            Some(id) => id.clone(),
            None => ctx.identity().to_string(),
        };
        let handler = ctx.state(0, || ButtonHandler {
            focus_id: String::new(),
            enabled: true,
            action: Arc::clone(&self.action),
            presses: 0,
        });
        handler.focus_id.clone_from(&focus_id);
        handler.enabled = !self.disabled;
        handler.action = Arc::clone(&self.action);
        ctx.register_focus::<ButtonHandler>(0);

        let theme = &ctx.environment().theme;
        let style = if self.disabled {
            theme.muted.clone()
        } else if ctx.is_focused(&focus_id) {
            ctx.environment().focus_indicator().to_owned()
        } else {
            theme.accent.clone()
        };
        let line = format!("{style}{}{}", self.text(), ansi::RESET);
        FrameBuffer::from_lines(vec![line]).clipped(ctx.width, ctx.height)
    }
}
