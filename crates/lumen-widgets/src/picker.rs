#![forbid(unsafe_code)]

//! Single-choice list.
//!
//! The option values keep their concrete type end to end: the handler is
//! generic over `T`, so selection callbacks receive a `T` and nothing is
//! type-erased in storage beyond the handler itself.

use std::sync::Arc;

use lumen_core::event::{KeyCode, KeyEvent};
use lumen_core::focus::FocusHandler;
use lumen_layout::{ProposedSize, ViewSize};
use lumen_render::{FrameBuffer, ansi};

use crate::context::{MeasureContext, RenderContext};
use crate::view::{Node, Primitive, View};

type SelectFn<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Vertical list of labelled options with one selected value.
///
/// Up/Down move the highlight, Enter or Space selects it. The selected
/// value is owned by the application and passed in every frame.
pub struct Picker<T> {
    options: Vec<(String, T)>,
    selection: Option<T>,
    on_select: SelectFn<T>,
    focus_id: Option<String>,
    disabled: bool,
}

impl<T> Picker<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new<F>(on_select: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            options: Vec::new(),
            selection: None,
            on_select: Arc::new(on_select),
            focus_id: None,
            disabled: false,
        }
    }

    #[must_use]
    pub fn option(mut self, label: impl Into<String>, value: T) -> Self {
        self.options.push((label.into(), value));
        self
    }

    /// The currently selected value.
    #[must_use]
    pub fn selection(mut self, value: Option<T>) -> Self {
        self.selection = value;
        self
    }

    #[must_use]
    pub fn focus_id(mut self, id: impl Into<String>) -> Self {
        self.focus_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    fn row(&self, label: &str, value: &T) -> String {
        let mark = if self.selection.as_ref() == Some(value) {
            "(•)"
        } else {
            "( )"
        };
        format!("{mark} {label}")
    }
}

/// Persisted part of a [`Picker`].
pub struct PickerHandler<T> {
    focus_id: String,
    enabled: bool,
    values: Vec<T>,
    highlighted: usize,
    on_select: SelectFn<T>,
}

impl<T> PickerHandler<T> {
    /// Index of the highlighted option.
    pub fn highlighted(&self) -> usize {
        self.highlighted
    }
}

impl<T> FocusHandler for PickerHandler<T>
where
    T: Clone + Send + 'static,
{
    fn focus_id(&self) -> &str {
        &self.focus_id
    }

    fn can_be_focused(&self) -> bool {
        self.enabled && !self.values.is_empty()
    }

    fn handle_key_event(&mut self, event: &KeyEvent) -> bool {
        let last = self.values.len().saturating_sub(1);
        match event.code {
            KeyCode::Up => self.highlighted = self.highlighted.saturating_sub(1),
            KeyCode::Down => self.highlighted = (self.highlighted + 1).min(last),
            KeyCode::Home => self.highlighted = 0,
            KeyCode::End => self.highlighted = last,
            KeyCode::Enter | KeyCode::Char(' ') => match self.values.get(self.highlighted) {
                Some(value) => (self.on_select)(value.clone()),
                None => return false,
            },
            _ => return false,
        }
        true
    }
}

impl<T> View for Picker<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn node(&self) -> Node<'_> {
        Node::Primitive(self)
    }
}

impl<T> Primitive for Picker<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn size_that_fits(&self, proposal: ProposedSize, _ctx: &MeasureContext<'_>) -> ViewSize {
        let width = self
            .options
            .iter()
            .map(|(label, value)| ansi::visible_width(&self.row(label, value)))
            .max()
            .unwrap_or(0);
        let height = self.options.len();
        ViewSize::fixed(
            u16::try_from(width).unwrap_or(u16::MAX),
            u16::try_from(height).unwrap_or(u16::MAX),
        )
        .clamped_to(proposal)
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let focus_id = match &self.focus_id {
            Some(id) => id.clone(),
            None => ctx.identity().to_string(),
        };
        let values: Vec<T> = self.options.iter().map(|(_, v)| v.clone()).collect();
        let selected = self
            .selection
            .as_ref()
            .and_then(|s| values.iter().position(|v| v == s))
            .unwrap_or(0);
        let handler = ctx.state(0, || PickerHandler {
            focus_id: String::new(),
            enabled: true,
            values: Vec::new(),
            highlighted: selected,
            on_select: Arc::clone(&self.on_select),
        });
        handler.focus_id.clone_from(&focus_id);
        handler.enabled = !self.disabled;
        handler.highlighted = handler.highlighted.min(values.len().saturating_sub(1));
        handler.values = values;
        handler.on_select = Arc::clone(&self.on_select);
        let highlighted = handler.highlighted;
        ctx.register_focus::<PickerHandler<T>>(0);

        let focused = ctx.is_focused(&focus_id);
        let env = ctx.environment();
        let lines = self
            .options
            .iter()
            .enumerate()
            .map(|(i, (label, value))| {
                let style = if self.disabled {
                    env.theme.muted.as_str()
                } else if focused && i == highlighted {
                    env.focus_indicator()
                } else {
                    env.theme.foreground.as_str()
                };
                format!("{style}{}{}", self.row(label, value), ansi::RESET)
            })
            .collect();
        FrameBuffer::from_lines(lines).clipped(ctx.width, ctx.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Flavor {
        Plain,
        Spicy,
    }

    #[test]
    fn selects_highlighted_value() {
        let picked = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&picked);
        let mut handler = PickerHandler {
            focus_id: "flavor".into(),
            enabled: true,
            values: vec![Flavor::Plain, Flavor::Spicy],
            highlighted: 0,
            on_select: Arc::new(move |f: Flavor| *sink.lock().unwrap() = Some(f)),
        };
        assert!(handler.handle_key_event(&KeyEvent::new(KeyCode::Down)));
        assert!(handler.handle_key_event(&KeyEvent::new(KeyCode::Down)));
        assert_eq!(handler.highlighted(), 1);
        assert!(handler.handle_key_event(&KeyEvent::new(KeyCode::Enter)));
        assert_eq!(*picked.lock().unwrap(), Some(Flavor::Spicy));
        assert!(!handler.handle_key_event(&KeyEvent::new(KeyCode::Tab)));
    }

    #[test]
    fn empty_picker_is_not_focusable() {
        let handler: PickerHandler<u8> = PickerHandler {
            focus_id: "none".into(),
            enabled: true,
            values: Vec::new(),
            highlighted: 0,
            on_select: Arc::new(|_| {}),
        };
        assert!(!handler.can_be_focused());
    }
}
