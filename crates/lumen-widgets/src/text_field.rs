#![forbid(unsafe_code)]

//! Single-line text input.
//!
//! The text and the cursor live in the field's [`TextFieldHandler`], which
//! is persisted in state storage. The cursor is a grapheme index, so
//! combining sequences and wide characters move and delete as one unit.

use std::sync::Arc;

use lumen_core::event::{KeyCode, KeyEvent};
use lumen_core::focus::FocusHandler;
use lumen_layout::{ProposedSize, ViewSize};
use lumen_render::{FrameBuffer, ansi};
use unicode_segmentation::UnicodeSegmentation;

use crate::context::{MeasureContext, RenderContext};
use crate::view::{Node, Primitive, View};

/// Narrowest a field measures, in cells.
pub const MIN_FIELD_WIDTH: u16 = 10;

const CURSOR_ON: &str = "\x1b[7m";
const CURSOR_OFF: &str = "\x1b[27m";

type TextCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// An editable line of text.
pub struct TextField {
    placeholder: String,
    initial: String,
    on_change: Option<TextCallback>,
    on_submit: Option<TextCallback>,
    focus_id: Option<String>,
    disabled: bool,
}

impl TextField {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            initial: String::new(),
            on_change: None,
            on_submit: None,
            focus_id: None,
            disabled: false,
        }
    }

    /// Text the field starts with the first time it appears.
    #[must_use]
    pub fn initial_text(mut self, text: impl Into<String>) -> Self {
        self.initial = text.into();
        self
    }

    /// Called with the new text after every edit.
    #[must_use]
    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    /// Called with the text when Enter is pressed.
    #[must_use]
    pub fn on_submit<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_submit = Some(Arc::new(f));
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
}

/// Persisted editing state of a [`TextField`].
pub struct TextFieldHandler {
    focus_id: String,
    enabled: bool,
    text: String,
    cursor: usize,
    on_change: Option<TextCallback>,
    on_submit: Option<TextCallback>,
}

impl TextFieldHandler {
    fn new(text: String) -> Self {
        let cursor = text.graphemes(true).count();
        Self {
            focus_id: String::new(),
            enabled: true,
            text,
            cursor,
            on_change: None,
            on_submit: None,
        }
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in graphemes.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn grapheme_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    fn byte_offset(&self, grapheme: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(grapheme)
            .map_or(self.text.len(), |(offset, _)| offset)
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        let before = self.grapheme_count();
        self.text.insert(at, c);
        // A combining mark merges into the previous grapheme.
        if self.grapheme_count() > before {
            self.cursor += 1;
        }
    }

    fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = self.byte_offset(self.cursor - 1);
        let end = self.byte_offset(self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= 1;
        true
    }

    fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.grapheme_count() {
            return false;
        }
        let start = self.byte_offset(self.cursor);
        let end = self.byte_offset(self.cursor + 1);
        self.text.replace_range(start..end, "");
        true
    }

    fn changed(&self) {
        if let Some(on_change) = &self.on_change {
            on_change(&self.text);
        }
    }
}

impl FocusHandler for TextFieldHandler {
    fn focus_id(&self) -> &str {
        &self.focus_id
    }

    fn can_be_focused(&self) -> bool {
        self.enabled
    }

    fn handle_key_event(&mut self, event: &KeyEvent) -> bool {
        if event.ctrl() || event.alt() {
            return false;
        }
        match event.code {
            KeyCode::Char(c) => {
                self.insert_char(c);
                self.changed();
            }
            KeyCode::Backspace => {
                if self.delete_back() {
                    self.changed();
                }
            }
            KeyCode::Delete => {
                if self.delete_forward() {
                    self.changed();
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.grapheme_count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.grapheme_count(),
            KeyCode::Enter => {
                if let Some(on_submit) = &self.on_submit {
                    on_submit(&self.text);
                }
            }
            _ => return false,
        }
        true
    }
}

/// First grapheme to draw so that the cursor cell fits in `width`.
fn scroll_start(graphemes: &[&str], cursor: usize, width: usize) -> usize {
    let mut used = 1;
    let mut start = cursor.min(graphemes.len());
    while start > 0 {
        let w = ansi::visible_width(graphemes[start - 1]);
        if used + w > width {
            break;
        }
        used += w;
        start -= 1;
    }
    start
}

impl View for TextField {
    fn node(&self) -> Node<'_> {
        Node::Primitive(self)
    }
}

impl Primitive for TextField {
    fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
        let text_width = match ctx.state::<TextFieldHandler>(0) {
            Some(handler) => ansi::visible_width(&handler.text),
            None => ansi::visible_width(&self.initial),
        }
        .max(ansi::visible_width(&self.placeholder))
        .saturating_add(1);
        let width = u16::try_from(text_width)
            .unwrap_or(u16::MAX)
            .max(MIN_FIELD_WIDTH);
        ViewSize::fixed(width, 1)
            .with_flexibility(true, false)
            .clamped_to(proposal)
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let focus_id = match &self.focus_id {
            Some(id) => id.clone(),
            None => ctx.identity().to_string(),
        };
        let handler = ctx.state(0, || TextFieldHandler::new(self.initial.clone()));
        handler.focus_id.clone_from(&focus_id);
        handler.enabled = !self.disabled;
        handler.on_change.clone_from(&self.on_change);
        handler.on_submit.clone_from(&self.on_submit);
        let text = handler.text.clone();
        let cursor = handler.cursor;
        ctx.register_focus::<TextFieldHandler>(0);

        let focused = ctx.is_focused(&focus_id);
        let env = ctx.environment();
        let width = usize::from(ctx.width);

        let line = if text.is_empty() && !focused {
            format!("{}{}{}", env.theme.muted, self.placeholder, ansi::RESET)
        } else {
            let graphemes: Vec<&str> = text.graphemes(true).collect();
            let start = if focused {
                scroll_start(&graphemes, cursor, width)
            } else {
                0
            };
            let mut line = env.theme.foreground.clone();
            for (i, g) in graphemes.iter().enumerate().skip(start) {
                if focused && i == cursor {
                    line.push_str(CURSOR_ON);
                    line.push_str(g);
                    line.push_str(CURSOR_OFF);
                } else {
                    line.push_str(g);
                }
            }
            if focused && cursor >= graphemes.len() {
                line.push_str(CURSOR_ON);
                line.push(' ');
                line.push_str(CURSOR_OFF);
            }
            line.push_str(ansi::RESET);
            line
        };
        FrameBuffer::from_lines(vec![line]).clipped(ctx.width, ctx.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code)
    }

    #[test]
    fn edits_at_cursor() {
        let mut h = TextFieldHandler::new("held".into());
        assert_eq!(h.cursor(), 4);
        h.handle_key_event(&key(KeyCode::Left));
        h.handle_key_event(&key(KeyCode::Left));
        h.handle_key_event(&key(KeyCode::Char('l')));
        assert_eq!(h.text(), "helld");
        h.handle_key_event(&key(KeyCode::Backspace));
        h.handle_key_event(&key(KeyCode::Delete));
        assert_eq!(h.text(), "hed");
        h.handle_key_event(&key(KeyCode::Home));
        h.handle_key_event(&key(KeyCode::Delete));
        assert_eq!((h.text(), h.cursor()), ("ed", 0));
        h.handle_key_event(&key(KeyCode::End));
        assert_eq!(h.cursor(), 2);
    }

    #[test]
    fn cursor_moves_by_grapheme() {
        let mut h = TextFieldHandler::new("ae\u{301}b".into());
        assert_eq!(h.cursor(), 3);
        h.handle_key_event(&key(KeyCode::Left));
        h.handle_key_event(&key(KeyCode::Backspace));
        assert_eq!(h.text(), "ab");
        assert_eq!(h.cursor(), 1);
    }

    #[test]
    fn boundaries_do_not_change_text() {
        let mut h = TextFieldHandler::new(String::new());
        assert!(h.handle_key_event(&key(KeyCode::Backspace)));
        assert!(h.handle_key_event(&key(KeyCode::Delete)));
        assert_eq!(h.text(), "");
        assert!(!h.handle_key_event(&key(KeyCode::Tab)));
    }

    #[test]
    fn callbacks_fire() {
        use std::sync::Mutex;
        let log = Arc::new(Mutex::new(Vec::new()));
        let changes = Arc::clone(&log);
        let submits = Arc::clone(&log);
        let mut h = TextFieldHandler::new(String::new());
        h.on_change = Some(Arc::new(move |t: &str| changes.lock().unwrap().push(format!("c:{t}"))));
        h.on_submit = Some(Arc::new(move |t: &str| submits.lock().unwrap().push(format!("s:{t}"))));
        h.handle_key_event(&key(KeyCode::Char('h')));
        h.handle_key_event(&key(KeyCode::Char('i')));
        h.handle_key_event(&key(KeyCode::Enter));
        assert_eq!(*log.lock().unwrap(), ["c:h", "c:hi", "s:hi"]);
    }

    #[test]
    fn scroll_keeps_cursor_visible() {
        let g: Vec<&str> = "abcdefgh".graphemes(true).collect();
        assert_eq!(scroll_start(&g, 8, 4), 5);
        assert_eq!(scroll_start(&g, 2, 4), 0);
    }
}
