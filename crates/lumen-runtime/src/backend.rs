#![forbid(unsafe_code)]

//! Crossterm terminal backend.
//!
//! [`CrosstermTerminal`] puts the terminal in raw mode (optionally on the
//! alternate screen), hides the cursor, and restores everything on drop.
//! Output goes through a buffered [`AnsiTerminal`] over stdout, so a frame
//! reaches the terminal in one flush.
//!
//! [`event_from_crossterm`] converts crossterm events into Lumen events;
//! events Lumen has no use for (mouse, paste) map to `None`.

use std::io::{self, BufWriter, Stdout};
use std::time::Duration;

use crossterm::{cursor, event as cte, execute, terminal};
use lumen_core::event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
use lumen_render::{AnsiTerminal, TerminalOutput};

/// Raw-mode terminal on stdout.
pub struct CrosstermTerminal {
    out: AnsiTerminal<BufWriter<Stdout>>,
    alternate_screen: bool,
    restored: bool,
}

impl CrosstermTerminal {
    /// Enter raw mode, and the alternate screen when `alternate_screen`.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or the screen setup fails; raw mode is
    /// left again before returning.
    pub fn new(alternate_screen: bool) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let mut stdout = io::stdout();
        let setup = if alternate_screen {
            execute!(
                stdout,
                terminal::EnterAlternateScreen,
                terminal::Clear(terminal::ClearType::All),
                cursor::MoveTo(0, 0),
                cursor::Hide
            )
        } else {
            execute!(stdout, cursor::Hide)
        };
        if let Err(err) = setup {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }

        let (width, height) = terminal::size()?;
        tracing::info!(width, height, alternate_screen, "terminal session started");
        Ok(Self {
            out: AnsiTerminal::new(BufWriter::new(stdout), width, height),
            alternate_screen,
            restored: false,
        })
    }

    /// Re-read the terminal size.
    pub fn refresh_size(&mut self) -> io::Result<(u16, u16)> {
        let (width, height) = terminal::size()?;
        self.out.set_size(width, height);
        Ok((width, height))
    }

    /// Wait up to `timeout` for an input event.
    ///
    /// Resize events also update the size reported by this terminal.
    pub fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        if !cte::poll(timeout)? {
            return Ok(None);
        }
        let event = event_from_crossterm(cte::read()?);
        if let Some(Event::Resize { width, height }) = event {
            self.out.set_size(width, height);
        }
        Ok(event)
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        self.out.flush()?;
        let mut stdout = io::stdout();
        if self.alternate_screen {
            execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
        } else {
            execute!(stdout, cursor::Show)?;
        }
        terminal::disable_raw_mode()?;
        tracing::info!("terminal restored");
        Ok(())
    }
}

impl TerminalOutput for CrosstermTerminal {
    fn width(&self) -> u16 {
        self.out.width()
    }

    fn height(&self) -> u16 {
        self.out.height()
    }

    fn write(&mut self, row: u16, column: u16, text: &str) -> io::Result<()> {
        self.out.write(row, column, text)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!(error = %err, "failed to restore terminal");
        }
    }
}

impl std::fmt::Debug for CrosstermTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrosstermTerminal")
            .field("width", &self.out.width())
            .field("height", &self.out.height())
            .field("alternate_screen", &self.alternate_screen)
            .finish()
    }
}

/// Convert a crossterm event. Returns `None` for events Lumen ignores.
pub fn event_from_crossterm(event: cte::Event) -> Option<Event> {
    match event {
        cte::Event::Key(key) => key_from_crossterm(key).map(Event::Key),
        cte::Event::Resize(width, height) => Some(Event::Resize { width, height }),
        cte::Event::FocusGained => Some(Event::Focus(true)),
        cte::Event::FocusLost => Some(Event::Focus(false)),
        cte::Event::Mouse(_) | cte::Event::Paste(_) => None,
    }
}

/// Convert a crossterm key event. Shift+Tab becomes [`KeyCode::BackTab`].
pub fn key_from_crossterm(key: cte::KeyEvent) -> Option<KeyEvent> {
    let mut modifiers = Modifiers::NONE;
    if key.modifiers.contains(cte::KeyModifiers::SHIFT) {
        modifiers |= Modifiers::SHIFT;
    }
    if key.modifiers.contains(cte::KeyModifiers::CONTROL) {
        modifiers |= Modifiers::CTRL;
    }
    if key.modifiers.contains(cte::KeyModifiers::ALT) {
        modifiers |= Modifiers::ALT;
    }
    if key.modifiers.contains(cte::KeyModifiers::SUPER) {
        modifiers |= Modifiers::SUPER;
    }

    let code = match key.code {
        cte::KeyCode::Tab if modifiers.contains(Modifiers::SHIFT) => KeyCode::BackTab,
        cte::KeyCode::Char(c) => KeyCode::Char(c),
        cte::KeyCode::Enter => KeyCode::Enter,
        cte::KeyCode::Esc => KeyCode::Escape,
        cte::KeyCode::Backspace => KeyCode::Backspace,
        cte::KeyCode::Tab => KeyCode::Tab,
        cte::KeyCode::BackTab => KeyCode::BackTab,
        cte::KeyCode::Delete => KeyCode::Delete,
        cte::KeyCode::Insert => KeyCode::Insert,
        cte::KeyCode::Home => KeyCode::Home,
        cte::KeyCode::End => KeyCode::End,
        cte::KeyCode::PageUp => KeyCode::PageUp,
        cte::KeyCode::PageDown => KeyCode::PageDown,
        cte::KeyCode::Up => KeyCode::Up,
        cte::KeyCode::Down => KeyCode::Down,
        cte::KeyCode::Left => KeyCode::Left,
        cte::KeyCode::Right => KeyCode::Right,
        cte::KeyCode::F(n) => KeyCode::F(n),
        _ => return None,
    };

    let kind = match key.kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    };

    Some(KeyEvent::new(code).with_modifiers(modifiers).with_kind(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ct_key(code: cte::KeyCode, modifiers: cte::KeyModifiers) -> cte::KeyEvent {
        cte::KeyEvent {
            code,
            modifiers,
            kind: cte::KeyEventKind::Press,
            state: cte::KeyEventState::NONE,
        }
    }

    #[test]
    fn shift_tab_is_back_tab() {
        let key = key_from_crossterm(ct_key(cte::KeyCode::Tab, cte::KeyModifiers::SHIFT));
        assert_eq!(key.map(|k| k.code), Some(KeyCode::BackTab));
    }

    #[test]
    fn modifiers_carry_over() {
        let key = key_from_crossterm(ct_key(
            cte::KeyCode::Char('c'),
            cte::KeyModifiers::CONTROL | cte::KeyModifiers::ALT,
        ))
        .unwrap();
        assert!(key.ctrl() && key.alt() && !key.shift());
        assert!(key.is_char('c'));
    }

    #[test]
    fn unsupported_keys_and_events_are_dropped() {
        assert!(key_from_crossterm(ct_key(cte::KeyCode::CapsLock, cte::KeyModifiers::NONE)).is_none());
        assert!(event_from_crossterm(cte::Event::Paste("x".into())).is_none());
        assert_eq!(
            event_from_crossterm(cte::Event::Resize(80, 24)),
            Some(Event::Resize {
                width: 80,
                height: 24
            })
        );
    }

    #[test]
    fn release_kind_preserved() {
        let mut raw = ct_key(cte::KeyCode::Enter, cte::KeyModifiers::NONE);
        raw.kind = cte::KeyEventKind::Release;
        assert!(key_from_crossterm(raw).unwrap().is_release());
    }
}
