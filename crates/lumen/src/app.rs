#![forbid(unsafe_code)]

//! Application runner.
//!
//! [`App`] collects the view builders and configuration, then
//! [`App::run`] drives a [`RenderLoop`] on a crossterm terminal until a
//! [`QuitHandle`] fires or Ctrl+C goes unhandled.
//!
//! ```rust,ignore
//! use lumen::prelude::*;
//!
//! let app = App::new(|| Text::new("hello").boxed());
//! let quit = app.quit_handle();
//! app.status_bar(move || {
//!     let quit = quit.clone();
//!     Button::new("Quit", move || quit.quit()).boxed()
//! })
//! .run()?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lumen_runtime::{RenderLoopConfig, ViewBuilder};
use lumen_widgets::AnyView;

#[cfg(feature = "crossterm")]
use lumen_core::{Event, KeyCode};

/// How long [`App::run`] waits for input before checking render requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Ends a running [`App`] from a view callback or another thread.
#[derive(Debug, Clone, Default)]
pub struct QuitHandle(Arc<AtomicBool>);

impl QuitHandle {
    /// Ask the app to stop after the current event.
    pub fn quit(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_quit(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A Lumen application: a main view, an optional status bar, settings.
pub struct App {
    content: ViewBuilder,
    status_bar: Option<ViewBuilder>,
    config: RenderLoopConfig,
    alternate_screen: bool,
    poll_interval: Duration,
    quit: QuitHandle,
}

impl App {
    /// An app whose main region is built by `content` every frame.
    pub fn new<F>(content: F) -> Self
    where
        F: FnMut() -> AnyView + 'static,
    {
        Self {
            content: Box::new(content),
            status_bar: None,
            config: RenderLoopConfig::default(),
            alternate_screen: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            quit: QuitHandle::default(),
        }
    }

    #[must_use]
    pub fn status_bar<F>(mut self, status_bar: F) -> Self
    where
        F: FnMut() -> AnyView + 'static,
    {
        self.status_bar = Some(Box::new(status_bar));
        self
    }

    #[must_use]
    pub fn config(mut self, config: RenderLoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML file.
    #[cfg(feature = "config-file")]
    pub fn config_file(self, path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let config = RenderLoopConfig::from_toml_file(path)?;
        Ok(self.config(config))
    }

    /// Draw on the alternate screen (the default) or inline.
    #[must_use]
    pub fn alternate_screen(mut self, enabled: bool) -> Self {
        self.alternate_screen = enabled;
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Use `quit` instead of the app's own handle, so views built before
    /// the app can stop it.
    #[must_use]
    pub fn with_quit_handle(mut self, quit: QuitHandle) -> Self {
        self.quit = quit;
        self
    }

    /// Handle that stops [`run`](Self::run).
    pub fn quit_handle(&self) -> QuitHandle {
        self.quit.clone()
    }

    /// Take over the terminal and run until quit.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or any terminal I/O failure. The terminal is
    /// restored either way.
    #[cfg(feature = "crossterm")]
    pub fn run(self) -> crate::Result<()> {
        use lumen_runtime::{CrosstermTerminal, KeyOutcome, RenderLoop};

        let config = self.config.validated()?;
        let terminal = CrosstermTerminal::new(self.alternate_screen)?;
        let mut render_loop = RenderLoop::new(terminal, config, self.content);
        if let Some(status_bar) = self.status_bar {
            render_loop = render_loop.with_status_bar(status_bar);
        }

        tracing::info!(size = ?render_loop.size(), "app started");
        render_loop.render()?;

        while !self.quit.is_quit() {
            if let Some(event) = render_loop.terminal_mut().poll_event(self.poll_interval)? {
                let outcome = render_loop.handle_event(&event);
                if outcome == KeyOutcome::Unhandled && is_interrupt(&event) {
                    tracing::info!("interrupted");
                    break;
                }
            }
            render_loop.render_if_requested()?;
        }

        tracing::info!(frames = render_loop.frame_count(), "app stopped");
        Ok(())
    }
}

#[cfg(feature = "crossterm")]
fn is_interrupt(event: &Event) -> bool {
    matches!(event, Event::Key(key) if key.ctrl() && key.code == KeyCode::Char('c'))
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("has_status_bar", &self.status_bar.is_some())
            .field("alternate_screen", &self.alternate_screen)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_widgets::prelude::*;

    #[test]
    fn quit_handle_is_shared() {
        let app = App::new(|| Text::new("x").boxed());
        let handle = app.quit_handle();
        assert!(!app.quit.is_quit());
        handle.quit();
        assert!(app.quit.is_quit());

        let external = QuitHandle::default();
        let app = App::new(|| Text::new("x").boxed()).with_quit_handle(external.clone());
        external.quit();
        assert!(app.quit_handle().is_quit());
    }

    #[test]
    fn builder_sets_fields() {
        let app = App::new(|| EmptyView.boxed())
            .status_bar(|| Text::new("status").boxed())
            .config(RenderLoopConfig::default().status_bar_height(2))
            .alternate_screen(false)
            .poll_interval(Duration::from_millis(50));
        assert!(app.status_bar.is_some());
        assert_eq!(app.config.status_bar_height, 2);
        assert!(!app.alternate_screen);
        assert_eq!(app.poll_interval, Duration::from_millis(50));
    }

    #[cfg(feature = "crossterm")]
    #[test]
    fn ctrl_c_is_an_interrupt() {
        use lumen_core::{KeyEvent, Modifiers};
        let ctrl_c = KeyEvent::new(KeyCode::Char('c')).with_modifiers(Modifiers::CTRL);
        assert!(is_interrupt(&Event::Key(ctrl_c)));
        assert!(!is_interrupt(&Event::Key(KeyEvent::new(KeyCode::Char('c')))));
        assert!(!is_interrupt(&Event::Focus(true)));
    }
}
