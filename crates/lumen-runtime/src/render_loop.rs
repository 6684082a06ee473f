#![forbid(unsafe_code)]

//! Frame orchestration.
//!
//! [`RenderLoop`] owns everything that outlives a single frame: the shared
//! state storage, the focus registry, the lifecycle, one diff writer per
//! screen region, and the channel background work uses to ask for a
//! frame. The application supplies closures that build the main view
//! and, optionally, a status bar view; they are called once per frame.
//!
//! # Frame sequence
//!
//! 1. Clear key handlers, preferences and focus registrations.
//! 2. Begin the state and lifecycle passes for the main root.
//! 3. Build a render context for the terminal minus the status bar rows.
//! 4. Evaluate the main view.
//! 5. Expand to output lines and diff-write them from row 0.
//! 6. End the passes: evict unvisited state, run disappear callbacks,
//!    cancel orphaned tasks.
//! 7. Do the same for the status bar in its own region, never dimmed.
//!
//! Focus is reconciled last, once both regions have registered.
//!
//! The storage lock is held while a region is evaluated, so a background
//! task never writes state halfway through a pass. User callbacks never run
//! under it: appear and disappear actions run once the region's pass ends,
//! and a focused control handles its key with the storage unlocked.

use std::io;

use lumen_core::event::{Event, KeyCode, KeyEvent};
use lumen_core::focus::{FocusDirection, FocusRegistry};
use lumen_core::geometry::Size;
use lumen_core::identity::Identity;
use lumen_core::lifecycle::Lifecycle;
use lumen_core::render_signal::{self, RenderRequester, RenderRequests};
use lumen_core::state::SharedStateStorage;
use lumen_render::{DiffStats, FrameDiffWriter, TerminalOutput, ansi, build_output_lines};
use lumen_widgets::eval::render_root;
use lumen_widgets::{AnimationPhase, AnyView, Environment, FrameRegistries, RenderContext};
use web_time::Instant;

use crate::config::RenderLoopConfig;

/// Builds a region's view tree for the current frame.
pub type ViewBuilder = Box<dyn FnMut() -> AnyView>;

/// What happened to a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The focused control or a global key handler consumed it.
    Handled,
    /// It moved or released focus.
    FocusMoved,
    /// Nothing used it.
    Unhandled,
}

/// Counts from one [`RenderLoop::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Diff result for the main region.
    pub main: DiffStats,
    /// Diff result for the status bar, if one is set.
    pub status_bar: Option<DiffStats>,
    /// Identities whose state was evicted this frame.
    pub evicted: usize,
}

struct Region {
    root: Identity,
    writer: FrameDiffWriter,
}

impl Region {
    fn new(name: &'static str) -> Self {
        Self {
            root: Identity::root(name),
            writer: FrameDiffWriter::new(),
        }
    }
}

/// Drives frames from a view builder to a terminal.
pub struct RenderLoop<T: TerminalOutput> {
    terminal: T,
    config: RenderLoopConfig,
    size: Size,
    environment: Environment,
    main_dimmed: bool,
    content: ViewBuilder,
    status_bar: Option<ViewBuilder>,
    storage: SharedStateStorage,
    focus: FocusRegistry,
    lifecycle: Lifecycle,
    frame: FrameRegistries,
    main: Region,
    status: Region,
    requester: RenderRequester,
    requests: RenderRequests,
    started: Instant,
    frame_count: u64,
}

impl<T: TerminalOutput> RenderLoop<T> {
    /// Render `content` to `terminal`, sized to the terminal's current size.
    pub fn new<F>(terminal: T, config: RenderLoopConfig, content: F) -> Self
    where
        F: FnMut() -> AnyView + 'static,
    {
        let (requester, requests) = render_signal::channel();
        let storage = SharedStateStorage::new();
        let lifecycle = Lifecycle::new(storage.writer(requester.clone()));
        let size = terminal.size();
        Self {
            terminal,
            focus: FocusRegistry::new().with_autofocus(config.autofocus),
            main_dimmed: config.dim_main_content,
            config,
            size,
            environment: Environment::default(),
            content: Box::new(content),
            status_bar: None,
            storage,
            lifecycle,
            frame: FrameRegistries::new(),
            main: Region::new("main"),
            status: Region::new("status_bar"),
            requester,
            requests,
            started: Instant::now(),
            frame_count: 0,
        }
    }

    /// Reserve the bottom rows for a status bar built by `status_bar`.
    #[must_use]
    pub fn with_status_bar<F>(mut self, status_bar: F) -> Self
    where
        F: FnMut() -> AnyView + 'static,
    {
        self.status_bar = Some(Box::new(status_bar));
        self
    }

    /// Use `environment` (theme, appearance) from the next frame on.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Render one frame.
    pub fn render(&mut self) -> io::Result<FrameStats> {
        let Size { width, height } = self.size;
        let _span = tracing::debug_span!("render_frame", frame = self.frame_count, width, height)
            .entered();

        self.frame.clear();
        self.focus.begin_pass();
        self.requests.take_pending();

        let status_height = if self.status_bar.is_some() {
            self.config.status_bar_height.min(height)
        } else {
            0
        };
        let main_height = height - status_height;
        let env = self.environment.clone().with_animation(AnimationPhase {
            frame: self.frame_count,
            elapsed: self.started.elapsed(),
        });

        let mut main_env = env.clone();
        main_env.dimmed |= self.main_dimmed;
        let main_view = (self.content)();
        let background = self.config.background_code.clone();
        let (main, evicted) = self.render_region(
            Which::Main,
            &main_view,
            main_env,
            Size::new(width, main_height),
            0,
            &background,
        );

        let status_bar = match self.status_bar.as_mut() {
            Some(build) => {
                let view = build();
                let mut status_env = env;
                status_env.dimmed = false;
                let background = status_env.theme.status_bar.clone();
                let (stats, status_evicted) = self.render_region(
                    Which::Status,
                    &view,
                    status_env,
                    Size::new(width, status_height),
                    main_height,
                    &background,
                );
                Some((stats, status_evicted))
            }
            None => None,
        };

        self.focus.finish_pass();
        self.frame_count += 1;

        let main = main?;
        let (status_bar, status_evicted) = match status_bar {
            Some((stats, n)) => (Some(stats?), n),
            None => (None, 0),
        };
        self.terminal.flush()?;

        let stats = FrameStats {
            main,
            status_bar,
            evicted: evicted + status_evicted,
        };
        tracing::trace!(
            written = stats.main.rows_written,
            skipped = stats.main.rows_skipped,
            evicted = stats.evicted,
            "frame rendered"
        );
        Ok(stats)
    }

    /// Render only if something asked for a frame since the last one.
    pub fn render_if_requested(&mut self) -> io::Result<Option<FrameStats>> {
        if self.requests.take_pending() {
            self.render().map(Some)
        } else {
            Ok(None)
        }
    }

    fn render_region(
        &mut self,
        which: Which,
        view: &AnyView,
        env: Environment,
        size: Size,
        start_row: u16,
        background: &str,
    ) -> (io::Result<DiffStats>, usize) {
        let region = match which {
            Which::Main => &mut self.main,
            Which::Status => &mut self.status,
        };
        let root = region.root.clone();
        let alignment = match which {
            Which::Main => None,
            Which::Status => Some(self.config.status_bar_alignment),
        };

        let dimmed = env.dimmed;

        let (written, evicted) = {
            let mut storage = self.storage.lock();
            storage.begin_render_pass(&root);
            self.lifecycle.begin_render_pass(&root);

            let buffer = {
                let mut ctx = RenderContext::new(
                    size.width,
                    size.height,
                    env,
                    root.clone(),
                    &mut storage,
                    &mut self.focus,
                    &mut self.lifecycle,
                    &mut self.frame,
                );
                render_root(view.as_view(), &mut ctx)
            };
            let buffer = if dimmed { buffer.styled(ansi::DIM) } else { buffer };
            let buffer = match alignment {
                Some(alignment) => {
                    let x = alignment.offset(buffer.width(), size.width);
                    buffer.placed(size.width, size.height, x, 0)
                }
                None => buffer,
            };
            let lines = build_output_lines(
                &buffer,
                size.width,
                size.height,
                background,
                &self.config.reset_code,
            );
            let written = region
                .writer
                .write_diff(&lines, &mut self.terminal, start_row);
            let evicted = storage.end_render_pass(&root);
            (written, evicted.len())
        };
        // Disappear callbacks run without the storage lock held.
        let gone = self.lifecycle.end_render_pass(&root);

        if evicted > 0 || !gone.is_empty() {
            tracing::debug!(region = %root, evicted, disappeared = gone.len(), "views removed");
        }
        (written, evicted)
    }

    /// Route a key event: the focused control first, then global key
    /// handlers, then Tab traversal and Escape.
    ///
    /// Anything other than [`KeyOutcome::Unhandled`] requests a frame.
    pub fn dispatch_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        if event.is_release() {
            return KeyOutcome::Unhandled;
        }

        let outcome = if self.focus.dispatch_key_event_shared(event, &self.storage) {
            KeyOutcome::Handled
        } else if self.frame.dispatch_key(event) {
            KeyOutcome::Handled
        } else {
            self.navigate(event)
        };

        if outcome != KeyOutcome::Unhandled {
            self.requester.request_render();
        }
        outcome
    }

    fn navigate(&mut self, event: &KeyEvent) -> KeyOutcome {
        let moved = match event.code {
            KeyCode::Tab if self.config.tab_navigation => {
                self.focus.advance_focus(FocusDirection::Next)
            }
            KeyCode::BackTab if self.config.tab_navigation => {
                self.focus.advance_focus(FocusDirection::Previous)
            }
            KeyCode::Escape if self.config.escape_releases_focus => self.focus.release_focus(),
            _ => false,
        };
        if moved {
            tracing::debug!(focused = ?self.focus.focused_id(), key = ?event.code, "focus moved");
            KeyOutcome::FocusMoved
        } else {
            KeyOutcome::Unhandled
        }
    }

    /// Apply an input event. Resizes are applied immediately; key events
    /// go through [`dispatch_key`](Self::dispatch_key).
    pub fn handle_event(&mut self, event: &Event) -> KeyOutcome {
        match event {
            Event::Key(key) => self.dispatch_key(key),
            Event::Resize { width, height } => {
                self.resize(*width, *height);
                KeyOutcome::Unhandled
            }
            Event::Focus(_) => KeyOutcome::Unhandled,
        }
    }

    /// Adopt a new terminal size; the next frame repaints every row.
    pub fn resize(&mut self, width: u16, height: u16) {
        tracing::info!(width, height, "terminal resized");
        self.size = Size::new(width, height);
        self.invalidate_diff_cache();
        self.requester.request_render();
    }

    /// Forget what is on screen; the next frame repaints every row.
    pub fn invalidate_diff_cache(&mut self) {
        self.main.writer.invalidate();
        self.status.writer.invalidate();
    }

    /// Dim (or undim) the main content, e.g. while the status bar takes
    /// input.
    pub fn set_main_dimmed(&mut self, dimmed: bool) {
        if self.main_dimmed != dimmed {
            self.main_dimmed = dimmed;
            self.requester.request_render();
        }
    }

    /// Handle for code that needs to ask for a frame.
    pub fn requester(&self) -> RenderRequester {
        self.requester.clone()
    }

    /// Receiving side of render requests, for waiting between frames.
    pub fn render_requests(&self) -> &RenderRequests {
        &self.requests
    }

    pub fn config(&self) -> &RenderLoopConfig {
        &self.config
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// State shared with background tasks.
    pub fn storage(&self) -> &SharedStateStorage {
        &self.storage
    }

    pub fn focus(&self) -> &FocusRegistry {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusRegistry {
        &mut self.focus
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// Frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Diff cache generations of the main and status regions.
    pub fn diff_generations(&self) -> (u64, u64) {
        (self.main.writer.generation(), self.status.writer.generation())
    }
}

#[derive(Clone, Copy)]
enum Which {
    Main,
    Status,
}

impl<T: TerminalOutput> std::fmt::Debug for RenderLoop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("size", &self.size)
            .field("frame_count", &self.frame_count)
            .field("focus", &self.focus)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}
