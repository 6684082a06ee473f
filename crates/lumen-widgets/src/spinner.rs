#![forbid(unsafe_code)]

//! Activity spinner driven by a view-bound background task.

use lumen_core::lifecycle::TaskPriority;
use lumen_layout::{ProposedSize, ViewSize};
use lumen_render::{FrameBuffer, ansi};
use web_time::Duration;

use crate::context::{MeasureContext, RenderContext};
use crate::view::{Node, Primitive, View};

pub const DOTS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const LINE: &[&str] = &["|", "/", "-", "\\"];

/// Persisted frame counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpinnerState {
    pub current_frame: usize,
}

impl SpinnerState {
    pub fn tick(&mut self) {
        self.current_frame = self.current_frame.wrapping_add(1);
    }
}

/// Cycles through `frames` while on screen.
///
/// The first render starts a task that ticks the persisted frame counter
/// every `interval` and requests a frame. The task ends when the spinner
/// disappears.
#[derive(Debug, Clone)]
pub struct Spinner {
    frames: &'static [&'static str],
    label: Option<String>,
    interval: Duration,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            frames: DOTS,
            label: None,
            interval: Duration::from_millis(80),
        }
    }

    #[must_use]
    pub fn frames(mut self, frames: &'static [&'static str]) -> Self {
        self.frames = frames;
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn line(&self, frame: usize) -> String {
        let glyph = if self.frames.is_empty() {
            ""
        } else {
            self.frames[frame % self.frames.len()]
        };
        match &self.label {
            Some(label) => format!("{glyph} {label}"),
            None => glyph.to_owned(),
        }
    }
}

impl View for Spinner {
    fn node(&self) -> Node<'_> {
        Node::Primitive(self)
    }
}

impl Primitive for Spinner {
    fn size_that_fits(&self, proposal: ProposedSize, ctx: &MeasureContext<'_>) -> ViewSize {
        let frame = ctx
            .state::<SpinnerState>(0)
            .map_or(0, |state| state.current_frame);
        let width = u16::try_from(ansi::visible_width(&self.line(frame))).unwrap_or(u16::MAX);
        ViewSize::fixed(width, 1).clamped_to(proposal)
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> FrameBuffer {
        let frame = ctx.state(0, SpinnerState::default).current_frame;
        let key = ctx.state_key(0);
        let token = ctx.identity().clone();
        let interval = self.interval;
        ctx.lifecycle()
            .start_task(&token, TaskPriority::UserInitiated, move |task| {
                while !task.cancellation().wait_timeout(interval) {
                    if !task.writer().update::<SpinnerState, _>(&key, SpinnerState::tick) {
                        break;
                    }
                }
            });

        let style = &ctx.environment().theme.accent;
        let line = format!("{style}{}{}", self.line(frame), ansi::RESET);
        FrameBuffer::from_lines(vec![line]).clipped(ctx.width, ctx.height)
    }
}
