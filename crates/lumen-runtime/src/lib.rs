#![forbid(unsafe_code)]

//! Runtime: frames, input routing and terminal setup.
//!
//! # Role in Lumen
//! `lumen-runtime` ties the layers together. A [`RenderLoop`] evaluates
//! the application's view builders once per frame, diff-writes the result
//! to a [`TerminalOutput`](lumen_render::TerminalOutput), and routes key
//! events to the focused control, global key handlers, and Tab traversal.
//!
//! # Primary responsibilities
//! - **RenderLoop**: the per-frame pass sequence for the main region and
//!   the optional status bar, state eviction, focus reconciliation.
//! - **Key dispatch**: [`KeyOutcome`] reports who consumed an event.
//! - **Configuration**: [`RenderLoopConfig`], loadable from TOML with the
//!   `config-file` feature.
//! - **Backend**: with the `crossterm` feature, a raw-mode terminal and
//!   crossterm event conversion.
//!
//! The loop itself does not own an event source; applications poll their
//! backend, hand events to [`RenderLoop::handle_event`], and call
//! [`RenderLoop::render_if_requested`].

pub mod config;
pub mod render_loop;

#[cfg(feature = "crossterm")]
pub mod backend;

pub use config::{ConfigError, MAX_STATUS_BAR_HEIGHT, RenderLoopConfig};
pub use render_loop::{FrameStats, KeyOutcome, RenderLoop, ViewBuilder};

#[cfg(feature = "crossterm")]
pub use backend::{CrosstermTerminal, event_from_crossterm, key_from_crossterm};
