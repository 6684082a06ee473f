#![forbid(unsafe_code)]

//! Lumen public facade crate.
//!
//! Re-exports the types most applications need from the internal crates,
//! plus [`App`] for running a view tree on a real terminal and a prelude
//! for day-to-day use.

pub mod app;
pub mod error;

pub use app::{App, DEFAULT_POLL_INTERVAL, QuitHandle};
pub use error::{Error, Result};

// --- Core re-exports -------------------------------------------------------

pub use lumen_core::{
    Event, FocusDirection, FocusRegistry, Identity, KeyCode, KeyEvent, KeyEventKind, Modifiers,
    RenderRequester, SectionId, SharedStateStorage, Sides, Size, TaskContext, TaskPriority,
};

// --- Layout and render re-exports ------------------------------------------

pub use lumen_layout::{Alignment, Axis, ProposedSize, ViewSize};
pub use lumen_render::{FrameBuffer, FrameDiffWriter, HeadlessTerminal, TerminalOutput};

// --- Widget re-exports -----------------------------------------------------

pub use lumen_widgets::{
    AnyView, Appearance, Button, EmptyView, Environment, HStack, MeasureContext, Picker,
    PreferenceKey, RenderContext, Spacer, Spinner, Text, TextField, Theme, VStack, View, ViewExt,
    ZStack,
};

// --- Runtime re-exports ----------------------------------------------------

pub use lumen_runtime::{ConfigError, FrameStats, KeyOutcome, RenderLoop, RenderLoopConfig};

#[cfg(feature = "crossterm")]
pub use lumen_runtime::CrosstermTerminal;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Alignment, AnyView, App, Button, EmptyView, Error, Event, HStack, KeyCode, KeyEvent,
        Picker, QuitHandle, RenderLoop, RenderLoopConfig, Result, Sides, Spacer, Spinner, Text,
        TextField, View, ViewExt, VStack, ZStack,
    };

    pub use crate::{core, layout, render, runtime, widgets};
}

pub use lumen_core as core;
pub use lumen_layout as layout;
pub use lumen_render as render;
pub use lumen_runtime as runtime;
pub use lumen_widgets as widgets;
