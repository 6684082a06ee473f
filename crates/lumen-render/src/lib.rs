#![forbid(unsafe_code)]

//! Render kernel: styled line buffers, row diffs, and terminal output.
//!
//! # Role in Lumen
//! `lumen-render` owns everything between "a view produced some styled
//! lines" and "bytes reached the terminal". It knows nothing about views.
//!
//! # Primary responsibilities
//! - **ansi**: escape-aware width, truncation, padding, and compositing.
//! - **FrameBuffer**: rectangular blocks of styled lines and their
//!   vertical/horizontal/overlay composition.
//! - **FrameDiffWriter**: per-row cache that writes only changed rows.
//! - **TerminalOutput**: the write surface, with ANSI and headless
//!   implementations.
//!
//! # How it fits in the system
//! `lumen-widgets` renders views into [`FrameBuffer`]s. `lumen-runtime`
//! expands the root buffer with [`build_output_lines`] and hands the result
//! to one [`FrameDiffWriter`] per screen region.
//!
//! [`FrameBuffer`]: frame_buffer::FrameBuffer
//! [`FrameDiffWriter`]: diff_writer::FrameDiffWriter
//! [`build_output_lines`]: diff_writer::build_output_lines

pub mod ansi;
pub mod diff_writer;
pub mod frame_buffer;
pub mod terminal;

pub use diff_writer::{DiffStats, FrameDiffWriter, build_output_lines};
pub use frame_buffer::FrameBuffer;
pub use terminal::{AnsiTerminal, HeadlessTerminal, TerminalOutput, WriteRecord};
