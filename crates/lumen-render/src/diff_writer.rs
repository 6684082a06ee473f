#![forbid(unsafe_code)]

//! Row-level frame diffing.
//!
//! [`FrameDiffWriter`] remembers the exact text last written to each row of
//! its region. A new frame is compared row by row: a changed or uncached
//! row costs one positioned write, an unchanged row costs nothing. Rows the
//! previous frame had but the new one lacks are erased and forgotten.
//!
//! The cache can be stale after anything the writer did not see (resize,
//! another program scribbling on the screen); [`FrameDiffWriter::invalidate`]
//! drops it so the next frame repaints every row.
//!
//! # Usage
//!
//! ```
//! use lumen_render::diff_writer::{FrameDiffWriter, build_output_lines};
//! use lumen_render::frame_buffer::FrameBuffer;
//! use lumen_render::terminal::HeadlessTerminal;
//!
//! let mut term = HeadlessTerminal::new(10, 2);
//! let mut writer = FrameDiffWriter::new();
//! let buffer = FrameBuffer::from_lines(vec!["hello".into()]);
//! let lines = build_output_lines(&buffer, 10, 2, "", "\x1b[0m");
//!
//! let first = writer.write_diff(&lines, &mut term, 0).unwrap();
//! let second = writer.write_diff(&lines, &mut term, 0).unwrap();
//! assert_eq!(first.rows_written, 2);
//! assert_eq!(second.rows_written, 0);
//! ```

use std::io;

use crate::ansi;
use crate::frame_buffer::FrameBuffer;
use crate::terminal::TerminalOutput;

/// Counts from one [`FrameDiffWriter::write_diff`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffStats {
    /// Rows written because they changed or were not cached.
    pub rows_written: usize,
    /// Rows left alone because they matched the cache.
    pub rows_skipped: usize,
    /// Stale rows beyond the new frame that were erased.
    pub rows_cleared: usize,
}

/// Expand `buffer` into exactly `height` terminal-ready lines of `width`
/// columns.
///
/// Lines are truncated or padded; `background_code` sits under the whole
/// line (re-applied after any reset inside it) and every line ends with
/// `reset_code`.
pub fn build_output_lines(
    buffer: &FrameBuffer,
    width: u16,
    height: u16,
    background_code: &str,
    reset_code: &str,
) -> Vec<String> {
    let width = usize::from(width);
    (0..usize::from(height))
        .map(|row| {
            let source = buffer.lines().get(row).map_or("", String::as_str);
            let fitted = if ansi::visible_width(source) > width {
                ansi::truncate(source, width)
            } else {
                source.to_owned()
            };
            let fill = width - ansi::visible_width(&fitted);
            let mut line = String::with_capacity(
                fitted.len() + fill + background_code.len() * 2 + reset_code.len(),
            );
            line.push_str(background_code);
            if background_code.is_empty() {
                line.push_str(&fitted);
            } else {
                for token in ansi::tokenize(&fitted) {
                    match token {
                        ansi::Token::Escape(escape) => {
                            line.push_str(escape);
                            if ansi::is_reset(escape) {
                                line.push_str(background_code);
                            }
                        }
                        ansi::Token::Grapheme { text, .. } => line.push_str(text),
                    }
                }
            }
            line.extend(std::iter::repeat_n(' ', fill));
            line.push_str(reset_code);
            line
        })
        .collect()
}

/// Per-region cache of the rows last written.
#[derive(Debug, Clone, Default)]
pub struct FrameDiffWriter {
    previous: Vec<String>,
    generation: u64,
}

impl FrameDiffWriter {
    /// A writer with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every cached row; the next frame repaints fully.
    pub fn invalidate(&mut self) {
        self.previous.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Number of invalidations so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of rows currently cached.
    pub fn cached_rows(&self) -> usize {
        self.previous.len()
    }

    /// Write the rows of `lines` that differ from the cache, the first line
    /// landing at `start_row`.
    ///
    /// On an I/O error the cache is invalidated, so nothing is assumed about
    /// what reached the terminal.
    pub fn write_diff(
        &mut self,
        lines: &[String],
        terminal: &mut dyn TerminalOutput,
        start_row: u16,
    ) -> io::Result<DiffStats> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("write_diff", rows = lines.len(), start_row).entered();

        match self.write_rows(lines, terminal, start_row) {
            Ok(stats) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    written = stats.rows_written,
                    skipped = stats.rows_skipped,
                    cleared = stats.rows_cleared,
                    "diff written"
                );
                Ok(stats)
            }
            Err(err) => {
                self.invalidate();
                Err(err)
            }
        }
    }

    fn write_rows(
        &mut self,
        lines: &[String],
        terminal: &mut dyn TerminalOutput,
        start_row: u16,
    ) -> io::Result<DiffStats> {
        let mut stats = DiffStats::default();
        for (index, line) in lines.iter().enumerate() {
            let row = row_at(start_row, index);
            match self.previous.get_mut(index) {
                Some(cached) if cached == line => stats.rows_skipped += 1,
                Some(cached) => {
                    terminal.write(row, 0, line)?;
                    cached.clone_from(line);
                    stats.rows_written += 1;
                }
                None => {
                    terminal.write(row, 0, line)?;
                    self.previous.push(line.clone());
                    stats.rows_written += 1;
                }
            }
        }
        for index in lines.len()..self.previous.len() {
            terminal.write(row_at(start_row, index), 0, ansi::ERASE_LINE)?;
            stats.rows_cleared += 1;
        }
        self.previous.truncate(lines.len());
        Ok(stats)
    }
}

fn row_at(start_row: u16, index: usize) -> u16 {
    start_row.saturating_add(u16::try_from(index).unwrap_or(u16::MAX))
}
