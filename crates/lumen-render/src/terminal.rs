#![forbid(unsafe_code)]

//! Terminal output abstraction.
//!
//! The diff writer only needs "write this text at this row/column" plus a
//! size and a flush. [`AnsiTerminal`] implements that over any
//! [`std::io::Write`] with cursor-position sequences; [`HeadlessTerminal`]
//! records writes in memory for tests.

use std::io::{self, Write};

use lumen_core::geometry::Size;

/// Output surface for rendered rows.
pub trait TerminalOutput {
    /// Width in columns.
    fn width(&self) -> u16;

    /// Height in rows.
    fn height(&self) -> u16;

    /// Both dimensions.
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Write `text` starting at (`row`, `column`), zero-based.
    fn write(&mut self, row: u16, column: u16, text: &str) -> io::Result<()>;

    /// Push buffered output to the device.
    fn flush(&mut self) -> io::Result<()>;
}

impl<T: TerminalOutput + ?Sized> TerminalOutput for &mut T {
    fn width(&self) -> u16 {
        (**self).width()
    }
    fn height(&self) -> u16 {
        (**self).height()
    }
    fn write(&mut self, row: u16, column: u16, text: &str) -> io::Result<()> {
        (**self).write(row, column, text)
    }
    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Terminal over a byte sink using CUP (`ESC [ row ; col H`) addressing.
#[derive(Debug)]
pub struct AnsiTerminal<W: Write> {
    out: W,
    width: u16,
    height: u16,
}

impl<W: Write> AnsiTerminal<W> {
    /// Wrap `out`, which the caller knows to be `width` x `height`.
    pub fn new(out: W, width: u16, height: u16) -> Self {
        Self { out, width, height }
    }

    /// Record a new size after a resize.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// The underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Consume, returning the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TerminalOutput for AnsiTerminal<W> {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn write(&mut self, row: u16, column: u16, text: &str) -> io::Result<()> {
        write!(
            self.out,
            "\x1b[{};{}H{}",
            u32::from(row) + 1,
            u32::from(column) + 1,
            text
        )
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// One recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    /// Zero-based row.
    pub row: u16,
    /// Zero-based column.
    pub column: u16,
    /// Text as written, escapes included.
    pub text: String,
}

/// In-memory terminal that records every write.
#[derive(Debug, Clone, Default)]
pub struct HeadlessTerminal {
    width: u16,
    height: u16,
    writes: Vec<WriteRecord>,
    rows: Vec<String>,
    flushes: usize,
    fail_writes: bool,
}

impl HeadlessTerminal {
    /// A blank `width` x `height` terminal.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            rows: vec![String::new(); usize::from(height)],
            ..Self::default()
        }
    }

    /// Change the reported size; rows are kept or blanked to match.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.rows.resize(usize::from(height), String::new());
    }

    /// Make every subsequent write fail (or stop failing).
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// All writes since construction or the last [`take_writes`](Self::take_writes).
    pub fn writes(&self) -> &[WriteRecord] {
        &self.writes
    }

    /// Drain the write log.
    pub fn take_writes(&mut self) -> Vec<WriteRecord> {
        std::mem::take(&mut self.writes)
    }

    /// Number of flushes so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Last text written to `row` at column 0, escapes included.
    pub fn row(&self, row: u16) -> Option<&str> {
        self.rows.get(usize::from(row)).map(String::as_str)
    }

    /// Screen rows with escape sequences stripped.
    pub fn plain_rows(&self) -> Vec<String> {
        self.rows.iter().map(|row| crate::ansi::strip(row)).collect()
    }
}

impl TerminalOutput for HeadlessTerminal {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn write(&mut self, row: u16, column: u16, text: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "headless terminal write failure"));
        }
        self.writes.push(WriteRecord {
            row,
            column,
            text: text.to_owned(),
        });
        if let Some(slot) = self.rows.get_mut(usize::from(row)) {
            if text == crate::ansi::ERASE_LINE {
                slot.clear();
            } else if column == 0 {
                *slot = text.to_owned();
            } else {
                slot.push_str(text);
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
