#![forbid(unsafe_code)]

//! ANSI-aware measurement and slicing of styled lines.
//!
//! Lines in Lumen are plain `String`s with embedded escape sequences. Every
//! width computation must skip those sequences and count grapheme clusters
//! by their display width; everything else in this crate builds on the
//! helpers here.
//!
//! # Escape grammar
//!
//! - CSI: `ESC [` parameters, terminated by a byte in `0x40..=0x7E`
//! - OSC: `ESC ]` ... terminated by BEL or `ESC \`
//! - any other `ESC x` pair
//!
//! An unterminated sequence runs to the end of the line.

use memchr::memchr;
use unicode_segmentation::{Graphemes, UnicodeSegmentation};
use unicode_width::UnicodeWidthStr;

/// SGR reset.
pub const RESET: &str = "\x1b[0m";

/// Erase the whole line the cursor is on.
pub const ERASE_LINE: &str = "\x1b[2K";

/// SGR faint, used for dimmed content.
pub const DIM: &str = "\x1b[2m";

const ESC: u8 = 0x1b;

/// One lexical unit of a styled line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A complete escape sequence.
    Escape(&'a str),
    /// A grapheme cluster and its display width.
    Grapheme {
        /// The cluster text.
        text: &'a str,
        /// Columns it occupies.
        width: usize,
    },
}

/// Iterator over the [`Token`]s of a line.
pub struct Tokens<'a> {
    rest: &'a str,
    plain: Option<Graphemes<'a>>,
}

/// Split `line` into escape sequences and grapheme clusters.
pub fn tokenize(line: &str) -> Tokens<'_> {
    Tokens {
        rest: line,
        plain: None,
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            if let Some(graphemes) = self.plain.as_mut() {
                if let Some(text) = graphemes.next() {
                    return Some(Token::Grapheme {
                        text,
                        width: text.width(),
                    });
                }
                self.plain = None;
            }
            if self.rest.is_empty() {
                return None;
            }
            if self.rest.as_bytes()[0] == ESC {
                let (escape, rest) = self.rest.split_at(escape_len(self.rest));
                self.rest = rest;
                return Some(Token::Escape(escape));
            }
            let end = memchr(ESC, self.rest.as_bytes()).unwrap_or(self.rest.len());
            let (plain, rest) = self.rest.split_at(end);
            self.rest = rest;
            self.plain = Some(plain.graphemes(true));
        }
    }
}

/// Byte length of the escape sequence at the start of `s`.
fn escape_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    match bytes.get(1) {
        None => 1,
        Some(b'[') => bytes[2..]
            .iter()
            .position(|b| (0x40..=0x7e).contains(b))
            .map_or(bytes.len(), |i| i + 3),
        Some(b']') => {
            let mut i = 2;
            while i < bytes.len() {
                match bytes[i] {
                    0x07 => return i + 1,
                    ESC if bytes.get(i + 1) == Some(&b'\\') => return i + 2,
                    _ => i += 1,
                }
            }
            bytes.len()
        }
        Some(_) => 1 + s[1..].chars().next().map_or(0, char::len_utf8),
    }
}

/// Display width of `line`, escape sequences excluded.
pub fn visible_width(line: &str) -> usize {
    tokenize(line)
        .map(|token| match token {
            Token::Grapheme { width, .. } => width,
            Token::Escape(_) => 0,
        })
        .sum()
}

/// Cut `line` to at most `max_width` columns.
///
/// Escape sequences are kept even past the cut so trailing resets survive.
/// A wide grapheme that would straddle the limit is dropped.
pub fn truncate(line: &str, max_width: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut width = 0;
    let mut full = false;
    for token in tokenize(line) {
        match token {
            Token::Escape(escape) => out.push_str(escape),
            Token::Grapheme { text, width: w } => {
                if full {
                    continue;
                }
                if width + w > max_width {
                    full = true;
                    continue;
                }
                out.push_str(text);
                width += w;
            }
        }
    }
    out
}

/// Whether `escape` is an SGR sequence.
fn sgr_params(escape: &str) -> Option<&str> {
    escape.strip_prefix("\x1b[")?.strip_suffix('m')
}

/// Whether `escape` is an SGR sequence that starts by resetting everything.
pub fn is_reset(escape: &str) -> bool {
    sgr_params(escape).is_some_and(|params| {
        let first = params.split(';').next().unwrap_or("");
        first.is_empty() || first == "0"
    })
}

/// Fold one SGR parameter list into the tracked background.
fn apply_sgr(params: &str, background: &mut Option<String>) {
    let parts: Vec<&str> = params.split(';').collect();
    let mut i = 0;
    while i < parts.len() {
        let part = parts[i];
        if part.starts_with("48:") {
            *background = Some(format!("\x1b[{part}m"));
            i += 1;
            continue;
        }
        match part {
            "" | "0" | "49" => *background = None,
            "48" | "38" | "58" => {
                let consumed = match parts.get(i + 1) {
                    Some(&"5") => 2,
                    Some(&"2") => 4,
                    _ => 0,
                };
                if part == "48" && consumed > 0 && i + consumed < parts.len() {
                    let spec = parts[i..=i + consumed].join(";");
                    *background = Some(format!("\x1b[{spec}m"));
                }
                i += consumed;
            }
            _ => {
                if let Ok(code) = part.parse::<u16>()
                    && ((40..=47).contains(&code) || (100..=107).contains(&code))
                {
                    *background = Some(format!("\x1b[{code}m"));
                }
            }
        }
        i += 1;
    }
}

/// The background that is active at the last visible grapheme of `line`.
///
/// Resets after the last visible character are ignored, so a line such as
/// `ESC[44m text ESC[0m` reports `ESC[44m`.
pub fn trailing_background(line: &str) -> Option<String> {
    let mut current: Option<String> = None;
    let mut at_last_visible: Option<String> = None;
    for token in tokenize(line) {
        match token {
            Token::Escape(escape) => {
                if let Some(params) = sgr_params(escape) {
                    apply_sgr(params, &mut current);
                }
            }
            Token::Grapheme { width, .. } if width > 0 => {
                at_last_visible.clone_from(&current);
            }
            Token::Grapheme { .. } => {}
        }
    }
    at_last_visible
}

/// Pad `line` with spaces (or truncate it) to exactly `width` columns.
///
/// Padding carries the line's trailing background, followed by a reset.
/// A wide grapheme dropped at the cut is made up with padding.
pub fn pad_to_width(line: &str, width: usize) -> String {
    let current = visible_width(line);
    if current > width {
        let cut = truncate(line, width);
        if visible_width(&cut) == width {
            return cut;
        }
        return pad_to_width(&cut, width);
    }
    if current == width {
        return line.to_owned();
    }
    let fill = width - current;
    match trailing_background(line) {
        Some(background) => {
            let mut out = String::with_capacity(line.len() + background.len() + fill + RESET.len());
            out.push_str(line);
            out.push_str(&background);
            out.extend(std::iter::repeat_n(' ', fill));
            out.push_str(RESET);
            out
        }
        None => {
            let mut out = String::with_capacity(line.len() + fill);
            out.push_str(line);
            out.extend(std::iter::repeat_n(' ', fill));
            out
        }
    }
}

/// Lay `style` under every cell of `line`, re-applying it after each reset.
pub fn apply_base_style(line: &str, style: &str) -> String {
    if style.is_empty() {
        return line.to_owned();
    }
    let mut out = String::with_capacity(line.len() + style.len() * 2 + RESET.len());
    out.push_str(style);
    for token in tokenize(line) {
        match token {
            Token::Escape(escape) => {
                out.push_str(escape);
                if is_reset(escape) {
                    out.push_str(style);
                }
            }
            Token::Grapheme { text, .. } => out.push_str(text),
        }
    }
    out.push_str(RESET);
    out
}

/// Strip every escape sequence from `line`.
pub fn strip(line: &str) -> String {
    tokenize(line)
        .filter_map(|token| match token {
            Token::Grapheme { text, .. } => Some(text),
            Token::Escape(_) => None,
        })
        .collect()
}

// ── Columns ─────────────────────────────────────────────────────────────

/// One terminal column of a styled line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Column {
    /// Escape sequences in effect since the last reset.
    pub style: String,
    /// Grapheme text; empty for the right half of a wide grapheme.
    pub text: String,
    /// 1 or 2 for a grapheme head, 0 for a continuation.
    pub width: u8,
}

impl Column {
    pub(crate) fn blank(style: &str) -> Self {
        Self {
            style: style.to_owned(),
            text: " ".to_owned(),
            width: 1,
        }
    }

    fn continuation(style: &str) -> Self {
        Self {
            style: style.to_owned(),
            text: String::new(),
            width: 0,
        }
    }

    fn is_transparent(&self) -> bool {
        self.width == 0 || self.text == " "
    }
}

/// Explode `line` into per-column cells with their effective style.
pub(crate) fn columns(line: &str) -> Vec<Column> {
    let mut style = String::new();
    let mut out: Vec<Column> = Vec::new();
    for token in tokenize(line) {
        match token {
            Token::Escape(escape) => {
                if is_reset(escape) {
                    style.clear();
                    if sgr_params(escape).is_some_and(|p| p.contains(';')) {
                        style.push_str(escape);
                    }
                } else {
                    style.push_str(escape);
                }
            }
            Token::Grapheme { text, width: 0 } => {
                if let Some(last) = out.iter_mut().rev().find(|c| c.width > 0) {
                    last.text.push_str(text);
                }
            }
            Token::Grapheme { text, width } => {
                let wide = width >= 2;
                out.push(Column {
                    style: style.clone(),
                    text: text.to_owned(),
                    width: if wide { 2 } else { 1 },
                });
                if wide {
                    out.push(Column::continuation(&style));
                }
            }
        }
    }
    out
}

/// Re-assemble columns into a styled line with minimal style switches.
pub(crate) fn render_columns(columns: &[Column]) -> String {
    let mut out = String::new();
    let mut current = "";
    for column in columns {
        if column.width == 0 {
            continue;
        }
        if column.style != current {
            if !current.is_empty() {
                out.push_str(RESET);
            }
            out.push_str(&column.style);
            current = &column.style;
        }
        out.push_str(&column.text);
    }
    if !current.is_empty() {
        out.push_str(RESET);
    }
    out
}

/// Turn whichever wide grapheme covers `index` into blanks.
fn split_wide(columns: &mut [Column], index: usize) {
    match columns[index].width {
        0 if index > 0 => {
            let style = columns[index - 1].style.clone();
            columns[index - 1] = Column::blank(&style);
            columns[index] = Column::blank(&style);
        }
        2 if index + 1 < columns.len() => {
            let style = columns[index].style.clone();
            columns[index + 1] = Column::blank(&style);
        }
        _ => {}
    }
}

/// Composite `top` over `base` within `width` columns.
///
/// Visible non-space graphemes of `top` replace the columns beneath them;
/// spaces are transparent. The result is exactly `width` columns wide.
pub fn overlay_line(base: &str, top: &str, width: usize) -> String {
    let mut cells = columns(base);
    cells.truncate(width);
    if cells.last().is_some_and(|c| c.width == 2) {
        let style = cells[cells.len() - 1].style.clone();
        let last = cells.len() - 1;
        cells[last] = Column::blank(&style);
    }
    while cells.len() < width {
        cells.push(Column::blank(""));
    }

    for (x, cell) in columns(top).into_iter().enumerate() {
        if x >= width {
            break;
        }
        if cell.is_transparent() {
            continue;
        }
        let span = usize::from(cell.width);
        if x + span > width {
            continue;
        }
        for covered in x..x + span {
            split_wide(&mut cells, covered);
        }
        let style = cell.style.clone();
        cells[x] = cell;
        if span == 2 {
            cells[x + 1] = Column::continuation(&style);
        }
    }
    render_columns(&cells)
}
