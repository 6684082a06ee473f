//! Property-based invariant tests for FrameBuffer composition.
//!
//! 1. Every line of every buffer has visible width equal to the buffer width
//! 2. Overlay never changes dimensions
//! 3. Vertical/horizontal append produce the expected extents
//! 4. Output lines always have the requested shape
//! 5. Narrowing with `with_width` never loses a column to a wide grapheme

use lumen_core::geometry::Sides;
use lumen_render::ansi::visible_width;
use lumen_render::{FrameBuffer, build_output_lines};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

/// A styled line: plain words, optionally wrapped in fg/bg codes, with the
/// occasional wide grapheme.
fn styled_line() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-z ]{0,6}",
        Just("日".to_string()),
        "[a-z]{1,4}".prop_map(|s| format!("\x1b[31m{s}\x1b[0m")),
        "[a-z]{1,4}".prop_map(|s| format!("\x1b[44m{s}\x1b[0m")),
        "[a-z]{1,4}".prop_map(|s| format!("\x1b[48;5;236m{s}")),
    ];
    proptest::collection::vec(piece, 0..5).prop_map(|pieces| pieces.concat())
}

fn buffer() -> impl Strategy<Value = FrameBuffer> {
    proptest::collection::vec(styled_line(), 0..6).prop_map(FrameBuffer::from_lines)
}

fn assert_rect(buffer: &FrameBuffer) -> Result<(), TestCaseError> {
    for line in buffer.lines() {
        prop_assert_eq!(visible_width(line), usize::from(buffer.width()), "line {:?}", line);
    }
    Ok(())
}

// ── Invariants ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn from_lines_is_rectangular(buffer in buffer()) {
        assert_rect(&buffer)?;
    }

    #[test]
    fn narrowed_lines_keep_declared_width(
        lines in proptest::collection::vec(styled_line(), 1..6),
        shrink in 1usize..6,
    ) {
        let natural = lines.iter().map(|l| visible_width(l)).max().unwrap_or(0);
        let width = u16::try_from(natural.saturating_sub(shrink)).unwrap_or(0);
        let narrowed = FrameBuffer::with_width(lines, width);
        prop_assert_eq!(narrowed.width(), width);
        assert_rect(&narrowed)?;

        let mut joined = FrameBuffer::from_lines(vec!["|".to_owned()]);
        joined.append_horizontally(narrowed, 1);
        assert_rect(&joined)?;
    }

    #[test]
    fn vertical_append_is_rectangular(a in buffer(), b in buffer(), spacing in 0u16..3) {
        let (ah, bh) = (a.height(), b.height());
        let width = a.width().max(b.width());
        let mut joined = a;
        joined.append_vertically(b, spacing);
        assert_rect(&joined)?;
        prop_assert_eq!(joined.width(), width);
        let expected = if ah == 0 || bh == 0 { ah + bh } else { ah + bh + spacing };
        prop_assert_eq!(joined.height(), expected);
    }

    #[test]
    fn horizontal_append_is_rectangular(a in buffer(), b in buffer(), spacing in 0u16..3) {
        let height = a.height().max(b.height());
        let mut joined = a;
        joined.append_horizontally(b, spacing);
        assert_rect(&joined)?;
        prop_assert_eq!(joined.height(), height);
    }

    #[test]
    fn overlay_keeps_dimensions(a in buffer(), b in buffer()) {
        let (w, h) = (a.width(), a.height());
        let mut base = a;
        base.overlay(&b);
        assert_rect(&base)?;
        prop_assert_eq!((base.width(), base.height()), (w, h));
    }

    #[test]
    fn padding_and_placement_are_rectangular(
        a in buffer(),
        top in 0u16..3, right in 0u16..3, bottom in 0u16..3, left in 0u16..3,
        width in 0u16..20, height in 0u16..8, x in 0u16..6, y in 0u16..4,
    ) {
        let padded = a.clone().padded(Sides::new(top, right, bottom, left));
        assert_rect(&padded)?;
        prop_assert_eq!(padded.height(), a.height() + top + bottom);

        let placed = a.clone().placed(width, height, x, y);
        assert_rect(&placed)?;
        prop_assert_eq!((placed.width(), placed.height()), (width, height));

        let clipped = a.clipped(width, height);
        assert_rect(&clipped)?;
    }

    #[test]
    fn output_lines_have_requested_shape(a in buffer(), width in 0u16..30, height in 0u16..10) {
        let lines = build_output_lines(&a, width, height, "\x1b[40m", "\x1b[0m");
        prop_assert_eq!(lines.len(), usize::from(height));
        for line in &lines {
            prop_assert_eq!(visible_width(line), usize::from(width));
            prop_assert!(line.ends_with("\x1b[0m"));
        }
    }
}
