//! Row-diff behaviour across frame sequences.

use lumen_render::{FrameBuffer, FrameDiffWriter, HeadlessTerminal, build_output_lines};

const RESET: &str = "\x1b[0m";

fn frame(rows: u16, marker: &str) -> FrameBuffer {
    FrameBuffer::from_lines(
        (0..rows)
            .map(|row| format!("row {row:02} {marker}"))
            .collect(),
    )
}

#[test]
fn identical_frames_write_once() {
    let mut term = HeadlessTerminal::new(40, 24);
    let mut writer = FrameDiffWriter::new();
    let lines = build_output_lines(&frame(24, "steady"), 40, 24, "", RESET);

    let mut per_frame = Vec::new();
    for _ in 0..10 {
        let before = term.writes().len();
        writer.write_diff(&lines, &mut term, 0).unwrap();
        per_frame.push(term.writes().len() - before);
    }

    assert_eq!(per_frame[0], 24);
    assert!(per_frame[1..].iter().all(|&n| n == 0), "{per_frame:?}");
}

#[test]
fn single_row_change_writes_single_row() {
    let mut term = HeadlessTerminal::new(40, 24);
    let mut writer = FrameDiffWriter::new();
    let first = build_output_lines(&frame(24, "a"), 40, 24, "", RESET);
    writer.write_diff(&first, &mut term, 0).unwrap();
    term.take_writes();

    let mut second = first.clone();
    second[7] = build_output_lines(&FrameBuffer::from_lines(vec!["changed".into()]), 40, 1, "", RESET)
        .remove(0);
    let stats = writer.write_diff(&second, &mut term, 0).unwrap();

    assert_eq!(stats.rows_written, 1);
    assert_eq!(stats.rows_skipped, 23);
    assert_eq!(term.writes().len(), 1);
    assert_eq!(term.writes()[0].row, 7);
}

#[test]
fn resize_invalidation_repaints_every_row() {
    let mut term = HeadlessTerminal::new(40, 24);
    let mut writer = FrameDiffWriter::new();
    let lines = build_output_lines(&frame(24, "x"), 40, 24, "", RESET);
    writer.write_diff(&lines, &mut term, 0).unwrap();
    writer.write_diff(&lines, &mut term, 0).unwrap();
    term.take_writes();

    term.resize(30, 20);
    writer.invalidate();
    let resized = build_output_lines(&frame(24, "x"), 30, 20, "", RESET);
    let stats = writer.write_diff(&resized, &mut term, 0).unwrap();

    assert_eq!(stats.rows_written, 20);
    assert_eq!(term.writes().len(), 20);
}

#[test]
fn independent_regions_do_not_interfere() {
    let mut term = HeadlessTerminal::new(20, 6);
    let mut main = FrameDiffWriter::new();
    let mut status = FrameDiffWriter::new();

    let body = build_output_lines(&frame(5, "body"), 20, 5, "", RESET);
    let bar = build_output_lines(&FrameBuffer::from_lines(vec!["status".into()]), 20, 1, "", RESET);

    main.write_diff(&body, &mut term, 0).unwrap();
    status.write_diff(&bar, &mut term, 5).unwrap();
    term.take_writes();

    let bar2 = build_output_lines(&FrameBuffer::from_lines(vec!["status 2".into()]), 20, 1, "", RESET);
    main.write_diff(&body, &mut term, 0).unwrap();
    status.write_diff(&bar2, &mut term, 5).unwrap();

    assert_eq!(term.writes().len(), 1);
    assert_eq!(term.writes()[0].row, 5);
    assert_eq!(term.plain_rows()[5].trim_end(), "status 2");
}
