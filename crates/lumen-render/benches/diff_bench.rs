//! Benchmarks for output-line building and row diffing.
//!
//! Run with: cargo bench -p lumen-render --bench diff_bench

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lumen_render::{FrameBuffer, FrameDiffWriter, HeadlessTerminal, build_output_lines};
use std::hint::black_box;

const RESET: &str = "\x1b[0m";
const BACKGROUND: &str = "\x1b[48;5;235m";

/// A styled frame where every `stride`-th row carries `marker`.
fn make_frame(width: u16, height: u16, stride: u16, marker: &str) -> FrameBuffer {
    let lines = (0..height)
        .map(|row| {
            let tag = if stride > 0 && row % stride == 0 { marker } else { "" };
            format!("\x1b[1m{row:>4}\x1b[0m \x1b[34mcell content {tag}\x1b[0m")
        })
        .collect();
    FrameBuffer::from_lines(lines).clipped(width, height)
}

fn bench_build_output_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_output_lines");
    for &(w, h) in &[(80u16, 24u16), (200, 60)] {
        let frame = make_frame(w, h, 0, "");
        group.throughput(Throughput::Elements(u64::from(h)));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}")), &frame, |b, frame| {
            b.iter(|| black_box(build_output_lines(frame, w, h, BACKGROUND, RESET)));
        });
    }
    group.finish();
}

fn bench_write_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_diff");
    let (w, h) = (120u16, 40u16);
    let base = build_output_lines(&make_frame(w, h, 0, ""), w, h, BACKGROUND, RESET);

    for &(name, stride) in &[("unchanged", 0u16), ("every_8th", 8), ("all", 1)] {
        let next = build_output_lines(&make_frame(w, h, stride, "*"), w, h, BACKGROUND, RESET);
        group.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let mut term = HeadlessTerminal::new(w, h);
                    let mut writer = FrameDiffWriter::new();
                    writer
                        .write_diff(&base, &mut term, 0)
                        .expect("headless writes succeed");
                    (writer, term)
                },
                |(mut writer, mut term)| {
                    black_box(writer.write_diff(&next, &mut term, 0).expect("headless writes succeed"))
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build_output_lines, bench_write_diff);
criterion_main!(benches);
