use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use cartola_terminal::annotate::annotate_lineup;
use cartola_terminal::api::{parse_backtest_json, parse_lineup_json};
use cartola_terminal::backtest_chart::BacktestChart;
use cartola_terminal::path::Path;
use cartola_terminal::scale::{ChartScales, Viewport};
use cartola_terminal::window::trailing_window;

fn long_series(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            55.0 + 12.0 * (t / 7.0).sin() + 3.0 * (t / 2.3).cos()
        })
        .collect()
}

fn bench_scale_and_path(c: &mut Criterion) {
    let values = long_series(10_000);
    c.bench_function("scale_and_path_10k", |b| {
        b.iter(|| {
            let scales =
                ChartScales::fit(&[black_box(values.as_slice())], Viewport::BACKTEST).unwrap();
            let path = Path::from_values(&values, &scales);
            black_box(path.commands().len());
        })
    });
}

fn bench_path_to_string(c: &mut Criterion) {
    let values = long_series(2_000);
    let scales = ChartScales::fit(&[values.as_slice()], Viewport::BACKTEST).unwrap();
    let path = Path::from_values(&values, &scales);
    c.bench_function("path_to_string_2k", |b| {
        b.iter(|| {
            let text = black_box(&path).to_string();
            black_box(text.len());
        })
    });
}

fn bench_windowed_chart(c: &mut Criterion) {
    let result = parse_backtest_json(BACKTEST_JSON).expect("valid fixture json");
    c.bench_function("windowed_chart_build", |b| {
        b.iter(|| {
            let window = trailing_window(black_box(&result.series), 20);
            let chart = BacktestChart::build(window, Viewport::BACKTEST).unwrap();
            let segments: usize = chart
                .series
                .iter()
                .map(|s| s.visible_segments().len())
                .sum();
            black_box(segments);
        })
    });
}

fn bench_annotate_lineup(c: &mut Criterion) {
    let lineup = parse_lineup_json(LINEUP_JSON).expect("valid fixture json");
    c.bench_function("annotate_lineup", |b| {
        b.iter(|| {
            let annotated = annotate_lineup(black_box(&lineup));
            black_box(annotated.captain_count() + annotated.luxury_count());
        })
    });
}

fn bench_lineup_parse(c: &mut Criterion) {
    c.bench_function("lineup_parse", |b| {
        b.iter(|| {
            let lineup = parse_lineup_json(black_box(LINEUP_JSON)).unwrap();
            black_box(lineup.starters.len());
        })
    });
}

criterion_group!(
    perf,
    bench_scale_and_path,
    bench_path_to_string,
    bench_windowed_chart,
    bench_annotate_lineup,
    bench_lineup_parse
);
criterion_main!(perf);

static LINEUP_JSON: &str = include_str!("../tests/fixtures/lineup.json");
static BACKTEST_JSON: &str = include_str!("../tests/fixtures/backtest.json");
