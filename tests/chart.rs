use proptest::prelude::*;

use cartola_terminal::backtest_chart::{BacktestChart, SeriesKind};
use cartola_terminal::model::BacktestPoint;
use cartola_terminal::path::{Path, PathCommand};
use cartola_terminal::scale::{ChartScales, Viewport};
use cartola_terminal::window::trailing_window;

const VP: Viewport = Viewport::BACKTEST;

fn point(round: u32, actual: f64, predicted: f64, baseline: f64) -> BacktestPoint {
    BacktestPoint {
        season: 2024,
        round,
        actual_points: actual,
        predicted_points: predicted,
        baseline_points: baseline,
        top_k_hit_rate: 0.25,
        luxury_used: false,
        luxury_delta: 0.0,
        captain: None,
        captain_club: None,
    }
}

fn arb_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-5000i32..5000, 2..80)
        .prop_map(|raw| raw.into_iter().map(|v| f64::from(v) / 10.0).collect())
}

proptest! {
    /// x is strictly increasing in the index and hits both inset edges.
    #[test]
    fn x_scale_is_monotonic_with_exact_edges(values in arb_series()) {
        let scales = ChartScales::fit(&[values.as_slice()], VP).unwrap();
        let n = values.len();
        prop_assert_eq!(scales.x_at(0), VP.left());
        prop_assert_eq!(scales.x_at(n - 1), VP.right());
        for i in 1..n {
            prop_assert!(scales.x_at(i) > scales.x_at(i - 1));
        }
    }

    /// Larger values sit higher on screen; the extremes land on the edges.
    #[test]
    fn y_scale_is_monotonic_with_exact_edges(values in arb_series()) {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assume!(max > min);

        let scales = ChartScales::fit(&[values.as_slice()], VP).unwrap();
        prop_assert_eq!(scales.y_at(min), VP.bottom());
        prop_assert_eq!(scales.y_at(max), VP.top());
        for a in &values {
            for b in &values {
                if a < b {
                    prop_assert!(scales.y_at(*a) > scales.y_at(*b));
                }
            }
        }
    }

    /// Every generated coordinate is finite and inside the inset box.
    #[test]
    fn path_stays_inside_viewport(values in prop::collection::vec(-1.0e6..1.0e6_f64, 1..60)) {
        let scales = ChartScales::fit(&[values.as_slice()], VP).unwrap();
        let path = Path::from_values(&values, &scales);
        prop_assert_eq!(path.commands().len(), values.len());
        for cmd in path.commands() {
            let p = cmd.point();
            prop_assert!(p.x.is_finite() && p.y.is_finite());
            prop_assert!(p.x >= VP.left() - 1e-9 && p.x <= VP.right() + 1e-9);
            prop_assert!(p.y >= VP.top() - 1e-9 && p.y <= VP.bottom() + 1e-9);
        }
    }

    /// The window is a contiguous suffix of length min(M, K).
    #[test]
    fn window_is_a_suffix(len in 0usize..120, k in 0usize..40) {
        let series: Vec<usize> = (0..len).collect();
        let window = trailing_window(&series, k);
        prop_assert_eq!(window.len(), len.min(k));
        prop_assert!(series.ends_with(window));
        if len <= k {
            prop_assert_eq!(window, series.as_slice());
        }
    }
}

#[test]
fn path_is_move_then_lines_in_index_order() {
    let values = [10.0, 30.0, 20.0];
    let scales = ChartScales::fit(&[values.as_slice()], VP).unwrap();
    let path = Path::from_values(&values, &scales);
    let cmds = path.commands();
    assert!(matches!(cmds[0], PathCommand::MoveTo(_)));
    assert!(cmds[1..].iter().all(|c| matches!(c, PathCommand::LineTo(_))));
    assert_eq!(
        path.to_string(),
        "M 30.00 190.00 L 450.00 30.00 L 870.00 110.00"
    );
}

#[test]
fn path_generation_is_deterministic() {
    let values = [61.37, 48.2, 55.0, 70.11];
    let scales = ChartScales::fit(&[values.as_slice()], VP).unwrap();
    let first = Path::from_values(&values, &scales).to_string();
    let second = Path::from_values(&values, &scales).to_string();
    assert_eq!(first, second);
}

#[test]
fn empty_window_draws_nothing() {
    assert!(BacktestChart::build(&[], VP).is_none());
}

#[test]
fn single_round_collapses_to_finite_point() {
    let chart = BacktestChart::build(&[point(1, 50.0, 50.0, 50.0)], VP).unwrap();
    for series in &chart.series {
        let p = series.path.commands()[0].point();
        assert_eq!(p.x, VP.left());
        assert_eq!(p.y, VP.bottom());
        assert!(series.visible_segments().is_empty());
    }
}

#[test]
fn three_series_share_one_vertical_scale() {
    let points = [point(1, 40.0, 55.0, 30.0), point(2, 60.0, 50.0, 70.0)];
    let chart = BacktestChart::build(&points, VP).unwrap();
    assert_eq!(chart.value_range(), (30.0, 70.0));
    let kinds: Vec<SeriesKind> = chart.series.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, SeriesKind::ALL.to_vec());

    let baseline = &chart.series[2];
    assert_eq!(baseline.path.commands()[0].point().y, VP.bottom());
    assert_eq!(baseline.path.commands()[1].point().y, VP.top());
}

#[test]
fn strokes_are_distinguishable_without_colour() {
    let styles: Vec<_> = SeriesKind::ALL.iter().map(|k| k.stroke()).collect();
    for i in 0..styles.len() {
        for j in (i + 1)..styles.len() {
            assert_ne!(styles[i], styles[j]);
        }
    }
    assert!(SeriesKind::Actual.stroke().dash.is_none());
}

#[test]
fn twenty_five_rounds_window_to_last_twenty() {
    let series: Vec<BacktestPoint> = (0..25)
        .map(|i| point(i + 1, f64::from(i), 0.0, 0.0))
        .collect();
    let window = trailing_window(&series, 20);
    assert_eq!(window.len(), 20);
    assert_eq!(window[0], series[5]);
    assert_eq!(window[19], series[24]);

    let chart = BacktestChart::build(window, VP).unwrap();
    assert_eq!(chart.scales.samples, 20);
}
