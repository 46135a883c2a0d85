use crate::model::BacktestPoint;
use crate::path::{Path, Point, Segment, StrokeStyle};
use crate::scale::{ChartScales, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Actual,
    Predicted,
    Baseline,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [
        SeriesKind::Actual,
        SeriesKind::Predicted,
        SeriesKind::Baseline,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SeriesKind::Actual => "Actual",
            SeriesKind::Predicted => "Predicted",
            SeriesKind::Baseline => "Baseline",
        }
    }

    pub fn stroke(self) -> StrokeStyle {
        match self {
            SeriesKind::Actual => StrokeStyle::SOLID_HEAVY,
            SeriesKind::Predicted => StrokeStyle::DASHED_HEAVY,
            SeriesKind::Baseline => StrokeStyle::DOTTED_LIGHT,
        }
    }

    pub fn value(self, point: &BacktestPoint) -> f64 {
        match self {
            SeriesKind::Actual => point.actual_points,
            SeriesKind::Predicted => point.predicted_points,
            SeriesKind::Baseline => point.baseline_points,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub kind: SeriesKind,
    pub stroke: StrokeStyle,
    pub path: Path,
}

impl ChartSeries {
    pub fn visible_segments(&self) -> Vec<Segment> {
        self.path.dashed_segments(self.stroke.dash)
    }
}

/// Everything needed to draw the actual/predicted/baseline chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestChart {
    pub viewport: Viewport,
    pub scales: ChartScales,
    pub series: Vec<ChartSeries>,
}

impl BacktestChart {
    /// `None` for an empty window: nothing is scaled and nothing is drawn.
    pub fn build(points: &[BacktestPoint], viewport: Viewport) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let columns: Vec<Vec<f64>> = SeriesKind::ALL
            .iter()
            .map(|kind| points.iter().map(|p| kind.value(p)).collect())
            .collect();
        let refs: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
        let scales = ChartScales::fit(&refs, viewport)?;

        let series = SeriesKind::ALL
            .iter()
            .zip(&columns)
            .map(|(&kind, values)| ChartSeries {
                kind,
                stroke: kind.stroke(),
                path: Path::from_values(values, &scales),
            })
            .collect();

        Some(Self {
            viewport,
            scales,
            series,
        })
    }

    /// The two axis lines, x along the bottom edge and y along the left edge.
    pub fn axes(&self) -> [Segment; 2] {
        let vp = self.viewport;
        [
            Segment {
                from: Point {
                    x: vp.left(),
                    y: vp.bottom(),
                },
                to: Point {
                    x: vp.right(),
                    y: vp.bottom(),
                },
            },
            Segment {
                from: Point {
                    x: vp.left(),
                    y: vp.top(),
                },
                to: Point {
                    x: vp.left(),
                    y: vp.bottom(),
                },
            },
        ]
    }

    pub fn value_range(&self) -> (f64, f64) {
        self.scales.y.domain()
    }
}
