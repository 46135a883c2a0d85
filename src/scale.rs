/// Drawing area in abstract units; `padding` is inset on all four sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Viewport {
    pub const BACKTEST: Viewport = Viewport {
        width: 900.0,
        height: 220.0,
        padding: 30.0,
    };

    pub fn left(&self) -> f64 {
        self.padding
    }

    pub fn right(&self) -> f64 {
        self.width - self.padding
    }

    pub fn top(&self) -> f64 {
        self.padding
    }

    pub fn bottom(&self) -> f64 {
        self.height - self.padding
    }
}

/// Linear map from `[domain_min, domain_max]` onto `[range_start, range_end]`.
///
/// A zero-width domain collapses every input to `range_start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_min: f64,
    domain_max: f64,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    pub fn new(domain_min: f64, domain_max: f64, range_start: f64, range_end: f64) -> Self {
        Self {
            domain_min,
            domain_max,
            range_start,
            range_end,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.domain_max == self.domain_min
    }

    pub fn apply(&self, value: f64) -> f64 {
        if self.is_degenerate() || !value.is_finite() {
            return self.range_start;
        }
        let t = (value - self.domain_min) / (self.domain_max - self.domain_min);
        self.range_start + t * (self.range_end - self.range_start)
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.domain_min, self.domain_max)
    }
}

/// Shared x (sample index) and y (value) scales for series drawn together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScales {
    pub x: LinearScale,
    pub y: LinearScale,
    pub samples: usize,
}

impl ChartScales {
    /// Fits both scales to every series at once so they share one vertical
    /// range. Returns `None` when there is nothing to draw.
    pub fn fit(series: &[&[f64]], viewport: Viewport) -> Option<Self> {
        let samples = series.iter().map(|s| s.len()).max().unwrap_or(0);
        if samples == 0 {
            return None;
        }

        let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for value in series.iter().flat_map(|s| s.iter()).copied() {
            if !value.is_finite() {
                continue;
            }
            v_min = v_min.min(value);
            v_max = v_max.max(value);
        }
        if v_min > v_max {
            (v_min, v_max) = (0.0, 0.0);
        }

        let i_max = (samples - 1) as f64;
        Some(Self {
            x: LinearScale::new(0.0, i_max, viewport.left(), viewport.right()),
            // Screen y grows downward: the smallest value sits on the bottom edge.
            y: LinearScale::new(v_min, v_max, viewport.bottom(), viewport.top()),
            samples,
        })
    }

    pub fn x_at(&self, index: usize) -> f64 {
        self.x.apply(index as f64)
    }

    pub fn y_at(&self, value: f64) -> f64 {
        self.y.apply(value)
    }
}
