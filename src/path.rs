use std::fmt;

use crate::scale::ChartScales;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
}

impl PathCommand {
    pub fn point(&self) -> Point {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => *p,
        }
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCommand::MoveTo(p) => write!(f, "M {:.2} {:.2}", p.x, p.y),
            PathCommand::LineTo(p) => write!(f, "L {:.2} {:.2}", p.x, p.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    pub fn length(&self) -> f64 {
        (self.to.x - self.from.x).hypot(self.to.y - self.from.y)
    }

    fn lerp(&self, t: f64) -> Point {
        Point {
            x: self.from.x + (self.to.x - self.from.x) * t,
            y: self.from.y + (self.to.y - self.from.y) * t,
        }
    }
}

/// Ordered draw commands for one series: a move-to followed by line-tos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    /// One command per sample, in index order, through the shared scales.
    pub fn from_values(values: &[f64], scales: &ChartScales) -> Self {
        let commands = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let p = Point {
                    x: scales.x_at(i),
                    y: scales.y_at(v),
                };
                if i == 0 {
                    PathCommand::MoveTo(p)
                } else {
                    PathCommand::LineTo(p)
                }
            })
            .collect();
        Self { commands }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.commands.windows(2).filter_map(|pair| match pair[1] {
            PathCommand::LineTo(to) => Some(Segment {
                from: pair[0].point(),
                to,
            }),
            PathCommand::MoveTo(_) => None,
        })
    }

    /// Splits the stroke into visible pieces following `dash`. The dash phase
    /// carries across segment joins so the pattern reads as one continuous line.
    pub fn dashed_segments(&self, dash: Option<Dash>) -> Vec<Segment> {
        let Some(dash) = dash.filter(Dash::is_drawable) else {
            return self.segments().collect();
        };

        let period = dash.on + dash.off;
        let mut phase = 0.0_f64;
        let mut out = Vec::new();
        for seg in self.segments() {
            let len = seg.length();
            if len == 0.0 {
                continue;
            }
            let mut pos = 0.0_f64;
            while pos < len {
                let in_on = phase < dash.on;
                let remaining_in_state = if in_on {
                    dash.on - phase
                } else {
                    period - phase
                };
                let step = remaining_in_state.min(len - pos);
                if in_on {
                    out.push(Segment {
                        from: seg.lerp(pos / len),
                        to: seg.lerp((pos + step) / len),
                    });
                }
                pos += step;
                phase = (phase + step) % period;
            }
        }
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{cmd}")?;
        }
        Ok(())
    }
}

/// On/off lengths, in viewport units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub on: f64,
    pub off: f64,
}

impl Dash {
    fn is_drawable(&self) -> bool {
        self.on > 0.0 && self.off >= 0.0 && (self.on + self.off).is_finite()
    }
}

/// Stroke weight and dash pattern; colour is left to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub dash: Option<Dash>,
}

impl StrokeStyle {
    pub const SOLID_HEAVY: StrokeStyle = StrokeStyle {
        width: 2.0,
        dash: None,
    };
    pub const DASHED_HEAVY: StrokeStyle = StrokeStyle {
        width: 2.0,
        dash: Some(Dash { on: 6.0, off: 4.0 }),
    };
    pub const DOTTED_LIGHT: StrokeStyle = StrokeStyle {
        width: 1.0,
        dash: Some(Dash { on: 2.0, off: 6.0 }),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::Viewport;

    const VP: Viewport = Viewport {
        width: 100.0,
        height: 50.0,
        padding: 5.0,
    };

    #[test]
    fn first_command_moves_then_lines() {
        let values = [1.0, 2.0, 3.0];
        let scales = ChartScales::fit(&[&values], VP).unwrap();
        let path = Path::from_values(&values, &scales);
        assert!(matches!(path.commands()[0], PathCommand::MoveTo(_)));
        assert!(
            path.commands()[1..]
                .iter()
                .all(|c| matches!(c, PathCommand::LineTo(_)))
        );
        assert_eq!(path.to_string(), "M 5.00 45.00 L 50.00 25.00 L 95.00 5.00");
    }

    #[test]
    fn generation_is_deterministic() {
        let values = [4.2, 1.7, 9.9, 3.3];
        let scales = ChartScales::fit(&[&values], VP).unwrap();
        let a = Path::from_values(&values, &scales).to_string();
        let b = Path::from_values(&values, &scales).to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn single_point_has_no_segments() {
        let scales = ChartScales::fit(&[&[3.0]], VP).unwrap();
        let path = Path::from_values(&[3.0], &scales);
        assert_eq!(path.commands().len(), 1);
        assert_eq!(path.segments().count(), 0);
        assert_eq!(path.to_string(), "M 5.00 45.00");
    }

    #[test]
    fn solid_stroke_keeps_segments_whole() {
        let values = [0.0, 1.0, 0.0];
        let scales = ChartScales::fit(&[&values], VP).unwrap();
        let path = Path::from_values(&values, &scales);
        assert_eq!(path.dashed_segments(None).len(), 2);
    }

    #[test]
    fn dashes_cover_the_on_fraction() {
        let values = [0.0, 0.0];
        let scales = ChartScales::fit(&[&values], VP).unwrap();
        let path = Path::from_values(&values, &scales);
        // Horizontal line of length 90 with a 6/4 dash: nine full periods.
        let pieces = path.dashed_segments(Some(Dash { on: 6.0, off: 4.0 }));
        assert_eq!(pieces.len(), 9);
        let drawn: f64 = pieces.iter().map(Segment::length).sum();
        assert!((drawn - 54.0).abs() < 1e-9);
    }

    #[test]
    fn dash_phase_carries_across_joins() {
        let scales = ChartScales::fit(&[&[0.0, 0.0, 0.0]], VP).unwrap();
        let path = Path::from_values(&[0.0, 0.0, 0.0], &scales);
        // Two 45-unit segments; a 10/10 dash splits one dash across the join.
        let pieces = path.dashed_segments(Some(Dash {
            on: 10.0,
            off: 10.0,
        }));
        let drawn: f64 = pieces.iter().map(Segment::length).sum();
        assert!((drawn - 50.0).abs() < 1e-9);
    }
}
