//! Text views shared by the terminal renderer and the tests. Styling is left
//! to the caller.

use crate::annotate::{AnnotatedEntry, RoleFlags};
use crate::labels::{
    self, MISSING_VALUE, club_label, format_fixed, format_optional, format_percent,
    format_signed, name_label, position_label,
};
use crate::model::{BacktestMetrics, BacktestPoint, BacktestResult, LineupResult};

pub const CAPTAIN_BADGE: &str = "C x1.5";
pub const LUXURY_BADGE: &str = "LUX";

pub const BACKTEST_COLUMNS: [&str; 9] = [
    "Season", "Round", "Actual", "Pred", "Baseline", "Top-K", "Luxury", "Lux d", "Captain",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub title: String,
    pub badges: Vec<&'static str>,
    pub lines: Vec<String>,
}

pub fn badges(roles: RoleFlags) -> Vec<&'static str> {
    let mut out = Vec::new();
    if roles.captain {
        out.push(CAPTAIN_BADGE);
    }
    if roles.luxury_reserve {
        out.push(LUXURY_BADGE);
    }
    out
}

pub fn roster_card(annotated: &AnnotatedEntry<'_>) -> CardView {
    let entry = annotated.entry;
    let club = club_label(entry);
    let mut lines = vec![if club.is_empty() {
        position_label(entry).to_string()
    } else {
        format!("{} | {}", position_label(entry), club)
    }];
    lines.push(format!(
        "C$ {}  pred {}",
        format_fixed(entry.price),
        format_fixed(entry.predicted)
    ));
    if let Some(vol) = entry.volatility {
        lines.push(format!("std5 {}", format_fixed(vol)));
    }
    CardView {
        title: name_label(entry).to_string(),
        badges: badges(annotated.roles),
        lines,
    }
}

/// The six totals: the five optimizer sums plus the budget it was given.
pub fn summary_rows(lineup: &LineupResult) -> Vec<(&'static str, String)> {
    let summary = lineup.summary.clone().unwrap_or_default();
    vec![
        (
            "Starters cost",
            format_optional(summary.starters_cost, format_fixed),
        ),
        (
            "Points (no captain)",
            format_optional(summary.points_without_captain, format_fixed),
        ),
        (
            "Captain bonus",
            format_optional(summary.captain_bonus, format_fixed),
        ),
        (
            "Total points",
            format_optional(summary.total_points, format_fixed),
        ),
        ("Total cost", format_optional(summary.total_cost, format_fixed)),
        (
            "Budget",
            format_optional(lineup.budget_available, format_fixed),
        ),
    ]
}

pub fn captain_line(lineup: &LineupResult) -> String {
    match lineup.captain.as_ref() {
        Some(cap) => {
            let club = club_label(cap);
            let mut line = format!("Captain: {} ({})", name_label(cap), position_label(cap));
            if !club.is_empty() {
                line.push_str(&format!(" {club}"));
            }
            if let Some(pred) = cap.predicted {
                line.push_str(&format!("  pred {}", format_fixed(pred)));
            }
            line
        }
        None => "Captain: none".to_string(),
    }
}

pub fn luxury_line(lineup: &LineupResult) -> String {
    match lineup.luxury_reserve.as_ref() {
        Some(lux) => format!(
            "Luxury reserve: {} ({})  gain {}  beats starter {}",
            name_label(lux),
            position_label(lux),
            format_optional(lux.expected_gain, format_fixed),
            format_optional(lux.outperform_probability, format_percent),
        ),
        None => "Luxury reserve: none beats its starter".to_string(),
    }
}

pub fn metrics_rows(metrics: &BacktestMetrics) -> Vec<(&'static str, String)> {
    vec![
        ("MAE", format_optional(metrics.mae, format_fixed)),
        ("RMSE", format_optional(metrics.rmse, format_fixed)),
        ("Correlation", format_optional(metrics.correlation, format_fixed)),
        (
            "Top-K hit rate",
            format_optional(metrics.top_k_hit_rate_mean, format_percent),
        ),
        (
            "Return vs baseline",
            format_optional(metrics.mean_return_vs_baseline, format_signed),
        ),
        (
            "Rounds",
            metrics
                .rounds_evaluated
                .map(|n| n.to_string())
                .unwrap_or_else(|| MISSING_VALUE.to_string()),
        ),
    ]
}

pub fn config_line(result: &BacktestResult) -> String {
    let pairs = result.config_pairs();
    if pairs.is_empty() {
        return MISSING_VALUE.to_string();
    }
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn backtest_row(point: &BacktestPoint) -> [String; 9] {
    let captain = match (point.captain.as_deref(), point.captain_club.as_deref()) {
        (Some(name), Some(club)) => format!("{name} ({club})"),
        (Some(name), None) => name.to_string(),
        _ => MISSING_VALUE.to_string(),
    };
    [
        point.season.to_string(),
        point.round.to_string(),
        format_fixed(point.actual_points),
        format_fixed(point.predicted_points),
        format_fixed(point.baseline_points),
        format_percent(point.top_k_hit_rate),
        labels::yes_no(point.luxury_used).to_string(),
        format_signed(point.luxury_delta),
        captain,
    ]
}
