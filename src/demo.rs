use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::model::{
    BacktestMetrics, BacktestPoint, BacktestRequest, BacktestResult, CaptainRef, LineupRequest,
    LineupResult, LineupSummary, LuxuryReserve, Position, RosterEntry,
};
use crate::source::DataSource;

const POOL_PER_POSITION: u64 = 12;
const LAST_ROUND: u32 = 38;
const DEMO_SEASON: i32 = 2024;

const CLUBS: &[(u64, &str)] = &[
    (262, "Flamengo"),
    (275, "Palmeiras"),
    (276, "Sao Paulo"),
    (264, "Corinthians"),
    (282, "Atletico-MG"),
    (284, "Gremio"),
    (285, "Internacional"),
    (263, "Botafogo"),
    (266, "Fluminense"),
    (293, "Athletico-PR"),
];

const NAMES: &[&str] = &[
    "Rossi", "Varela", "Gomes", "Arias", "Pedro", "Hulk", "Cano", "Veiga", "Estevao", "Savarino",
    "Luiz", "Marlon", "Bruno", "Caio", "Diego", "Erick", "Fabio", "Gabriel", "Hugo", "Igor",
];

/// Offline source with plausible random data. With a seed, every call for the
/// same request returns the same result.
#[derive(Debug, Clone, Default)]
pub struct DemoSource {
    seed: Option<u64>,
}

impl DemoSource {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    fn rng(&self, salt: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ salt),
            None => StdRng::from_entropy(),
        }
    }
}

impl DataSource for DemoSource {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn fetch_lineup(&self, request: &LineupRequest) -> Result<LineupResult> {
        let mut rng = self.rng(u64::from(request.budget) << 8 | request.formation as u64);
        Ok(seed_lineup(&mut rng, request))
    }

    fn fetch_backtest(&self, request: &BacktestRequest) -> Result<BacktestResult> {
        let mut rng = self.rng(
            u64::from(request.budget) << 40
                | (request.formation as u64) << 32
                | u64::from(request.top_k) << 16
                | u64::from(request.min_train_rounds),
        );
        Ok(seed_backtest(&mut rng, request))
    }
}

fn seed_pool(rng: &mut StdRng) -> Vec<RosterEntry> {
    let mut pool = Vec::new();
    for pos in Position::ALL {
        for n in 0..POOL_PER_POSITION {
            let (club_id, club) = CLUBS[rng.gen_range(0..CLUBS.len())];
            let name = NAMES[rng.gen_range(0..NAMES.len())];
            let price: f64 = round2(rng.gen_range(2.0..22.0));
            let predicted = round2(price * 0.35 + rng.gen_range(-1.5..3.5));
            pool.push(RosterEntry {
                id: Some(u64::from(pos.id()) * 1000 + n),
                short_name: Some(name.to_string()),
                full_name: Some(format!("{name} {}", club)),
                club_name: Some(club.to_string()),
                club_id: Some(club_id),
                position_code: Some(pos.code().to_string()),
                position_id: Some(pos.id()),
                price,
                predicted,
                volatility: Some(round2(rng.gen_range(0.5..6.0))),
            });
        }
    }
    pool.sort_by(|a, b| b.predicted.total_cmp(&a.predicted));
    pool
}

fn seed_lineup(rng: &mut StdRng, request: &LineupRequest) -> LineupResult {
    let mut pool = seed_pool(rng);

    let mut starters = Vec::new();
    for (pos, count) in request.formation.slots() {
        for _ in 0..count {
            if let Some(idx) = pool
                .iter()
                .position(|p| p.position_id == Some(pos.id()))
            {
                starters.push(pool.remove(idx));
            }
        }
    }

    let mut bench = Vec::new();
    for pos in [
        Position::Goalkeeper,
        Position::CentreBack,
        Position::FullBack,
        Position::Midfielder,
        Position::Forward,
    ] {
        if let Some(idx) = pool
            .iter()
            .position(|p| p.position_id == Some(pos.id()))
        {
            bench.push(pool.remove(idx));
        }
    }

    let captain = starters
        .iter()
        .max_by(|a, b| a.predicted.total_cmp(&b.predicted))
        .map(|c| CaptainRef {
            id: c.id,
            name: c.short_name.clone(),
            position_code: c.position_code.clone(),
            club_name: c.club_name.clone(),
            predicted: Some(c.predicted),
        });

    let luxury_reserve = pick_luxury(&starters, &bench);

    let starters_cost: f64 = starters.iter().map(|p| p.price).sum();
    let points: f64 = starters.iter().map(|p| p.predicted).sum();
    let bonus = captain
        .as_ref()
        .and_then(|c| c.predicted)
        .map(|p| 0.5 * p)
        .unwrap_or(0.0);

    LineupResult {
        starters,
        bench,
        luxury_reserve,
        captain,
        summary: Some(LineupSummary {
            starters_cost: Some(round2(starters_cost)),
            points_without_captain: Some(round2(points)),
            captain_bonus: Some(round2(bonus)),
            total_points: Some(round2(points + bonus)),
            total_cost: Some(round2(starters_cost)),
        }),
        formation: Some(request.formation.to_string()),
        budget_available: Some(f64::from(request.budget)),
    }
}

/// Bench player with the best expected improvement over the strongest
/// starter at the same position, treating both scores as normal.
fn pick_luxury(starters: &[RosterEntry], bench: &[RosterEntry]) -> Option<LuxuryReserve> {
    let mut best: Option<(f64, f64, &RosterEntry)> = None;
    for reserve in bench {
        let Some(starter) = starters
            .iter()
            .filter(|s| s.position_id == reserve.position_id)
            .max_by(|a, b| a.predicted.total_cmp(&b.predicted))
        else {
            continue;
        };
        let mu = reserve.predicted - starter.predicted;
        let sigma = (reserve.volatility.unwrap_or(0.0).powi(2)
            + starter.volatility.unwrap_or(0.0).powi(2))
        .max(1e-9)
        .sqrt();
        let z = mu / sigma;
        let gain = mu * normal_cdf(z) + sigma * normal_pdf(z);
        if best.is_none_or(|(g, ..)| gain > g) {
            best = Some((gain, normal_cdf(z), reserve));
        }
    }
    best.map(|(gain, p, r)| LuxuryReserve {
        id: r.id,
        name: r.short_name.clone(),
        position_code: r.position_code.clone(),
        club_name: r.club_name.clone(),
        expected_gain: Some(gain),
        outperform_probability: Some(p),
    })
}

fn seed_backtest(rng: &mut StdRng, request: &BacktestRequest) -> BacktestResult {
    let first_round = (request.min_train_rounds + 1).min(LAST_ROUND);
    let mut series = Vec::new();
    for round in first_round..=LAST_ROUND {
        let predicted: f64 = rng.gen_range(45.0..70.0);
        let actual: f64 = (predicted + rng.gen_range(-18.0..15.0)).max(0.0);
        let baseline: f64 = (actual + rng.gen_range(-12.0..8.0)).max(0.0);
        let luxury_used = rng.gen_bool(0.3);
        let (_, club) = CLUBS[rng.gen_range(0..CLUBS.len())];
        series.push(BacktestPoint {
            season: DEMO_SEASON,
            round,
            actual_points: round2(actual),
            predicted_points: round2(predicted),
            baseline_points: round2(baseline),
            top_k_hit_rate: (rng.gen_range(0.15..0.6_f64) * 10_000.0).round() / 10_000.0,
            luxury_used,
            luxury_delta: if luxury_used {
                round2(rng.gen_range(0.5..9.0))
            } else {
                0.0
            },
            captain: Some(NAMES[rng.gen_range(0..NAMES.len())].to_string()),
            captain_club: Some(club.to_string()),
        });
    }

    BacktestResult {
        config: json!({
            "cartoletas": f64::from(request.budget),
            "formacao": request.formation.as_str(),
            "top_k": request.top_k,
            "min_train_rounds": request.min_train_rounds,
        }),
        metrics: summarize(&series),
        series,
    }
}

/// Aggregate metrics over a series, as the backtest service reports them.
pub fn summarize(series: &[BacktestPoint]) -> BacktestMetrics {
    let n = series.len();
    if n == 0 {
        return BacktestMetrics {
            rounds_evaluated: Some(0),
            ..Default::default()
        };
    }
    let nf = n as f64;
    let actual: Vec<f64> = series.iter().map(|p| p.actual_points).collect();
    let predicted: Vec<f64> = series.iter().map(|p| p.predicted_points).collect();

    let mae = actual
        .iter()
        .zip(&predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / nf;
    let rmse = (actual
        .iter()
        .zip(&predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / nf)
        .sqrt();
    let hit = series.iter().map(|p| p.top_k_hit_rate).sum::<f64>() / nf;
    let ret = series
        .iter()
        .map(|p| p.actual_points - p.baseline_points)
        .sum::<f64>()
        / nf;

    BacktestMetrics {
        mae: Some(round3(mae)),
        rmse: Some(round3(rmse)),
        correlation: Some(round3(pearson(&actual, &predicted))),
        top_k_hit_rate_mean: Some((hit * 10_000.0).round() / 10_000.0),
        mean_return_vs_baseline: Some(round3(ret)),
        rounds_evaluated: u32::try_from(n).ok(),
    }
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || a.len() != b.len() {
        return 0.0;
    }
    let n = a.len() as f64;
    let ma = a.iter().sum::<f64>() / n;
    let mb = b.iter().sum::<f64>() / n;
    let (mut cov, mut va, mut vb) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma).powi(2);
        vb += (y - mb).powi(2);
    }
    let denom = (va * vb).sqrt();
    if denom == 0.0 { 0.0 } else { cov / denom }
}

fn normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

// Abramowitz-Stegun 7.1.26; error below 1.5e-7.
fn normal_cdf(z: f64) -> f64 {
    let x = z.abs() / std::f64::consts::SQRT_2;
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    let erf = 1.0 - poly * (-x * x).exp();
    if z >= 0.0 {
        0.5 * (1.0 + erf)
    } else {
        0.5 * (1.0 - erf)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_cdf_is_symmetric() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.0) + normal_cdf(-1.0) - 1.0).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
    }

    #[test]
    fn pearson_of_identical_series_is_one() {
        let a = [1.0, 2.0, 4.0, 8.0];
        assert!((pearson(&a, &a) - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[1.0], &[1.0]), 0.0);
        assert_eq!(pearson(&[2.0, 2.0], &[1.0, 3.0]), 0.0);
    }

    #[test]
    fn summarize_empty_series() {
        let metrics = summarize(&[]);
        assert_eq!(metrics.rounds_evaluated, Some(0));
        assert!(metrics.mae.is_none());
    }
}
