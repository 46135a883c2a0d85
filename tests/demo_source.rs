use cartola_terminal::annotate::annotate_lineup;
use cartola_terminal::demo::{DemoSource, summarize};
use cartola_terminal::model::{BacktestRequest, Formation, LineupRequest, Position};
use cartola_terminal::source::DataSource;

fn lineup_request(formation: Formation) -> LineupRequest {
    LineupRequest {
        budget: 140,
        formation,
    }
}

fn backtest_request() -> BacktestRequest {
    BacktestRequest {
        budget: 140,
        formation: Formation::F433,
        top_k: 20,
        min_train_rounds: 5,
    }
}

#[test]
fn demo_lineup_follows_formation_slots() {
    let source = DemoSource::new(Some(3));
    for formation in Formation::ALL {
        let lineup = source
            .fetch_lineup(&lineup_request(formation))
            .expect("demo never fails");
        assert_eq!(lineup.starters.len(), 11, "{formation}");
        for (pos, count) in formation.slots() {
            let filled = lineup
                .starters
                .iter()
                .filter(|p| p.position_id == Some(pos.id()))
                .count();
            assert_eq!(filled, usize::from(count), "{formation} {}", pos.code());
        }
        assert_eq!(lineup.bench.len(), Position::ALL.len());
        assert_eq!(lineup.formation.as_deref(), Some(formation.as_str()));
    }
}

#[test]
fn demo_captain_is_a_starter() {
    let source = DemoSource::new(Some(9));
    let lineup = source
        .fetch_lineup(&lineup_request(Formation::F442))
        .unwrap();
    let annotated = annotate_lineup(&lineup);
    assert_eq!(annotated.captain_count(), 1);
    assert!(annotated.bench.iter().all(|a| !a.roles.captain));
    assert!(annotated.luxury_count() <= 1);

    let summary = lineup.summary.unwrap();
    let bonus = summary.captain_bonus.unwrap();
    let without = summary.points_without_captain.unwrap();
    assert!((summary.total_points.unwrap() - (without + bonus)).abs() < 0.02);
}

#[test]
fn seeded_demo_is_reproducible() {
    let a = DemoSource::new(Some(42));
    let b = DemoSource::new(Some(42));
    let request = lineup_request(Formation::F352);
    assert_eq!(a.fetch_lineup(&request).unwrap(), b.fetch_lineup(&request).unwrap());
    assert_eq!(
        a.fetch_backtest(&backtest_request()).unwrap(),
        b.fetch_backtest(&backtest_request()).unwrap()
    );
}

#[test]
fn demo_backtest_is_chronological_and_summarized() {
    let source = DemoSource::new(Some(5));
    let result = source.fetch_backtest(&backtest_request()).unwrap();
    assert!(!result.series.is_empty());
    assert!(result.series.windows(2).all(|w| w[0].round < w[1].round));
    assert!(
        result
            .series
            .iter()
            .all(|p| (0.0..=1.0).contains(&p.top_k_hit_rate))
    );
    assert_eq!(result.metrics, summarize(&result.series));
    assert_eq!(
        result.metrics.rounds_evaluated,
        Some(result.series.len() as u32)
    );
    assert!(result.config_pairs().iter().any(|(k, v)| k == "top_k" && v == "20"));
}

#[test]
fn seeded_backtest_varies_with_budget_and_formation() {
    let source = DemoSource::new(Some(42));
    let base = source.fetch_backtest(&backtest_request()).unwrap();
    let richer = source
        .fetch_backtest(&BacktestRequest {
            budget: 180,
            ..backtest_request()
        })
        .unwrap();
    let other_shape = source
        .fetch_backtest(&BacktestRequest {
            formation: Formation::F532,
            ..backtest_request()
        })
        .unwrap();
    assert_ne!(base.series, richer.series);
    assert_ne!(base.series, other_shape.series);
}
