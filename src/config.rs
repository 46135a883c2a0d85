use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::model::Formation;
use crate::window::DEFAULT_WINDOW;

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
const DEFAULT_BUDGET: u32 = 200;
const DEFAULT_TOP_K: u32 = 20;
const DEFAULT_MIN_TRAIN_ROUNDS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Http,
    Demo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub source: SourceKind,
    pub demo_seed: Option<u64>,
    pub budget: u32,
    pub formation: Formation,
    pub top_k: u32,
    pub min_train_rounds: u32,
    pub chart_window: usize,
    pub lineup_timeout: Duration,
    pub backtest_timeout: Duration,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &str| text(key).and_then(|v| v.parse::<u64>().ok());

        let api_base = text("CARTOLA_API_BASE")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let source = match text("CARTOLA_SOURCE").map(|v| v.to_lowercase()).as_deref() {
            Some("demo") => SourceKind::Demo,
            _ => SourceKind::Http,
        };
        let formation = text("CARTOLA_FORMATION")
            .and_then(|v| v.parse::<Formation>().ok())
            .unwrap_or(Formation::F433);

        Self {
            api_base,
            source,
            demo_seed: number("CARTOLA_DEMO_SEED"),
            budget: number("CARTOLA_BUDGET")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_BUDGET)
                .max(1),
            formation,
            top_k: number("CARTOLA_TOP_K")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_TOP_K)
                .max(1),
            min_train_rounds: number("CARTOLA_MIN_TRAIN_ROUNDS")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_MIN_TRAIN_ROUNDS),
            chart_window: number("CARTOLA_CHART_WINDOW")
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(DEFAULT_WINDOW)
                .max(1),
            lineup_timeout: Duration::from_secs(
                number("CARTOLA_LINEUP_TIMEOUT_SECS").unwrap_or(30).max(5),
            ),
            backtest_timeout: Duration::from_secs(
                number("CARTOLA_BACKTEST_TIMEOUT_SECS")
                    .unwrap_or(600)
                    .max(30),
            ),
            log_dir: text("CARTOLA_LOG_DIR").map(PathBuf::from),
        }
    }

    pub fn source_label(&self) -> String {
        match self.source {
            SourceKind::Http => self.api_base.clone(),
            SourceKind::Demo => "demo data".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.source, SourceKind::Http);
        assert_eq!(cfg.budget, 200);
        assert_eq!(cfg.formation, Formation::F433);
        assert_eq!(cfg.top_k, 20);
        assert_eq!(cfg.min_train_rounds, 5);
        assert_eq!(cfg.chart_window, 20);
        assert!(cfg.log_dir.is_none());
    }

    #[test]
    fn overrides_and_clamps() {
        let cfg = config_from(&[
            ("CARTOLA_API_BASE", "https://api.example.com/"),
            ("CARTOLA_SOURCE", "DEMO"),
            ("CARTOLA_BUDGET", "0"),
            ("CARTOLA_FORMATION", "3-5-2"),
            ("CARTOLA_CHART_WINDOW", "0"),
            ("CARTOLA_LINEUP_TIMEOUT_SECS", "1"),
        ]);
        assert_eq!(cfg.api_base, "https://api.example.com");
        assert_eq!(cfg.source, SourceKind::Demo);
        assert_eq!(cfg.budget, 1);
        assert_eq!(cfg.formation, Formation::F352);
        assert_eq!(cfg.chart_window, 1);
        assert_eq!(cfg.lineup_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = config_from(&[
            ("CARTOLA_BUDGET", "lots"),
            ("CARTOLA_FORMATION", "2-3-5"),
            ("CARTOLA_TOP_K", "-3"),
        ]);
        assert_eq!(cfg.budget, 200);
        assert_eq!(cfg.formation, Formation::F433);
        assert_eq!(cfg.top_k, 20);
    }
}
