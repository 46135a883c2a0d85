use std::sync::Arc;

use anyhow::Result;

use crate::api::HttpSource;
use crate::config::{AppConfig, SourceKind};
use crate::demo::DemoSource;
use crate::model::{BacktestRequest, BacktestResult, LineupRequest, LineupResult};

/// Where both pipelines get their data from. Implementations are called from
/// worker threads and must not share mutable state between calls.
pub trait DataSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch_lineup(&self, request: &LineupRequest) -> Result<LineupResult>;

    fn fetch_backtest(&self, request: &BacktestRequest) -> Result<BacktestResult>;
}

pub fn source_from_config(config: &AppConfig) -> Arc<dyn DataSource> {
    match config.source {
        SourceKind::Http => Arc::new(HttpSource::new(
            config.api_base.clone(),
            config.lineup_timeout,
            config.backtest_timeout,
        )),
        SourceKind::Demo => Arc::new(DemoSource::new(config.demo_seed)),
    }
}
