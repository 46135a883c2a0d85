use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use anyhow::{Context, Result};

use crate::source::DataSource;
use crate::state::{Delta, ProviderCommand};

/// Runs fetches off the UI thread. Each command gets its own worker so the
/// lineup and backtest pipelines never wait on each other.
pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    source: Arc<dyn DataSource>,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("provider".into())
        .spawn(move || {
            tracing::info!(source = source.name(), "provider started");
            while let Ok(cmd) = cmd_rx.recv() {
                let worker_tx = tx.clone();
                let worker_source = Arc::clone(&source);
                let worker_cmd = cmd.clone();
                let spawned = thread::Builder::new().name("fetch".into()).spawn(move || {
                    run_command(worker_source.as_ref(), worker_cmd, &worker_tx)
                });
                if let Err(err) = spawned {
                    tracing::error!(%err, "failed to spawn fetch worker, fetching inline");
                    run_command(source.as_ref(), cmd, &tx);
                }
            }
            tracing::info!("provider stopped");
        })
        .context("failed to spawn provider thread")
}

/// Executes one command and reports the outcome. Blocking; exposed for tests.
pub fn run_command(source: &dyn DataSource, cmd: ProviderCommand, tx: &Sender<Delta>) {
    let delta = match cmd {
        ProviderCommand::FetchLineup { seq, request } => {
            match source.fetch_lineup(&request) {
                Ok(result) => {
                    tracing::info!(seq, starters = result.starters.len(), "lineup fetched");
                    Delta::LineupLoaded {
                        seq,
                        result: Box::new(result),
                    }
                }
                Err(err) => {
                    tracing::warn!(seq, error = %format!("{err:#}"), "lineup fetch failed");
                    Delta::LineupFailed {
                        seq,
                        error: format!("{err:#}"),
                    }
                }
            }
        }
        ProviderCommand::FetchBacktest { seq, request } => {
            match source.fetch_backtest(&request) {
                Ok(result) => {
                    tracing::info!(seq, rounds = result.series.len(), "backtest fetched");
                    Delta::BacktestLoaded {
                        seq,
                        result: Box::new(result),
                    }
                }
                Err(err) => {
                    tracing::warn!(seq, error = %format!("{err:#}"), "backtest fetch failed");
                    Delta::BacktestFailed {
                        seq,
                        error: format!("{err:#}"),
                    }
                }
            }
        }
    };
    let _ = tx.send(delta);
}
