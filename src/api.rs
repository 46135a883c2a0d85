use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::RequestBuilder;

use crate::http_client::http_client;
use crate::model::{BacktestRequest, BacktestResult, LineupRequest, LineupResult};
use crate::source::DataSource;

const LINEUP_PATH: &str = "/api/gerar-time";
const BACKTEST_PATH: &str = "/api/backtest/resumo";
const ERROR_BODY_LIMIT: usize = 200;

/// Optimizer and backtest endpoints behind one base address.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: String,
    lineup_timeout: Duration,
    backtest_timeout: Duration,
}

impl HttpSource {
    pub fn new(
        base: impl Into<String>,
        lineup_timeout: Duration,
        backtest_timeout: Duration,
    ) -> Self {
        Self {
            base: base.into(),
            lineup_timeout,
            backtest_timeout,
        }
    }
}

impl DataSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    fn fetch_lineup(&self, request: &LineupRequest) -> Result<LineupResult> {
        let url = endpoint_url(&self.base, LINEUP_PATH);
        let span = tracing::info_span!(
            "fetch_lineup",
            %url,
            budget = request.budget,
            formation = %request.formation
        );
        let _enter = span.enter();

        let req = http_client()?
            .post(&url)
            .json(request)
            .timeout(self.lineup_timeout);
        let body = send_for_body(req)?;
        parse_lineup_json(&body)
    }

    fn fetch_backtest(&self, request: &BacktestRequest) -> Result<BacktestResult> {
        let url = endpoint_url(&self.base, BACKTEST_PATH);
        let span = tracing::info_span!("fetch_backtest", %url, top_k = request.top_k);
        let _enter = span.enter();

        let req = http_client()?
            .get(&url)
            .query(request)
            .timeout(self.backtest_timeout);
        let body = send_for_body(req)?;
        parse_backtest_json(&body)
    }
}

pub fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

fn send_for_body(req: RequestBuilder) -> Result<String> {
    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        tracing::warn!(%status, "collaborator returned an error");
        return Err(anyhow!(
            "http {}: {}",
            status,
            truncate(&body, ERROR_BODY_LIMIT)
        ));
    }
    tracing::debug!(bytes = body.len(), "response received");
    Ok(body)
}

pub fn parse_lineup_json(raw: &str) -> Result<LineupResult> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty lineup response"));
    }
    serde_json::from_str(trimmed).context("invalid lineup json")
}

pub fn parse_backtest_json(raw: &str) -> Result<BacktestResult> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty backtest response"));
    }
    serde_json::from_str(trimmed).context("invalid backtest json")
}

fn truncate(text: &str, limit: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_without_double_slash() {
        assert_eq!(
            endpoint_url("http://localhost:8000/", LINEUP_PATH),
            "http://localhost:8000/api/gerar-time"
        );
        assert_eq!(
            endpoint_url("http://localhost:8000", BACKTEST_PATH),
            "http://localhost:8000/api/backtest/resumo"
        );
    }

    #[test]
    fn null_bodies_are_errors() {
        assert!(parse_lineup_json("null").is_err());
        assert!(parse_backtest_json("  ").is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("ação", 2), "aç...");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
