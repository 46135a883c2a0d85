use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::config::AppConfig;
use crate::model::{BacktestRequest, BacktestResult, Formation, LineupRequest, LineupResult};

const MAX_LOGS: usize = 200;
const BUDGET_STEP: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Squad,
    Backtest,
}

impl Screen {
    pub fn toggle(self) -> Self {
        match self {
            Screen::Squad => Screen::Backtest,
            Screen::Backtest => Screen::Squad,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Squad => "Squad",
            Screen::Backtest => "Backtest",
        }
    }
}

/// A successful response together with the moment it landed.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub data: T,
    pub fetched_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotState<T> {
    Empty,
    Loading { previous: Option<Loaded<T>> },
    Ready(Loaded<T>),
    Failed { previous: Option<Loaded<T>>, error: String },
}

/// "Last successful response" for one pipeline.
///
/// Every request gets a sequence number from [`ResultSlot::begin`]; only the
/// response carrying the latest number is accepted. A failure keeps whatever
/// was displayed before.
#[derive(Debug, Clone)]
pub struct ResultSlot<Req, T> {
    state: SlotState<T>,
    issued: u64,
    in_flight: Option<Req>,
}

impl<Req, T> Default for ResultSlot<Req, T> {
    fn default() -> Self {
        Self {
            state: SlotState::Empty,
            issued: 0,
            in_flight: None,
        }
    }
}

impl<Req: PartialEq, T> ResultSlot<Req, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SlotState<T> {
        &self.state
    }

    pub fn latest_seq(&self) -> u64 {
        self.issued
    }

    /// Returns the sequence number to tag the outbound request with, or
    /// `None` when the identical request is already in flight.
    pub fn begin(&mut self, request: Req) -> Option<u64> {
        if self.in_flight.as_ref() == Some(&request) {
            return None;
        }
        self.issued += 1;
        self.in_flight = Some(request);
        let previous = self.take_latest();
        self.state = SlotState::Loading { previous };
        Some(self.issued)
    }

    /// Accepts `data` if `seq` is the latest issued request still in flight.
    pub fn complete(&mut self, seq: u64, data: T) -> bool {
        if !self.accepts(seq) {
            return false;
        }
        self.in_flight = None;
        self.state = SlotState::Ready(Loaded {
            data,
            fetched_at: Local::now(),
        });
        true
    }

    pub fn fail(&mut self, seq: u64, error: impl Into<String>) -> bool {
        if !self.accepts(seq) {
            return false;
        }
        self.in_flight = None;
        let previous = self.take_latest();
        self.state = SlotState::Failed {
            previous,
            error: error.into(),
        };
        true
    }

    /// Data to display: the newest success, even while loading or after a failure.
    pub fn current(&self) -> Option<&T> {
        self.loaded().map(|l| &l.data)
    }

    pub fn fetched_at(&self) -> Option<DateTime<Local>> {
        self.loaded().map(|l| l.fetched_at)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SlotState::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SlotState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn status_label(&self) -> String {
        match &self.state {
            SlotState::Empty => "idle".to_string(),
            SlotState::Loading { .. } => "loading".to_string(),
            SlotState::Ready(l) => format!("ready {}", l.fetched_at.format("%H:%M:%S")),
            SlotState::Failed { .. } => "failed".to_string(),
        }
    }

    fn accepts(&self, seq: u64) -> bool {
        seq == self.issued && self.in_flight.is_some()
    }

    fn loaded(&self) -> Option<&Loaded<T>> {
        match &self.state {
            SlotState::Empty => None,
            SlotState::Ready(l) => Some(l),
            SlotState::Loading { previous } | SlotState::Failed { previous, .. } => {
                previous.as_ref()
            }
        }
    }

    fn take_latest(&mut self) -> Option<Loaded<T>> {
        match std::mem::replace(&mut self.state, SlotState::Empty) {
            SlotState::Empty => None,
            SlotState::Ready(l) => Some(l),
            SlotState::Loading { previous } | SlotState::Failed { previous, .. } => previous,
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub budget: u32,
    pub formation: Formation,
    pub top_k: u32,
    pub min_train_rounds: u32,
    pub chart_window: usize,
    pub source_label: String,
    pub lineup: ResultSlot<LineupRequest, LineupResult>,
    pub backtest: ResultSlot<BacktestRequest, BacktestResult>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub squad_scroll: u16,
    pub backtest_scroll: u16,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            screen: Screen::Squad,
            budget: config.budget,
            formation: config.formation,
            top_k: config.top_k,
            min_train_rounds: config.min_train_rounds,
            chart_window: config.chart_window,
            source_label: config.source_label(),
            lineup: ResultSlot::new(),
            backtest: ResultSlot::new(),
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            squad_scroll: 0,
            backtest_scroll: 0,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn lineup_request(&self) -> LineupRequest {
        LineupRequest {
            budget: self.budget,
            formation: self.formation,
        }
    }

    pub fn backtest_request(&self) -> BacktestRequest {
        BacktestRequest {
            budget: self.budget,
            formation: self.formation,
            top_k: self.top_k,
            min_train_rounds: self.min_train_rounds,
        }
    }

    /// Marks the lineup slot busy and returns the command to send, unless the
    /// same request is already running.
    pub fn request_lineup(&mut self) -> Option<ProviderCommand> {
        let request = self.lineup_request();
        let Some(seq) = self.lineup.begin(request.clone()) else {
            self.push_log("[INFO] Lineup request already running");
            return None;
        };
        self.push_log(format!(
            "[INFO] Generating lineup: {} / {}",
            request.budget, request.formation
        ));
        Some(ProviderCommand::FetchLineup { seq, request })
    }

    pub fn request_backtest(&mut self) -> Option<ProviderCommand> {
        let request = self.backtest_request();
        let Some(seq) = self.backtest.begin(request.clone()) else {
            self.push_log("[INFO] Backtest already running");
            return None;
        };
        self.push_log(format!(
            "[INFO] Running backtest: top_k={} min_train_rounds={}",
            request.top_k, request.min_train_rounds
        ));
        Some(ProviderCommand::FetchBacktest { seq, request })
    }

    pub fn adjust_budget(&mut self, steps: i64) {
        let next = (i64::from(self.budget) + steps * BUDGET_STEP).max(1);
        self.budget = u32::try_from(next).unwrap_or(u32::MAX);
    }

    pub fn cycle_formation(&mut self, forward: bool) {
        self.formation = if forward {
            self.formation.next()
        } else {
            self.formation.prev()
        };
    }

    pub fn scroll(&mut self, down: bool) {
        let offset = match self.screen {
            Screen::Squad => &mut self.squad_scroll,
            Screen::Backtest => &mut self.backtest_scroll,
        };
        *offset = if down {
            offset.saturating_add(1)
        } else {
            offset.saturating_sub(1)
        };
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    LineupLoaded {
        seq: u64,
        result: Box<LineupResult>,
    },
    LineupFailed {
        seq: u64,
        error: String,
    },
    BacktestLoaded {
        seq: u64,
        result: Box<BacktestResult>,
    },
    BacktestFailed {
        seq: u64,
        error: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchLineup { seq: u64, request: LineupRequest },
    FetchBacktest { seq: u64, request: BacktestRequest },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::LineupLoaded { seq, result } => {
            let starters = result.starters.len();
            if state.lineup.complete(seq, *result) {
                state.squad_scroll = 0;
                state.push_log(format!("[INFO] Lineup ready: {starters} starters"));
            } else {
                state.push_log(format!("[WARN] Discarded stale lineup response #{seq}"));
            }
        }
        Delta::LineupFailed { seq, error } => {
            let msg = format!("[WARN] Could not generate lineup: {error}");
            if state.lineup.fail(seq, error) {
                state.push_log(msg);
            } else {
                state.push_log(format!("[WARN] Discarded stale lineup failure #{seq}"));
            }
        }
        Delta::BacktestLoaded { seq, result } => {
            let rounds = result.series.len();
            if state.backtest.complete(seq, *result) {
                state.backtest_scroll = 0;
                state.push_log(format!("[INFO] Backtest ready: {rounds} rounds"));
            } else {
                state.push_log(format!("[WARN] Discarded stale backtest response #{seq}"));
            }
        }
        Delta::BacktestFailed { seq, error } => {
            let msg = format!("[WARN] Could not load backtest: {error}");
            if state.backtest.fail(seq, error) {
                state.push_log(msg);
            } else {
                state.push_log(format!("[WARN] Discarded stale backtest failure #{seq}"));
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
