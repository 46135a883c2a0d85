use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type PlayerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Goalkeeper,
    FullBack,
    CentreBack,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::Goalkeeper,
        Position::FullBack,
        Position::CentreBack,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Maps the optimizer's numeric `posicao_id` (1..=5).
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::FullBack),
            3 => Some(Position::CentreBack),
            4 => Some(Position::Midfielder),
            5 => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Position::Goalkeeper => 1,
            Position::FullBack => 2,
            Position::CentreBack => 3,
            Position::Midfielder => 4,
            Position::Forward => 5,
        }
    }

    /// Short code, identical to the `pos` the optimizer emits.
    pub fn code(self) -> &'static str {
        match self {
            Position::Goalkeeper => "G",
            Position::FullBack => "L",
            Position::CentreBack => "Z",
            Position::Midfielder => "M",
            Position::Forward => "A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formation {
    #[serde(rename = "4-3-3")]
    F433,
    #[serde(rename = "4-4-2")]
    F442,
    #[serde(rename = "3-4-3")]
    F343,
    #[serde(rename = "3-5-2")]
    F352,
    #[serde(rename = "5-3-2")]
    F532,
}

impl Formation {
    pub const ALL: [Formation; 5] = [
        Formation::F433,
        Formation::F442,
        Formation::F343,
        Formation::F352,
        Formation::F532,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Formation::F433 => "4-3-3",
            Formation::F442 => "4-4-2",
            Formation::F343 => "3-4-3",
            Formation::F352 => "3-5-2",
            Formation::F532 => "5-3-2",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Formation::F433 => Formation::F442,
            Formation::F442 => Formation::F343,
            Formation::F343 => Formation::F352,
            Formation::F352 => Formation::F532,
            Formation::F532 => Formation::F433,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Formation::F433 => Formation::F532,
            Formation::F442 => Formation::F433,
            Formation::F343 => Formation::F442,
            Formation::F352 => Formation::F343,
            Formation::F532 => Formation::F352,
        }
    }

    /// Starter slots per position, in `Position::ALL` order.
    pub fn slots(self) -> [(Position, u8); 5] {
        let (full_backs, centre_backs, midfielders, forwards) = match self {
            Formation::F433 => (2, 2, 3, 3),
            Formation::F442 => (2, 2, 4, 2),
            Formation::F343 => (0, 3, 4, 3),
            Formation::F352 => (0, 3, 5, 2),
            Formation::F532 => (2, 3, 3, 2),
        };
        [
            (Position::Goalkeeper, 1),
            (Position::FullBack, full_backs),
            (Position::CentreBack, centre_backs),
            (Position::Midfielder, midfielders),
            (Position::Forward, forwards),
        ]
    }

    pub fn composition_label(self) -> String {
        self.slots()
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(pos, count)| format!("{count}{}", pos.code()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Formation {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        Formation::ALL
            .into_iter()
            .find(|f| f.as_str() == trimmed)
            .ok_or_else(|| anyhow!("unknown formation: {trimmed}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineupRequest {
    #[serde(rename = "cartoletas")]
    pub budget: u32,
    #[serde(rename = "formacao")]
    pub formation: Formation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacktestRequest {
    #[serde(rename = "cartoletas")]
    pub budget: u32,
    #[serde(rename = "formacao")]
    pub formation: Formation,
    pub top_k: u32,
    pub min_train_rounds: u32,
}

/// One roster entry (starter or bench) as returned by the optimizer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "atleta_id", default, deserialize_with = "de_opt_id")]
    pub id: Option<PlayerId>,
    #[serde(rename = "apelido", default, deserialize_with = "de_opt_text")]
    pub short_name: Option<String>,
    #[serde(rename = "nome", default, deserialize_with = "de_opt_text")]
    pub full_name: Option<String>,
    #[serde(rename = "clube_nome", default, deserialize_with = "de_opt_text")]
    pub club_name: Option<String>,
    #[serde(rename = "clube_id", default, deserialize_with = "de_opt_id")]
    pub club_id: Option<u64>,
    #[serde(rename = "pos", default, deserialize_with = "de_opt_text")]
    pub position_code: Option<String>,
    #[serde(rename = "posicao_id", default, deserialize_with = "de_opt_small")]
    pub position_id: Option<u8>,
    #[serde(rename = "preco")]
    pub price: f64,
    #[serde(rename = "pred")]
    pub predicted: f64,
    #[serde(rename = "std_5", default, deserialize_with = "de_opt_f64")]
    pub volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CaptainRef {
    #[serde(rename = "atleta_id", default, deserialize_with = "de_opt_id")]
    pub id: Option<PlayerId>,
    #[serde(rename = "nome", default, deserialize_with = "de_opt_text")]
    pub name: Option<String>,
    #[serde(rename = "pos", default, deserialize_with = "de_opt_text")]
    pub position_code: Option<String>,
    #[serde(rename = "clube_nome", default, deserialize_with = "de_opt_text")]
    pub club_name: Option<String>,
    #[serde(rename = "pred", default, deserialize_with = "de_opt_f64")]
    pub predicted: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LuxuryReserve {
    #[serde(rename = "atleta_id", default, deserialize_with = "de_opt_id")]
    pub id: Option<PlayerId>,
    #[serde(rename = "nome", default, deserialize_with = "de_opt_text")]
    pub name: Option<String>,
    #[serde(rename = "pos", default, deserialize_with = "de_opt_text")]
    pub position_code: Option<String>,
    #[serde(rename = "clube_nome", default, deserialize_with = "de_opt_text")]
    pub club_name: Option<String>,
    #[serde(rename = "expected_gain", default, deserialize_with = "de_opt_f64")]
    pub expected_gain: Option<f64>,
    #[serde(
        rename = "p_reserva_supera_titular",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub outperform_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LineupSummary {
    #[serde(rename = "custo_titulares", default, deserialize_with = "de_opt_f64")]
    pub starters_cost: Option<f64>,
    #[serde(
        rename = "pontos_previstos_titulares_sem_capitao",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub points_without_captain: Option<f64>,
    #[serde(rename = "bonus_capitao", default, deserialize_with = "de_opt_f64")]
    pub captain_bonus: Option<f64>,
    #[serde(
        rename = "pontos_previstos_total_com_capitao",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub total_points: Option<f64>,
    #[serde(rename = "custo_total", default, deserialize_with = "de_opt_f64")]
    pub total_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LineupResult {
    #[serde(rename = "titulares", default, deserialize_with = "de_null_as_default")]
    pub starters: Vec<RosterEntry>,
    #[serde(rename = "banco", default, deserialize_with = "de_null_as_default")]
    pub bench: Vec<RosterEntry>,
    #[serde(rename = "reserva_luxo", default, deserialize_with = "de_designation")]
    pub luxury_reserve: Option<LuxuryReserve>,
    #[serde(rename = "capitao", default, deserialize_with = "de_designation")]
    pub captain: Option<CaptainRef>,
    #[serde(rename = "resumo", default)]
    pub summary: Option<LineupSummary>,
    #[serde(rename = "formacao", default, deserialize_with = "de_opt_text")]
    pub formation: Option<String>,
    #[serde(
        rename = "cartoletas_disponiveis",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub budget_available: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BacktestPoint {
    pub season: i32,
    #[serde(rename = "rodada")]
    pub round: u32,
    #[serde(rename = "pontos_reais")]
    pub actual_points: f64,
    #[serde(rename = "pontos_previstos")]
    pub predicted_points: f64,
    #[serde(rename = "pontos_reais_baseline")]
    pub baseline_points: f64,
    #[serde(rename = "topk_hit_rate")]
    pub top_k_hit_rate: f64,
    #[serde(rename = "luxo_usou", default)]
    pub luxury_used: bool,
    #[serde(rename = "luxo_delta", default)]
    pub luxury_delta: f64,
    #[serde(rename = "capitao", default, deserialize_with = "de_opt_text")]
    pub captain: Option<String>,
    #[serde(rename = "capitao_clube", default, deserialize_with = "de_opt_text")]
    pub captain_club: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BacktestMetrics {
    #[serde(rename = "mae_team", default, deserialize_with = "de_opt_f64")]
    pub mae: Option<f64>,
    #[serde(rename = "rmse_team", default, deserialize_with = "de_opt_f64")]
    pub rmse: Option<f64>,
    #[serde(rename = "corr_team", default, deserialize_with = "de_opt_f64")]
    pub correlation: Option<f64>,
    #[serde(rename = "topk_hit_rate_mean", default, deserialize_with = "de_opt_f64")]
    pub top_k_hit_rate_mean: Option<f64>,
    #[serde(
        rename = "retorno_medio_vs_baseline",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub mean_return_vs_baseline: Option<f64>,
    #[serde(rename = "n_rodadas_avaliadas", default, deserialize_with = "de_opt_count")]
    pub rounds_evaluated: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BacktestResult {
    #[serde(default)]
    pub config: Value,
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub metrics: BacktestMetrics,
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub series: Vec<BacktestPoint>,
}

impl BacktestResult {
    /// Flattens the opaque run configuration into `key=value` pairs, keys sorted.
    pub fn config_pairs(&self) -> Vec<(String, String)> {
        let Some(map) = self.config.as_object() else {
            return Vec::new();
        };
        let mut pairs: Vec<(String, String)> = map
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }
}

/// A role reference the optimizer sends as `{}` when it has nothing to say.
trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for CaptainRef {
    fn is_blank(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.position_code.is_none()
            && self.club_name.is_none()
            && self.predicted.is_none()
    }
}

impl Blank for LuxuryReserve {
    fn is_blank(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.position_code.is_none()
            && self.club_name.is_none()
            && self.expected_gain.is_none()
            && self.outperform_probability.is_none()
    }
}

fn de_designation<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Blank,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_blank()))
}

fn de_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(value_as_id))
}

fn de_opt_small<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(value_as_id)
        .and_then(|id| u8::try_from(id).ok()))
}

fn de_opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(value_as_id)
        .and_then(|n| u32::try_from(n).ok()))
}

fn de_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite()))
}

fn de_opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Identities arrive as integers, integral floats (pandas), or numeric strings.
fn value_as_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
