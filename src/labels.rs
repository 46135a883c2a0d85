//! Display-label resolution and number formatting for roster entries and
//! backtest rows. Every optional field has exactly one fallback chain here;
//! render code never builds its own.

use std::borrow::Cow;

use crate::model::{CaptainRef, LuxuryReserve, Position, RosterEntry};

pub const NAME_PLACEHOLDER: &str = "Unnamed";
pub const POSITION_UNKNOWN: &str = "?";
pub const MISSING_VALUE: &str = "-";

/// Optional identity fields shared by starters, bench entries and role references.
pub trait DisplayFields {
    fn short_name(&self) -> Option<&str> {
        None
    }
    fn full_name(&self) -> Option<&str> {
        None
    }
    fn position_code(&self) -> Option<&str> {
        None
    }
    fn position_id(&self) -> Option<u8> {
        None
    }
    fn club_name(&self) -> Option<&str> {
        None
    }
    fn club_id(&self) -> Option<u64> {
        None
    }
}

impl DisplayFields for RosterEntry {
    fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }
    fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }
    fn position_code(&self) -> Option<&str> {
        self.position_code.as_deref()
    }
    fn position_id(&self) -> Option<u8> {
        self.position_id
    }
    fn club_name(&self) -> Option<&str> {
        self.club_name.as_deref()
    }
    fn club_id(&self) -> Option<u64> {
        self.club_id
    }
}

impl DisplayFields for CaptainRef {
    fn full_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    fn position_code(&self) -> Option<&str> {
        self.position_code.as_deref()
    }
    fn club_name(&self) -> Option<&str> {
        self.club_name.as_deref()
    }
}

impl DisplayFields for LuxuryReserve {
    fn full_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    fn position_code(&self) -> Option<&str> {
        self.position_code.as_deref()
    }
    fn club_name(&self) -> Option<&str> {
        self.club_name.as_deref()
    }
}

/// Short name, then full name, then the placeholder. Never concatenated.
pub fn name_label<E: DisplayFields + ?Sized>(entry: &E) -> &str {
    non_blank(entry.short_name())
        .or_else(|| non_blank(entry.full_name()))
        .unwrap_or(NAME_PLACEHOLDER)
}

/// Explicit code, then the numeric position id through the fixed table, then `?`.
pub fn position_label<E: DisplayFields + ?Sized>(entry: &E) -> &str {
    if let Some(code) = non_blank(entry.position_code()) {
        return code;
    }
    entry
        .position_id()
        .and_then(Position::from_id)
        .map(Position::code)
        .unwrap_or(POSITION_UNKNOWN)
}

/// Club name, then a label synthesized from the club id, then empty.
pub fn club_label<E: DisplayFields + ?Sized>(entry: &E) -> Cow<'_, str> {
    if let Some(name) = non_blank(entry.club_name()) {
        return Cow::Borrowed(name);
    }
    match entry.club_id() {
        Some(id) => Cow::Owned(format!("Club {id}")),
        None => Cow::Borrowed(""),
    }
}

/// Prices, points and other plain numerics: two decimals.
pub fn format_fixed(value: f64) -> String {
    format!("{value:.2}")
}

pub fn format_signed(value: f64) -> String {
    format!("{value:+.2}")
}

/// A `[0, 1]` fraction shown as a percentage with one decimal.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

pub fn format_optional(value: Option<f64>, format: fn(f64) -> String) -> String {
    value
        .map(format)
        .unwrap_or_else(|| MISSING_VALUE.to_string())
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> RosterEntry {
        RosterEntry {
            id: Some(7),
            short_name: None,
            full_name: None,
            club_name: None,
            club_id: None,
            position_code: None,
            position_id: None,
            price: 10.0,
            predicted: 5.0,
            volatility: None,
        }
    }

    #[test]
    fn name_prefers_short_then_full_then_placeholder() {
        let mut e = entry();
        assert_eq!(name_label(&e), NAME_PLACEHOLDER);
        e.full_name = Some("Jose da Silva".to_string());
        assert_eq!(name_label(&e), "Jose da Silva");
        e.short_name = Some("Zeca".to_string());
        assert_eq!(name_label(&e), "Zeca");
    }

    #[test]
    fn blank_short_name_falls_through() {
        let mut e = entry();
        e.short_name = Some(String::new());
        e.full_name = Some("Full".to_string());
        assert_eq!(name_label(&e), "Full");
    }

    #[test]
    fn position_prefers_explicit_code() {
        let mut e = entry();
        assert_eq!(position_label(&e), POSITION_UNKNOWN);
        e.position_id = Some(3);
        assert_eq!(position_label(&e), "Z");
        e.position_code = Some("M".to_string());
        assert_eq!(position_label(&e), "M");
    }

    #[test]
    fn position_id_outside_table_is_unknown() {
        let mut e = entry();
        e.position_id = Some(6);
        assert_eq!(position_label(&e), POSITION_UNKNOWN);
    }

    #[test]
    fn club_label_synthesizes_from_id() {
        let mut e = entry();
        assert_eq!(club_label(&e), "");
        e.club_id = Some(262);
        assert_eq!(club_label(&e), "Club 262");
        e.club_name = Some("Flamengo".to_string());
        assert_eq!(club_label(&e), "Flamengo");
    }

    #[test]
    fn fixed_and_percent_formatting() {
        assert_eq!(format_fixed(73.456), "73.46");
        assert_eq!(format_percent(0.3333), "33.3%");
        assert_eq!(format_signed(1.5), "+1.50");
        assert_eq!(format_optional(None, format_fixed), MISSING_VALUE);
    }

    #[test]
    fn captain_uses_name_field() {
        let cap = CaptainRef {
            id: Some(1),
            name: Some("Arrascaeta".to_string()),
            ..Default::default()
        };
        assert_eq!(name_label(&cap), "Arrascaeta");
        assert_eq!(position_label(&cap), POSITION_UNKNOWN);
    }
}
