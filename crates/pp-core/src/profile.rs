//! User profile: the persisted record behind every screen
//!
//! Profiles are stored as JSON by the host application. Records written by
//! older revisions may lack whole sections or fields, so every load goes
//! through [`ensure_schema`] once: missing parts get defaults, the standard
//! action blocks are restored and the schema id is set to [`SCHEMA_ID`].
//! Top-level keys this crate doesn't know about are carried through.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::matrix::Potentials;
use crate::normalizer::parse_potentials_9;
use crate::plan::ActionItem;
use crate::today::DayRecord;
use crate::{Error, Result};

/// Current profile schema id
pub const SCHEMA_ID: &str = "pp.realization.v2";

/// Standard action blocks: (key, title)
pub const STANDARD_BLOCKS: [(&str, &str); 4] = [
    ("structure", "Структура дня"),
    ("focus", "Фокус недели"),
    ("growth", "Рост и навыки"),
    ("energy", "Энергия и ресурс"),
];

/// ISO-8601 UTC timestamp with microseconds and a `Z` suffix
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Monday of the ISO week containing `date`
pub fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(i64::from(date.weekday().num_days_from_monday()))
}

// ── Sections ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub schema: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Name and the raw potentials text, exactly as the user typed it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Foundation {
    pub name: String,
    pub potentials_table: String,
    pub notes: String,
}

impl Foundation {
    /// Nine potentials parsed from the stored raw text
    pub fn potentials(&self) -> Potentials {
        parse_potentials_9(&self.potentials_table)
    }

    pub fn has_potentials(&self) -> bool {
        !self.potentials_table.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBlock {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<ActionItem>,
}

impl ActionBlock {
    fn standard(key: &str, title: &str) -> Self {
        ActionBlock {
            key: key.to_string(),
            title: title.to_string(),
            items: Vec::new(),
        }
    }
}

/// Point A → Point B, weekly focus and the action blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Realization {
    pub point_a: String,
    pub point_b: String,
    pub weekly_focus: String,
    pub focus_explainer: String,
    pub action_blocks: Vec<ActionBlock>,
    pub week_start: String,
}

impl Default for Realization {
    fn default() -> Self {
        Realization {
            point_a: String::new(),
            point_b: String::new(),
            weekly_focus: String::new(),
            focus_explainer: String::new(),
            action_blocks: STANDARD_BLOCKS
                .iter()
                .map(|(key, title)| ActionBlock::standard(key, title))
                .collect(),
            week_start: String::new(),
        }
    }
}

impl Realization {
    pub fn block(&self, key: &str) -> Option<&ActionBlock> {
        self.action_blocks.iter().find(|b| b.key == key)
    }

    pub fn block_mut(&mut self, key: &str) -> Option<&mut ActionBlock> {
        self.action_blocks.iter_mut().find(|b| b.key == key)
    }

    /// Both points filled in
    pub fn has_points(&self) -> bool {
        !self.point_a.trim().is_empty() && !self.point_b.trim().is_empty()
    }

    /// Append any standard block that is missing; returns how many were added
    fn restore_standard_blocks(&mut self) -> usize {
        let mut added = 0;
        for (key, title) in STANDARD_BLOCKS {
            if self.block(key).is_none() {
                self.action_blocks.push(ActionBlock::standard(key, title));
                added += 1;
            }
        }
        added
    }
}

/// Daily checklist state, keyed by `YYYY-MM-DD`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Today {
    pub by_date: BTreeMap<String, DayRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Library {
    pub extended_report_md: String,
    pub extended_report_updated_at: String,
    /// Fingerprint of the matrix the stored report was generated from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_report_fingerprint: Option<String>,
}

impl Library {
    /// Store a freshly generated report
    pub fn store_report(&mut self, text: &str, potentials: &Potentials, now: DateTime<Utc>) {
        self.extended_report_md = text.trim().to_string();
        self.extended_report_updated_at = timestamp(now);
        self.extended_report_fingerprint = Some(potentials.fingerprint());
    }

    pub fn has_report(&self) -> bool {
        !self.extended_report_md.trim().is_empty()
    }

    /// A stored report is stale when the matrix changed since it was
    /// written, or when its origin is unknown
    pub fn is_report_stale(&self, potentials: &Potentials) -> bool {
        if !self.has_report() {
            return false;
        }
        self.extended_report_fingerprint.as_deref() != Some(potentials.fingerprint().as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    /// Daily actions that make a day count as "on target"
    pub daily_target: u32,
    /// On-target days per week that meet the weekly goal
    pub weekly_target_days: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics {
            daily_target: 3,
            weekly_target_days: 4,
        }
    }
}

// ── Profile ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub meta: Meta,
    pub foundation: Foundation,
    pub realization: Realization,
    pub today: Today,
    pub library: Library,
    pub metrics: Metrics,
    /// Keys written by other revisions, preserved on save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// A fresh profile with the current schema
    pub fn new(now: DateTime<Utc>) -> Self {
        let ts = timestamp(now);
        Profile {
            meta: Meta {
                schema: SCHEMA_ID.to_string(),
                created_at: ts.clone(),
                updated_at: ts,
            },
            ..Profile::default()
        }
    }

    /// Parse profile JSON text and bring it up to the current schema
    pub fn from_json(text: &str, now: DateTime<Utc>) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| Error::Schema(e.to_string()))?;
        ensure_schema(value, now)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Schema(e.to_string()))
    }

    /// Stamp `meta.updated_at`; call right before persisting
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.meta.updated_at = timestamp(now);
    }

    /// Update name and raw potentials text from a form submission
    pub fn set_foundation(&mut self, name: &str, potentials_raw: &str) {
        self.foundation.name = name.trim().to_string();
        self.foundation.potentials_table = potentials_raw.trim().to_string();
    }

    /// Update Point A / Point B from a form submission
    pub fn set_points(&mut self, point_a: &str, point_b: &str) {
        self.realization.point_a = point_a.trim().to_string();
        self.realization.point_b = point_b.trim().to_string();
    }

    /// Move `week_start` to the Monday of `today`'s week; returns whether
    /// it changed
    pub fn ensure_week_initialized(&mut self, today: NaiveDate) -> bool {
        let week_start = monday_of_week(today).to_string();
        if self.realization.week_start == week_start {
            return false;
        }
        self.realization.week_start = week_start;
        true
    }
}

/// Bring a stored profile value up to the current schema
///
/// Non-object input is replaced by a fresh profile. Missing sections and
/// fields take their defaults; present values are never overwritten.
///
/// # Errors
/// Returns `Schema` when a present field has an incompatible type.
pub fn ensure_schema(value: Value, now: DateTime<Utc>) -> Result<Profile> {
    if !value.is_object() {
        tracing::warn!("stored profile is not an object, starting fresh");
        return Ok(Profile::new(now));
    }

    let mut profile: Profile =
        serde_json::from_value(value).map_err(|e| Error::Schema(e.to_string()))?;

    let added = profile.realization.restore_standard_blocks();
    if added > 0 {
        tracing::debug!(added, "restored standard action blocks");
    }
    if profile.meta.schema != SCHEMA_ID {
        tracing::info!(from = %profile.meta.schema, to = SCHEMA_ID, "upgrading profile schema");
        profile.meta.schema = SCHEMA_ID.to_string();
    }
    if profile.meta.created_at.is_empty() {
        profile.meta.created_at = timestamp(now);
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(timestamp(now()), "2026-03-04T10:30:00.000000Z");
    }

    #[test]
    fn test_new_profile_defaults() {
        let p = Profile::new(now());
        assert_eq!(p.meta.schema, SCHEMA_ID);
        assert_eq!(p.meta.created_at, "2026-03-04T10:30:00.000000Z");
        let keys: Vec<&str> = p.realization.action_blocks.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["structure", "focus", "growth", "energy"]);
        assert_eq!(p.realization.block("growth").unwrap().title, "Рост и навыки");
        assert_eq!(p.metrics.daily_target, 3);
        assert_eq!(p.metrics.weekly_target_days, 4);
        assert!(p.today.by_date.is_empty());
    }

    #[test]
    fn test_ensure_schema_non_object() {
        let p = ensure_schema(json!("garbage"), now()).unwrap();
        assert_eq!(p, Profile::new(now()));
        let p = ensure_schema(Value::Null, now()).unwrap();
        assert_eq!(p.meta.schema, SCHEMA_ID);
    }

    #[test]
    fn test_ensure_schema_fills_missing() {
        let stored = json!({
            "meta": {"schema": "pp.realization.v1", "created_at": "2025-01-01T00:00:00Z"},
            "foundation": {"name": "Анна"},
            "realization": {"point_a": "Сейчас"}
        });
        let p = ensure_schema(stored, now()).unwrap();
        assert_eq!(p.meta.schema, SCHEMA_ID);
        assert_eq!(p.meta.created_at, "2025-01-01T00:00:00Z");
        assert_eq!(p.foundation.name, "Анна");
        assert_eq!(p.foundation.potentials_table, "");
        assert_eq!(p.realization.point_a, "Сейчас");
        assert_eq!(p.realization.action_blocks.len(), 4);
        assert_eq!(p.metrics, Metrics::default());
        assert!(!p.library.has_report());
    }

    #[test]
    fn test_ensure_schema_restores_missing_blocks() {
        let stored = json!({
            "realization": {
                "action_blocks": [
                    {"key": "focus", "title": "Мой фокус", "items": [
                        {"id": "a1", "title": "Шаг", "minutes": 20, "freq": "daily"}
                    ]},
                    {"key": "custom", "title": "Своё"}
                ]
            }
        });
        let p = ensure_schema(stored, now()).unwrap();
        let keys: Vec<&str> = p.realization.action_blocks.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["focus", "custom", "structure", "growth", "energy"]);
        assert_eq!(p.realization.block("focus").unwrap().title, "Мой фокус");
        assert_eq!(p.realization.block("focus").unwrap().items[0].minutes, 20);
    }

    #[test]
    fn test_ensure_schema_empty_blocks_list() {
        let stored = json!({"realization": {"action_blocks": []}});
        let p = ensure_schema(stored, now()).unwrap();
        assert_eq!(p.realization.action_blocks.len(), 4);
    }

    #[test]
    fn test_ensure_schema_preserves_unknown_keys() {
        let stored = json!({"journal": {"entries": [1, 2]}, "foundation": {"name": "X"}});
        let p = ensure_schema(stored, now()).unwrap();
        assert_eq!(p.extra["journal"]["entries"][1], 2);
        let out = serde_json::to_value(&p).unwrap();
        assert_eq!(out["journal"]["entries"][0], 1);
        assert_eq!(out["foundation"]["name"], "X");
    }

    #[test]
    fn test_ensure_schema_type_mismatch() {
        let stored = json!({"metrics": {"daily_target": "three"}});
        assert!(matches!(ensure_schema(stored, now()), Err(Error::Schema(_))));
    }

    #[test]
    fn test_ensure_schema_idempotent() {
        let stored = json!({"foundation": {"potentials_table": "Аметист, Гранат"}});
        let once = ensure_schema(stored, now()).unwrap();
        let twice = ensure_schema(serde_json::to_value(&once).unwrap(), now()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(Profile::from_json("{oops", now()), Err(Error::Schema(_))));
    }

    #[test]
    fn test_monday_of_week() {
        let wed = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let mon = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let sun = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        assert_eq!(monday_of_week(wed), mon);
        assert_eq!(monday_of_week(mon), mon);
        assert_eq!(monday_of_week(sun), mon);
    }

    #[test]
    fn test_ensure_week_initialized() {
        let mut p = Profile::new(now());
        let wed = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert!(p.ensure_week_initialized(wed));
        assert_eq!(p.realization.week_start, "2026-03-02");
        assert!(!p.ensure_week_initialized(wed));
        let next = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert!(p.ensure_week_initialized(next));
        assert_eq!(p.realization.week_start, "2026-03-09");
    }

    #[test]
    fn test_form_setters_trim() {
        let mut p = Profile::new(now());
        p.set_foundation("  Анна ", "\n Аметист, Гранат \n");
        p.set_points(" сейчас ", " потом ");
        assert_eq!(p.foundation.name, "Анна");
        assert!(p.foundation.potentials_table.starts_with("Аметист"));
        assert_eq!(p.realization.point_a, "сейчас");
        assert!(p.realization.has_points());
        assert_eq!(p.foundation.potentials().as_slice().len(), 9);
    }

    #[test]
    fn test_report_staleness() {
        let mut p = Profile::new(now());
        p.set_foundation("", "Аметист, Гранат");
        let nine = p.foundation.potentials();
        assert!(!p.library.is_report_stale(&nine));

        p.library.store_report("# Отчёт\n", &nine, now());
        assert_eq!(p.library.extended_report_md, "# Отчёт");
        assert!(!p.library.is_report_stale(&nine));

        p.set_foundation("", "Гранат, Аметист");
        assert!(p.library.is_report_stale(&p.foundation.potentials()));

        p.library.extended_report_fingerprint = None;
        assert!(p.library.is_report_stale(&nine));
    }

    #[test]
    fn test_touch() {
        let mut p = Profile::new(now());
        let later = Utc.with_ymd_and_hms(2026, 3, 5, 8, 0, 0).unwrap();
        p.touch(later);
        assert_eq!(p.meta.updated_at, "2026-03-05T08:00:00.000000Z");
        assert_eq!(p.meta.created_at, "2026-03-04T10:30:00.000000Z");
    }
}
