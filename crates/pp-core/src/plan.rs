//! Weekly plans: parsing text-generation output into action items
//!
//! The generator is asked for a JSON object, but replies often wrap it in
//! prose or code fences. [`parse_plan`] digs the object out and normalizes
//! every item. It never substitutes a default on failure: callers decide
//! whether to fall back to [`WeeklyPlan::fallback`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::profile::Realization;
use crate::{Error, Result};

/// Minutes assigned to an item that doesn't say
pub const DEFAULT_MINUTES: u32 = 15;

/// Outermost `{ … }` span, across lines
static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

// ── Core types ─────────────────────────────────────────────

/// How often an action is meant to be done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

impl From<String> for Frequency {
    fn from(s: String) -> Self {
        Frequency::parse(&s)
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.as_str().to_string()
    }
}

impl Frequency {
    /// `weekly` (any case) is weekly; anything else is daily
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("weekly") {
            Frequency::Weekly
        } else {
            Frequency::Daily
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }
}

/// One small, measurable action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_minutes")]
    pub minutes: u32,
    #[serde(default)]
    pub freq: Frequency,
}

fn default_minutes() -> u32 {
    DEFAULT_MINUTES
}

impl ActionItem {
    /// New item with a fresh id
    pub fn new(title: impl Into<String>, minutes: u32, freq: Frequency) -> Self {
        ActionItem {
            id: new_item_id(),
            title: title.into().trim().to_string(),
            minutes,
            freq,
        }
    }
}

/// Items for one action block, addressed by block key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanBlock {
    pub key: String,
    pub items: Vec<ActionItem>,
}

/// A parsed weekly plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub weekly_focus: String,
    pub focus_explainer: String,
    pub action_blocks: Vec<PlanBlock>,
}

/// Fallback items, one per standard block: (key, title, minutes)
const FALLBACK_ITEMS: [(&str, &str, u32); 4] = [
    ("structure", "План дня: 1–3 приоритета", 15),
    ("focus", "Один маленький шаг к цели", 20),
    ("growth", "10 минут обучения по теме", 10),
    ("energy", "Прогулка/вода/сон — 1 улучшение", 15),
];

impl WeeklyPlan {
    /// The plan used when the generator's reply can't be parsed
    pub fn fallback() -> Self {
        WeeklyPlan {
            weekly_focus: "Собрать фокус и ритм".to_string(),
            focus_explainer: "Ответ ИИ не удалось разобрать. Проверь ключ OpenAI или попробуй ещё раз."
                .to_string(),
            action_blocks: FALLBACK_ITEMS
                .iter()
                .map(|(key, title, minutes)| PlanBlock {
                    key: key.to_string(),
                    items: vec![ActionItem::new(*title, *minutes, Frequency::Daily)],
                })
                .collect(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.action_blocks.iter().map(|b| b.items.len()).sum()
    }
}

// ── Parsing ────────────────────────────────────────────────

/// Find a JSON value in free text: the whole text first, then the span
/// from the first `{` to the last `}`
pub fn extract_json(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    let span = JSON_OBJECT.find(text)?;
    serde_json::from_str(span.as_str()).ok()
}

/// Parse a generator reply into a normalized plan
///
/// # Errors
/// Returns `PlanParse` if the reply holds no JSON object, or an empty one.
pub fn parse_plan(text: &str) -> Result<WeeklyPlan> {
    let value =
        extract_json(text).ok_or_else(|| Error::PlanParse("no JSON found in reply".to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| Error::PlanParse(format!("expected JSON object, found {}", kind(&value))))?;
    if obj.is_empty() {
        return Err(Error::PlanParse("reply JSON object is empty".to_string()));
    }

    let action_blocks = obj
        .get("action_blocks")
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter().filter_map(normalize_block).collect())
        .unwrap_or_default();

    Ok(WeeklyPlan {
        weekly_focus: str_field(obj, "weekly_focus"),
        focus_explainer: str_field(obj, "focus_explainer"),
        action_blocks,
    })
}

/// Write a plan into the realization section
///
/// Focus text is replaced. Each plan block replaces the items of the
/// profile block with the same key; blocks with unknown keys are dropped.
pub fn apply_plan(realization: &mut Realization, plan: &WeeklyPlan) {
    realization.weekly_focus = plan.weekly_focus.trim().to_string();
    realization.focus_explainer = plan.focus_explainer.trim().to_string();

    for block in &plan.action_blocks {
        match realization
            .action_blocks
            .iter_mut()
            .find(|b| b.key == block.key)
        {
            Some(target) => target.items = block.items.clone(),
            None => tracing::warn!(key = %block.key, "dropping plan block with unknown key"),
        }
    }
}

/// Twelve lowercase hex characters
pub fn new_item_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

// ── Helpers ────────────────────────────────────────────────

fn normalize_block(block: &Value) -> Option<PlanBlock> {
    let key = block.get("key")?.as_str()?.trim().to_string();
    let items = block
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(normalize_item).collect())
        .unwrap_or_default();
    Some(PlanBlock { key, items })
}

fn normalize_item(item: &Value) -> Option<ActionItem> {
    let obj = item.as_object()?;
    let id = match obj.get("id").and_then(Value::as_str).map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => new_item_id(),
    };
    Some(ActionItem {
        id,
        title: str_field(obj, "title"),
        minutes: obj.get("minutes").and_then(minutes_value).unwrap_or(DEFAULT_MINUTES),
        freq: obj
            .get("freq")
            .and_then(Value::as_str)
            .map(Frequency::parse)
            .unwrap_or_default(),
    })
}

/// Minutes from an integer, float or numeric string; zero counts as unset
fn minutes_value(v: &Value) -> Option<u32> {
    let minutes = match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))?,
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64))?
        }
        _ => return None,
    };
    u32::try_from(minutes).ok().filter(|m| *m > 0)
}

fn str_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
