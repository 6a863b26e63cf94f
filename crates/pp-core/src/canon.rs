//! Canon excerpts: reference descriptions of potentials by position
//!
//! Report prompts must only describe a potential through its canon text.
//! The canon is a JSON document keyed by potential name:
//!
//! ```json
//! {
//!   "cells": { "Аметист": { "perception": "...", "motivation": { "title": "...", "lines": [] } } },
//!   "pos4":  { "Аметист": "..." },
//!   "pos5":  {},
//!   "pos6":  {}
//! }
//! ```
//!
//! Rows 1 and 3 read `cells` by column; row 2 reads the dedicated
//! position tables. An entry is either plain text or a structured block.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::matrix::{Column, PositionalView};
use crate::{Error, Result};

/// Placeholder rendered for missing or empty canon text
pub const EMPTY_EXCERPT: &str = "—";

const NOTES_HEADING: &str = "**Интуиция / как мне лучше принимать решения:**";

/// Characters stripped from potential names before lookup
const NAME_TRIM: &[char] = &['-', '–', '—', '•', '*', ',', ':', ';'];

/// A single canon entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonEntry {
    PlainText(String),
    Structured {
        #[serde(default)]
        title: String,
        #[serde(default)]
        lines: Vec<String>,
        #[serde(default, alias = "intuition")]
        notes: Vec<String>,
    },
}

impl CanonEntry {
    /// Render as markdown; empty entries render as [`EMPTY_EXCERPT`]
    pub fn render_markdown(&self) -> String {
        let out = match self {
            CanonEntry::PlainText(text) => text.trim().to_string(),
            CanonEntry::Structured { title, lines, notes } => {
                let mut out = Vec::new();
                let title = title.trim();
                if !title.is_empty() {
                    out.push(format!("**{}**", title));
                }
                out.extend(bullets(lines));
                let notes: Vec<String> = bullets(notes).collect();
                if !notes.is_empty() {
                    out.push(String::new());
                    out.push(NOTES_HEADING.to_string());
                    out.extend(notes);
                }
                out.join("\n").trim().to_string()
            }
        };
        if out.is_empty() {
            EMPTY_EXCERPT.to_string()
        } else {
            out
        }
    }
}

fn bullets(items: &[String]) -> impl Iterator<Item = String> + '_ {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| format!("- {}", s))
}

/// Column entries for one potential (rows 1 and 3)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonCell {
    pub perception: Option<CanonEntry>,
    pub motivation: Option<CanonEntry>,
    pub instrument: Option<CanonEntry>,
}

impl CanonCell {
    pub fn get(&self, column: Column) -> Option<&CanonEntry> {
        match column {
            Column::Perception => self.perception.as_ref(),
            Column::Motivation => self.motivation.as_ref(),
            Column::Instrument => self.instrument.as_ref(),
        }
    }
}

/// The full canon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canon {
    pub cells: BTreeMap<String, CanonCell>,
    pub pos4: BTreeMap<String, CanonEntry>,
    pub pos5: BTreeMap<String, CanonEntry>,
    pub pos6: BTreeMap<String, CanonEntry>,
}

impl Canon {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Canon(e.to_string()))
    }

    /// Rendered excerpt for a row-1/row-3 potential in a column
    pub fn cell_excerpt(&self, potential: &str, column: Column) -> String {
        self.cells
            .get(clean_name(potential))
            .and_then(|cell| cell.get(column))
            .map(CanonEntry::render_markdown)
            .unwrap_or_else(|| EMPTY_EXCERPT.to_string())
    }

    /// Rendered excerpt for a row-2 potential at position 4, 5 or 6
    pub fn position_excerpt(&self, potential: &str, pos: usize) -> String {
        let table = match pos {
            4 => &self.pos4,
            5 => &self.pos5,
            6 => &self.pos6,
            _ => return EMPTY_EXCERPT.to_string(),
        };
        table
            .get(clean_name(potential))
            .map(CanonEntry::render_markdown)
            .unwrap_or_else(|| EMPTY_EXCERPT.to_string())
    }

    /// Excerpts for all nine positions
    pub fn bundle(&self, positions: &PositionalView) -> CanonBundle {
        let label = |pos: usize| positions.get(pos).unwrap_or_default();
        let by_column = |pos: usize, column: Column| {
            (format!("pos{}", pos), self.cell_excerpt(label(pos), column))
        };

        let canon_row1 = [
            by_column(1, Column::Perception),
            by_column(2, Column::Motivation),
            by_column(3, Column::Instrument),
        ]
        .into_iter()
        .collect();
        let canon_row2 = (4..=6)
            .map(|pos| (format!("pos{}", pos), self.position_excerpt(label(pos), pos)))
            .collect();
        // Row 3 reuses the column canon; its reading (risk/delegation) comes from the row
        let canon_row3 = [
            by_column(7, Column::Perception),
            by_column(8, Column::Motivation),
            by_column(9, Column::Instrument),
        ]
        .into_iter()
        .collect();

        CanonBundle {
            canon_row1,
            canon_row2,
            canon_row3,
        }
    }
}

/// Rendered canon excerpts grouped by row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonBundle {
    pub canon_row1: BTreeMap<String, String>,
    pub canon_row2: BTreeMap<String, String>,
    pub canon_row3: BTreeMap<String, String>,
}

impl CanonBundle {
    /// Number of positions that have real canon text
    pub fn covered(&self) -> usize {
        [&self.canon_row1, &self.canon_row2, &self.canon_row3]
            .iter()
            .flat_map(|row| row.values())
            .filter(|v| v.as_str() != EMPTY_EXCERPT)
            .count()
    }
}

fn clean_name(name: &str) -> &str {
    name.trim_matches(|c: char| c.is_whitespace() || NAME_TRIM.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::parse_potentials_9;

    const CANON: &str = r#"{
        "cells": {
            "Аметист": {
                "perception": "Вижу систему целиком",
                "motivation": {
                    "title": "Порядок",
                    "lines": ["Навожу ясность", "  ", "Люблю структуру"],
                    "intuition": ["Решаю после паузы"]
                }
            },
            "Гранат": {
                "instrument": { "title": "", "lines": [] }
            }
        },
        "pos4": { "Сапфир": "Поле анализа — смыслы" },
        "pos5": { "Гелиодор": { "title": "Миссия", "lines": ["Вдохновлять"] } }
    }"#;

    #[test]
    fn test_plain_text_render() {
        let entry = CanonEntry::PlainText("  текст  ".into());
        assert_eq!(entry.render_markdown(), "текст");
        assert_eq!(CanonEntry::PlainText("   ".into()).render_markdown(), EMPTY_EXCERPT);
    }

    #[test]
    fn test_structured_render() {
        let entry = CanonEntry::Structured {
            title: "Порядок".into(),
            lines: vec!["Навожу ясность".into(), "".into()],
            notes: vec!["Решаю после паузы".into()],
        };
        assert_eq!(
            entry.render_markdown(),
            "**Порядок**\n- Навожу ясность\n\n**Интуиция / как мне лучше принимать решения:**\n- Решаю после паузы"
        );
    }

    #[test]
    fn test_structured_empty_render() {
        let entry = CanonEntry::Structured {
            title: " ".into(),
            lines: vec![],
            notes: vec![],
        };
        assert_eq!(entry.render_markdown(), EMPTY_EXCERPT);
    }

    #[test]
    fn test_load_and_lookup() {
        let canon = Canon::from_json(CANON).unwrap();
        assert_eq!(
            canon.cell_excerpt("Аметист", Column::Perception),
            "Вижу систему целиком"
        );
        assert_eq!(
            canon.cell_excerpt(" • Аметист: ", Column::Motivation),
            "**Порядок**\n- Навожу ясность\n- Люблю структуру\n\n**Интуиция / как мне лучше принимать решения:**\n- Решаю после паузы"
        );
        assert_eq!(canon.cell_excerpt("Аметист", Column::Instrument), EMPTY_EXCERPT);
        assert_eq!(canon.cell_excerpt("Гранат", Column::Instrument), EMPTY_EXCERPT);
        assert_eq!(canon.cell_excerpt("Опал", Column::Perception), EMPTY_EXCERPT);
        assert_eq!(canon.position_excerpt("Сапфир", 4), "Поле анализа — смыслы");
        assert_eq!(canon.position_excerpt("Сапфир", 5), EMPTY_EXCERPT);
        assert_eq!(canon.position_excerpt("Сапфир", 7), EMPTY_EXCERPT);
    }

    #[test]
    fn test_invalid_json() {
        let err = Canon::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Canon(_)));
    }

    #[test]
    fn test_bundle() {
        let canon = Canon::from_json(CANON).unwrap();
        let positions =
            parse_potentials_9("Аметист, Аметист, Гранат, Сапфир, Гелиодор, Изумруд").positions();
        let bundle = canon.bundle(&positions);

        assert_eq!(bundle.canon_row1["pos1"], "Вижу систему целиком");
        assert!(bundle.canon_row1["pos2"].starts_with("**Порядок**"));
        assert_eq!(bundle.canon_row1["pos3"], EMPTY_EXCERPT);
        assert_eq!(bundle.canon_row2["pos4"], "Поле анализа — смыслы");
        assert_eq!(bundle.canon_row2["pos5"], "**Миссия**\n- Вдохновлять");
        assert_eq!(bundle.canon_row2["pos6"], EMPTY_EXCERPT);
        assert_eq!(bundle.canon_row3.len(), 3);
        assert_eq!(bundle.covered(), 4);
    }

    #[test]
    fn test_empty_canon_bundle() {
        let bundle = Canon::default().bundle(&parse_potentials_9("").positions());
        assert_eq!(bundle.covered(), 0);
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["canon_row2"]["pos5"], EMPTY_EXCERPT);
    }
}
