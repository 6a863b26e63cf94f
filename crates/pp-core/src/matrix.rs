//! The 3×3 potentials matrix and its derived presentation forms
//!
//! A [`Potentials`] value always holds exactly nine labels. Positions 1–3
//! form the core row, 4–6 the content/social row and 7–9 the
//! risk/delegation row. Columns are perception, motivation and instrument.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::normalizer::pad_with_defaults;
use crate::{Error, Result};

// ── Rows and columns ───────────────────────────────────────

/// Matrix row, by weighted life-energy allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Row {
    Core,
    Social,
    Risk,
}

impl Row {
    pub const ALL: [Row; 3] = [Row::Core, Row::Social, Row::Risk];

    /// 1-based row number
    pub fn number(self) -> usize {
        match self {
            Row::Core => 1,
            Row::Social => 2,
            Row::Risk => 3,
        }
    }

    /// Role label used in the three-row summary
    pub fn summary_label(self) -> &'static str {
        match self {
            Row::Core => "ядро",
            Row::Social => "наполнение/соц.слой",
            Row::Risk => "риски/делегирование",
        }
    }

    /// Short label used in the markdown table
    pub fn table_label(self) -> &'static str {
        match self {
            Row::Core => "ядро",
            Row::Social => "наполнение",
            Row::Risk => "риски",
        }
    }

    /// Approximate share of life energy, in percent
    pub fn energy_share(self) -> u8 {
        match self {
            Row::Core => 60,
            Row::Social => 30,
            Row::Risk => 10,
        }
    }
}

/// Matrix column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Perception,
    Motivation,
    Instrument,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Perception, Column::Motivation, Column::Instrument];

    pub fn title(self) -> &'static str {
        match self {
            Column::Perception => "Восприятие",
            Column::Motivation => "Мотивация",
            Column::Instrument => "Инструмент",
        }
    }
}

// ── Potentials ─────────────────────────────────────────────

/// Exactly nine ordered potential labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Potentials([String; 9]);

impl Potentials {
    /// Build from a list already padded/truncated to nine
    pub(crate) fn from_padded(tokens: Vec<String>) -> Self {
        match <[String; 9]>::try_from(tokens) {
            Ok(nine) => Potentials(nine),
            Err(tokens) => Potentials::from_padded(pad_with_defaults(tokens)),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.to_vec()
    }

    /// Label at a 1-based position (1..=9)
    pub fn position(&self, pos: usize) -> Option<&str> {
        pos.checked_sub(1)
            .and_then(|i| self.0.get(i))
            .map(String::as_str)
    }

    /// The three labels of one row
    pub fn row(&self, row: Row) -> &[String] {
        let start = (row.number() - 1) * 3;
        &self.0[start..start + 3]
    }

    /// Label at a row/column intersection
    pub fn cell(&self, row: Row, column: Column) -> &str {
        let col = Column::ALL
            .iter()
            .position(|c| *c == column)
            .unwrap_or_default();
        &self.row(row)[col]
    }

    /// Three labelled rows, pipe-separated within a row
    ///
    /// ```text
    /// 1 ряд (ядро): a | b | c
    /// 2 ряд (наполнение/соц.слой): d | e | f
    /// 3 ряд (риски/делегирование): g | h | i
    /// ```
    pub fn three_row_summary(&self) -> String {
        Row::ALL
            .iter()
            .map(|row| {
                let cells = self.row(*row);
                format!(
                    "{} ряд ({}): {} | {} | {}",
                    row.number(),
                    row.summary_label(),
                    cells[0],
                    cells[1],
                    cells[2]
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Markdown table with row weights and column titles
    pub fn markdown_table(&self) -> String {
        let mut lines = Vec::with_capacity(5);
        let titles: Vec<&str> = Column::ALL.iter().map(|c| c.title()).collect();
        lines.push(format!("| Ряд | {} |", titles.join(" | ")));
        lines.push("|---|---|---|---|".to_string());
        for row in Row::ALL {
            let cells = self.row(row);
            lines.push(format!(
                "| {} ({} / {}%) | {} | {} | {} |",
                row.number(),
                row.table_label(),
                row.energy_share(),
                cells[0],
                cells[1],
                cells[2]
            ));
        }
        lines.join("\n")
    }

    /// Positional projection `pos1..pos9`
    pub fn positions(&self) -> PositionalView {
        PositionalView::from_nine(&self.0)
    }

    /// SHA-256 (hex) over the lower-cased, newline-joined labels
    ///
    /// Two matrices that differ only in letter case share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let canonical = self
            .0
            .iter()
            .map(|label| label.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl TryFrom<Vec<String>> for Potentials {
    type Error = Error;

    fn try_from(tokens: Vec<String>) -> Result<Self> {
        let found = tokens.len();
        <[String; 9]>::try_from(tokens)
            .map(Potentials)
            .map_err(|_| Error::MatrixLength { found })
    }
}

impl From<Potentials> for Vec<String> {
    fn from(p: Potentials) -> Self {
        p.0.into()
    }
}

impl fmt::Display for Potentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.three_row_summary())
    }
}

// ── Positional view ────────────────────────────────────────

/// Read-only mapping `pos1..pos9` → label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionalView(BTreeMap<String, String>);

impl PositionalView {
    /// Build from any token list; short lists are padded the same way
    /// the normalizer pads, long lists keep their first nine
    pub fn from_tokens(tokens: &[String]) -> Self {
        let nine = pad_with_defaults(tokens.to_vec());
        Self::from_nine(&nine)
    }

    fn from_nine(nine: &[String]) -> Self {
        let map = nine
            .iter()
            .take(9)
            .enumerate()
            .map(|(i, label)| (position_key(i + 1), label.clone()))
            .collect();
        PositionalView(map)
    }

    /// Label at a 1-based position
    pub fn get(&self, pos: usize) -> Option<&str> {
        self.0.get(&position_key(pos)).map(String::as_str)
    }

    /// Label by key (`"pos1"`..`"pos9"`)
    pub fn get_key(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries in position order (pos1 first)
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        (1..=9).filter_map(move |pos| self.get(pos).map(|label| (pos, label)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Key for a 1-based position
pub fn position_key(pos: usize) -> String {
    format!("pos{}", pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{parse_potentials_9, DEFAULT_LABELS};

    fn nine() -> Potentials {
        parse_potentials_9("A,B,C,D,E,F,G,H,I")
    }

    #[test]
    fn test_try_from_rejects_wrong_length() {
        let err = Potentials::try_from(vec!["A".to_string(); 8]).unwrap_err();
        assert!(matches!(err, Error::MatrixLength { found: 8 }));

        let err = Potentials::try_from(vec!["A".to_string(); 10]).unwrap_err();
        assert!(matches!(err, Error::MatrixLength { found: 10 }));

        assert!(Potentials::try_from(vec!["A".to_string(); 9]).is_ok());
    }

    #[test]
    fn test_rows_and_cells() {
        let p = nine();
        assert_eq!(p.row(Row::Core).to_vec(), vec!["A", "B", "C"]);
        assert_eq!(p.row(Row::Social).to_vec(), vec!["D", "E", "F"]);
        assert_eq!(p.row(Row::Risk).to_vec(), vec!["G", "H", "I"]);
        assert_eq!(p.cell(Row::Social, Column::Motivation), "E");
        assert_eq!(p.cell(Row::Risk, Column::Instrument), "I");
        assert_eq!(p.position(1), Some("A"));
        assert_eq!(p.position(9), Some("I"));
        assert_eq!(p.position(0), None);
        assert_eq!(p.position(10), None);
    }

    #[test]
    fn test_three_row_summary() {
        let summary = nine().three_row_summary();
        assert_eq!(
            summary,
            "1 ряд (ядро): A | B | C\n\
             2 ряд (наполнение/соц.слой): D | E | F\n\
             3 ряд (риски/делегирование): G | H | I"
        );
    }

    #[test]
    fn test_three_row_summary_two_pipes_per_line() {
        for input in ["", "Аметист, Гранат", "1. a 2. b 3. c 4. d 5. e 6. f 7. g 8. h 9. i 10. j"] {
            let summary = parse_potentials_9(input).three_row_summary();
            let lines: Vec<&str> = summary.lines().collect();
            assert_eq!(lines.len(), 3);
            for line in lines {
                assert_eq!(line.matches('|').count(), 2, "line: {}", line);
            }
        }
    }

    #[test]
    fn test_markdown_table() {
        let table = nine().markdown_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "| Ряд | Восприятие | Мотивация | Инструмент |");
        assert_eq!(lines[1], "|---|---|---|---|");
        assert_eq!(lines[2], "| 1 (ядро / 60%) | A | B | C |");
        assert_eq!(lines[3], "| 2 (наполнение / 30%) | D | E | F |");
        assert_eq!(lines[4], "| 3 (риски / 10%) | G | H | I |");
    }

    #[test]
    fn test_positions_cover_all_keys() {
        for input in ["", "x", "A,B,C,D,E,F,G,H,I,J,K"] {
            let view = parse_potentials_9(input).positions();
            let keys: Vec<&str> = view.keys().collect();
            assert_eq!(view.len(), 9);
            for pos in 1..=9 {
                assert!(keys.contains(&position_key(pos).as_str()));
            }
        }
    }

    #[test]
    fn test_positions_match_order() {
        let p = nine();
        let view = p.positions();
        for (pos, label) in view.iter() {
            assert_eq!(p.position(pos), Some(label));
        }
        assert_eq!(view.get_key("pos5"), Some("E"));
    }

    #[test]
    fn test_positional_view_pads_short_input() {
        let view = PositionalView::from_tokens(&["Гранат".to_string()]);
        assert_eq!(view.len(), 9);
        assert_eq!(view.get(1), Some("Гранат"));
        assert_eq!(view.get(2), Some(DEFAULT_LABELS[0]));
        // Гранат is not repeated
        assert_eq!(view.get(3), Some(DEFAULT_LABELS[2]));
        assert_eq!(view.get(9), Some(DEFAULT_LABELS[8]));
    }

    #[test]
    fn test_positional_view_serializes_as_object() {
        let json = serde_json::to_value(nine().positions()).unwrap();
        assert_eq!(json["pos1"], "A");
        assert_eq!(json["pos9"], "I");
        assert_eq!(json.as_object().unwrap().len(), 9);
    }

    #[test]
    fn test_potentials_serde_rejects_short_list() {
        let ok: Potentials =
            serde_json::from_str(r#"["A","B","C","D","E","F","G","H","I"]"#).unwrap();
        assert_eq!(ok, nine());
        assert!(serde_json::from_str::<Potentials>(r#"["A","B"]"#).is_err());
    }

    #[test]
    fn test_fingerprint() {
        let a = nine().fingerprint();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, parse_potentials_9("a,b,c,d,e,f,g,h,i").fingerprint());
        assert_ne!(a, parse_potentials_9("B,A,C,D,E,F,G,H,I").fingerprint());
    }
}
