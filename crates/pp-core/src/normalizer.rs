//! Potentials normalizer: turns free text into exactly nine ordered labels
//!
//! Users paste their matrix in whatever shape they have it: a comma list,
//! a numbered list, one label per line, pipe-delimited rows copied from a
//! table. The normalizer reduces all of these to the same token stream.
//!
//! # Pipeline
//!
//! `raw text → separators → filler words → enumeration → split → trim → pad/truncate`
//!
//! # Guarantees
//!
//! - **Total**: every string, including the empty one, yields nine labels
//! - **Deterministic**: same input always produces the same output
//! - **Order preserving**: user tokens keep their relative order
//! - **Non-overriding**: defaults only fill gaps, never replace user tokens

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::matrix::Potentials;
use crate::{Error, Result};

/// Fallback labels used to pad short input, in padding order
pub const DEFAULT_LABELS: [&str; 9] = [
    "Аметист", "Гранат", "Цитрин", "Сапфир", "Гелиодор", "Изумруд", "Янтарь", "Шунгит", "Рубин",
];

/// Default cap on raw input length, in characters
pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;

/// Whole-word filler vocabulary (row/percent/place/position/potential)
static FILLER_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:ряд|row|проценты?|percent|место|позиция|position|потенциалы?|potentials?)\b",
    )
    .unwrap()
});

/// One or more digits, optional whitespace, then an enumeration mark
static ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*[.):\-]").unwrap());

/// A hyphen standing alone between words acts as a list separator
static SPACED_HYPHEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+-\s+").unwrap());

static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n]+").unwrap());

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;]+").unwrap());

// ── Public API ─────────────────────────────────────────────

/// Split raw potentials text into cleaned, non-empty tokens
///
/// Returns an empty vec for empty or whitespace-only input. Never fails:
/// malformed input just yields fewer or stranger tokens, which
/// [`parse_potentials_9`] resolves by padding or truncation.
pub fn clean_tokens(raw: &str) -> Vec<String> {
    let s = raw.trim();
    if s.is_empty() {
        return Vec::new();
    }

    // ── Step 1: Alternate separators ───────────────────
    let s = s.replace('|', ",").replace(['—', '–'], "-");

    // ── Step 2: Filler words ───────────────────────────
    let s = FILLER_WORDS.replace_all(&s, " ");
    let s = s.replace('%', " ");

    // ── Step 3: Enumeration markers ────────────────────
    let s = strip_enumeration(&s);

    // ── Step 4: Line breaks and standalone hyphens ─────
    let s = SPACED_HYPHEN.replace_all(&s, ",");
    let s = LINE_BREAKS.replace_all(&s, ",");

    // ── Step 5: Split and trim ─────────────────────────
    SEPARATORS
        .split(&s)
        .filter_map(clean_piece)
        .collect()
}

/// Parse raw potentials text into exactly nine ordered labels
///
/// Input with nine or more tokens keeps the first nine. Shorter input is
/// padded from [`DEFAULT_LABELS`] in order, skipping any default already
/// present (case-insensitive), so the same input always pads identically.
///
/// # Example
/// ```
/// let nine = pp_core::normalizer::parse_potentials_9("1. Сапфир 2) Янтарь");
/// assert_eq!(nine.as_slice()[0], "Сапфир");
/// assert_eq!(nine.as_slice()[1], "Янтарь");
/// assert_eq!(nine.as_slice()[2], "Аметист");
/// ```
pub fn parse_potentials_9(raw: &str) -> Potentials {
    let tokens = pad_with_defaults(clean_tokens(raw));
    Potentials::from_padded(tokens)
}

/// Truncate to nine, or pad from [`DEFAULT_LABELS`] without duplicating
/// labels already present
///
/// The result always has exactly nine entries: the nine defaults are
/// distinct, so at most `tokens.len()` of them can be skipped.
pub fn pad_with_defaults(mut tokens: Vec<String>) -> Vec<String> {
    if tokens.len() >= 9 {
        if tokens.len() > 9 {
            tracing::debug!(dropped = tokens.len() - 9, "truncating potentials to nine");
        }
        tokens.truncate(9);
        return tokens;
    }

    let existing: BTreeSet<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let supplied = tokens.len();
    for label in DEFAULT_LABELS {
        if tokens.len() == 9 {
            break;
        }
        if !existing.contains(&label.to_lowercase()) {
            tokens.push(label.to_string());
        }
    }
    tracing::debug!(supplied, padded = tokens.len() - supplied, "padded potentials with defaults");
    tokens
}

/// Reject raw input longer than `max_chars` characters
///
/// The pattern-matching steps are linear, but callers accepting untrusted
/// text should still bound it before normalizing.
pub fn check_input(raw: &str, max_chars: usize) -> Result<()> {
    let len = raw.chars().count();
    if len > max_chars {
        return Err(Error::InputTooLong { len, max: max_chars });
    }
    Ok(())
}

// ── Helpers ────────────────────────────────────────────────

/// Replace one- or two-digit enumeration markers with a list separator.
/// Longer digit runs ("2024-") are left alone. A match always starts at
/// the beginning of a digit run, so no marker is preceded by a digit.
fn strip_enumeration(s: &str) -> String {
    ENUMERATION
        .replace_all(s, |caps: &Captures| {
            if caps[1].chars().count() <= 2 {
                ",".to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Strip surrounding whitespace and punctuation (bullets, brackets,
/// quotes), then collapse inner whitespace
fn clean_piece(piece: &str) -> Option<String> {
    let trimmed = piece.trim_matches(|c: char| !c.is_alphanumeric());
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}
