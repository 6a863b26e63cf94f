//! Personal Potentials Core - the potentials matrix and the profile around it
//!
//! Users describe their nine personal potentials in free text. This crate
//! turns that text into a fixed 3×3 matrix, keeps the versioned profile
//! record, builds the payloads sent to the text-generation service and
//! parses the weekly plans that come back.
//!
//! # Architecture
//!
//! ```text
//! raw text → Normalizer → Potentials (9) → summary / table / pos1..pos9
//!                                  ↓
//!              Profile ──→ Prompt payloads (+ Canon excerpts)
//!                 ↑                ↓
//!             apply_plan ←── parse_plan ←── generator reply
//!                 ↓
//!           Today / week progress
//! ```
//!
//! # Guarantees
//!
//! - **Total**: the normalizer accepts any string and always yields nine labels
//! - **Deterministic**: same input always produces identical output
//! - **Explicit upgrades**: stored profiles pass through one `ensure_schema` step
//! - **No hidden fallbacks**: plan parsing returns `Result`; defaults are the caller's choice

pub mod canon;
pub mod error;
pub mod matrix;
pub mod normalizer;
pub mod plan;
pub mod profile;
pub mod prompt;
pub mod today;

pub use canon::{Canon, CanonBundle, CanonEntry};
pub use error::{Error, Result};
pub use matrix::{Column, PositionalView, Potentials, Row};
pub use normalizer::{clean_tokens, parse_potentials_9, DEFAULT_LABELS};
pub use plan::{apply_plan, parse_plan, ActionItem, Frequency, WeeklyPlan};
pub use profile::{ensure_schema, Profile, SCHEMA_ID};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
