//! Python bindings for Personal Potentials
//!
//! Thin wrapper around `pp-core`. Structured values cross the boundary
//! as JSON strings so the Python side never depends on Rust layouts.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn to_py_err(e: pp_core::Error) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PyValueError::new_err(format!("Serialization error: {}", e)))
}

/// Split free-form potentials text into cleaned tokens.
///
/// Never raises; empty or unusable input gives an empty list.
#[pyfunction]
fn clean_tokens(text: &str) -> Vec<String> {
    pp_core::clean_tokens(text)
}

/// Parse potentials text into exactly nine labels.
///
/// Missing slots are filled from the default labels, skipping any
/// already present.
#[pyfunction]
fn parse_potentials_9(text: &str) -> Vec<String> {
    pp_core::parse_potentials_9(text).to_vec()
}

/// Three lines, one per matrix row, e.g. "1 ряд (ядро): A | B | C".
#[pyfunction]
fn three_row_summary(text: &str) -> String {
    pp_core::parse_potentials_9(text).three_row_summary()
}

/// Markdown table of the matrix with row and column headings.
#[pyfunction]
fn matrix_table(text: &str) -> String {
    pp_core::parse_potentials_9(text).markdown_table()
}

/// JSON object mapping "pos1".."pos9" to labels.
#[pyfunction]
fn positions(text: &str) -> PyResult<String> {
    to_json(&pp_core::parse_potentials_9(text).positions())
}

/// SHA-256 hex fingerprint of the matrix.
#[pyfunction]
fn fingerprint(text: &str) -> String {
    pp_core::parse_potentials_9(text).fingerprint()
}

/// Upgrade stored profile JSON to the current schema.
///
/// Raises:
///     ValueError: If the JSON is malformed or a field has the wrong type
#[pyfunction]
fn ensure_schema(profile_json: &str) -> PyResult<String> {
    let profile =
        pp_core::Profile::from_json(profile_json, chrono::Utc::now()).map_err(to_py_err)?;
    profile.to_json_pretty().map_err(to_py_err)
}

/// Read a weekly plan out of a generator reply.
///
/// Raises:
///     ValueError: If the reply holds no usable plan object. Callers pick
///     their own fallback.
#[pyfunction]
fn parse_plan(reply: &str) -> PyResult<String> {
    let plan = pp_core::parse_plan(reply).map_err(to_py_err)?;
    to_json(&plan)
}

/// The default plan used when a reply cannot be read, as JSON.
#[pyfunction]
fn fallback_plan() -> PyResult<String> {
    to_json(&pp_core::WeeklyPlan::fallback())
}

/// Personal Potentials Python module
#[pymodule]
fn pp(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(clean_tokens, m)?)?;
    m.add_function(wrap_pyfunction!(parse_potentials_9, m)?)?;
    m.add_function(wrap_pyfunction!(three_row_summary, m)?)?;
    m.add_function(wrap_pyfunction!(matrix_table, m)?)?;
    m.add_function(wrap_pyfunction!(positions, m)?)?;
    m.add_function(wrap_pyfunction!(fingerprint, m)?)?;
    m.add_function(wrap_pyfunction!(ensure_schema, m)?)?;
    m.add_function(wrap_pyfunction!(parse_plan, m)?)?;
    m.add_function(wrap_pyfunction!(fallback_plan, m)?)?;
    m.add("SCHEMA_ID", pp_core::SCHEMA_ID)?;
    Ok(())
}
