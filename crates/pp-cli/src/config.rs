//! CLI configuration
//!
//! Loaded from YAML with a fallback chain:
//! 1. `--config <path>` if given
//! 2. `.pp.yml` in the current directory
//! 3. `<config_dir>/pp/pp.yml`
//! 4. Defaults
//!
//! `PP_MAX_INPUT_CHARS` overrides the input cap from any source.

use std::fs;
use std::path::{Path, PathBuf};

use pp_core::normalizer::DEFAULT_MAX_INPUT_CHARS;
use pp_core::{Error, Result};
use serde::Deserialize;

const PROJECT_CONFIG: &str = ".pp.yml";
const MAX_INPUT_ENV: &str = "PP_MAX_INPUT_CHARS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Longest potentials text accepted, in characters
    pub max_input_chars: usize,

    /// Canon JSON used for report prompts
    pub canon_path: Option<PathBuf>,

    /// Model named in generated request bodies
    pub default_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            canon_path: None,
            default_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::load_file_chain(explicit)?;
        if let Ok(raw) = std::env::var(MAX_INPUT_ENV) {
            config.max_input_chars = parse_max_input(&raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn load_file_chain(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let project = PathBuf::from(PROJECT_CONFIG);
        if project.exists() {
            match Self::load_from_file(&project) {
                Ok(config) => {
                    tracing::info!("loaded config from {}", PROJECT_CONFIG);
                    return Ok(config);
                }
                Err(e) => tracing::warn!("failed to load {}: {}", PROJECT_CONFIG, e),
            }
        }

        if let Some(dir) = dirs::config_dir() {
            let user = dir.join("pp").join("pp.yml");
            if user.exists() {
                match Self::load_from_file(&user) {
                    Ok(config) => {
                        tracing::info!("loaded config from {}", user.display());
                        return Ok(config);
                    }
                    Err(e) => tracing::warn!("failed to load {}: {}", user.display(), e),
                }
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_yaml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    fn validate(&self) -> Result<()> {
        if self.max_input_chars == 0 {
            return Err(Error::Config("max_input_chars must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_max_input(raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got {:?}", MAX_INPUT_ENV, raw)))
}
