//! Optional TOML configuration: database location and vessel names
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{LabelSet, REDUCER_COUNT, VESSEL_COUNT, VesselLabel};

pub const DEFAULT_CONFIG_PATH: &str = "brew-ledger.toml";
pub const DEFAULT_DATABASE_PATH: &str = "brew_ledger.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: Option<PathBuf>,
    /// Extraction vessel names, exactly six when present
    pub vessels: Option<Vec<String>>,
    /// Concentration vessel names, exactly two when present
    pub reducers: Option<Vec<String>>,
    pub operator: Option<String>,
    pub beverage: Option<String>,
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
    }

    pub fn vessel_labels(&self) -> LabelSet {
        self.vessels
            .as_deref()
            .and_then(|names| label_set(names).ok())
            .unwrap_or_else(LabelSet::default_vessels)
    }

    pub fn reducer_labels(&self) -> LabelSet {
        self.reducers
            .as_deref()
            .and_then(|names| label_set(names).ok())
            .unwrap_or_else(LabelSet::default_reducers)
    }
}

fn label_set(names: &[String]) -> Result<LabelSet, ConfigError> {
    let labels = names
        .iter()
        .map(|n| VesselLabel::new(n))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    LabelSet::new(labels).map_err(|e| ConfigError::Invalid(e.to_string()))
}

/// Load configuration from `path`.
/// - A missing file at the default location yields the defaults.
/// - A missing file that was asked for explicitly is an error.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if !explicit && !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<Config, ConfigError> {
    let cfg: Config = toml::from_str(content)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(vessels) = &cfg.vessels {
        if vessels.len() != VESSEL_COUNT {
            return Err(ConfigError::Invalid(format!(
                "vessels must list exactly {} names, got {}",
                VESSEL_COUNT,
                vessels.len()
            )));
        }
        label_set(vessels)?;
    }
    if let Some(reducers) = &cfg.reducers {
        if reducers.len() != REDUCER_COUNT {
            return Err(ConfigError::Invalid(format!(
                "reducers must list exactly {} names, got {}",
                REDUCER_COUNT,
                reducers.len()
            )));
        }
        label_set(reducers)?;
    }
    if let Some(db) = &cfg.database {
        if db.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database must be non-empty".into()));
        }
    }
    Ok(())
}

/// Example file, also used in tests
pub fn example() -> &'static str {
    r#"database = "tea.db"
vessels = ["Front-L", "Front-R", "Mid-L", "Mid-R", "Back-L", "Back-R"]
reducers = ["Pan A", "Pan B"]
operator = "Ana"
beverage = "Black tea"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_example() {
        let cfg = parse(example()).unwrap();
        assert_eq!(cfg.database_path(), PathBuf::from("tea.db"));
        assert_eq!(cfg.vessel_labels().get(5).unwrap().as_str(), "Back-R");
        assert!(cfg.reducer_labels().contains("Pan B"));
        assert_eq!(cfg.operator.as_deref(), Some("Ana"));
    }

    #[test]
    fn empty_file_means_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.database_path(), PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(cfg.vessel_labels(), LabelSet::default_vessels());
    }

    #[test]
    fn rejects_wrong_counts_and_bad_labels() {
        assert!(matches!(
            parse(r#"vessels = ["A", "B"]"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse(r#"reducers = ["A", "A"]"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse(r#"reducers = ["A", " "]"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(parse("colour = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(load(Some(&missing)), Err(ConfigError::Io(_))));
    }
}
