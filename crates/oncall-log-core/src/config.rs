//! Wizard configuration.
//!
//! Option lists default to the values offered on the new-log form; a JSON
//! file may override any of them.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "ONCALL_LOG_CONFIG";

/// A selectable value and its display label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Settings for a log wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WizardConfig {
    pub sites: Vec<SelectOption>,
    pub caller_designations: Vec<SelectOption>,
    pub request_types: Vec<SelectOption>,
    pub notify_teams: Vec<String>,
    /// Cap on drug search results kept for selection
    pub max_drug_results: usize,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            sites: vec![
                SelectOption::new("central", "Central Hospital"),
                SelectOption::new("north", "North Wing"),
                SelectOption::new("south", "South Wing"),
            ],
            caller_designations: vec![
                SelectOption::new("consultant", "Consultant"),
                SelectOption::new("doctor", "Doctor"),
                SelectOption::new("nurse", "Nurse"),
                SelectOption::new("midwife", "Midwife"),
            ],
            request_types: vec![
                SelectOption::new("medicine", "Medicine Information"),
                SelectOption::new("clinical", "Clinical Advice"),
                SelectOption::new("supply", "Supply Issue"),
                SelectOption::new("emergency", "Emergency"),
                SelectOption::new("other", "Other"),
            ],
            notify_teams: ["Respiratory", "Cardiology", "Emergency", "Pharmacy", "ICU", "Surgery"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            max_drug_results: 10,
        }
    }
}

impl WizardConfig {
    /// Parse a config from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Load from the file named by `ONCALL_LOG_CONFIG`, or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                tracing::debug!(path = ?path, "loading wizard config");
                Self::from_json_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Whether `team` is one of the configured notification teams.
    pub fn is_known_team(&self, team: &str) -> bool {
        self.notify_teams.iter().any(|t| t == team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WizardConfig::default();
        assert_eq!(config.sites.len(), 3);
        assert_eq!(config.notify_teams.len(), 6);
        assert!(config.is_known_team("ICU"));
        assert!(!config.is_known_team("Radiology"));
        assert_eq!(config.max_drug_results, 10);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = WizardConfig::from_json(r#"{"max_drug_results": 3}"#).unwrap();
        assert_eq!(config.max_drug_results, 3);
        assert_eq!(config.request_types.len(), 5);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"notify_teams": ["Pharmacy", "Renal"]}}"#).unwrap();

        let config = WizardConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.notify_teams, vec!["Pharmacy", "Renal"]);
        assert!(config.is_known_team("Renal"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = WizardConfig::from_json_file("/nonexistent/oncall.json").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/oncall.json"));
    }
}
