//! Settings Models
//!
//! Application configuration stored in config.json.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use esg_survey_llm::ProviderConfig;

/// Upper bound for `SurveyConfig::max_follow_ups`
pub const MAX_FOLLOW_UP_BUDGET: u32 = 5;

/// Application configuration stored in config.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language model used by the judge, follow-up generator and synthesizer
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Elicitation and scoring behavior
    #[serde(default)]
    pub survey: SurveyConfig,
    /// Where completed rows are written
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// How follow-up answers contribute to a topic's accepted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpPolicy {
    /// Keep only the original reaction
    Discard,
    /// Original reaction followed by follow-up answers, newline-joined
    #[default]
    Append,
    /// The latest follow-up answer replaces the original reaction
    Replace,
}

impl fmt::Display for FollowUpPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowUpPolicy::Discard => write!(f, "discard"),
            FollowUpPolicy::Append => write!(f, "append"),
            FollowUpPolicy::Replace => write!(f, "replace"),
        }
    }
}

/// Labels the judge output is scanned for: `Suficiente: Sí|No`, `Categoría: <dimension>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SufficiencyPatternConfig {
    pub label: String,
    pub yes: Vec<String>,
    pub no: Vec<String>,
    pub category_label: String,
}

impl Default for SufficiencyPatternConfig {
    fn default() -> Self {
        Self {
            label: "Suficiente".to_string(),
            yes: vec!["Sí".to_string(), "Si".to_string(), "Yes".to_string()],
            no: vec!["No".to_string()],
            category_label: "Categoría".to_string(),
        }
    }
}

/// Grammar of `Label: <integer>` pairs in the synthesizer output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatternConfig {
    /// Separator between a dimension label and its score
    pub separator: String,
    /// Match dimension labels case-sensitively
    pub case_sensitive: bool,
}

impl Default for ProfilePatternConfig {
    fn default() -> Self {
        Self {
            separator: ":".to_string(),
            case_sensitive: false,
        }
    }
}

/// Survey behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Follow-up questions allowed per topic; 0 disables follow-ups
    #[serde(default = "default_max_follow_ups")]
    pub max_follow_ups: u32,
    /// Scored dimensions, in chart and row order
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub follow_up_policy: FollowUpPolicy,
    /// Reactions with fewer words are judged insufficient without a model call; 0 disables
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default)]
    pub sufficiency: SufficiencyPatternConfig,
    #[serde(default)]
    pub profile: ProfilePatternConfig,
    /// Headline override; the built-in list is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
}

fn default_max_follow_ups() -> u32 {
    1
}

fn default_dimensions() -> Vec<String> {
    ["Ambiental", "Social", "Gobernanza", "Riesgo"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_words() -> usize {
    5
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            max_follow_ups: default_max_follow_ups(),
            dimensions: default_dimensions(),
            follow_up_policy: FollowUpPolicy::default(),
            min_words: default_min_words(),
            sufficiency: SufficiencyPatternConfig::default(),
            profile: ProfilePatternConfig::default(),
            topics: None,
        }
    }
}

/// Google Sheets target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_range")]
    pub range: String,
}

fn default_sheet_range() -> String {
    "Sheet1".to_string()
}

/// Row sinks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Write rows to the local SQLite database
    #[serde(default = "default_sqlite_enabled")]
    pub sqlite: bool,
    /// Database file; defaults to ~/.esg-survey/data.db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets: Option<SheetsConfig>,
}

fn default_sqlite_enabled() -> bool {
    true
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            sqlite: default_sqlite_enabled(),
            sqlite_path: None,
            sheets: None,
        }
    }
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let survey = &self.survey;

        // Validate dimensions
        if survey.dimensions.is_empty() {
            return Err("dimensions must not be empty".to_string());
        }
        let mut seen = HashSet::new();
        for dim in &survey.dimensions {
            if dim.trim().is_empty() {
                return Err("dimension names must not be blank".to_string());
            }
            if !seen.insert(dim.to_lowercase()) {
                return Err(format!("Duplicate dimension: {}", dim));
            }
        }

        if survey.max_follow_ups > MAX_FOLLOW_UP_BUDGET {
            return Err(format!(
                "max_follow_ups cannot exceed {}",
                MAX_FOLLOW_UP_BUDGET
            ));
        }

        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(format!(
                "Invalid temperature: {}. Must be between 0 and 2",
                self.provider.temperature
            ));
        }

        if self.provider.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }

        // Validate sufficiency vocabularies
        let pattern = &survey.sufficiency;
        if pattern.label.trim().is_empty() {
            return Err("sufficiency label must not be empty".to_string());
        }
        if pattern.yes.is_empty() || pattern.no.is_empty() {
            return Err("sufficiency yes/no vocabularies must not be empty".to_string());
        }
        let yes: HashSet<String> = pattern.yes.iter().map(|w| w.to_lowercase()).collect();
        if let Some(both) = pattern.no.iter().find(|w| yes.contains(&w.to_lowercase())) {
            return Err(format!(
                "'{}' appears in both sufficiency vocabularies",
                both
            ));
        }
        if pattern
            .yes
            .iter()
            .chain(pattern.no.iter())
            .any(|w| w.trim().is_empty())
        {
            return Err("sufficiency words must not be blank".to_string());
        }

        if survey.profile.separator.is_empty() {
            return Err("profile separator must not be empty".to_string());
        }

        if let Some(topics) = &survey.topics {
            if topics.is_empty() {
                return Err("topics override must not be empty".to_string());
            }
        }

        if let Some(sheets) = &self.persistence.sheets {
            if sheets.spreadsheet_id.trim().is_empty() {
                return Err("sheets.spreadsheet_id must not be empty".to_string());
            }
        }

        Ok(())
    }
}
