//! Profile Synthesizer
//!
//! Turns the accepted reactions into a scored profile. The model output is
//! scanned for one `Label: <integer>` pair per configured dimension:
//!
//! - the first occurrence of a label followed by an integer wins
//! - a label that never appears is `Missing`
//! - a label that only appears with non-integer values is `NotAnInteger`
//! - an integer outside `[0, 100]` is `OutOfRange`
//!
//! Any of these invalidates the whole profile.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use esg_survey_core::{Profile, TopicOutcome, MAX_SCORE};
use esg_survey_llm::{variables, PromptTemplate, TextCompletion};

use crate::models::settings::{ProfilePatternConfig, SurveyConfig};
use crate::utils::error::{AppError, AppResult};

use super::prompts;

/// Why a synthesized profile was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("missing score for {dimension}")]
    Missing { dimension: String },

    #[error("score for {dimension} is not an integer: '{value}'")]
    NotAnInteger { dimension: String, value: String },

    #[error("score for {dimension} out of range [0, 100]: {value}")]
    OutOfRange { dimension: String, value: String },

    #[error("profile completion failed: {0}")]
    Completion(String),

    #[error("{0}")]
    Invalid(String),
}

/// Raw model output plus the profile parsed from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedProfile {
    pub raw: String,
    pub profile: Profile,
}

/// Transcript in, validated profile out
#[async_trait]
pub trait ProfileSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        transcript: &[TopicOutcome],
    ) -> Result<SynthesizedProfile, ProfileError>;
}

/// Accepted reactions in topic order, newline-joined
pub fn transcript_text(transcript: &[TopicOutcome]) -> String {
    transcript
        .iter()
        .map(|o| o.accepted_text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads `Label: <integer>` pairs for the configured dimensions
#[derive(Debug, Clone)]
pub struct ProfileParser {
    patterns: Vec<(String, Regex)>,
    integer_re: Regex,
    decimal_re: Regex,
}

impl ProfileParser {
    pub fn new(pattern: &ProfilePatternConfig, dimensions: &[String]) -> AppResult<Self> {
        let flags = if pattern.case_sensitive { "" } else { "(?i)" };
        let separator = regex::escape(&pattern.separator);

        let patterns = dimensions
            .iter()
            .map(|dim| {
                let re = Regex::new(&format!(
                    r"{flags}(?:^|[^\p{{L}}\p{{N}}_]){label}[\s*_]*{separator}[\s*_]*\[?\s*([^\s,;\]\*]*(?:,\d+)?)",
                    label = regex::escape(dim),
                ))
                .map_err(|e| AppError::config(format!("Invalid profile pattern for {}: {}", dim, e)))?;
                Ok((dim.clone(), re))
            })
            .collect::<AppResult<Vec<_>>>()?;

        // An integer may only be followed by "/100", "%" and closing punctuation
        let integer_re = Regex::new(r"^(-?\d+)(?:/100|%)?[.)]?$")
            .map_err(|e| AppError::internal(e.to_string()))?;
        let decimal_re =
            Regex::new(r"^-?\d+[.,]\d").map_err(|e| AppError::internal(e.to_string()))?;

        Ok(Self {
            patterns,
            integer_re,
            decimal_re,
        })
    }

    /// Parse raw model output into a profile over every configured dimension
    pub fn parse(&self, raw: &str) -> Result<Profile, ProfileError> {
        let mut scores = Vec::with_capacity(self.patterns.len());
        for (dimension, re) in &self.patterns {
            scores.push((dimension.clone(), self.score_for(dimension, re, raw)?));
        }
        Profile::new(scores).map_err(|e| ProfileError::Invalid(e.to_string()))
    }

    fn score_for(&self, dimension: &str, re: &Regex, raw: &str) -> Result<u8, ProfileError> {
        let mut first_token: Option<String> = None;

        for caps in re.captures_iter(raw) {
            let token = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if self.decimal_re.is_match(token) {
                return Err(ProfileError::NotAnInteger {
                    dimension: dimension.to_string(),
                    value: token.to_string(),
                });
            }
            if let Some(digits) = self.integer_re.captures(token).and_then(|c| c.get(1)) {
                let out_of_range = || ProfileError::OutOfRange {
                    dimension: dimension.to_string(),
                    value: digits.as_str().to_string(),
                };
                let value: i64 = digits.as_str().parse().map_err(|_| out_of_range())?;
                if !(0..=i64::from(MAX_SCORE)).contains(&value) {
                    return Err(out_of_range());
                }
                return Ok(value as u8);
            }
            first_token.get_or_insert_with(|| token.to_string());
        }

        match first_token {
            Some(value) => Err(ProfileError::NotAnInteger {
                dimension: dimension.to_string(),
                value,
            }),
            None => Err(ProfileError::Missing {
                dimension: dimension.to_string(),
            }),
        }
    }
}

/// Parse with the default `Label: <integer>` grammar
pub fn parse_profile(raw: &str, dimensions: &[String]) -> Result<Profile, ProfileError> {
    ProfileParser::new(&ProfilePatternConfig::default(), dimensions)
        .map_err(|e| ProfileError::Invalid(e.to_string()))?
        .parse(raw)
}

/// Profile synthesizer backed by the text-completion collaborator
pub struct LlmProfileSynthesizer {
    completion: Arc<dyn TextCompletion>,
    template: PromptTemplate,
    parser: ProfileParser,
}

impl LlmProfileSynthesizer {
    pub fn new(completion: Arc<dyn TextCompletion>, config: &SurveyConfig) -> AppResult<Self> {
        Ok(Self {
            completion,
            template: prompts::profile_template(&config.profile, &config.dimensions),
            parser: ProfileParser::new(&config.profile, &config.dimensions)?,
        })
    }
}

#[async_trait]
impl ProfileSynthesizer for LlmProfileSynthesizer {
    async fn synthesize(
        &self,
        transcript: &[TopicOutcome],
    ) -> Result<SynthesizedProfile, ProfileError> {
        let analysis = transcript_text(transcript);
        let raw = self
            .completion
            .complete(&self.template, &variables([("analisis", analysis.as_str())]))
            .await
            .map_err(|e| ProfileError::Completion(e.to_string()))?;

        match self.parser.parse(&raw) {
            Ok(profile) => {
                info!(profile = %profile, "profile synthesized");
                Ok(SynthesizedProfile { raw, profile })
            }
            Err(e) => {
                warn!(error = %e, output = %raw, "profile output rejected");
                Err(e)
            }
        }
    }
}
