//! Sufficiency Judge
//!
//! Decides whether a reaction carries enough analyzable content. The model is
//! asked for a `Suficiente: Sí|No` line plus an optional `Categoría: <dimension>`
//! line; anything that does not match that grammar, and any completion failure,
//! counts as insufficient with no category.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use esg_survey_core::Topic;
use esg_survey_llm::{variables, PromptTemplate, TextCompletion};

use crate::models::settings::SurveyConfig;
use crate::utils::error::{AppError, AppResult};

use super::prompts;

/// Binary sufficiency decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sufficient,
    Insufficient,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Sufficient => write!(f, "sufficient"),
            Verdict::Insufficient => write!(f, "insufficient"),
        }
    }
}

/// Verdict plus the dimension the reaction most lacks, when reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgement {
    pub verdict: Verdict,
    /// Always one of the configured dimensions
    pub category: Option<String>,
}

impl Judgement {
    pub fn sufficient() -> Self {
        Self {
            verdict: Verdict::Sufficient,
            category: None,
        }
    }

    pub fn insufficient(category: Option<String>) -> Self {
        Self {
            verdict: Verdict::Insufficient,
            category,
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.verdict == Verdict::Sufficient
    }
}

/// Judges one reaction to one topic. Never fails: degraded paths are insufficient.
#[async_trait]
pub trait SufficiencyJudge: Send + Sync {
    async fn judge(&self, topic: &Topic, reaction: &str) -> Judgement;
}

/// Reads judge output according to the configured labels and vocabularies
#[derive(Debug, Clone)]
pub struct SufficiencyParser {
    verdict_re: Regex,
    category_re: Regex,
    yes: Vec<String>,
    dimensions: Vec<String>,
}

impl SufficiencyParser {
    pub fn new(config: &SurveyConfig) -> AppResult<Self> {
        let pattern = &config.sufficiency;

        let mut words: Vec<&String> = pattern.yes.iter().chain(pattern.no.iter()).collect();
        // Longest first so a word is never shadowed by its own prefix
        words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
        let alternatives = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");

        let verdict_re = Regex::new(&format!(
            r#"(?i)(?:^|[^\p{{L}}\p{{N}}_]){}[\s*_]*:[\s*_"'«]*({})(?:[^\p{{L}}\p{{N}}]|$)"#,
            regex::escape(&pattern.label),
            alternatives
        ))
        .map_err(|e| AppError::config(format!("Invalid sufficiency pattern: {}", e)))?;

        let category_re = Regex::new(&format!(
            r#"(?i)(?:^|[^\p{{L}}\p{{N}}_]){}[\s*_]*:[\s*_"'«]*(\p{{L}}+)"#,
            regex::escape(&pattern.category_label)
        ))
        .map_err(|e| AppError::config(format!("Invalid category pattern: {}", e)))?;

        Ok(Self {
            verdict_re,
            category_re,
            yes: pattern.yes.iter().map(|w| w.to_lowercase()).collect(),
            dimensions: config.dimensions.clone(),
        })
    }

    /// Parse model output. `None` means the output did not match the grammar.
    pub fn parse(&self, raw: &str) -> Option<Judgement> {
        let word = self.verdict_re.captures(raw)?.get(1)?.as_str().to_lowercase();

        if self.yes.contains(&word) {
            return Some(Judgement::sufficient());
        }

        let category = self
            .category_re
            .captures(raw)
            .and_then(|c| c.get(1))
            .and_then(|m| {
                let found = m.as_str().to_lowercase();
                self.dimensions
                    .iter()
                    .find(|d| d.to_lowercase() == found)
                    .cloned()
            });

        Some(Judgement::insufficient(category))
    }
}

/// Judge backed by the text-completion collaborator
pub struct LlmJudge {
    completion: Arc<dyn TextCompletion>,
    template: PromptTemplate,
    parser: SufficiencyParser,
    min_words: usize,
}

impl LlmJudge {
    pub fn new(completion: Arc<dyn TextCompletion>, config: &SurveyConfig) -> AppResult<Self> {
        Ok(Self {
            completion,
            template: prompts::judge_template(&config.sufficiency, &config.dimensions),
            parser: SufficiencyParser::new(config)?,
            min_words: config.min_words,
        })
    }
}

#[async_trait]
impl SufficiencyJudge for LlmJudge {
    async fn judge(&self, topic: &Topic, reaction: &str) -> Judgement {
        let words = reaction.split_whitespace().count();
        if words < self.min_words {
            debug!(
                topic_index = topic.index,
                words,
                min_words = self.min_words,
                "reaction below word threshold"
            );
            return Judgement::insufficient(None);
        }

        let vars = variables([("noticia", topic.headline.as_str()), ("respuesta", reaction)]);
        match self.completion.complete(&self.template, &vars).await {
            Ok(raw) => match self.parser.parse(&raw) {
                Some(judgement) => judgement,
                None => {
                    warn!(
                        topic_index = topic.index,
                        output = %raw,
                        "unrecognized judge output, treating as insufficient"
                    );
                    Judgement::insufficient(None)
                }
            },
            Err(e) => {
                warn!(
                    topic_index = topic.index,
                    error = %e,
                    "judge completion failed, treating as insufficient"
                );
                Judgement::insufficient(None)
            }
        }
    }
}
