//! Survey Domain Types
//!
//! Plain data carried between the elicitation state machine, the profile
//! synthesizer and the outer sinks. Nothing in here performs I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Upper bound (inclusive) of every profile score
pub const MAX_SCORE: u8 = 100;

/// Author of a rendered chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Bot,
    User,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Bot => "bot",
            Speaker::User => "user",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation log, in the order the user saw it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatMessage {
    /// Create a bot message
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Bot,
            text: text.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }
}

/// A headline presented to the user, identified by its position in the content source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub index: usize,
    pub headline: String,
}

impl Topic {
    pub fn new(index: usize, headline: impl Into<String>) -> Self {
        Self {
            index,
            headline: headline.into(),
        }
    }
}

/// One user reaction to the current topic attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub text: String,
    pub topic_index: usize,
    /// Whether this turn answers a follow-up question rather than the headline itself
    pub is_follow_up: bool,
}

impl Turn {
    pub fn new(topic_index: usize, text: impl Into<String>, is_follow_up: bool) -> Self {
        Self {
            text: text.into(),
            topic_index,
            is_follow_up,
        }
    }
}

/// Final, accepted reaction for a topic once its elicitation loop completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicOutcome {
    pub topic_index: usize,
    /// Text that represents this topic in the transcript and the persisted row
    pub accepted_text: String,
    /// Every turn the user gave for this topic, in order
    pub turns: Vec<Turn>,
}

/// One cell of a persisted row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowValue {
    Text(String),
    Score(u8),
}

impl fmt::Display for RowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValue::Text(text) => f.write_str(text),
            RowValue::Score(score) => write!(f, "{}", score),
        }
    }
}

impl From<&str> for RowValue {
    fn from(value: &str) -> Self {
        RowValue::Text(value.to_string())
    }
}

impl From<u8> for RowValue {
    fn from(value: u8) -> Self {
        RowValue::Score(value)
    }
}

/// Scored investor profile, one integer in `[0, 100]` per configured dimension.
///
/// Dimension order is the configured order and is preserved everywhere the
/// profile is rendered or persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    scores: Vec<(String, u8)>,
}

impl Profile {
    /// Build a profile from ordered `(dimension, score)` pairs.
    ///
    /// Rejects empty score sets, duplicate dimensions and scores above [`MAX_SCORE`].
    pub fn new(scores: Vec<(String, u8)>) -> CoreResult<Self> {
        if scores.is_empty() {
            return Err(CoreError::validation("Profile needs at least one dimension"));
        }

        for (i, (dimension, score)) in scores.iter().enumerate() {
            if *score > MAX_SCORE {
                return Err(CoreError::validation(format!(
                    "Score for {} out of range: {}",
                    dimension, score
                )));
            }
            if scores[..i].iter().any(|(d, _)| d == dimension) {
                return Err(CoreError::validation(format!(
                    "Duplicate dimension: {}",
                    dimension
                )));
            }
        }

        Ok(Self { scores })
    }

    /// Score of a dimension, if configured
    pub fn get(&self, dimension: &str) -> Option<u8> {
        self.scores
            .iter()
            .find(|(d, _)| d == dimension)
            .map(|(_, s)| *s)
    }

    /// Ordered `(dimension, score)` pairs
    pub fn scores(&self) -> &[(String, u8)] {
        &self.scores
    }

    /// Ordered dimension names
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.scores.iter().map(|(d, _)| d.as_str())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .scores
            .iter()
            .map(|(d, s)| format!("{}: {}", d, s))
            .collect();
        f.write_str(&parts.join(", "))
    }
}
