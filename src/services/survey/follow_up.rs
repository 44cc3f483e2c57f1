//! Follow-up Generator
//!
//! Produces exactly one clarifying question for an insufficient reaction.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use esg_survey_core::Topic;
use esg_survey_llm::{variables, PromptTemplate, TextCompletion};

use super::prompts;

/// Generates one non-empty clarifying question. Never fails.
#[async_trait]
pub trait FollowUpGenerator: Send + Sync {
    async fn generate(&self, topic: &Topic, reaction: &str, category: Option<&str>) -> String;
}

/// Follow-up generator backed by the text-completion collaborator
pub struct LlmFollowUpGenerator {
    completion: Arc<dyn TextCompletion>,
    template: PromptTemplate,
}

impl LlmFollowUpGenerator {
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self {
            completion,
            template: prompts::follow_up_template(),
        }
    }
}

#[async_trait]
impl FollowUpGenerator for LlmFollowUpGenerator {
    async fn generate(&self, topic: &Topic, reaction: &str, category: Option<&str>) -> String {
        let focus = prompts::follow_up_focus(category);
        let vars = variables([
            ("noticia", topic.headline.as_str()),
            ("respuesta", reaction),
            ("enfoque", focus.as_str()),
        ]);

        match self.completion.complete(&self.template, &vars).await {
            Ok(raw) => match clean_question(&raw) {
                Some(question) => question,
                None => {
                    warn!(topic_index = topic.index, "empty follow-up question, using fallback");
                    prompts::fallback_follow_up(category)
                }
            },
            Err(e) => {
                warn!(
                    topic_index = topic.index,
                    error = %e,
                    "follow-up completion failed, using fallback"
                );
                prompts::fallback_follow_up(category)
            }
        }
    }
}

/// Strip labels and quoting around a generated question.
///
/// When the model wraps the question in commentary, the first line that ends
/// with `?` is kept. Output that is not a question is still returned.
pub fn clean_question(raw: &str) -> Option<String> {
    let lines: Vec<String> = raw
        .lines()
        .map(strip_decoration)
        .filter(|l| !l.is_empty())
        .collect();

    let chosen = lines
        .iter()
        .find(|l| l.ends_with('?'))
        .cloned()
        .or_else(|| {
            if lines.is_empty() {
                None
            } else {
                Some(lines.join(" "))
            }
        })?;

    if chosen.is_empty() {
        None
    } else {
        Some(chosen)
    }
}

fn strip_decoration(line: &str) -> String {
    line.trim()
        .trim_start_matches('#')
        .trim_start_matches(['-', '>'])
        .trim()
        .trim_start_matches("**Pregunta:**")
        .trim_start_matches("**Pregunta**:")
        .trim_start_matches("Pregunta de seguimiento:")
        .trim_start_matches("Pregunta:")
        .trim()
        .trim_matches(|c| c == '"' || c == '*' || c == '«' || c == '»')
        .trim()
        .to_string()
}
