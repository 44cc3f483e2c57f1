//! Survey Service
//!
//! Sufficiency-gated elicitation over a fixed list of headlines, followed by
//! LLM profile synthesis.
//!
//! - `machine` - per-topic state machine over an explicit `SessionState`
//! - `judge` - sufficiency verdicts with a closed-fail parse of model output
//! - `follow_up` - one clarifying question per insufficient reaction
//! - `profile` - transcript to validated score set
//! - `runner` - drives a session from input to persisted row

pub mod follow_up;
pub mod judge;
pub mod machine;
pub mod profile;
pub mod prompts;
pub mod runner;
pub mod topics;

use std::sync::Arc;

use esg_survey_core::{ContentSource, PersistenceSink};
use esg_survey_llm::TextCompletion;

use crate::models::settings::SurveyConfig;
use crate::utils::error::AppResult;

pub use follow_up::{FollowUpGenerator, LlmFollowUpGenerator};
pub use judge::{Judgement, LlmJudge, SufficiencyJudge, SufficiencyParser, Verdict};
pub use machine::{ElicitationMachine, SessionState, SurveyState, TurnOutcome};
pub use profile::{
    parse_profile, LlmProfileSynthesizer, ProfileError, ProfileParser, ProfileSynthesizer,
    SynthesizedProfile,
};
pub use runner::{build_row, SessionOutcome, SessionReport, SurveyRunner};
pub use topics::{topic_source, DEFAULT_HEADLINES};

/// Wire the LLM-backed judge, follow-up generator and synthesizer into a runner
pub fn build_runner(
    config: &SurveyConfig,
    content: &dyn ContentSource,
    completion: Arc<dyn TextCompletion>,
    persistence: Arc<dyn PersistenceSink>,
) -> AppResult<SurveyRunner> {
    let judge = Arc::new(LlmJudge::new(completion.clone(), config)?);
    let follow_ups = Arc::new(LlmFollowUpGenerator::new(completion.clone()));
    let synthesizer = Arc::new(LlmProfileSynthesizer::new(completion, config)?);

    let machine = ElicitationMachine::new(content.topics(), judge, follow_ups, config);
    Ok(SurveyRunner::new(machine, synthesizer, persistence))
}
