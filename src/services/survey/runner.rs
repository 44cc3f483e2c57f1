//! Survey Runner
//!
//! Drives one session end to end: reads turns from an input source, feeds them
//! to the elicitation machine, then synthesizes, renders and stores the profile.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use esg_survey_core::{
    CoreError, InputSource, PersistenceSink, PresentationSink, Profile, RowValue, TopicOutcome,
};

use crate::utils::error::{AppError, AppResult};

use super::machine::{ElicitationMachine, SessionState};
use super::profile::{ProfileError, ProfileSynthesizer};
use super::prompts;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Profile shown; `persisted` tells whether the row was stored
    Completed { profile: Profile, persisted: bool },
    /// Synthesizer output was unusable; nothing was stored
    InvalidProfile(ProfileError),
    /// Input closed before the last topic was accepted; nothing was stored
    Abandoned,
}

/// Final session data returned to the caller
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub state: SessionState,
    pub outcome: SessionOutcome,
}

/// Row layout: accepted reactions in topic order, then scores in dimension order
pub fn build_row(transcript: &[TopicOutcome], profile: &Profile) -> Vec<RowValue> {
    transcript
        .iter()
        .map(|o| RowValue::Text(o.accepted_text.clone()))
        .chain(profile.scores().iter().map(|(_, s)| RowValue::Score(*s)))
        .collect()
}

pub struct SurveyRunner {
    machine: ElicitationMachine,
    synthesizer: Arc<dyn ProfileSynthesizer>,
    persistence: Arc<dyn PersistenceSink>,
}

impl SurveyRunner {
    pub fn new(
        machine: ElicitationMachine,
        synthesizer: Arc<dyn ProfileSynthesizer>,
        persistence: Arc<dyn PersistenceSink>,
    ) -> Self {
        Self {
            machine,
            synthesizer,
            persistence,
        }
    }

    pub fn machine(&self) -> &ElicitationMachine {
        &self.machine
    }

    /// Run a fresh session with a generated id
    pub async fn run(
        &self,
        input: &mut dyn InputSource,
        sink: &mut dyn PresentationSink,
    ) -> AppResult<SessionReport> {
        let state = SessionState::new(Uuid::new_v4().to_string());
        self.run_session(state, input, sink).await
    }

    /// Run a session from the given state until done or the input closes
    pub async fn run_session(
        &self,
        mut state: SessionState,
        input: &mut dyn InputSource,
        sink: &mut dyn PresentationSink,
    ) -> AppResult<SessionReport> {
        info!(
            session_id = %state.session_id,
            topics = self.machine.topic_count(),
            max_follow_ups = self.machine.max_follow_ups(),
            "survey session started"
        );
        if state.profile_requested {
            return Err(AppError::validation("Survey session already finished"));
        }
        if state.message_log.is_empty() {
            self.machine.say(&mut state, sink, prompts::GREETING);
        }

        while !self.machine.is_done(&state) {
            self.machine.present(&mut state, sink);

            match input.read_next_input().await {
                Ok(Some(text)) => {
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    self.machine.handle_turn(&mut state, text, sink).await?;
                }
                Ok(None) => continue,
                Err(CoreError::InputClosed) => {
                    info!(
                        session_id = %state.session_id,
                        topic_index = state.current_topic_index,
                        "input closed, session abandoned"
                    );
                    return Ok(SessionReport {
                        state,
                        outcome: SessionOutcome::Abandoned,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        let outcome = self
            .finish(&mut state, sink)
            .await
            .ok_or_else(|| AppError::internal("Finished session produced no outcome"))?;
        Ok(SessionReport { state, outcome })
    }

    /// Synthesize, render and persist the profile of a finished session.
    ///
    /// Runs the synthesizer at most once per session; returns `None` if the
    /// session is not done or its profile was already requested.
    pub async fn finish(
        &self,
        state: &mut SessionState,
        sink: &mut dyn PresentationSink,
    ) -> Option<SessionOutcome> {
        if !self.machine.take_profile_request(state) {
            return None;
        }

        let synthesized = match self.synthesizer.synthesize(&state.transcript).await {
            Ok(s) => s,
            Err(e) => {
                warn!(session_id = %state.session_id, error = %e, "profile synthesis failed");
                self.machine
                    .say(state, sink, &prompts::profile_error_message(&e.to_string()));
                return Some(SessionOutcome::InvalidProfile(e));
            }
        };

        self.machine
            .say(state, sink, &prompts::profile_message(&synthesized.raw));
        sink.render_bar_chart(synthesized.profile.scores());

        let row = build_row(&state.transcript, &synthesized.profile);
        let persisted = match self.persistence.append_row(&row).await {
            Ok(()) => {
                info!(
                    session_id = %state.session_id,
                    sink = self.persistence.name(),
                    cells = row.len(),
                    "survey row stored"
                );
                self.machine.say(state, sink, prompts::SAVED_MESSAGE);
                true
            }
            Err(e) => {
                warn!(
                    session_id = %state.session_id,
                    sink = self.persistence.name(),
                    error = %e,
                    "failed to store survey row"
                );
                self.machine
                    .say(state, sink, &prompts::save_error_message(&e.to_string()));
                false
            }
        };

        Some(SessionOutcome::Completed {
            profile: synthesized.profile,
            persisted,
        })
    }
}
