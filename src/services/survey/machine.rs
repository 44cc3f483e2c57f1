//! Elicitation State Machine
//!
//! Per topic: present, collect a reaction, judge it, optionally ask a bounded
//! number of follow-up questions, then accept and advance. All session data
//! lives in an explicit [`SessionState`] owned by the caller.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use esg_survey_core::{ChatMessage, PresentationSink, Speaker, Topic, TopicOutcome, Turn};

use crate::models::settings::{FollowUpPolicy, SurveyConfig};
use crate::utils::error::{AppError, AppResult};

use super::follow_up::FollowUpGenerator;
use super::judge::SufficiencyJudge;
use super::prompts;

/// Where a session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyState {
    PresentingTopic,
    AwaitingReaction,
    AwaitingFollowUpReaction,
    Done,
}

impl fmt::Display for SurveyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SurveyState::PresentingTopic => "presenting_topic",
            SurveyState::AwaitingReaction => "awaiting_reaction",
            SurveyState::AwaitingFollowUpReaction => "awaiting_follow_up_reaction",
            SurveyState::Done => "done",
        };
        f.write_str(s)
    }
}

/// All mutable data of one conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    /// Index of the topic being elicited; equals the topic count once done
    pub current_topic_index: usize,
    pub topic_presented: bool,
    pub awaiting_follow_up: bool,
    /// Follow-up questions asked for the current topic
    pub follow_up_count: u32,
    /// One accepted outcome per completed topic, in topic order
    pub transcript: Vec<TopicOutcome>,
    /// Everything rendered, in display order
    pub message_log: Vec<ChatMessage>,
    /// Turns given for the current topic so far
    pub pending_turns: Vec<Turn>,
    pub profile_requested: bool,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// Total user turns across finished and pending topics
    pub fn turn_count(&self) -> usize {
        self.transcript.iter().map(|o| o.turns.len()).sum::<usize>() + self.pending_turns.len()
    }
}

/// What a single user turn caused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The topic was accepted and the next one presented
    Advanced { topic_index: usize },
    /// A clarifying question was asked for the current topic
    FollowUpAsked { topic_index: usize, question: String },
    /// The last topic was accepted
    Completed,
}

/// Accepted text of a topic from its turns (original reaction first)
pub fn accepted_text(policy: FollowUpPolicy, turns: &[Turn]) -> String {
    let Some(original) = turns.first() else {
        return String::new();
    };
    match policy {
        FollowUpPolicy::Discard => original.text.clone(),
        FollowUpPolicy::Append => turns
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        FollowUpPolicy::Replace => turns
            .iter()
            .rev()
            .find(|t| t.is_follow_up)
            .unwrap_or(original)
            .text
            .clone(),
    }
}

/// Sufficiency-gated elicitation over a fixed topic list
pub struct ElicitationMachine {
    topics: Vec<Topic>,
    judge: Arc<dyn SufficiencyJudge>,
    follow_ups: Arc<dyn FollowUpGenerator>,
    max_follow_ups: u32,
    policy: FollowUpPolicy,
}

impl ElicitationMachine {
    pub fn new(
        topics: Vec<Topic>,
        judge: Arc<dyn SufficiencyJudge>,
        follow_ups: Arc<dyn FollowUpGenerator>,
        config: &SurveyConfig,
    ) -> Self {
        Self {
            topics,
            judge,
            follow_ups,
            max_follow_ups: config.max_follow_ups,
            policy: config.follow_up_policy,
        }
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn max_follow_ups(&self) -> u32 {
        self.max_follow_ups
    }

    /// Current state, derived from the session fields
    pub fn state_of(&self, state: &SessionState) -> SurveyState {
        if state.current_topic_index >= self.topics.len() {
            SurveyState::Done
        } else if !state.topic_presented {
            SurveyState::PresentingTopic
        } else if state.awaiting_follow_up {
            SurveyState::AwaitingFollowUpReaction
        } else {
            SurveyState::AwaitingReaction
        }
    }

    pub fn is_done(&self, state: &SessionState) -> bool {
        self.state_of(state) == SurveyState::Done
    }

    /// Render and log a bot message
    pub fn say(&self, state: &mut SessionState, sink: &mut dyn PresentationSink, text: &str) {
        sink.render_message(Speaker::Bot, text);
        state.message_log.push(ChatMessage::bot(text));
    }

    /// Present the current topic if it has not been shown yet.
    ///
    /// Returns whether a topic prompt was emitted.
    pub fn present(&self, state: &mut SessionState, sink: &mut dyn PresentationSink) -> bool {
        if self.state_of(state) != SurveyState::PresentingTopic {
            return false;
        }
        let topic = &self.topics[state.current_topic_index];
        debug!(
            session_id = %state.session_id,
            topic_index = topic.index,
            "presenting topic"
        );
        self.say(state, sink, &prompts::topic_message(&topic.headline));
        state.topic_presented = true;
        true
    }

    /// Apply one user turn to the session
    pub async fn handle_turn(
        &self,
        state: &mut SessionState,
        text: &str,
        sink: &mut dyn PresentationSink,
    ) -> AppResult<TurnOutcome> {
        if self.is_done(state) {
            return Err(AppError::validation("Survey already complete"));
        }
        // A turn always answers a visible topic
        self.present(state, sink);

        let topic = self.topics[state.current_topic_index].clone();
        let is_follow_up = state.awaiting_follow_up;

        sink.render_message(Speaker::User, text);
        state.message_log.push(ChatMessage::user(text));
        state
            .pending_turns
            .push(Turn::new(topic.index, text, is_follow_up));

        debug!(
            session_id = %state.session_id,
            topic_index = topic.index,
            follow_up_count = state.follow_up_count,
            is_follow_up,
            "turn received"
        );

        if is_follow_up {
            // Follow-up answers are recorded and accepted without judging
            return Ok(self.advance(state, sink));
        }

        let judgement = self.judge.judge(&topic, text).await;
        debug!(
            session_id = %state.session_id,
            topic_index = topic.index,
            verdict = %judgement.verdict,
            category = judgement.category.as_deref().unwrap_or(""),
            "reaction judged"
        );

        if judgement.is_sufficient() || state.follow_up_count >= self.max_follow_ups {
            return Ok(self.advance(state, sink));
        }

        let question = self
            .follow_ups
            .generate(&topic, text, judgement.category.as_deref())
            .await;
        state.follow_up_count += 1;
        state.awaiting_follow_up = true;
        info!(
            session_id = %state.session_id,
            topic_index = topic.index,
            follow_up_count = state.follow_up_count,
            "follow-up asked"
        );
        self.say(state, sink, &question);

        Ok(TurnOutcome::FollowUpAsked {
            topic_index: topic.index,
            question,
        })
    }

    /// Mark the profile as requested. Returns true only the first time the session is done.
    pub fn take_profile_request(&self, state: &mut SessionState) -> bool {
        if !self.is_done(state) || state.profile_requested {
            return false;
        }
        state.profile_requested = true;
        true
    }

    fn advance(&self, state: &mut SessionState, sink: &mut dyn PresentationSink) -> TurnOutcome {
        let topic_index = state.current_topic_index;
        let turns = std::mem::take(&mut state.pending_turns);
        state.transcript.push(TopicOutcome {
            topic_index,
            accepted_text: accepted_text(self.policy, &turns),
            turns,
        });

        state.current_topic_index += 1;
        state.topic_presented = false;
        state.awaiting_follow_up = false;
        state.follow_up_count = 0;

        info!(
            session_id = %state.session_id,
            topic_index,
            remaining = self.topics.len() - state.current_topic_index,
            "topic accepted"
        );

        if self.is_done(state) {
            TurnOutcome::Completed
        } else {
            self.present(state, sink);
            TurnOutcome::Advanced { topic_index }
        }
    }
}
