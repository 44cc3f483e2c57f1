//! Profile Integration Tests
//!
//! Score extraction from synthesizer output and the synthesizer's failure
//! branches when driven through the text-completion stack.

use std::sync::Arc;

use esg_survey::models::settings::{ProfilePatternConfig, SurveyConfig};
use esg_survey::services::survey::profile::transcript_text;
use esg_survey::services::survey::{
    parse_profile, LlmProfileSynthesizer, ProfileError, ProfileParser, ProfileSynthesizer,
    SessionOutcome, SessionState,
};
use esg_survey_core::TopicOutcome;
use esg_survey_llm::{Completer, LlmError};

use crate::common::{
    reaction, runner, survey_config, PromptKind, QueuedInput, RecordingScreen, RecordingSink,
    ScriptedProvider,
};

fn dims(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn outcome(index: usize, text: &str) -> TopicOutcome {
    TopicOutcome {
        topic_index: index,
        accepted_text: text.to_string(),
        turns: Vec::new(),
    }
}

// ============================================================================
// Grammar
// ============================================================================

#[test]
fn test_profile_from_verbose_model_output() {
    let raw = "Perfil del inversor:\n\
               El inversor muestra una preocupación alta por el medio ambiente.\n\
               - **Ambiental:** 82\n\
               - **Social:** 45\n\
               - **Gobernanza:** 60/100\n\
               - **Riesgo:** [30]";
    let profile =
        parse_profile(raw, &dims(&["Ambiental", "Social", "Gobernanza", "Riesgo"])).unwrap();
    assert_eq!(
        profile.scores(),
        &[
            ("Ambiental".to_string(), 82),
            ("Social".to_string(), 45),
            ("Gobernanza".to_string(), 60),
            ("Riesgo".to_string(), 30),
        ]
    );
    assert_eq!(profile.to_string(), "Ambiental: 82, Social: 45, Gobernanza: 60, Riesgo: 30");
}

#[test]
fn test_echoed_format_line_is_skipped() {
    let raw = "Formato: Ambiental: [puntuación], Social: [puntuación]\nAmbiental: 10, Social: 90";
    let profile = parse_profile(raw, &dims(&["Ambiental", "Social"])).unwrap();
    assert_eq!(profile.get("Ambiental"), Some(10));
    assert_eq!(profile.get("Social"), Some(90));
}

#[test]
fn test_profile_failures_name_the_dimension() {
    let three = dims(&["Ambiental", "Social", "Riesgo"]);

    assert_eq!(
        parse_profile("Ambiental: 70, Social: 40", &three),
        Err(ProfileError::Missing {
            dimension: "Riesgo".to_string()
        })
    );
    assert_eq!(
        parse_profile("Ambiental: 70, Social: 40, Riesgo: abc", &three),
        Err(ProfileError::NotAnInteger {
            dimension: "Riesgo".to_string(),
            value: "abc".to_string()
        })
    );
    assert_eq!(
        parse_profile("Ambiental: 170, Social: 40, Riesgo: 5", &three),
        Err(ProfileError::OutOfRange {
            dimension: "Ambiental".to_string(),
            value: "170".to_string()
        })
    );
    assert!(matches!(
        parse_profile("Ambiental: 99999999999999999999, Social: 1, Riesgo: 1", &three),
        Err(ProfileError::OutOfRange { .. })
    ));
}

#[test]
fn test_decimal_scores_are_not_truncated() {
    let three = dims(&["Ambiental", "Social", "Riesgo"]);
    for raw in [
        "Ambiental: 72.5, Social: 40, Riesgo: 85",
        "Ambiental: 72,5; Social: 40; Riesgo: 85",
    ] {
        assert!(
            matches!(
                parse_profile(raw, &three),
                Err(ProfileError::NotAnInteger { ref dimension, .. }) if dimension == "Ambiental"
            ),
            "accepted {}",
            raw
        );
    }
}

#[tokio::test]
async fn test_decimal_profile_is_not_persisted() {
    let provider = Arc::new(
        ScriptedProvider::new().profile("Ambiental: 72.5, Social: 40, Gobernanza: 10, Riesgo: 85"),
    );
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(1);
    let runner = runner(&config, provider, sink.clone());

    let r1 = reaction(1);
    let mut input = QueuedInput::new(&[&r1]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("dec"), &mut input, &mut screen)
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        SessionOutcome::InvalidProfile(ProfileError::NotAnInteger { .. })
    ));
    assert!(sink.rows().is_empty());
    assert!(screen.charts.is_empty());
}

#[test]
fn test_custom_separator_and_case() {
    let pattern = ProfilePatternConfig {
        separator: "=".to_string(),
        case_sensitive: true,
    };
    let parser = ProfileParser::new(&pattern, &dims(&["Ambiental", "Social"])).unwrap();

    let profile = parser.parse("Ambiental = 70; Social = 40").unwrap();
    assert_eq!(profile.get("Social"), Some(40));
    assert!(matches!(
        parser.parse("ambiental = 70; Social = 40"),
        Err(ProfileError::Missing { .. })
    ));
}

// ============================================================================
// Synthesizer
// ============================================================================

#[test]
fn test_transcript_text_is_newline_joined() {
    let transcript = vec![outcome(0, "uno"), outcome(1, "dos\ntres")];
    assert_eq!(transcript_text(&transcript), "uno\ndos\ntres");
}

#[tokio::test]
async fn test_synthesizer_sends_transcript() {
    let provider = Arc::new(ScriptedProvider::new().profile(
        "Ambiental: 70, Social: 40, Gobernanza: 20, Riesgo: 85",
    ));
    let completion = Arc::new(Completer::new(provider.clone()).with_max_retries(0));
    let synthesizer = LlmProfileSynthesizer::new(completion, &SurveyConfig::default()).unwrap();

    let synthesized = synthesizer
        .synthesize(&[outcome(0, "me preocupa el clima"), outcome(1, "bien")])
        .await
        .unwrap();
    assert_eq!(synthesized.profile.get("Riesgo"), Some(85));

    let prompts = provider.prompts_of(PromptKind::Profile);
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Análisis de reacciones: me preocupa el clima\nbien"));
    assert!(prompts[0].contains("Ambiental: [puntuación], Social: [puntuación]"));
}

#[tokio::test]
async fn test_synthesizer_completion_failure() {
    let provider = Arc::new(ScriptedProvider::new().profile_error(LlmError::AuthenticationFailed {
        message: "invalid key".to_string(),
    }));
    let completion = Arc::new(Completer::new(provider).with_max_retries(0));
    let synthesizer = LlmProfileSynthesizer::new(completion, &SurveyConfig::default()).unwrap();

    let err = synthesizer.synthesize(&[outcome(0, "x")]).await.unwrap_err();
    assert!(matches!(err, ProfileError::Completion(_)));
}

#[tokio::test]
async fn test_completion_failure_is_visible_and_not_stored() {
    let provider = Arc::new(ScriptedProvider::new().profile_error(LlmError::ServerError {
        message: "overloaded".to_string(),
        status: Some(503),
    }));
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(1);
    let runner = runner(&config, provider, sink.clone());

    let r1 = reaction(1);
    let mut input = QueuedInput::new(&[&r1]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("s"), &mut input, &mut screen)
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        SessionOutcome::InvalidProfile(ProfileError::Completion(_))
    ));
    assert!(sink.rows().is_empty());
    assert!(screen
        .bot_messages()
        .last()
        .unwrap()
        .starts_with("No se pudo generar el perfil del inversor"));
}
