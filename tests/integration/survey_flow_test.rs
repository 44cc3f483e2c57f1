//! Survey Flow Integration Tests
//!
//! Full sessions through `SurveyRunner` with a scripted language model:
//! the headline scenarios, follow-up handling, degraded collaborators and
//! the progress guarantees of the elicitation machine.

use std::sync::Arc;

use async_trait::async_trait;

use esg_survey::models::settings::{FollowUpPolicy, SurveyConfig};
use esg_survey::services::render::{LineInput, TerminalPresenter};
use esg_survey::services::survey::{
    prompts, ElicitationMachine, FollowUpGenerator, Judgement, SessionOutcome, SessionState,
    SufficiencyJudge, SurveyState, TurnOutcome,
};
use esg_survey_core::{RowValue, Speaker, Topic};
use esg_survey_llm::LlmError;

use crate::common::{
    reaction, runner, survey_config, PromptKind, QueuedInput, RecordingScreen, RecordingSink,
    ScriptedProvider,
};

fn three_dimensions(n: usize) -> SurveyConfig {
    SurveyConfig {
        dimensions: vec![
            "Ambiental".to_string(),
            "Social".to_string(),
            "Riesgo".to_string(),
        ],
        ..survey_config(n)
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_all_sufficient_reactions() {
    let provider = Arc::new(ScriptedProvider::new());
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(3);
    let runner = runner(&config, provider.clone(), sink.clone());

    let (r1, r2, r3) = (reaction(1), reaction(2), reaction(3));
    let mut input = QueuedInput::new(&[&r1, &r2, &r3]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("a"), &mut input, &mut screen)
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        SessionOutcome::Completed { persisted: true, .. }
    ));
    assert_eq!(report.state.turn_count(), 3);
    assert_eq!(report.state.transcript.len(), 3);
    for (i, outcome) in report.state.transcript.iter().enumerate() {
        assert_eq!(outcome.topic_index, i);
        assert_eq!(outcome.turns.len(), 1);
    }
    assert_eq!(provider.calls(PromptKind::Judge), 3);
    assert_eq!(provider.calls(PromptKind::FollowUp), 0);
    assert_eq!(provider.calls(PromptKind::Profile), 1);

    assert_eq!(
        screen.bot_messages(),
        vec![
            prompts::GREETING,
            "¿Qué opinas sobre esta noticia? Titular 1",
            "¿Qué opinas sobre esta noticia? Titular 2",
            "¿Qué opinas sobre esta noticia? Titular 3",
            "**Perfil del inversor:** Ambiental: 50, Social: 50, Gobernanza: 50, Riesgo: 50",
            prompts::SAVED_MESSAGE,
        ]
    );
    assert_eq!(screen.charts.len(), 1);
    assert_eq!(sink.rows().len(), 1);
    assert_eq!(sink.rows()[0].len(), 3 + 4);
}

#[tokio::test]
async fn test_finished_session_cannot_be_resumed() {
    let provider = Arc::new(ScriptedProvider::new());
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(1);
    let runner = runner(&config, provider.clone(), sink.clone());

    let r1 = reaction(1);
    let mut input = QueuedInput::new(&[&r1]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("done"), &mut input, &mut screen)
        .await
        .unwrap();
    assert!(report.state.profile_requested);

    let mut input = QueuedInput::new(&[]);
    let result = runner
        .run_session(report.state, &mut input, &mut screen)
        .await;

    assert!(result.is_err());
    assert_eq!(provider.calls(PromptKind::Profile), 1);
    assert_eq!(sink.rows().len(), 1);
}

#[tokio::test]
async fn test_insufficient_reaction_gets_one_follow_up() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .judge("Suficiente: No\nCategoría: Social")
            .follow_up("Pregunta: ¿Qué impacto social te preocupa?"),
    );
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(2);
    let runner = runner(&config, provider.clone(), sink.clone());

    let first = reaction(1);
    let second = reaction(2);
    let mut input = QueuedInput::new(&[&first, "Los despidos en la plantilla", &second]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("b"), &mut input, &mut screen)
        .await
        .unwrap();

    let transcript = &report.state.transcript;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].turns.len(), 2);
    assert!(transcript[0].turns[1].is_follow_up);
    assert_eq!(
        transcript[0].accepted_text,
        format!("{}\nLos despidos en la plantilla", first)
    );
    assert_eq!(transcript[1].turns.len(), 1);
    assert_eq!(transcript[1].accepted_text, second);

    // The follow-up answer is accepted without a second verdict
    assert_eq!(provider.calls(PromptKind::Judge), 2);
    let follow_up_prompts = provider.prompts_of(PromptKind::FollowUp);
    assert_eq!(follow_up_prompts.len(), 1);
    assert!(follow_up_prompts[0].contains("Aspecto a profundizar: Social"));

    let bot = screen.bot_messages();
    assert_eq!(bot[2], "¿Qué impacto social te preocupa?");
    assert_eq!(bot[3], "¿Qué opinas sobre esta noticia? Titular 2");
}

#[tokio::test]
async fn test_malformed_profile_is_not_persisted() {
    let provider =
        Arc::new(ScriptedProvider::new().profile("Ambiental: 70, Social: 40, Riesgo: abc"));
    let sink = Arc::new(RecordingSink::default());
    let config = three_dimensions(3);
    let runner = runner(&config, provider.clone(), sink.clone());

    let (r1, r2, r3) = (reaction(1), reaction(2), reaction(3));
    let mut input = QueuedInput::new(&[&r1, &r2, &r3]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("c"), &mut input, &mut screen)
        .await
        .unwrap();

    match report.outcome {
        SessionOutcome::InvalidProfile(e) => assert!(e.to_string().contains("Riesgo")),
        other => panic!("expected invalid profile, got {:?}", other),
    }
    assert!(sink.rows().is_empty());
    assert!(screen.charts.is_empty());
    let last = screen.bot_messages().last().unwrap().to_string();
    assert!(last.contains("Riesgo"));
}

#[tokio::test]
async fn test_well_formed_profile_row_layout() {
    let provider =
        Arc::new(ScriptedProvider::new().profile("Ambiental: 70, Social: 40, Riesgo: 85"));
    let sink = Arc::new(RecordingSink::default());
    let config = three_dimensions(3);
    let runner = runner(&config, provider, sink.clone());

    let (r1, r2, r3) = (reaction(1), reaction(2), reaction(3));
    let mut input = QueuedInput::new(&[&r1, &r2, &r3]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("d"), &mut input, &mut screen)
        .await
        .unwrap();

    match &report.outcome {
        SessionOutcome::Completed { profile, persisted } => {
            assert!(*persisted);
            assert_eq!(profile.get("Ambiental"), Some(70));
            assert_eq!(profile.get("Social"), Some(40));
            assert_eq!(profile.get("Riesgo"), Some(85));
        }
        other => panic!("expected completed session, got {:?}", other),
    }

    assert_eq!(
        sink.rows(),
        vec![vec![
            RowValue::from(r1.as_str()),
            RowValue::from(r2.as_str()),
            RowValue::from(r3.as_str()),
            RowValue::from(70u8),
            RowValue::from(40u8),
            RowValue::from(85u8),
        ]]
    );
    assert_eq!(
        screen.charts[0],
        vec![
            ("Ambiental".to_string(), 70),
            ("Social".to_string(), 40),
            ("Riesgo".to_string(), 85),
        ]
    );
}

// ============================================================================
// Degraded collaborators and input edge cases
// ============================================================================

#[tokio::test]
async fn test_judge_failure_and_garbage_fail_closed() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .judge_error(LlmError::NetworkError {
                message: "connection reset".to_string(),
            })
            .judge("Quizás, depende del contexto"),
    );
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(2);
    let runner = runner(&config, provider.clone(), sink.clone());

    let (r1, r2) = (reaction(1), reaction(2));
    let mut input = QueuedInput::new(&[&r1, "más detalle", &r2, "otro detalle"]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("e"), &mut input, &mut screen)
        .await
        .unwrap();

    assert_eq!(provider.calls(PromptKind::FollowUp), 2);
    assert!(report
        .state
        .transcript
        .iter()
        .all(|o| o.turns.len() == 2));
    assert_eq!(sink.rows().len(), 1);
}

#[tokio::test]
async fn test_insufficient_label_is_not_read_as_sufficient() {
    let provider = Arc::new(ScriptedProvider::new().judge("Insuficiente: Sí"));
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(1);
    let runner = runner(&config, provider.clone(), sink);

    let r1 = reaction(1);
    let mut input = QueuedInput::new(&[&r1, "Más detalle sobre el riesgo"]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("ins"), &mut input, &mut screen)
        .await
        .unwrap();

    assert_eq!(provider.calls(PromptKind::FollowUp), 1);
    assert_eq!(report.state.transcript[0].turns.len(), 2);
}

#[tokio::test]
async fn test_short_reaction_skips_judge_call() {
    let provider = Arc::new(ScriptedProvider::new().follow_up(""));
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(1);
    let runner = runner(&config, provider.clone(), sink);

    let mut input = QueuedInput::new(&["No sé", "Me preocupa el agua"]);
    let mut screen = RecordingScreen::default();
    runner
        .run_session(SessionState::new("f"), &mut input, &mut screen)
        .await
        .unwrap();

    assert_eq!(provider.calls(PromptKind::Judge), 0);
    // Empty generator output falls back to the fixed question
    assert!(screen
        .bot_messages()
        .contains(&prompts::fallback_follow_up(None).as_str()));
}

#[tokio::test]
async fn test_persistence_failure_keeps_profile_visible() {
    let provider = Arc::new(ScriptedProvider::new());
    let sink = Arc::new(RecordingSink::failing());
    let config = survey_config(1);
    let runner = runner(&config, provider, sink);

    let r1 = reaction(1);
    let mut input = QueuedInput::new(&[&r1]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("g"), &mut input, &mut screen)
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        SessionOutcome::Completed { persisted: false, .. }
    ));
    assert_eq!(screen.charts.len(), 1);
    let last = screen.bot_messages().last().unwrap().to_string();
    assert!(last.starts_with("Error al guardar datos:"));
    assert!(last.contains("spreadsheet unavailable"));
}

#[tokio::test]
async fn test_closed_input_abandons_without_profile() {
    let provider = Arc::new(ScriptedProvider::new());
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(3);
    let runner = runner(&config, provider.clone(), sink.clone());

    let r1 = reaction(1);
    let mut input = QueuedInput::new(&[&r1]);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("h"), &mut input, &mut screen)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Abandoned);
    assert_eq!(report.state.transcript.len(), 1);
    assert_eq!(provider.calls(PromptKind::Profile), 0);
    assert!(sink.rows().is_empty());
}

#[tokio::test]
async fn test_idle_cycles_and_blank_turns_are_ignored() {
    let provider = Arc::new(ScriptedProvider::new());
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(2);
    let runner = runner(&config, provider.clone(), sink.clone());

    let (r1, r2) = (reaction(1), reaction(2));
    let mut input = QueuedInput::new(&[&r1, "   ", &r2]).with_idle(1);
    let mut screen = RecordingScreen::default();
    let report = runner
        .run_session(SessionState::new("i"), &mut input, &mut screen)
        .await
        .unwrap();

    assert_eq!(report.state.turn_count(), 2);
    assert_eq!(provider.calls(PromptKind::Judge), 2);
    // Each topic prompt is shown exactly once despite the idle cycles
    let topic_prompts = screen
        .bot_messages()
        .iter()
        .filter(|m| m.starts_with("¿Qué opinas"))
        .count();
    assert_eq!(topic_prompts, 2);
}

#[tokio::test]
async fn test_follow_up_policies() {
    for (policy, expected) in [
        (FollowUpPolicy::Discard, "Primera reacción breve"),
        (FollowUpPolicy::Replace, "Segunda respuesta"),
        (
            FollowUpPolicy::Append,
            "Primera reacción breve\nSegunda respuesta",
        ),
    ] {
        let provider = Arc::new(ScriptedProvider::new());
        let sink = Arc::new(RecordingSink::default());
        let config = SurveyConfig {
            follow_up_policy: policy,
            min_words: 10,
            ..survey_config(1)
        };
        let runner = runner(&config, provider, sink.clone());

        let mut input = QueuedInput::new(&["Primera reacción breve", "Segunda respuesta"]);
        let mut screen = RecordingScreen::default();
        let report = runner
            .run_session(SessionState::new("p"), &mut input, &mut screen)
            .await
            .unwrap();

        assert_eq!(report.state.transcript[0].accepted_text, expected, "{}", policy);
        assert_eq!(sink.rows()[0][0], RowValue::from(expected));
    }
}

#[tokio::test]
async fn test_terminal_session_end_to_end() {
    let provider = Arc::new(ScriptedProvider::new());
    let sink = Arc::new(RecordingSink::default());
    let config = survey_config(2);
    let runner = runner(&config, provider, sink.clone());

    let script = format!("{}\n\n{}\n", reaction(1), reaction(2));
    let mut input = LineInput::new(script.as_bytes());
    let mut presenter = TerminalPresenter::new(Vec::new(), true);
    let report = runner.run(&mut input, &mut presenter).await.unwrap();
    assert!(matches!(report.outcome, SessionOutcome::Completed { .. }));

    let output = String::from_utf8(presenter.into_inner()).unwrap();
    assert!(output.starts_with("🤖 Chatbot de Análisis de Sentimiento"));
    assert!(output.contains(&format!("🧑 {}", reaction(1))));
    assert!(output.contains(prompts::CHART_TITLE));
    assert!(output.contains(prompts::CHART_VALUE_LABEL));
    assert_eq!(sink.rows().len(), 1);
}

// ============================================================================
// Progress and bounded follow-ups under adversarial judges
// ============================================================================

struct AlwaysInsufficient;

#[async_trait]
impl SufficiencyJudge for AlwaysInsufficient {
    async fn judge(&self, _topic: &Topic, _reaction: &str) -> Judgement {
        Judgement::insufficient(Some("Gobernanza".to_string()))
    }
}

/// Sufficient only on every third call
#[derive(Default)]
struct Flaky {
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl SufficiencyJudge for Flaky {
    async fn judge(&self, _topic: &Topic, _reaction: &str) -> Judgement {
        let n = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if n % 3 == 2 {
            Judgement::sufficient()
        } else {
            Judgement::insufficient(None)
        }
    }
}

struct FixedQuestion;

#[async_trait]
impl FollowUpGenerator for FixedQuestion {
    async fn generate(&self, _topic: &Topic, _reaction: &str, _category: Option<&str>) -> String {
        "¿Por qué?".to_string()
    }
}

fn topics(n: usize) -> Vec<Topic> {
    (0..n).map(|i| Topic::new(i, format!("Titular {}", i + 1))).collect()
}

async fn drive(machine: &ElicitationMachine, limit: usize) -> (SessionState, usize, Vec<usize>) {
    let mut state = SessionState::new("prop");
    let mut screen = RecordingScreen::default();
    let mut turns = 0;
    let mut follow_ups = vec![0; machine.topic_count()];

    while !machine.is_done(&state) && turns < limit {
        let before = state.current_topic_index;
        let outcome = machine
            .handle_turn(&mut state, "respuesta", &mut screen)
            .await
            .unwrap();
        turns += 1;
        if let TurnOutcome::FollowUpAsked { topic_index, .. } = outcome {
            follow_ups[topic_index] += 1;
        }
        assert!(state.current_topic_index >= before);
    }
    (state, turns, follow_ups)
}

#[tokio::test]
async fn test_progress_is_bounded_for_any_judge() {
    let n = 4;
    let judges: Vec<Arc<dyn SufficiencyJudge>> =
        vec![Arc::new(AlwaysInsufficient), Arc::new(Flaky::default())];

    for judge in judges {
        for max_follow_ups in 0..=3u32 {
            let config = SurveyConfig {
                max_follow_ups,
                ..Default::default()
            };
            let machine =
                ElicitationMachine::new(topics(n), judge.clone(), Arc::new(FixedQuestion), &config);
            let bound = n * (max_follow_ups as usize + 1);

            let (state, turns, follow_ups) = drive(&machine, bound + 10).await;

            assert_eq!(machine.state_of(&state), SurveyState::Done);
            assert!(turns <= bound, "{} turns exceeds bound {}", turns, bound);
            assert!(follow_ups.iter().all(|c| *c <= max_follow_ups as usize));
            assert_eq!(state.transcript.len(), n);
            assert!(state
                .transcript
                .iter()
                .enumerate()
                .all(|(i, o)| o.topic_index == i));
        }
    }
}

#[tokio::test]
async fn test_done_session_rejects_turns() {
    let config = SurveyConfig {
        max_follow_ups: 0,
        ..Default::default()
    };
    let machine = ElicitationMachine::new(
        topics(1),
        Arc::new(AlwaysInsufficient),
        Arc::new(FixedQuestion),
        &config,
    );
    let mut state = SessionState::new("done");
    let mut screen = RecordingScreen::default();

    let outcome = machine
        .handle_turn(&mut state, "respuesta", &mut screen)
        .await
        .unwrap();
    assert_eq!(outcome, TurnOutcome::Completed);
    assert!(machine
        .handle_turn(&mut state, "otra", &mut screen)
        .await
        .is_err());
    assert!(machine.take_profile_request(&mut state));
    assert!(!machine.take_profile_request(&mut state));
    assert_eq!(
        screen.messages.last().map(|(s, _)| *s),
        Some(Speaker::User)
    );
}
