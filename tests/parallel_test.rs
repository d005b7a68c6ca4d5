use std::sync::Arc;
use std::time::Duration;

use maestro::ErrorKind;
use maestro::engine::Engine;
use maestro::engine::parallel::{FanOutConfig, FanOutEngine, PromptTask};
use maestro::llm::mock::MockModel;
use maestro::prompts::parallel::{
    KEY_TERMS_INSTRUCTION, QUESTIONS_INSTRUCTION, SUMMARY_INSTRUCTION, SYNTHESIS_DIRECTIVE,
    TREND_INSTRUCTION,
};

const TOPIC: &str = "the history of space exploration";

fn scripted() -> MockModel {
    MockModel::new()
        .reply(SUMMARY_INSTRUCTION, "MOCK-SUMMARY")
        .reply(QUESTIONS_INSTRUCTION, "MOCK-QUESTIONS")
        .reply(KEY_TERMS_INSTRUCTION, "MOCK-TERMS")
        .reply(TREND_INSTRUCTION, "MOCK-TREND")
        .reply(SYNTHESIS_DIRECTIVE, "MOCK-SYNTHESIS")
}

fn build_engine(mock: Arc<MockModel>, config: FanOutConfig) -> FanOutEngine {
    FanOutEngine::new(mock, PromptTask::defaults(), config).unwrap()
}

fn synthesis_calls(mock: &MockModel) -> Vec<maestro::llm::Prompt> {
    mock.calls()
        .into_iter()
        .filter(|p| p.system.contains(SYNTHESIS_DIRECTIVE))
        .collect()
}

#[tokio::test]
async fn synthesizes_all_task_outputs() {
    let mock = Arc::new(scripted());
    let engine = build_engine(Arc::clone(&mock), FanOutConfig::default());

    let result = engine.run(TOPIC).await.unwrap();
    assert_eq!(result, "MOCK-SYNTHESIS");

    // Four tasks plus one synthesis.
    assert_eq!(mock.call_count(), 5);

    let synthesis = synthesis_calls(&mock);
    assert_eq!(synthesis.len(), 1);
    let prompt = &synthesis[0];
    for text in ["MOCK-SUMMARY", "MOCK-QUESTIONS", "MOCK-TERMS", "MOCK-TREND"] {
        assert!(prompt.system.contains(text), "missing {text}");
    }
    assert!(prompt.user.contains(TOPIC));
}

#[tokio::test]
async fn every_task_receives_the_topic_as_user_content() {
    let mock = Arc::new(scripted());
    let engine = build_engine(Arc::clone(&mock), FanOutConfig::default());
    engine.run(TOPIC).await.unwrap();

    let task_calls: Vec<_> = mock
        .calls()
        .into_iter()
        .filter(|p| !p.system.contains(SYNTHESIS_DIRECTIVE))
        .collect();
    assert_eq!(task_calls.len(), 4);
    for call in task_calls {
        assert_eq!(call.user, TOPIC);
    }
}

#[tokio::test]
async fn tasks_are_outstanding_simultaneously() {
    let mock = Arc::new(scripted());
    let engine = build_engine(Arc::clone(&mock), FanOutConfig::default());
    engine.run(TOPIC).await.unwrap();

    assert_eq!(mock.peak_concurrency(), 4);
}

#[tokio::test]
async fn synthesis_prompt_does_not_depend_on_completion_order() {
    let fast_summary = Arc::new(
        MockModel::new()
            .reply_after(SUMMARY_INSTRUCTION, "S", Duration::from_millis(1))
            .reply_after(QUESTIONS_INSTRUCTION, "Q", Duration::from_millis(20))
            .reply_after(KEY_TERMS_INSTRUCTION, "K", Duration::from_millis(40))
            .reply_after(TREND_INSTRUCTION, "T", Duration::from_millis(60))
            .reply(SYNTHESIS_DIRECTIVE, "done"),
    );
    let slow_summary = Arc::new(
        MockModel::new()
            .reply_after(SUMMARY_INSTRUCTION, "S", Duration::from_millis(60))
            .reply_after(QUESTIONS_INSTRUCTION, "Q", Duration::from_millis(40))
            .reply_after(KEY_TERMS_INSTRUCTION, "K", Duration::from_millis(20))
            .reply_after(TREND_INSTRUCTION, "T", Duration::from_millis(1))
            .reply(SYNTHESIS_DIRECTIVE, "done"),
    );

    build_engine(Arc::clone(&fast_summary), FanOutConfig::default())
        .run(TOPIC)
        .await
        .unwrap();
    build_engine(Arc::clone(&slow_summary), FanOutConfig::default())
        .run(TOPIC)
        .await
        .unwrap();

    assert_eq!(synthesis_calls(&fast_summary), synthesis_calls(&slow_summary));
}

#[tokio::test]
async fn task_failure_fails_the_run_without_synthesis() {
    let mock = Arc::new(
        MockModel::new()
            .fail(QUESTIONS_INSTRUCTION, "rate limited")
            .reply(SUMMARY_INSTRUCTION, "S")
            .reply(KEY_TERMS_INSTRUCTION, "K")
            .reply(TREND_INSTRUCTION, "T")
            .reply(SYNTHESIS_DIRECTIVE, "should not happen"),
    );
    let engine = build_engine(Arc::clone(&mock), FanOutConfig::default());

    let err = engine.run(TOPIC).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert!(err.to_string().contains("questions"));
    assert!(err.to_string().contains("rate limited"));
    assert!(synthesis_calls(&mock).is_empty());
}

#[tokio::test]
async fn gather_waits_for_every_task_before_failing() {
    let mock = Arc::new(
        MockModel::new()
            .fail(SUMMARY_INSTRUCTION, "boom")
            .reply_after(QUESTIONS_INSTRUCTION, "Q", Duration::from_millis(30))
            .reply_after(KEY_TERMS_INSTRUCTION, "K", Duration::from_millis(30))
            .reply_after(TREND_INSTRUCTION, "T", Duration::from_millis(30)),
    );
    let engine = build_engine(Arc::clone(&mock), FanOutConfig::default());

    let started = std::time::Instant::now();
    let err = engine.run(TOPIC).await.unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn multiple_failures_report_first_task_by_name() {
    let mock = Arc::new(
        MockModel::new()
            .fail_after(TREND_INSTRUCTION, "trend down", Duration::from_millis(1))
            .fail_after(KEY_TERMS_INSTRUCTION, "terms down", Duration::from_millis(30))
            .reply(SUMMARY_INSTRUCTION, "S")
            .reply(QUESTIONS_INSTRUCTION, "Q"),
    );
    let engine = build_engine(mock, FanOutConfig::default());

    let err = engine.run(TOPIC).await.unwrap_err();
    assert!(err.to_string().starts_with("key_terms:"), "{err}");
}

#[tokio::test]
async fn synthesis_failure_is_a_service_error() {
    let mock = Arc::new(
        MockModel::new()
            .fail(SYNTHESIS_DIRECTIVE, "synthesis unavailable")
            .reply("", "task output"),
    );
    let engine = build_engine(mock, FanOutConfig::default());

    let err = engine.run(TOPIC).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert!(err.to_string().starts_with("synthesis:"));
}

#[tokio::test]
async fn timeout_cancels_the_gather() {
    let mock = Arc::new(
        MockModel::new()
            .reply_after(SUMMARY_INSTRUCTION, "S", Duration::from_secs(10))
            .reply(QUESTIONS_INSTRUCTION, "Q")
            .reply(KEY_TERMS_INSTRUCTION, "K")
            .reply(TREND_INSTRUCTION, "T")
            .reply(SYNTHESIS_DIRECTIVE, "should not happen"),
    );
    let engine = build_engine(
        Arc::clone(&mock),
        FanOutConfig {
            timeout: Some(Duration::from_millis(50)),
        },
    );

    let started = std::time::Instant::now();
    let err = engine.run(TOPIC).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(synthesis_calls(&mock).is_empty());
    // The slow summary call was dropped, not left running.
    assert_eq!(mock.call_count(), 4);
    assert_eq!(mock.in_flight(), 0);
}

#[tokio::test]
async fn dropping_run_cancels_in_flight_calls() {
    let mock = Arc::new(MockModel::new().reply_after("", "late", Duration::from_secs(30)));
    let engine = build_engine(Arc::clone(&mock), FanOutConfig::default());

    let outcome = tokio::time::timeout(Duration::from_millis(50), engine.run(TOPIC)).await;
    assert!(outcome.is_err());
    assert_eq!(mock.call_count(), 4);
    assert_eq!(mock.peak_concurrency(), 4);
    assert_eq!(mock.in_flight(), 0);
}

#[tokio::test]
async fn generous_timeout_does_not_interfere() {
    let mock = Arc::new(scripted());
    let engine = build_engine(
        mock,
        FanOutConfig {
            timeout: Some(Duration::from_secs(5)),
        },
    );
    assert_eq!(engine.run(TOPIC).await.unwrap(), "MOCK-SYNTHESIS");
}

#[tokio::test]
async fn empty_topic_is_passed_through() {
    let mock = Arc::new(scripted());
    let engine = build_engine(Arc::clone(&mock), FanOutConfig::default());

    assert_eq!(engine.run("").await.unwrap(), "MOCK-SYNTHESIS");
    assert!(mock.calls().iter().take(4).all(|p| p.user.is_empty()));
}

#[tokio::test]
async fn custom_task_set() {
    let mock = Arc::new(
        MockModel::new()
            .reply("Translate", "hola")
            .reply(SYNTHESIS_DIRECTIVE, "combined"),
    );
    let engine = FanOutEngine::new(
        Arc::clone(&mock) as Arc<dyn maestro::llm::LanguageModel>,
        vec![PromptTask::new("translation", "Translation", "Translate to Spanish:")],
        FanOutConfig::default(),
    )
    .unwrap();

    assert_eq!(engine.tasks().len(), 1);
    assert_eq!(engine.run("hello").await.unwrap(), "combined");
    let synthesis = synthesis_calls(&mock);
    assert!(synthesis[0].system.contains("Translation: hola"));
}
