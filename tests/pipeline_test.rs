//! 流水线集成测试：成功路径、重试纠正、重试耗尽与后端失败

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sage::domain::{
    AttemptStatus, InMemoryAttemptSink, LearningObjective, LessonDescription, StepKind,
};
use sage::generator::{ContentGenerator, GeneratorError, MockGenerator, StepOutput, StepRequest};
use sage::pipeline::{PipelineError, PipelineOrchestrator};

fn objectives(texts: &[&str]) -> Vec<LearningObjective> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| LearningObjective {
            index,
            text: text.to_string(),
        })
        .collect()
}

/// 每次调用都返回结构合法但业务校验必败的输出，并记录是否收到纠正提示
struct RejectingGenerator {
    calls: AtomicU32,
    corrections_seen: AtomicU32,
}

impl RejectingGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            corrections_seen: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ContentGenerator for RejectingGenerator {
    async fn generate(&self, request: &StepRequest) -> Result<StepOutput, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.correction.is_some() {
            self.corrections_seen.fetch_add(1, Ordering::SeqCst);
        }
        // 空标题 + 过短摘要 + 过少要点，必然违规
        Ok(StepOutput::Description(LessonDescription {
            lesson_title: String::new(),
            summary: "too short".to_string(),
            focus_points: vec![],
        }))
    }
}

/// 后端本身失败的生成器
struct FailingGenerator;

#[async_trait]
impl ContentGenerator for FailingGenerator {
    async fn generate(&self, _request: &StepRequest) -> Result<StepOutput, GeneratorError> {
        Err(GeneratorError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_successful_run_produces_complete_artifacts() {
    let sink = Arc::new(InMemoryAttemptSink::new());
    let orchestrator = PipelineOrchestrator::new(Arc::new(MockGenerator), sink.clone(), 2);

    let objectives = objectives(&["Ownership", "Borrowing", "Lifetimes"]);
    let artifacts = orchestrator
        .run("Rust Basics", "An introductory Rust course", &objectives)
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 3);
    for (i, artifact) in artifacts.iter().enumerate() {
        assert_eq!(artifact.objective_index, i);
        assert!(artifact.is_complete());
    }

    // 3 个目标 × 3 步，每步一次成功调用
    let records = sink.records();
    assert_eq!(records.len(), 9);
    assert!(records
        .iter()
        .all(|r| r.status == AttemptStatus::Success && r.attempt == 1));
}

#[tokio::test]
async fn test_exhaustion_aborts_with_zero_lessons() {
    let generator = Arc::new(RejectingGenerator::new());
    let sink = Arc::new(InMemoryAttemptSink::new());
    let orchestrator = PipelineOrchestrator::new(generator.clone(), sink.clone(), 2);

    let objectives = objectives(&["Ownership", "Borrowing"]);
    let err = orchestrator
        .run("Rust Basics", "", &objectives)
        .await
        .unwrap_err();

    match err {
        PipelineError::GenerationExhausted {
            objective_index,
            step,
            attempts,
            violations,
        } => {
            assert_eq!(objective_index, 0);
            assert_eq!(step, StepKind::Describe);
            assert_eq!(attempts, 3);
            assert!(!violations.is_empty());
        }
        other => panic!("Expected GenerationExhausted, got {:?}", other),
    }

    // 首个目标的首步即耗尽：恰好 3 次调用，第 2、3 次带纠正提示
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    assert_eq!(generator.corrections_seen.load(Ordering::SeqCst), 2);

    let records = sink.records();
    assert_eq!(records.len(), 3);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.attempt, (i + 1) as u32);
        assert_eq!(record.status, AttemptStatus::Violations);
        assert!(!record.detail.is_empty());
    }
}

#[tokio::test]
async fn test_backend_error_aborts_without_retry() {
    let sink = Arc::new(InMemoryAttemptSink::new());
    let orchestrator = PipelineOrchestrator::new(Arc::new(FailingGenerator), sink.clone(), 2);

    let objectives = objectives(&["Ownership"]);
    let err = orchestrator
        .run("Rust Basics", "", &objectives)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Generator { .. }));

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AttemptStatus::Failed);
}
