//! 引擎端到端测试：生成、学习流程、回滚、重生成上限与单飞追踪

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sage::config::PipelineSection;
use sage::core::{CourseEngine, EngineError, GenerationEvent, GenerationTracker};
use sage::domain::{
    ActivitySubmission, CourseStatus, InMemoryAttemptSink, LessonDescription, LessonStatus,
    MasteryDecision,
};
use sage::generator::{ContentGenerator, GeneratorError, MockGenerator, StepOutput, StepRequest};
use sage::store::InMemoryCourseStore;

fn build_engine(generator: Arc<dyn ContentGenerator>) -> Arc<CourseEngine> {
    Arc::new(CourseEngine::new(
        generator,
        Arc::new(InMemoryCourseStore::new()),
        Arc::new(InMemoryAttemptSink::new()),
        PipelineSection::default(),
    ))
}

fn submission(score: f32) -> ActivitySubmission {
    ActivitySubmission {
        score,
        mastery_decision: MasteryDecision::Meets,
        time_spent_seconds: 120,
    }
}

/// 永远违规的生成器，用于触发整次运行作废
struct RejectingGenerator;

#[async_trait]
impl ContentGenerator for RejectingGenerator {
    async fn generate(&self, _request: &StepRequest) -> Result<StepOutput, GeneratorError> {
        Ok(StepOutput::Description(LessonDescription {
            lesson_title: String::new(),
            summary: "nope".to_string(),
            focus_points: vec![],
        }))
    }
}

/// 放慢的 Mock，用于观察在途状态
struct SlowGenerator;

#[async_trait]
impl ContentGenerator for SlowGenerator {
    async fn generate(&self, request: &StepRequest) -> Result<StepOutput, GeneratorError> {
        tokio::time::sleep(Duration::from_millis(30)).await;
        MockGenerator.generate(request).await
    }
}

async fn abc_course(engine: &CourseEngine) -> String {
    let course = engine
        .create_course(
            "Demo",
            "A three-lesson demo course",
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
        )
        .await;
    course.id
}

#[tokio::test]
async fn test_end_to_end_learning_flow() {
    let engine = build_engine(Arc::new(MockGenerator));
    let id = abc_course(&engine).await;

    // draft → generating → active，课时 0 解锁，其余锁定
    let course = engine.start_generation(&id).await.unwrap();
    assert_eq!(course.status, CourseStatus::Active);
    assert_eq!(course.lessons.len(), 3);
    assert_eq!(course.lesson(0).unwrap().status, LessonStatus::Unlocked);
    assert_eq!(course.lesson(1).unwrap().status, LessonStatus::Locked);
    assert_eq!(course.lesson(2).unwrap().status, LessonStatus::Locked);

    // 查看课时 0 即进入学习中
    let course = engine.mark_lesson_viewed(&id, 0).await.unwrap();
    assert_eq!(course.status, CourseStatus::InProgress);
    assert!(course.lesson(0).unwrap().viewed_at.is_some());

    // 提交课时 0 的练习：完成 + 级联解锁课时 1，进度 ≈ 33.3%
    let course = engine.submit_activity(&id, 0, submission(88.0)).await.unwrap();
    assert_eq!(course.lesson(0).unwrap().status, LessonStatus::Completed);
    assert_eq!(course.lesson(1).unwrap().status, LessonStatus::Unlocked);

    let progress = engine.progress(&id).await.unwrap();
    assert!((progress.percentage - 100.0 / 3.0).abs() < 0.01);
    assert_eq!(progress.lessons_completed, 1);
    assert_eq!(progress.current_lesson_index, Some(1));

    // 完成剩余课时后自动进入待评估
    engine.submit_activity(&id, 1, submission(75.0)).await.unwrap();
    let course = engine.submit_activity(&id, 2, submission(91.0)).await.unwrap();
    assert_eq!(course.status, CourseStatus::AwaitingAssessment);

    let course = engine
        .request_transition(&id, CourseStatus::AssessmentReady)
        .await
        .unwrap();
    assert_eq!(course.status, CourseStatus::AssessmentReady);

    let course = engine.submit_assessment(&id, 84.0).await.unwrap();
    assert_eq!(course.status, CourseStatus::Completed);
    assert_eq!(course.assessment_score, Some(84.0));

    let progress = engine.progress(&id).await.unwrap();
    assert_eq!(progress.percentage, 100.0);
    assert_eq!(progress.current_lesson_index, None);
}

#[tokio::test]
async fn test_locked_lesson_rejects_view_submit_and_regenerate() {
    let engine = build_engine(Arc::new(MockGenerator));
    let id = abc_course(&engine).await;
    engine.start_generation(&id).await.unwrap();

    let err = engine.mark_lesson_viewed(&id, 1).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::LockedResourceAccess { objective_index: 1 }
    ));

    let err = engine.submit_activity(&id, 2, submission(90.0)).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::LockedResourceAccess { objective_index: 2 }
    ));

    let err = engine.regenerate_lesson(&id, 1).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::LockedResourceAccess { objective_index: 1 }
    ));
}

#[tokio::test]
async fn test_generation_rejected_outside_draft() {
    let engine = build_engine(Arc::new(MockGenerator));
    let id = abc_course(&engine).await;
    engine.start_generation(&id).await.unwrap();

    let err = engine.start_generation(&id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotInDraft(_)));
}

#[tokio::test]
async fn test_generation_rejected_without_objectives() {
    let engine = build_engine(Arc::new(MockGenerator));
    let course = engine.create_course("Empty", "", vec![]).await;

    let err = engine.start_generation(&course.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NoObjectives(_)));
    // 课程保持 draft，未被推进到 generating
    assert_eq!(
        engine.course(&course.id).await.unwrap().status,
        CourseStatus::Draft
    );
}

#[tokio::test]
async fn test_failed_generation_rolls_back_to_draft() {
    let engine = build_engine(Arc::new(RejectingGenerator));
    let id = abc_course(&engine).await;

    let err = engine.start_generation(&id).await.unwrap_err();
    assert!(matches!(err, EngineError::Pipeline(_)));

    // 回滚后课程仍是 draft 且没有任何课时落盘
    let course = engine.course(&id).await.unwrap();
    assert_eq!(course.status, CourseStatus::Draft);
    assert!(course.lessons.is_empty());

    // 回滚后可以重新发起
    let engine2 = build_engine(Arc::new(MockGenerator));
    let id2 = abc_course(&engine2).await;
    assert!(engine2.start_generation(&id2).await.is_ok());
}

#[tokio::test]
async fn test_regeneration_limit_enforced() {
    let engine = build_engine(Arc::new(MockGenerator));
    let id = abc_course(&engine).await;
    engine.start_generation(&id).await.unwrap();

    for expected_count in 1..=3 {
        let course = engine.regenerate_lesson(&id, 0).await.unwrap();
        let lesson = course.lesson(0).unwrap();
        assert_eq!(lesson.regeneration_count, expected_count);
        // 重生成不改变课时状态
        assert_eq!(lesson.status, LessonStatus::Unlocked);
        assert!(lesson.material.as_ref().unwrap().content.is_some());
    }

    let err = engine.regenerate_lesson(&id, 0).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::RegenerationLimitExceeded {
            objective_index: 0,
            limit: 3
        }
    ));
}

#[tokio::test]
async fn test_failed_assessment_keeps_state_for_retry() {
    let engine = build_engine(Arc::new(MockGenerator));
    let id = abc_course(&engine).await;
    engine.start_generation(&id).await.unwrap();
    for i in 0..3 {
        engine.submit_activity(&id, i, submission(80.0)).await.unwrap();
    }
    engine
        .request_transition(&id, CourseStatus::AssessmentReady)
        .await
        .unwrap();

    let course = engine.submit_assessment(&id, 55.0).await.unwrap();
    assert_eq!(course.status, CourseStatus::AssessmentReady);
    assert_eq!(course.assessment_score, Some(55.0));

    // 未达线的分数也已落盘，而不只是留在返回值里
    let stored = engine.course(&id).await.unwrap();
    assert_eq!(stored.assessment_score, Some(55.0));
    assert_eq!(stored.status, CourseStatus::AssessmentReady);

    // 重学路径仍然可走
    let course = engine
        .request_transition(&id, CourseStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(course.status, CourseStatus::InProgress);
}

#[tokio::test]
async fn test_assessment_threshold_boundary_passes() {
    let engine = build_engine(Arc::new(MockGenerator));
    let id = abc_course(&engine).await;
    engine.start_generation(&id).await.unwrap();
    for i in 0..3 {
        engine.submit_activity(&id, i, submission(80.0)).await.unwrap();
    }
    engine
        .request_transition(&id, CourseStatus::AssessmentReady)
        .await
        .unwrap();

    // 恰好踩线即通过，引擎与生命周期守卫使用同一条分数线
    let course = engine.submit_assessment(&id, 70.0).await.unwrap();
    assert_eq!(course.status, CourseStatus::Completed);
    assert_eq!(
        engine.course(&id).await.unwrap().status,
        CourseStatus::Completed
    );
}

#[tokio::test]
async fn test_resubmission_increments_count_without_state_change() {
    let engine = build_engine(Arc::new(MockGenerator));
    let id = abc_course(&engine).await;
    engine.start_generation(&id).await.unwrap();

    engine.submit_activity(&id, 0, submission(60.0)).await.unwrap();
    let course = engine.submit_activity(&id, 0, submission(95.0)).await.unwrap();

    let lesson = course.lesson(0).unwrap();
    assert_eq!(lesson.status, LessonStatus::Completed);
    assert_eq!(lesson.activity.submission_count, 2);
    assert_eq!(lesson.activity.latest_score, Some(95.0));
    assert_eq!(lesson.activity.best_score, Some(95.0));
    // 重复提交不会越过课时 1 解锁课时 2
    assert_eq!(course.lesson(2).unwrap().status, LessonStatus::Locked);
}

#[tokio::test]
async fn test_unknown_course_is_reported() {
    let engine = build_engine(Arc::new(MockGenerator));
    let err = engine.course("no-such-id").await.unwrap_err();
    assert!(matches!(err, EngineError::CourseNotFound(_)));

    let err = engine.delete_course("no-such-id").await.unwrap_err();
    assert!(matches!(err, EngineError::CourseNotFound(_)));
}

#[tokio::test]
async fn test_delete_course_cascades() {
    let engine = build_engine(Arc::new(MockGenerator));
    let id = abc_course(&engine).await;
    engine.start_generation(&id).await.unwrap();

    engine.delete_course(&id).await.unwrap();
    assert!(matches!(
        engine.course(&id).await.unwrap_err(),
        EngineError::CourseNotFound(_)
    ));
}

#[tokio::test]
async fn test_tracker_rejects_concurrent_generation() {
    let engine = build_engine(Arc::new(SlowGenerator));
    let tracker = GenerationTracker::new(engine.clone());
    let id = abc_course(&engine).await;

    let mut events = tracker.subscribe();
    tracker.start(&id).await.unwrap();
    assert!(tracker.is_running(&id).await);

    let err = tracker.start(&id).await.unwrap_err();
    assert!(matches!(err, EngineError::GenerationAlreadyRunning(_)));

    // 等待完成事件（Started → StepCompleted × 9 → Completed）
    let mut step_events = 0;
    let outcome = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await.unwrap() {
                GenerationEvent::Completed { lesson_count, .. } => break lesson_count,
                GenerationEvent::Failed { message, .. } => panic!("generation failed: {}", message),
                GenerationEvent::StepCompleted { .. } => step_events += 1,
                GenerationEvent::Started { .. } => {}
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(outcome, 3);
    assert_eq!(step_events, 9);

    tracker.wait(&id).await;
    assert!(!tracker.is_running(&id).await);
    assert_eq!(
        engine.course(&id).await.unwrap().status,
        CourseStatus::Active
    );
}
