//! CourseEngine：面向调用方的课程操作入口
//!
//! 引擎持有生成后端、存储与审计接收端，把流水线、生命周期状态机、解锁状态机
//! 和进度聚合器串成完整操作。每个操作加载课程快照、在内存中完成全部决策、
//! 最后以单次 upsert 持久化；部分失败的生成运行整体作废，绝不落盘半成品。

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::PipelineSection;
use crate::domain::{
    ActivitySubmission, AttemptSink, CourseInstance, CourseStatus, Lesson, LessonStatus,
};
use crate::generator::ContentGenerator;
use crate::pipeline::{PipelineError, PipelineEvent, PipelineOrchestrator};
use crate::progression::{
    activate_first_lesson, compute, on_activity_completed, transition, Progress,
    TransitionError, ASSESSMENT_PASS_THRESHOLD,
};
use crate::store::CourseStore;

/// 引擎层错误：业务规则违规由流水线内部重试消化，其余全部带上下文上抛
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Course not found: {0}")]
    CourseNotFound(String),

    #[error("Lesson {objective_index} not found in course '{course_id}'")]
    LessonNotFound {
        course_id: String,
        objective_index: usize,
    },

    #[error("Generation is already running for course '{0}'")]
    GenerationAlreadyRunning(String),

    #[error("Course '{0}' is not in draft, generation cannot start")]
    NotInDraft(String),

    #[error("Course '{0}' has no learning objectives to generate from")]
    NoObjectives(String),

    #[error("Lesson {objective_index} is locked")]
    LockedResourceAccess { objective_index: usize },

    #[error("Lesson {objective_index} has reached the regeneration limit of {limit}")]
    RegenerationLimitExceeded { objective_index: usize, limit: u32 },

    #[error("Lesson {objective_index} has no stored description and plan to regenerate from")]
    MissingMaterial { objective_index: usize },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

pub struct CourseEngine {
    generator: Arc<dyn ContentGenerator>,
    store: Arc<dyn CourseStore>,
    sink: Arc<dyn AttemptSink>,
    pipeline: PipelineSection,
    event_tx: broadcast::Sender<PipelineEvent>,
}

impl CourseEngine {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        store: Arc<dyn CourseStore>,
        sink: Arc<dyn AttemptSink>,
        pipeline: PipelineSection,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            generator,
            store,
            sink,
            pipeline,
            event_tx,
        }
    }

    /// 订阅流水线进度事件（无订阅者时事件被丢弃）
    pub fn subscribe_pipeline_events(&self) -> broadcast::Receiver<PipelineEvent> {
        self.event_tx.subscribe()
    }

    fn orchestrator(&self) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            self.generator.clone(),
            self.sink.clone(),
            self.pipeline.max_validation_retries,
        )
        .with_event_tx(self.event_tx.clone())
    }

    async fn load(&self, course_id: &str) -> Result<CourseInstance, EngineError> {
        self.store
            .get(course_id)
            .await
            .ok_or_else(|| EngineError::CourseNotFound(course_id.to_string()))
    }

    /// 创建 draft 课程并持久化
    pub async fn create_course(
        &self,
        name: &str,
        base_description: &str,
        objectives: Vec<String>,
    ) -> CourseInstance {
        let course = CourseInstance::new(name, base_description, objectives);
        tracing::info!(
            course = %course.name,
            course_id = %course.id,
            objectives = course.objectives.len(),
            "Course created"
        );
        self.store.upsert(course.clone()).await;
        course
    }

    pub async fn course(&self, course_id: &str) -> Result<CourseInstance, EngineError> {
        self.load(course_id).await
    }

    pub async fn list_courses(&self) -> Vec<CourseInstance> {
        self.store.list().await
    }

    /// 启动内容生成：draft → generating → 流水线 → active，失败则回滚 draft。
    /// 课时只在整条流水线成功后才物化，失败的运行不留下任何课时。
    pub async fn start_generation(&self, course_id: &str) -> Result<CourseInstance, EngineError> {
        let course = self.load(course_id).await?;
        if course.status != CourseStatus::Draft {
            return Err(EngineError::NotInDraft(course_id.to_string()));
        }
        if course.objectives.is_empty() {
            return Err(EngineError::NoObjectives(course_id.to_string()));
        }

        let mut course = transition(&course, CourseStatus::Generating)?;
        self.store.upsert(course.clone()).await;
        tracing::info!(
            course = %course.name,
            objectives = course.objectives.len(),
            "Generation started"
        );

        let orchestrator = self.orchestrator();
        let run = orchestrator
            .run(&course.name, &course.base_description, &course.objectives)
            .await;

        match run {
            Ok(artifacts) => {
                course.lessons = artifacts.into_iter().map(Lesson::from_material).collect();
                course = transition(&course, CourseStatus::Active)?;
                activate_first_lesson(&mut course);
                self.store.upsert(course.clone()).await;
                tracing::info!(
                    course = %course.name,
                    lessons = course.lessons.len(),
                    "Generation completed, course is active"
                );
                Ok(course)
            }
            Err(e) => {
                // 失败回滚到 draft，课程可重新发起生成
                let rolled_back = transition(&course, CourseStatus::Draft)?;
                self.store.upsert(rolled_back).await;
                tracing::warn!(
                    course = %course.name,
                    error = %e,
                    "Generation failed, course rolled back to draft"
                );
                Err(EngineError::Pipeline(e))
            }
        }
    }

    /// 显式生命周期转换（归档、恢复、重学等）
    pub async fn request_transition(
        &self,
        course_id: &str,
        to: CourseStatus,
    ) -> Result<CourseInstance, EngineError> {
        let course = self.load(course_id).await?;
        let next = transition(&course, to)?;
        self.store.upsert(next.clone()).await;
        tracing::info!(course = %next.name, from = %course.status, to = %to, "Course transitioned");
        Ok(next)
    }

    /// 标记课时已查看；首次查看记录 viewed_at，并自动推进 active → in_progress
    pub async fn mark_lesson_viewed(
        &self,
        course_id: &str,
        objective_index: usize,
    ) -> Result<CourseInstance, EngineError> {
        let mut course = self.load(course_id).await?;
        let lesson = course
            .lesson_mut(objective_index)
            .ok_or_else(|| EngineError::LessonNotFound {
                course_id: course_id.to_string(),
                objective_index,
            })?;
        if lesson.status == LessonStatus::Locked {
            return Err(EngineError::LockedResourceAccess { objective_index });
        }
        if lesson.viewed_at.is_none() {
            lesson.viewed_at = Some(Utc::now());
        }
        course.updated_at = Utc::now();

        if course.status == CourseStatus::Active {
            if let Ok(next) = transition(&course, CourseStatus::InProgress) {
                course = next;
            }
        }

        self.store.upsert(course.clone()).await;
        Ok(course)
    }

    /// 记录练习提交：submission_count 总是递增，首次完成触发解锁级联，
    /// 并尽力推进生命周期（active → in_progress，全部完成后 → awaiting_assessment）
    pub async fn submit_activity(
        &self,
        course_id: &str,
        objective_index: usize,
        submission: ActivitySubmission,
    ) -> Result<CourseInstance, EngineError> {
        let mut course = self.load(course_id).await?;
        {
            let lesson = course
                .lesson_mut(objective_index)
                .ok_or_else(|| EngineError::LessonNotFound {
                    course_id: course_id.to_string(),
                    objective_index,
                })?;
            if lesson.status == LessonStatus::Locked {
                return Err(EngineError::LockedResourceAccess { objective_index });
            }
            lesson.activity.record_submission(&submission);
        }

        if let Some(unlocked) = on_activity_completed(&mut course, objective_index) {
            tracing::info!(
                course = %course.name,
                completed = objective_index,
                unlocked,
                "Activity completed, next lesson unlocked"
            );
        }
        course.updated_at = Utc::now();

        if course.status == CourseStatus::Active {
            if let Ok(next) = transition(&course, CourseStatus::InProgress) {
                course = next;
            }
        }
        if course.status == CourseStatus::InProgress && course.all_lessons_completed() {
            if let Ok(next) = transition(&course, CourseStatus::AwaitingAssessment) {
                course = next;
            }
        }

        self.store.upsert(course.clone()).await;
        Ok(course)
    }

    /// 记录结业评估分数；达到分数线时推进 assessment_ready → completed，
    /// 未达线则保持现状，由调用方走 assessment_ready → in_progress 的重学路径。
    /// 分数先持久化，转换结果不影响分数的留存。
    pub async fn submit_assessment(
        &self,
        course_id: &str,
        score: f32,
    ) -> Result<CourseInstance, EngineError> {
        let mut course = self.load(course_id).await?;
        course.assessment_score = Some(score);
        course.updated_at = Utc::now();
        self.store.upsert(course.clone()).await;

        if course.status == CourseStatus::AssessmentReady && score >= ASSESSMENT_PASS_THRESHOLD {
            course = transition(&course, CourseStatus::Completed)?;
            tracing::info!(course = %course.name, score, "Assessment passed, course completed");
            self.store.upsert(course.clone()).await;
        }

        Ok(course)
    }

    /// 重生成课时正文：只重跑 write 步（同样的校验重试纪律与审计记录），
    /// 基于已存 description + plan，替换 content 并递增计数；不改课时状态。
    pub async fn regenerate_lesson(
        &self,
        course_id: &str,
        objective_index: usize,
    ) -> Result<CourseInstance, EngineError> {
        let course = self.load(course_id).await?;
        let lesson = course
            .lesson(objective_index)
            .ok_or_else(|| EngineError::LessonNotFound {
                course_id: course_id.to_string(),
                objective_index,
            })?;
        if lesson.status == LessonStatus::Locked {
            return Err(EngineError::LockedResourceAccess { objective_index });
        }
        if lesson.regeneration_count >= self.pipeline.max_regeneration_attempts {
            return Err(EngineError::RegenerationLimitExceeded {
                objective_index,
                limit: self.pipeline.max_regeneration_attempts,
            });
        }

        let material = lesson
            .material
            .as_ref()
            .ok_or(EngineError::MissingMaterial { objective_index })?;
        let description = material
            .description
            .clone()
            .ok_or(EngineError::MissingMaterial { objective_index })?;
        let plan = material
            .plan
            .clone()
            .ok_or(EngineError::MissingMaterial { objective_index })?;
        let objective = course
            .objectives
            .get(objective_index)
            .ok_or_else(|| EngineError::LessonNotFound {
                course_id: course_id.to_string(),
                objective_index,
            })?
            .text
            .clone();

        let content = self
            .orchestrator()
            .run_write(&course.name, objective_index, &objective, description, plan)
            .await?;

        let mut course = course;
        let mut regeneration_count = 0;
        if let Some(lesson) = course.lesson_mut(objective_index) {
            if let Some(material) = lesson.material.as_mut() {
                material.content = Some(content);
            }
            lesson.regeneration_count += 1;
            regeneration_count = lesson.regeneration_count;
        }
        tracing::info!(
            course = %course.name,
            objective_index,
            regeneration_count,
            "Lesson content regenerated"
        );
        course.updated_at = Utc::now();
        self.store.upsert(course.clone()).await;
        Ok(course)
    }

    /// 计算课程进度（只读派生）
    pub async fn progress(&self, course_id: &str) -> Result<Progress, EngineError> {
        let course = self.load(course_id).await?;
        Ok(compute(&course))
    }

    /// 整课级联删除（课时、练习随课程一并删除）
    pub async fn delete_course(&self, course_id: &str) -> Result<(), EngineError> {
        if self.store.delete(course_id).await {
            tracing::info!(course_id, "Course deleted");
            Ok(())
        } else {
            Err(EngineError::CourseNotFound(course_id.to_string()))
        }
    }
}
