//! 流水线编排器
//!
//! 对每个学习目标顺序执行 describe → plan → write：调用生成后端，应用输出校验，
//! 校验失败时带纠正提示在上限内重试；每次后端调用恰好产生一条审计记录。
//! 步骤严格串行（目标内与目标间都不并发），协作方确定时尝试序列可复现。

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::{
    AttemptRecord, AttemptSink, AttemptStatus, GeneratedLesson, LearningObjective,
    LessonContent, LessonDescription, LessonPlan, StepKind,
};
use crate::generator::{
    ContentGenerator, DescribeInput, GeneratorError, PlanInput, StepInput, StepOutput,
    StepRequest, WriteInput,
};
use crate::pipeline::validator::{validate, ValidationResult};

/// 流水线错误：除业务规则违规（内部重试）外全部直接上抛
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 生成输出结构错误，不重试
    #[error("Malformed output at objective {objective_index} step {step}: {message}")]
    Schema {
        objective_index: usize,
        step: StepKind,
        message: String,
    },

    /// 生成后端调用失败，不重试
    #[error("Generator failed at objective {objective_index} step {step}: {message}")]
    Generator {
        objective_index: usize,
        step: StepKind,
        message: String,
    },

    /// 重试上限内校验始终未通过，整次运行作废
    #[error("Generation exhausted after {attempts} attempts at objective {objective_index} step {step}")]
    GenerationExhausted {
        objective_index: usize,
        step: StepKind,
        attempts: u32,
        violations: Vec<String>,
    },
}

/// 单次步骤尝试的结果（显式值，而非异常控制流）
enum AttemptOutcome {
    Success(StepOutput),
    Violation(Vec<String>),
}

/// 流水线进度事件，供生成追踪器转发给订阅者
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StepCompleted {
        course: String,
        objective_index: usize,
        step: StepKind,
        attempts: u32,
    },
    ObjectiveCompleted {
        course: String,
        objective_index: usize,
    },
}

/// 将违规说明拼为纠正块（逐字使用校验器文本）
fn build_correction(violations: &[String]) -> String {
    violations
        .iter()
        .map(|v| format!("- {}", v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 流水线编排器：持有生成后端、审计接收端与重试上限
pub struct PipelineOrchestrator {
    generator: Arc<dyn ContentGenerator>,
    sink: Arc<dyn AttemptSink>,
    /// 校验失败后的重试次数上限（2 即每步最多 3 次调用）
    max_validation_retries: u32,
    event_tx: Option<broadcast::Sender<PipelineEvent>>,
}

impl PipelineOrchestrator {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        sink: Arc<dyn AttemptSink>,
        max_validation_retries: u32,
    ) -> Self {
        Self {
            generator,
            sink,
            max_validation_retries,
            event_tx: None,
        }
    }

    /// 设置进度事件通道
    pub fn with_event_tx(mut self, tx: broadcast::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// 对每个目标按索引序执行三步，返回每个目标一个完整产物。
    /// 任何一步失败都作废整次运行，不返回部分课程。
    pub async fn run(
        &self,
        course_name: &str,
        base_description: &str,
        objectives: &[LearningObjective],
    ) -> Result<Vec<GeneratedLesson>, PipelineError> {
        let objective_texts: Vec<String> =
            objectives.iter().map(|o| o.text.clone()).collect();
        let mut artifacts = Vec::with_capacity(objectives.len());

        for objective in objectives {
            let i = objective.index;
            let mut artifact = GeneratedLesson::new(i);

            let description = self
                .run_describe(course_name, base_description, &objective_texts, i)
                .await?;
            artifact.description = Some(description.clone());

            let other_objectives: Vec<String> = objective_texts
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, text)| text.clone())
                .collect();
            let plan = self
                .run_plan(course_name, i, &objective.text, other_objectives, description.clone())
                .await?;
            artifact.plan = Some(plan.clone());

            let content = self
                .run_write(course_name, i, &objective.text, description, plan)
                .await?;
            artifact.content = Some(content);

            self.send_event(PipelineEvent::ObjectiveCompleted {
                course: course_name.to_string(),
                objective_index: i,
            });
            tracing::info!(course = course_name, objective_index = i, "Objective generated");
            artifacts.push(artifact);
        }

        Ok(artifacts)
    }

    async fn run_describe(
        &self,
        course_name: &str,
        base_description: &str,
        objectives: &[String],
        objective_index: usize,
    ) -> Result<LessonDescription, PipelineError> {
        let request = StepRequest::new(StepInput::Describe(DescribeInput {
            course_name: course_name.to_string(),
            base_description: base_description.to_string(),
            objectives: objectives.to_vec(),
            objective_index,
        }));
        match self.run_step(course_name, objective_index, request).await? {
            StepOutput::Description(description) => Ok(description),
            other => Err(self.wrong_kind(objective_index, StepKind::Describe, &other)),
        }
    }

    async fn run_plan(
        &self,
        course_name: &str,
        objective_index: usize,
        objective: &str,
        other_objectives: Vec<String>,
        description: LessonDescription,
    ) -> Result<LessonPlan, PipelineError> {
        let request = StepRequest::new(StepInput::Plan(PlanInput {
            objective: objective.to_string(),
            other_objectives,
            description,
        }));
        match self.run_step(course_name, objective_index, request).await? {
            StepOutput::Plan(plan) => Ok(plan),
            other => Err(self.wrong_kind(objective_index, StepKind::Plan, &other)),
        }
    }

    /// write 步对编排器外可见：课时重生成只重跑这一步
    pub async fn run_write(
        &self,
        course_name: &str,
        objective_index: usize,
        objective: &str,
        description: LessonDescription,
        plan: LessonPlan,
    ) -> Result<LessonContent, PipelineError> {
        let request = StepRequest::new(StepInput::Write(WriteInput {
            objective: objective.to_string(),
            description,
            plan,
        }));
        match self.run_step(course_name, objective_index, request).await? {
            StepOutput::Content(content) => Ok(content),
            other => Err(self.wrong_kind(objective_index, StepKind::Write, &other)),
        }
    }

    fn wrong_kind(
        &self,
        objective_index: usize,
        expected: StepKind,
        got: &StepOutput,
    ) -> PipelineError {
        PipelineError::Schema {
            objective_index,
            step: expected,
            message: format!("expected {} output, got {}", expected, got.kind()),
        }
    }

    /// 单步的有界重试循环：显式尝试计数 + AttemptOutcome 值，
    /// 每次后端调用（无论成败）写一条审计记录。
    async fn run_step(
        &self,
        course_name: &str,
        objective_index: usize,
        request: StepRequest,
    ) -> Result<StepOutput, PipelineError> {
        let step = request.kind();
        let max_attempts = self.max_validation_retries + 1;
        let mut attempt: u32 = 0;
        let mut current = request;

        loop {
            attempt += 1;
            let started = Instant::now();
            let result = self.generator.generate(&current).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let outcome = match result {
                Err(GeneratorError::Schema(message)) => {
                    self.record(
                        course_name,
                        objective_index,
                        step,
                        attempt,
                        AttemptStatus::Failed,
                        vec![message.clone()],
                        duration_ms,
                    );
                    return Err(PipelineError::Schema {
                        objective_index,
                        step,
                        message,
                    });
                }
                Err(GeneratorError::Backend(message)) => {
                    self.record(
                        course_name,
                        objective_index,
                        step,
                        attempt,
                        AttemptStatus::Failed,
                        vec![message.clone()],
                        duration_ms,
                    );
                    return Err(PipelineError::Generator {
                        objective_index,
                        step,
                        message,
                    });
                }
                Ok(output) => match validate(&output) {
                    ValidationResult::Ok => AttemptOutcome::Success(output),
                    ValidationResult::Violations(violations) => {
                        AttemptOutcome::Violation(violations)
                    }
                },
            };

            match outcome {
                AttemptOutcome::Success(output) => {
                    self.record(
                        course_name,
                        objective_index,
                        step,
                        attempt,
                        AttemptStatus::Success,
                        vec![],
                        duration_ms,
                    );
                    self.send_event(PipelineEvent::StepCompleted {
                        course: course_name.to_string(),
                        objective_index,
                        step,
                        attempts: attempt,
                    });
                    return Ok(output);
                }
                AttemptOutcome::Violation(violations) => {
                    self.record(
                        course_name,
                        objective_index,
                        step,
                        attempt,
                        AttemptStatus::Violations,
                        violations.clone(),
                        duration_ms,
                    );
                    if attempt >= max_attempts {
                        tracing::warn!(
                            course = course_name,
                            objective_index,
                            step = %step,
                            attempts = attempt,
                            "Validation retries exhausted, aborting run"
                        );
                        return Err(PipelineError::GenerationExhausted {
                            objective_index,
                            step,
                            attempts: attempt,
                            violations,
                        });
                    }
                    tracing::debug!(
                        course = course_name,
                        objective_index,
                        step = %step,
                        attempt,
                        "Validation failed, retrying with correction"
                    );
                    current = current.with_correction(build_correction(&violations));
                }
            }
        }
    }

    fn record(
        &self,
        course_name: &str,
        objective_index: usize,
        step: StepKind,
        attempt: u32,
        status: AttemptStatus,
        detail: Vec<String>,
        duration_ms: u64,
    ) {
        let record = AttemptRecord::new(
            course_name,
            objective_index,
            step,
            attempt,
            status,
            detail,
            duration_ms,
        );
        if let Err(e) = self.sink.append(record) {
            // 审计失败不应中断生成，但必须可见
            tracing::warn!("Failed to append attempt record: {}", e);
        }
    }
}
