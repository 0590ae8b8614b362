//! 生成后端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 ContentGenerator：按步骤类型接收类型化请求，
//! 返回类型化结构输出或错误。核心对底层供应商无感知。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{LessonContent, LessonDescription, LessonPlan, StepKind};

/// 生成后端错误
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// 输出结构不符合该步骤的类型（不可重试，立即上抛）
    #[error("Malformed generator output: {0}")]
    Schema(String),

    /// 后端调用本身失败（网络、供应商错误等）
    #[error("Generator backend failed: {0}")]
    Backend(String),
}

/// describe 步输入：课程名、基础描述、全部目标与本次目标索引
#[derive(Debug, Clone)]
pub struct DescribeInput {
    pub course_name: String,
    pub base_description: String,
    pub objectives: Vec<String>,
    pub objective_index: usize,
}

/// plan 步输入：已通过校验的课时描述 + 本课目标与其余目标
#[derive(Debug, Clone)]
pub struct PlanInput {
    pub objective: String,
    pub other_objectives: Vec<String>,
    pub description: LessonDescription,
}

/// write 步输入：已通过校验的描述与计划
#[derive(Debug, Clone)]
pub struct WriteInput {
    pub objective: String,
    pub description: LessonDescription,
    pub plan: LessonPlan,
}

/// 步骤输入（类型化上下文）
#[derive(Debug, Clone)]
pub enum StepInput {
    Describe(DescribeInput),
    Plan(PlanInput),
    Write(WriteInput),
}

/// 单次生成请求：原始输入 + 可选的校验纠正提示（重试时由编排器填入）
#[derive(Debug, Clone)]
pub struct StepRequest {
    pub input: StepInput,
    pub correction: Option<String>,
}

impl StepRequest {
    pub fn new(input: StepInput) -> Self {
        Self {
            input,
            correction: None,
        }
    }

    /// 在原始输入之上附加纠正提示，用于校验失败后的重试
    pub fn with_correction(mut self, correction: impl Into<String>) -> Self {
        self.correction = Some(correction.into());
        self
    }

    pub fn kind(&self) -> StepKind {
        match self.input {
            StepInput::Describe(_) => StepKind::Describe,
            StepInput::Plan(_) => StepKind::Plan,
            StepInput::Write(_) => StepKind::Write,
        }
    }
}

/// 步骤的类型化结构输出
#[derive(Debug, Clone)]
pub enum StepOutput {
    Description(LessonDescription),
    Plan(LessonPlan),
    Content(LessonContent),
}

impl StepOutput {
    pub fn kind(&self) -> StepKind {
        match self {
            StepOutput::Description(_) => StepKind::Describe,
            StepOutput::Plan(_) => StepKind::Plan,
            StepOutput::Content(_) => StepKind::Write,
        }
    }
}

/// 生成后端 trait：一次调用完成一个步骤
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &StepRequest) -> Result<StepOutput, GeneratorError>;
}
