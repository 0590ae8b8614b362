//! 生成流水线：三步编排与输出校验

pub mod orchestrator;
pub mod validator;

pub use orchestrator::{PipelineError, PipelineEvent, PipelineOrchestrator};
pub use validator::{validate, ValidationResult};
