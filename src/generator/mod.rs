//! 内容生成层：生成后端抽象与实现（OpenAI 兼容 / Mock）

pub mod mock;
pub mod openai;
pub mod prompts;
pub mod traits;

use std::sync::Arc;

use crate::config::AppConfig;

pub use mock::MockGenerator;
pub use openai::OpenAiGenerator;
pub use traits::{
    ContentGenerator, DescribeInput, GeneratorError, PlanInput, StepInput, StepOutput,
    StepRequest, WriteInput,
};

/// 根据配置与环境变量选择生成后端（OpenAI 兼容 / Mock）
pub fn generator_from_config(cfg: &AppConfig) -> Arc<dyn ContentGenerator> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_key = std::env::var("OPENAI_API_KEY").is_ok();

    if provider == "openai" && has_key {
        tracing::info!("Using OpenAI content generator ({})", cfg.llm.model);
        Arc::new(OpenAiGenerator::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else {
        if provider != "mock" {
            tracing::warn!("No API key set or provider unknown, using Mock generator");
        }
        Arc::new(MockGenerator)
    }
}
