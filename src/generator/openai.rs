//! OpenAI 兼容生成后端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；
//! 每次调用拼 system（角色 + JSON Schema）与 user（上下文 + 纠正块），
//! 从回复中提取 JSON 并按步骤类型反序列化；解析失败即 Schema 错误。

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::domain::StepKind;
use crate::generator::prompts;
use crate::generator::traits::{ContentGenerator, GeneratorError, StepOutput, StepRequest};

/// OpenAI 兼容后端：持有 Client 与 model 名
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    async fn complete(&self, system: String, user: String) -> Result<String, GeneratorError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| GeneratorError::Backend(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()
                    .map_err(|e| GeneratorError::Backend(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| GeneratorError::Backend(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| GeneratorError::Backend(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }
}

/// 从 LLM 回复中提取 JSON 块（```json ... ``` 或首尾大括号之间）
fn extract_json(output: &str) -> &str {
    let trimmed = output.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        return rest
            .find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim());
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }
    trimmed
}

fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, GeneratorError> {
    serde_json::from_str(extract_json(raw))
        .map_err(|e| GeneratorError::Schema(format!("{}: {}", e, raw)))
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn generate(&self, request: &StepRequest) -> Result<StepOutput, GeneratorError> {
        let kind = request.kind();
        let system = prompts::system_prompt(kind);
        let user = prompts::user_prompt(request);

        tracing::debug!(step = %kind, model = %self.model, "Calling content generator");
        let raw = self.complete(system, user).await?;

        match kind {
            StepKind::Describe => Ok(StepOutput::Description(parse(&raw)?)),
            StepKind::Plan => Ok(StepOutput::Plan(parse(&raw)?)),
            StepKind::Write => Ok(StepOutput::Content(parse(&raw)?)),
        }
    }
}
