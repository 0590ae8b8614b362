//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SAGE__*` 覆盖（双下划线表示嵌套，如 `SAGE__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// [app] 段：应用名、审计记录输出路径
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 审计记录（AttemptRecord）JSONL 文件路径；未设置时仅存内存
    pub audit_log_path: Option<PathBuf>,
}

/// [llm] 段：生成后端选择与超时
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmSection {
    /// 后端：openai / mock；无 API Key 时自动回退 mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

/// [pipeline] 段：校验重试上限、重生成上限
///
/// 结业通过分数线不在这里：它是生命周期守卫的一部分，
/// 见 progression::ASSESSMENT_PASS_THRESHOLD。
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// 单步校验失败后的重试次数上限（2 即每步最多 3 次调用）
    #[serde(default = "default_max_validation_retries")]
    pub max_validation_retries: u32,
    /// 单个课时的重生成次数上限
    #[serde(default = "default_max_regeneration_attempts")]
    pub max_regeneration_attempts: u32,
}

fn default_max_validation_retries() -> u32 {
    2
}

fn default_max_regeneration_attempts() -> u32 {
    3
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            max_validation_retries: default_max_validation_retries(),
            max_regeneration_attempts: default_max_regeneration_attempts(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            pipeline: PipelineSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 SAGE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SAGE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SAGE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.pipeline.max_validation_retries, 2);
        assert_eq!(cfg.pipeline.max_regeneration_attempts, 3);
    }
}
