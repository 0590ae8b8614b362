//! 核心层：对外操作入口（CourseEngine）与生成任务追踪（GenerationTracker）

pub mod engine;
pub mod tracker;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::{AttemptSink, InMemoryAttemptSink, JsonlAttemptSink};

pub use engine::{CourseEngine, EngineError};
pub use tracker::{GenerationEvent, GenerationTracker};

/// 根据配置选择审计接收端：配置了文件路径用 JSONL，否则仅存内存
pub fn sink_from_config(cfg: &AppConfig) -> Arc<dyn AttemptSink> {
    match &cfg.app.audit_log_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Appending attempt records to JSONL file");
            Arc::new(JsonlAttemptSink::new(path))
        }
        None => Arc::new(InMemoryAttemptSink::new()),
    }
}
