//! Sage - 课程内容生成与学习进度引擎
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: CourseEngine 对外操作入口与生成任务追踪
//! - **domain**: 共享数据模型（课程、课时、生成产物、审计记录）
//! - **generator**: 内容生成后端抽象与实现（OpenAI 兼容 / Mock）
//! - **observability**: tracing 日志初始化
//! - **pipeline**: 三步生成流水线（describe → plan → write）与输出校验
//! - **progression**: 课程生命周期状态机、课时解锁状态机、进度聚合
//! - **store**: 持久化协作方抽象（内存实现）

pub mod config;
pub mod core;
pub mod domain;
pub mod generator;
pub mod observability;
pub mod pipeline;
pub mod progression;
pub mod store;

pub use crate::core::{CourseEngine, EngineError};
pub use pipeline::{PipelineError, PipelineOrchestrator};
