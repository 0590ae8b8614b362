//! 审计记录：每次生成步骤调用恰好产生一条 AttemptRecord
//!
//! 记录是只追加的，写入后不再修改；由编排器交给注入的 AttemptSink，
//! 编排器不关心记录如何存储。提供内存实现与 JSONL 文件实现。

use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::artifact::StepKind;

/// 单次步骤调用的结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// 生成并通过校验
    Success,
    /// 生成成功但业务规则校验未通过（detail 为违规说明）
    Violations,
    /// 生成后端本身失败（结构错误或调用失败，detail 为错误文本）
    Failed,
}

/// 一条审计记录：步骤名、目标索引、第几次尝试、结果与耗时
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: String,
    pub course_name: String,
    pub objective_index: usize,
    pub step: StepKind,
    /// 1 基的尝试序号（首次调用为 1）
    pub attempt: u32,
    pub status: AttemptStatus,
    pub detail: Vec<String>,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(
        course_name: impl Into<String>,
        objective_index: usize,
        step: StepKind,
        attempt: u32,
        status: AttemptStatus,
        detail: Vec<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            course_name: course_name.into(),
            objective_index,
            step,
            attempt,
            status,
            detail,
            duration_ms,
            created_at: Utc::now(),
        }
    }
}

/// 审计记录接收端：只追加
pub trait AttemptSink: Send + Sync {
    fn append(&self, record: AttemptRecord) -> anyhow::Result<()>;
}

/// 空实现：不需要审计时使用
#[derive(Clone, Default)]
pub struct NoopAttemptSink;

impl AttemptSink for NoopAttemptSink {
    fn append(&self, _record: AttemptRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

/// 内存实现：测试与演示用
#[derive(Clone, Default)]
pub struct InMemoryAttemptSink {
    records: Arc<RwLock<Vec<AttemptRecord>>>,
}

impl InMemoryAttemptSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}

impl AttemptSink for InMemoryAttemptSink {
    fn append(&self, record: AttemptRecord) -> anyhow::Result<()> {
        self.records
            .write()
            .map_err(|_| anyhow::anyhow!("attempt sink lock poisoned"))?
            .push(record);
        Ok(())
    }
}

/// JSONL 文件实现：每条记录一行 JSON，追加写入；父目录不存在时自动创建
#[derive(Debug)]
pub struct JsonlAttemptSink {
    path: std::path::PathBuf,
}

impl JsonlAttemptSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 读回全部记录；文件不存在时返回空 Vec
    pub fn load(&self) -> anyhow::Result<Vec<AttemptRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        data.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Ok(serde_json::from_str(line)?))
            .collect()
    }
}

impl AttemptSink for JsonlAttemptSink {
    fn append(&self, record: AttemptRecord) -> anyhow::Result<()> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(&record)?)?;
        Ok(())
    }
}
