//! 生成产物类型定义
//!
//! 流水线三步的结构化输出（描述 / 计划 / 正文）与单个学习目标的聚合产物 GeneratedLesson。
//! 各字段的业务边界（条目数、字数）由 pipeline::validator 检查，不在类型层强制。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 流水线步骤类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// 课时描述：定标题、摘要与重点
    Describe,
    /// 课时计划：概念、大纲、练习种子、掌握标准
    Plan,
    /// 课时正文：Markdown 课文与要点回顾
    Write,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Describe => "describe",
            StepKind::Plan => "plan",
            StepKind::Write => "write",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// describe 步输出：一个学习目标对应课时的定位描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LessonDescription {
    /// 课时标题（不是课程标题）
    pub lesson_title: String,
    /// 课时摘要，供学习者预览
    pub summary: String,
    /// 本课时聚焦的重点（2-4 条）
    pub focus_points: Vec<String>,
}

/// plan 步输出中的练习种子，供下游练习创建使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActivitySeed {
    pub activity_type: String,
    pub prompt: String,
    /// 期望的证据条目（2-5 条）
    pub expected_evidence: Vec<String>,
    /// 练习对齐的概念，必须逐字出现在 key_concepts 中
    pub aligned_concepts: Vec<String>,
}

/// plan 步输出：课时计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LessonPlan {
    pub lesson_title: String,
    /// 以可衡量结果重述的学习目标
    pub learning_objective: String,
    /// 核心概念（2-8 条）
    pub key_concepts: Vec<String>,
    /// 课文大纲（3-10 条有序步骤）
    pub lesson_outline: Vec<String>,
    pub suggested_activity: ActivitySeed,
    /// 掌握标准（2-6 条）
    pub mastery_criteria: Vec<String>,
}

/// write 步输出：完整课文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LessonContent {
    pub lesson_title: String,
    /// Markdown 课文正文（至少 200 字符，含标题结构）
    pub lesson_body: String,
    /// 要点回顾（3-6 条）
    pub key_takeaways: Vec<String>,
}

/// 单个学习目标的聚合产物：三个子结果严格从左到右填充，单次运行内一经写入不再改写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLesson {
    pub objective_index: usize,
    pub description: Option<LessonDescription>,
    pub plan: Option<LessonPlan>,
    pub content: Option<LessonContent>,
}

impl GeneratedLesson {
    pub fn new(objective_index: usize) -> Self {
        Self {
            objective_index,
            description: None,
            plan: None,
            content: None,
        }
    }

    /// 三个子结果是否全部就绪
    pub fn is_complete(&self) -> bool {
        self.description.is_some() && self.plan.is_some() && self.content.is_some()
    }
}
