//! 课程实例与生命周期状态
//!
//! CourseInstance 是状态机与聚合器共同操作的快照；不变量：每个学习目标
//! 恰有一个课时，objective_index 连续覆盖 0..N-1。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lesson::{Lesson, LessonStatus};

/// 课程生命周期的 8 个状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    /// 草稿：仅登记了目标与描述，内容未生成
    Draft,
    /// 生成中：流水线运行期间的占位状态，同时阻止重复启动
    Generating,
    /// 已生成：课时就绪，等待学习者开始
    Active,
    /// 学习中
    InProgress,
    /// 全部课时完成，等待结业评估生成
    AwaitingAssessment,
    /// 结业评估就绪
    AssessmentReady,
    /// 已结业
    Completed,
    /// 已归档（可恢复到归档前状态）
    Archived,
}

impl CourseStatus {
    /// 全部状态，供穷举状态对的测试使用
    pub const ALL: [CourseStatus; 8] = [
        CourseStatus::Draft,
        CourseStatus::Generating,
        CourseStatus::Active,
        CourseStatus::InProgress,
        CourseStatus::AwaitingAssessment,
        CourseStatus::AssessmentReady,
        CourseStatus::Completed,
        CourseStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Draft => "draft",
            CourseStatus::Generating => "generating",
            CourseStatus::Active => "active",
            CourseStatus::InProgress => "in_progress",
            CourseStatus::AwaitingAssessment => "awaiting_assessment",
            CourseStatus::AssessmentReady => "assessment_ready",
            CourseStatus::Completed => "completed",
            CourseStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 学习目标：不可变文本 + 课程内唯一的 0 基索引；索引序即生成序与解锁序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningObjective {
    pub index: usize,
    pub text: String,
}

/// 课程实例
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInstance {
    pub id: String,
    pub name: String,
    pub base_description: String,
    pub status: CourseStatus,
    /// 仅在 status == Archived 时为 Some，记录归档前状态供恢复
    pub pre_archive_state: Option<CourseStatus>,
    pub objectives: Vec<LearningObjective>,
    pub lessons: Vec<Lesson>,
    /// 最近一次结业评估分数（评估本身由上游产生）
    pub assessment_score: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseInstance {
    /// 创建草稿课程；目标按传入顺序编号
    pub fn new(
        name: impl Into<String>,
        base_description: impl Into<String>,
        objectives: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            base_description: base_description.into(),
            status: CourseStatus::Draft,
            pre_archive_state: None,
            objectives: objectives
                .into_iter()
                .enumerate()
                .map(|(index, text)| LearningObjective { index, text })
                .collect(),
            lessons: Vec::new(),
            assessment_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn lesson(&self, objective_index: usize) -> Option<&Lesson> {
        self.lessons
            .iter()
            .find(|l| l.objective_index == objective_index)
    }

    pub fn lesson_mut(&mut self, objective_index: usize) -> Option<&mut Lesson> {
        self.lessons
            .iter_mut()
            .find(|l| l.objective_index == objective_index)
    }

    // -- 生命周期守卫使用的快照判定 --

    pub fn has_lessons(&self) -> bool {
        !self.lessons.is_empty()
    }

    pub fn any_lesson_viewed(&self) -> bool {
        self.lessons.iter().any(|l| l.viewed_at.is_some())
    }

    pub fn any_activity_submitted(&self) -> bool {
        self.lessons.iter().any(|l| l.activity.submission_count > 0)
    }

    pub fn all_lessons_completed(&self) -> bool {
        !self.lessons.is_empty()
            && self
                .lessons
                .iter()
                .all(|l| l.status == LessonStatus::Completed)
    }
}
