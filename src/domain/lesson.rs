//! 课时与练习记录
//!
//! Lesson 状态只前进（locked → unlocked → completed），重生成不回退状态；
//! Activity 记录练习提交的累计统计，best_score 只增不减。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::artifact::GeneratedLesson;

/// 课时状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    /// 未解锁，任何访问都被拒绝
    Locked,
    /// 已解锁，可查看与提交练习
    Unlocked,
    /// 已完成（练习至少提交一次）
    Completed,
}

/// 练习评分的掌握判定（由上游评审产生，核心只记录）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryDecision {
    NotYet,
    Meets,
    Exceeds,
}

/// 一次练习提交事件（分数与掌握判定来自上游评审）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySubmission {
    pub score: f32,
    pub mastery_decision: MasteryDecision,
    /// 本次提交耗时（秒），计入 Activity 累计时长
    #[serde(default)]
    pub time_spent_seconds: u64,
}

/// 课时对应的练习记录
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Activity {
    pub submission_count: u32,
    pub latest_score: Option<f32>,
    /// 历次 latest_score 的最大值，只增不减
    pub best_score: Option<f32>,
    pub latest_mastery_decision: Option<MasteryDecision>,
    pub time_spent_seconds: u64,
}

impl Activity {
    /// 记录一次提交：计数、最新分、最好分与累计时长
    pub fn record_submission(&mut self, submission: &ActivitySubmission) {
        self.submission_count += 1;
        self.latest_score = Some(submission.score);
        self.best_score = Some(match self.best_score {
            Some(best) if best >= submission.score => best,
            _ => submission.score,
        });
        self.latest_mastery_decision = Some(submission.mastery_decision);
        self.time_spent_seconds += submission.time_spent_seconds;
    }
}

/// 课时：持有生成产物、解锁/完成时间戳与重生成计数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub objective_index: usize,
    pub status: LessonStatus,
    /// 生成产物，仅在流水线成功后存在
    pub material: Option<GeneratedLesson>,
    pub activity: Activity,
    /// 重生成次数，单调递增，有上限
    pub regeneration_count: u32,
    /// 课时阅读累计时长（秒）
    pub time_spent_seconds: u64,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Lesson {
    /// 从流水线产物创建课时，初始为 locked
    pub fn from_material(material: GeneratedLesson) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            objective_index: material.objective_index,
            status: LessonStatus::Locked,
            material: Some(material),
            activity: Activity::default(),
            regeneration_count: 0,
            time_spent_seconds: 0,
            unlocked_at: None,
            viewed_at: None,
            completed_at: None,
        }
    }
}
