//! 进度聚合器
//!
//! 对课程快照计算只读派生指标；每次调用都从当前状态重新计算，绝不缓存。

use serde::Serialize;

use crate::domain::{CourseInstance, LessonStatus};

/// 派生进度指标
#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    /// 完成百分比：100 × 已完成课时数 / 总课时数（总数为 0 时为 0）
    pub percentage: f64,
    pub lesson_count: usize,
    pub lessons_completed: usize,
    /// 按索引序第一个 unlocked 课时的目标索引；无 unlocked 课时时为 None
    pub current_lesson_index: Option<usize>,
    /// 课时阅读时长与练习时长之和（秒）
    pub total_time_seconds: u64,
    /// 已评分练习 latest_score 的均值；无评分时为 None
    pub average_score: Option<f64>,
}

/// 计算课程进度（纯函数，无副作用）
pub fn compute(course: &CourseInstance) -> Progress {
    let lesson_count = course.lessons.len();
    let lessons_completed = course
        .lessons
        .iter()
        .filter(|l| l.status == LessonStatus::Completed)
        .count();

    let percentage = if lesson_count == 0 {
        0.0
    } else {
        100.0 * lessons_completed as f64 / lesson_count as f64
    };

    // 课时索引连续 0..N-1，按索引序扫描第一个 unlocked
    let current_lesson_index = (0..lesson_count)
        .find(|&i| matches!(course.lesson(i), Some(l) if l.status == LessonStatus::Unlocked));

    let total_time_seconds = course
        .lessons
        .iter()
        .map(|l| l.time_spent_seconds + l.activity.time_spent_seconds)
        .sum();

    let scores: Vec<f64> = course
        .lessons
        .iter()
        .filter_map(|l| l.activity.latest_score.map(f64::from))
        .collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    Progress {
        percentage,
        lesson_count,
        lessons_completed,
        current_lesson_index,
        total_time_seconds,
        average_score,
    }
}
