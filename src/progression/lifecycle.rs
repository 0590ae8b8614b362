//! 课程生命周期状态机
//!
//! 转换表是数据而非分支代码：(from, to, Guard) 的常量表 + 一次守卫求值。
//! transition 是对快照的纯决策函数，不做任何 I/O，返回期望的新状态由调用方
//! 在单次写入内持久化；表中不存在的状态对在求值守卫之前即被拒绝。

use chrono::Utc;
use thiserror::Error;

use crate::domain::{CourseInstance, CourseStatus};

/// 结业评估通过分数线
pub const ASSESSMENT_PASS_THRESHOLD: f32 = 70.0;

/// 守卫条件：转换对合法后仍需满足的前置条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    /// 至少存在一个课时
    HasLessons,
    /// 至少一个课时被查看过，或至少一次练习提交
    LessonViewedOrActivitySubmitted,
    /// 全部课时已完成
    AllLessonsCompleted,
    /// 评估分数存在且达到分数线
    AssessmentPassed,
    /// 恢复目标必须等于归档前状态
    PreArchiveStateMatches,
}

use CourseStatus::*;
use Guard::*;

/// 完整转换表；任何不在表中的 (from, to) 对都会被拒绝
pub const TRANSITIONS: &[(CourseStatus, CourseStatus, Guard)] = &[
    (Draft, Generating, Always),
    (Generating, Active, HasLessons),
    // 流水线失败后的回滚路径
    (Generating, Draft, Always),
    (Active, InProgress, LessonViewedOrActivitySubmitted),
    (InProgress, AwaitingAssessment, AllLessonsCompleted),
    (AwaitingAssessment, AssessmentReady, Always),
    (AssessmentReady, Completed, AssessmentPassed),
    // 评估未通过后的重学路径
    (AssessmentReady, InProgress, Always),
    (InProgress, Archived, Always),
    (AwaitingAssessment, Archived, Always),
    (AssessmentReady, Archived, Always),
    (Completed, Archived, Always),
    (Archived, Active, PreArchiveStateMatches),
    (Archived, InProgress, PreArchiveStateMatches),
    (Archived, AwaitingAssessment, PreArchiveStateMatches),
    (Archived, AssessmentReady, PreArchiveStateMatches),
    (Archived, Completed, PreArchiveStateMatches),
];

/// 生命周期转换错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// 状态对不在转换表中（在守卫求值之前拒绝）
    #[error("Cannot transition from '{from}' to '{to}'")]
    InvalidStateTransition { from: CourseStatus, to: CourseStatus },

    /// 状态对合法但守卫不满足
    #[error("Guard failed for transition '{from}' -> '{to}': {reason}")]
    GuardFailed {
        from: CourseStatus,
        to: CourseStatus,
        reason: String,
    },
}

fn lookup(from: CourseStatus, to: CourseStatus) -> Option<Guard> {
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, guard)| *guard)
}

/// 守卫求值：满足返回 Ok，否则返回具体原因
fn check_guard(course: &CourseInstance, guard: Guard, to: CourseStatus) -> Result<(), String> {
    match guard {
        Always => Ok(()),
        HasLessons => {
            if course.has_lessons() {
                Ok(())
            } else {
                Err("course has no lessons".to_string())
            }
        }
        LessonViewedOrActivitySubmitted => {
            if course.any_lesson_viewed() || course.any_activity_submitted() {
                Ok(())
            } else {
                Err("no lesson has been viewed and no activity submitted".to_string())
            }
        }
        AllLessonsCompleted => {
            if course.all_lessons_completed() {
                Ok(())
            } else {
                Err("not every lesson is completed".to_string())
            }
        }
        AssessmentPassed => match course.assessment_score {
            Some(score) if score >= ASSESSMENT_PASS_THRESHOLD => Ok(()),
            Some(score) => Err(format!(
                "assessment score {} is below the passing threshold {}",
                score, ASSESSMENT_PASS_THRESHOLD
            )),
            None => Err("no assessment score recorded".to_string()),
        },
        PreArchiveStateMatches => match course.pre_archive_state {
            Some(previous) if previous == to => Ok(()),
            Some(previous) => Err(format!(
                "course was archived from '{}', cannot restore to '{}'",
                previous, to
            )),
            None => Err("no pre-archive state recorded".to_string()),
        },
    }
}

/// 状态对在表中且守卫满足时为 true
pub fn can_transition(course: &CourseInstance, to: CourseStatus) -> bool {
    match lookup(course.status, to) {
        Some(guard) => check_guard(course, guard, to).is_ok(),
        None => false,
    }
}

/// 求值转换：成功时返回更新了 status / pre_archive_state / updated_at 的新快照
pub fn transition(
    course: &CourseInstance,
    to: CourseStatus,
) -> Result<CourseInstance, TransitionError> {
    let from = course.status;
    let guard = lookup(from, to).ok_or(TransitionError::InvalidStateTransition { from, to })?;

    check_guard(course, guard, to).map_err(|reason| TransitionError::GuardFailed {
        from,
        to,
        reason,
    })?;

    let mut next = course.clone();
    next.status = to;
    next.updated_at = Utc::now();
    if to == Archived {
        next.pre_archive_state = Some(from);
    } else if from == Archived {
        next.pre_archive_state = None;
    }
    Ok(next)
}
