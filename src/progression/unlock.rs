//! 课时解锁状态机
//!
//! 解锁关系是严格不可跳跃的链：除 0 号课时由 activate_first_lesson 解锁外，
//! 课时 i+1 只能由课时 i 的练习完成级联解锁。

use chrono::Utc;

use crate::domain::{CourseInstance, LessonStatus};

/// 课程进入 active 时调用一次：解锁 0 号课时，其余保持 locked
pub fn activate_first_lesson(course: &mut CourseInstance) {
    if let Some(lesson) = course.lesson_mut(0) {
        if lesson.status == LessonStatus::Locked {
            lesson.status = LessonStatus::Unlocked;
            lesson.unlocked_at = Some(Utc::now());
        }
    }
}

/// 练习完成：将课时置为 completed（幂等，completed_at 只在首次转换时记录），
/// 并解锁下一课时（若存在且为 locked）。返回新解锁的课时索引；最后一课返回 None。
pub fn on_activity_completed(
    course: &mut CourseInstance,
    objective_index: usize,
) -> Option<usize> {
    if let Some(lesson) = course.lesson_mut(objective_index) {
        if lesson.status != LessonStatus::Completed {
            lesson.status = LessonStatus::Completed;
            lesson.completed_at = Some(Utc::now());
        }
    }

    let next_index = objective_index + 1;
    if let Some(next) = course.lesson_mut(next_index) {
        if next.status == LessonStatus::Locked {
            next.status = LessonStatus::Unlocked;
            next.unlocked_at = Some(Utc::now());
            return Some(next_index);
        }
    }
    None
}
