//! 生命周期状态机集成测试：状态对穷举与归档/恢复性质

use chrono::Utc;
use sage::domain::{CourseInstance, CourseStatus, GeneratedLesson, Lesson, LessonStatus};
use sage::progression::{can_transition, transition, TransitionError, TRANSITIONS};

use CourseStatus::*;

/// 满足全部守卫的课程快照：有课时、全部完成、已查看、评估达线
fn fully_satisfied_course(status: CourseStatus) -> CourseInstance {
    let mut course = CourseInstance::new(
        "Exhaustive",
        "",
        vec!["A".to_string(), "B".to_string()],
    );
    for i in 0..2 {
        let mut lesson = Lesson::from_material(GeneratedLesson::new(i));
        lesson.status = LessonStatus::Completed;
        lesson.viewed_at = Some(Utc::now());
        lesson.activity.submission_count = 1;
        course.lessons.push(lesson);
    }
    course.assessment_score = Some(85.0);
    course.status = status;
    course
}

#[test]
fn test_exhaustive_pairs_match_transition_table() {
    for from in CourseStatus::ALL {
        for to in CourseStatus::ALL {
            let mut course = fully_satisfied_course(from);
            if from == Archived {
                // 恢复守卫要求目标等于归档前状态
                course.pre_archive_state = Some(to);
            }

            let in_table = TRANSITIONS.iter().any(|(f, t, _)| *f == from && *t == to);
            assert_eq!(
                can_transition(&course, to),
                in_table,
                "pair {} -> {} disagrees with the table",
                from,
                to
            );

            if !in_table {
                assert_eq!(
                    transition(&course, to).unwrap_err(),
                    TransitionError::InvalidStateTransition { from, to }
                );
            }
        }
    }
}

#[test]
fn test_table_has_no_archive_path_from_draft_generating_or_active() {
    for from in [Draft, Generating, Active] {
        assert!(
            !TRANSITIONS.iter().any(|(f, t, _)| *f == from && *t == Archived),
            "unexpected archive path from {}",
            from
        );
    }
}

#[test]
fn test_archive_restore_roundtrip_for_every_archivable_state() {
    for from in [InProgress, AwaitingAssessment, AssessmentReady, Completed] {
        let course = fully_satisfied_course(from);
        let archived = transition(&course, Archived).unwrap();
        assert_eq!(archived.status, Archived);
        assert_eq!(archived.pre_archive_state, Some(from));

        // 只能恢复到归档前状态
        for to in [Active, InProgress, AwaitingAssessment, AssessmentReady, Completed] {
            let result = transition(&archived, to);
            if to == from {
                let restored = result.unwrap();
                assert_eq!(restored.status, from);
                assert!(restored.pre_archive_state.is_none());
            } else {
                assert!(
                    matches!(result, Err(TransitionError::GuardFailed { .. })),
                    "restore {} -> {} should fail the guard",
                    from,
                    to
                );
            }
        }
    }
}

#[test]
fn test_guards_block_transitions_on_fresh_course() {
    // 无课时、无查看、无提交、无评分：只有无守卫的转换可行
    let mut course = CourseInstance::new("Fresh", "", vec!["A".to_string()]);

    assert!(can_transition(&course, Generating));

    course.status = Generating;
    assert!(!can_transition(&course, Active)); // 无课时
    assert!(can_transition(&course, Draft));

    course.status = Active;
    assert!(!can_transition(&course, InProgress)); // 未查看未提交

    course.status = InProgress;
    assert!(!can_transition(&course, AwaitingAssessment)); // 未全部完成

    course.status = AssessmentReady;
    assert!(!can_transition(&course, Completed)); // 无评分
    assert!(can_transition(&course, InProgress)); // 重学路径无守卫
}
