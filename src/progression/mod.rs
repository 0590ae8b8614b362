//! 学习进度层：课程生命周期状态机、课时解锁状态机、进度聚合

pub mod lifecycle;
pub mod progress;
pub mod unlock;

pub use lifecycle::{
    can_transition, transition, Guard, TransitionError, ASSESSMENT_PASS_THRESHOLD, TRANSITIONS,
};
pub use progress::{compute, Progress};
pub use unlock::{activate_first_lesson, on_activity_completed};
