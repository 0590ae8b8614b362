//! 共享数据模型：课程、课时、生成产物、审计记录

pub mod artifact;
pub mod audit;
pub mod course;
pub mod lesson;

pub use artifact::{
    ActivitySeed, GeneratedLesson, LessonContent, LessonDescription, LessonPlan, StepKind,
};
pub use audit::{
    AttemptRecord, AttemptSink, AttemptStatus, InMemoryAttemptSink, JsonlAttemptSink,
    NoopAttemptSink,
};
pub use course::{CourseInstance, CourseStatus, LearningObjective};
pub use lesson::{Activity, ActivitySubmission, Lesson, LessonStatus, MasteryDecision};
