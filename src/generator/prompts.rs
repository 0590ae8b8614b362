//! 各步骤的提示词构建
//!
//! system 提示词描述角色、业务要求与期望的 JSON Schema（schemars 生成）；
//! user 提示词携带课程上下文，重试时在末尾追加纠正块。

use schemars::{schema_for, JsonSchema};

use crate::domain::{LessonContent, LessonDescription, LessonPlan, StepKind};
use crate::generator::traits::{DescribeInput, PlanInput, StepInput, StepRequest, WriteInput};

const DESCRIBE_SYSTEM: &str = "You are an expert instructional designer describing one lesson \
within a course.\n\n\
Requirements:\n\
- lesson_title: A clear, specific title for this lesson (not the course title)\n\
- summary: A 20-150 word preview of what the learner will get out of this lesson\n\
- focus_points: 2-4 concrete points this lesson focuses on\n\n\
IMPORTANT - Scope control: You will receive the full list of course objectives. \
Your description must cover ONLY the assigned objective. Do not promise material \
that belongs to a different objective; those have their own lessons.";

const PLAN_SYSTEM: &str = "You are an expert instructional designer creating a lesson plan for \
one learning objective within a course.\n\n\
Your job is to produce a structured lesson plan that a downstream lesson writer can use to \
write complete, engaging lesson content.\n\n\
Requirements:\n\
- lesson_title: A clear, specific title for this lesson (not the course title)\n\
- learning_objective: Restate the objective as a clear, measurable outcome\n\
- key_concepts: 2-8 core concepts the lesson must cover\n\
- lesson_outline: 3-10 ordered steps/sections for the lesson content\n\
- suggested_activity: A seed for a practice activity that tests the objective, including \
the activity type, a prompt, 2-5 expected evidence items, and the key concepts it aligns \
with (aligned_concepts entries must exactly match entries of key_concepts)\n\
- mastery_criteria: 2-6 rubric-style checks for determining mastery\n\n\
The plan must be specific enough that downstream steps can produce aligned content without \
guessing.\n\n\
IMPORTANT - Scope control: Your lesson must cover ONLY the assigned objective. You may \
briefly mention related topics for context, but do NOT teach, define, or provide \
tables/examples for concepts that belong to a different objective.";

const WRITE_SYSTEM: &str = "You are an expert educational content writer. Given a lesson plan, \
write a complete lesson in Markdown.\n\n\
Requirements for the lesson body:\n\
- Start with a clear statement of the learning objective\n\
- Explain why this topic matters (real-world relevance)\n\
- Walk through the key concepts with clear steps and explanations\n\
- Include at least one concrete, worked example\n\
- End with a brief recap that ties back to the objective\n\
- Use Markdown headings (##, ###), lists, and code blocks where appropriate\n\
- Write in a clear, engaging voice - teach, don't lecture\n\
- Minimum 200 characters for the lesson body\n\n\
Also provide 3-6 concise key takeaways.";

fn schema_block<T: JsonSchema>() -> String {
    // Schema 生成失败仅意味着提示里少一段说明，不影响调用
    serde_json::to_string_pretty(&schema_for!(T)).unwrap_or_default()
}

/// 步骤的 system 提示词：角色要求 + 期望输出的 JSON Schema + 仅输出 JSON 的约束
pub fn system_prompt(kind: StepKind) -> String {
    let (base, schema) = match kind {
        StepKind::Describe => (DESCRIBE_SYSTEM, schema_block::<LessonDescription>()),
        StepKind::Plan => (PLAN_SYSTEM, schema_block::<LessonPlan>()),
        StepKind::Write => (WRITE_SYSTEM, schema_block::<LessonContent>()),
    };
    format!(
        "{}\n\nRespond with a single JSON object matching this schema, and nothing else:\n{}",
        base, schema
    )
}

fn describe_user_prompt(input: &DescribeInput) -> String {
    let objective = input
        .objectives
        .get(input.objective_index)
        .cloned()
        .unwrap_or_default();
    let mut prompt = format!(
        "Course: {}\nCourse description: {}\n\nLearning objective for THIS lesson: {}\n",
        input.course_name, input.base_description, objective
    );
    let other: Vec<&String> = input
        .objectives
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != input.objective_index)
        .map(|(_, o)| o)
        .collect();
    if !other.is_empty() {
        prompt.push_str("\nOther objectives in this course (DO NOT cover these, they have their own lessons):\n");
        for o in other {
            prompt.push_str(&format!("- {}\n", o));
        }
    }
    prompt
}

fn plan_user_prompt(input: &PlanInput) -> String {
    let mut prompt = format!(
        "Lesson description:\n{}\n\nLearning objective for THIS lesson: {}\n",
        serde_json::to_string_pretty(&input.description).unwrap_or_default(),
        input.objective
    );
    if !input.other_objectives.is_empty() {
        prompt.push_str("\nOther objectives in this course (DO NOT teach these, they have their own lessons):\n");
        for o in &input.other_objectives {
            prompt.push_str(&format!("- {}\n", o));
        }
    }
    prompt
}

fn write_user_prompt(input: &WriteInput) -> String {
    format!(
        "Learning objective: {}\n\nLesson description:\n{}\n\nLesson plan:\n{}\n",
        input.objective,
        serde_json::to_string_pretty(&input.description).unwrap_or_default(),
        serde_json::to_string_pretty(&input.plan).unwrap_or_default(),
    )
}

/// 构建 user 提示词；重试时在末尾追加纠正块（纠正文本来自校验器，逐字使用）
pub fn user_prompt(request: &StepRequest) -> String {
    let mut prompt = match &request.input {
        StepInput::Describe(input) => describe_user_prompt(input),
        StepInput::Plan(input) => plan_user_prompt(input),
        StepInput::Write(input) => write_user_prompt(input),
    };
    if let Some(correction) = &request.correction {
        prompt.push_str(&format!(
            "\nYour previous output was rejected. Fix ALL of the following and respond again with the full corrected JSON object:\n{}\n",
            correction
        ));
    }
    prompt
}
