//! 输出校验器：结构化输出之上的业务规则检查
//!
//! 纯函数、无状态、不改写输入；每条违规返回一段可执行的纠正文本，
//! 由编排器逐字拼入重试提示。

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{LessonContent, LessonDescription, LessonPlan};
use crate::generator::StepOutput;

/// 正文最少字符数
const MIN_BODY_CHARS: usize = 200;
/// 摘要字数范围
const SUMMARY_WORDS: (usize, usize) = (20, 150);
/// 标题最大字符数
const MAX_TITLE_CHARS: usize = 120;

/// 校验结果：通过，或一组违规说明
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Ok,
    Violations(Vec<String>),
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationResult::Ok)
    }
}

fn from_violations(violations: Vec<String>) -> ValidationResult {
    if violations.is_empty() {
        ValidationResult::Ok
    } else {
        ValidationResult::Violations(violations)
    }
}

/// 按步骤类型应用业务规则
pub fn validate(output: &StepOutput) -> ValidationResult {
    match output {
        StepOutput::Description(description) => from_violations(check_description(description)),
        StepOutput::Plan(plan) => from_violations(check_plan(plan)),
        StepOutput::Content(content) => from_violations(check_content(content)),
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 条目数边界检查：越界或含空条目时追加违规说明
fn check_list(name: &str, items: &[String], min: usize, max: usize, violations: &mut Vec<String>) {
    if items.len() < min || items.len() > max {
        violations.push(format!(
            "{} must contain between {} and {} items (got {}); adjust the list to fit",
            name,
            min,
            max,
            items.len()
        ));
    }
    if items.iter().any(|item| item.trim().is_empty()) {
        violations.push(format!(
            "{} must not contain empty items; remove or fill in the blank entries",
            name
        ));
    }
}

fn check_title(title: &str, violations: &mut Vec<String>) {
    if title.trim().is_empty() {
        violations.push(
            "lesson_title must not be empty; give this lesson a clear, specific title"
                .to_string(),
        );
    } else if title.chars().count() > MAX_TITLE_CHARS {
        violations.push(format!(
            "lesson_title must be at most {} characters (got {}); shorten it",
            MAX_TITLE_CHARS,
            title.chars().count()
        ));
    }
}

fn check_description(description: &LessonDescription) -> Vec<String> {
    let mut violations = Vec::new();
    check_title(&description.lesson_title, &mut violations);

    let words = word_count(&description.summary);
    if words < SUMMARY_WORDS.0 || words > SUMMARY_WORDS.1 {
        violations.push(format!(
            "summary must be between {} and {} words (got {}); describe what the learner will get out of this lesson",
            SUMMARY_WORDS.0, SUMMARY_WORDS.1, words
        ));
    }

    check_list("focus_points", &description.focus_points, 2, 4, &mut violations);
    violations
}

fn check_plan(plan: &LessonPlan) -> Vec<String> {
    let mut violations = Vec::new();
    check_title(&plan.lesson_title, &mut violations);

    if plan.learning_objective.trim().is_empty() {
        violations.push(
            "learning_objective must restate the objective as a measurable outcome".to_string(),
        );
    }

    check_list("key_concepts", &plan.key_concepts, 2, 8, &mut violations);
    check_list("lesson_outline", &plan.lesson_outline, 3, 10, &mut violations);
    check_list("mastery_criteria", &plan.mastery_criteria, 2, 6, &mut violations);
    check_list(
        "suggested_activity.expected_evidence",
        &plan.suggested_activity.expected_evidence,
        2,
        5,
        &mut violations,
    );

    // 跨字段一致性：对齐引用必须逐字出现在 key_concepts 中
    for aligned in &plan.suggested_activity.aligned_concepts {
        if !plan.key_concepts.contains(aligned) {
            violations.push(format!(
                "aligned_concepts entry '{}' does not exactly match any key_concepts entry; copy the concept text verbatim",
                aligned
            ));
        }
    }

    violations
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#{1,3} ").unwrap())
}

fn check_content(content: &LessonContent) -> Vec<String> {
    let mut violations = Vec::new();
    check_title(&content.lesson_title, &mut violations);

    if content.lesson_body.chars().count() < MIN_BODY_CHARS {
        violations.push(format!(
            "lesson_body must be at least {} characters (got {}); write the full lesson, not a summary",
            MIN_BODY_CHARS,
            content.lesson_body.chars().count()
        ));
    }

    if !heading_regex().is_match(&content.lesson_body) {
        violations.push(
            "lesson_body must use Markdown headings (##, ###) to structure the lesson"
                .to_string(),
        );
    }

    check_list("key_takeaways", &content.key_takeaways, 3, 6, &mut violations);
    violations
}
