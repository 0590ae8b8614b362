//! Mock 生成后端（用于测试与演示，无需 API）
//!
//! 对同一请求返回确定性的、可通过全部业务校验的输出，便于本地跑通整条流水线。

use async_trait::async_trait;

use crate::domain::{ActivitySeed, LessonContent, LessonDescription, LessonPlan};
use crate::generator::traits::{
    ContentGenerator, DescribeInput, GeneratorError, PlanInput, StepInput, StepOutput,
    StepRequest, WriteInput,
};

/// Mock 后端：从请求上下文拼出合规输出
#[derive(Debug, Default)]
pub struct MockGenerator;

fn mock_description(input: &DescribeInput) -> LessonDescription {
    let objective = input
        .objectives
        .get(input.objective_index)
        .cloned()
        .unwrap_or_default();
    LessonDescription {
        lesson_title: format!("Lesson {}: {}", input.objective_index + 1, objective),
        summary: format!(
            "This lesson introduces {} in practical terms. You will see why the topic \
             matters, walk through the core ideas step by step, work a concrete example, \
             and finish with a short recap that ties everything back to the objective.",
            objective
        ),
        focus_points: vec![
            format!("What {} means", objective),
            format!("How {} is applied", objective),
            "Common mistakes to avoid".to_string(),
        ],
    }
}

fn mock_plan(input: &PlanInput) -> LessonPlan {
    let objective = input.objective.clone();
    let key_concepts = vec![
        format!("Definition of {}", objective),
        format!("Applying {}", objective),
        "Common pitfalls".to_string(),
    ];
    LessonPlan {
        lesson_title: input.description.lesson_title.clone(),
        learning_objective: format!("Learners can explain and apply {}", objective),
        key_concepts: key_concepts.clone(),
        lesson_outline: vec![
            "State the objective and why it matters".to_string(),
            "Introduce the core concepts".to_string(),
            "Work through a concrete example".to_string(),
            "Recap and connect back to the objective".to_string(),
        ],
        suggested_activity: ActivitySeed {
            activity_type: "short_answer".to_string(),
            prompt: format!("In your own words, explain {} and give one example.", objective),
            expected_evidence: vec![
                "A correct definition in the learner's own words".to_string(),
                "One original, concrete example".to_string(),
            ],
            aligned_concepts: vec![key_concepts[0].clone(), key_concepts[1].clone()],
        },
        mastery_criteria: vec![
            "Defines the concept accurately".to_string(),
            "Applies the concept to a new example".to_string(),
        ],
    }
}

fn mock_content(input: &WriteInput) -> LessonContent {
    let objective = input.objective.clone();
    let mut body = format!(
        "## {}\n\nBy the end of this lesson you will be able to explain and apply {}.\n\n\
         ### Why it matters\n\nUnderstanding {} shows up in real projects constantly, \
         and getting it right early saves painful debugging later.\n\n\
         ### Core ideas\n\n",
        input.plan.lesson_title, objective, objective
    );
    for (i, concept) in input.plan.key_concepts.iter().enumerate() {
        body.push_str(&format!("{}. {}\n", i + 1, concept));
    }
    body.push_str(&format!(
        "\n### Worked example\n\nLet's apply {} to a small, concrete case and walk \
         through each step of the reasoning.\n\n\
         ### Recap\n\nYou saw what {} is, why it matters, and how to apply it yourself.\n",
        objective, objective
    ));
    LessonContent {
        lesson_title: input.plan.lesson_title.clone(),
        lesson_body: body,
        key_takeaways: vec![
            format!("{} has a precise definition worth memorizing", objective),
            "The concept applies directly to everyday practice".to_string(),
            "Watch out for the common pitfalls covered above".to_string(),
        ],
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn generate(&self, request: &StepRequest) -> Result<StepOutput, GeneratorError> {
        match &request.input {
            StepInput::Describe(input) => Ok(StepOutput::Description(mock_description(input))),
            StepInput::Plan(input) => Ok(StepOutput::Plan(mock_plan(input))),
            StepInput::Write(input) => Ok(StepOutput::Content(mock_content(input))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::validator::{validate, ValidationResult};

    #[tokio::test]
    async fn test_mock_outputs_pass_validation() {
        let describe = StepRequest::new(StepInput::Describe(DescribeInput {
            course_name: "Rust Basics".to_string(),
            base_description: "An introductory Rust course".to_string(),
            objectives: vec!["Ownership".to_string(), "Borrowing".to_string()],
            objective_index: 0,
        }));
        let output = MockGenerator.generate(&describe).await.unwrap();
        assert!(matches!(validate(&output), ValidationResult::Ok));

        let StepOutput::Description(description) = output else {
            panic!("Expected description output");
        };
        let plan_request = StepRequest::new(StepInput::Plan(PlanInput {
            objective: "Ownership".to_string(),
            other_objectives: vec!["Borrowing".to_string()],
            description: description.clone(),
        }));
        let output = MockGenerator.generate(&plan_request).await.unwrap();
        assert!(matches!(validate(&output), ValidationResult::Ok));

        let StepOutput::Plan(plan) = output else {
            panic!("Expected plan output");
        };
        let write_request = StepRequest::new(StepInput::Write(WriteInput {
            objective: "Ownership".to_string(),
            description,
            plan,
        }));
        let output = MockGenerator.generate(&write_request).await.unwrap();
        assert!(matches!(validate(&output), ValidationResult::Ok));
    }
}
