//! Sage 演示程序 - 生成一门课程并走完学习流程

use std::sync::Arc;

use sage::config::load_config;
use sage::core::{sink_from_config, CourseEngine, GenerationEvent, GenerationTracker};
use sage::domain::{ActivitySubmission, CourseStatus, MasteryDecision};
use sage::generator::generator_from_config;
use sage::store::InMemoryCourseStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sage::observability::init();

    println!("🚀 Starting Sage course engine demo");

    let cfg = load_config(None).unwrap_or_default();
    let generator = generator_from_config(&cfg);
    let store = Arc::new(InMemoryCourseStore::new());
    let sink = sink_from_config(&cfg);

    let engine = Arc::new(CourseEngine::new(
        generator,
        store,
        sink,
        cfg.pipeline.clone(),
    ));
    let tracker = GenerationTracker::new(engine.clone());

    let course = engine
        .create_course(
            "Rust Fundamentals",
            "A hands-on introduction to writing safe and fast programs in Rust.",
            vec![
                "Understand ownership and borrowing".to_string(),
                "Model data with structs and enums".to_string(),
                "Handle failures with Result and the ? operator".to_string(),
            ],
        )
        .await;
    println!("📚 Course created: {} ({})", course.name, course.id);

    let mut events = tracker.subscribe();
    tracker.start(&course.id).await?;

    loop {
        match events.recv().await? {
            GenerationEvent::Started { .. } => println!("⏳ Generation started..."),
            GenerationEvent::StepCompleted {
                objective_index,
                step,
                attempts,
                ..
            } => println!(
                "  ✓ objective {} step {} done ({} attempt{})",
                objective_index,
                step,
                attempts,
                if attempts == 1 { "" } else { "s" }
            ),
            GenerationEvent::Completed { lesson_count, .. } => {
                println!("✅ Generation completed: {} lessons", lesson_count);
                break;
            }
            GenerationEvent::Failed { message, .. } => {
                anyhow::bail!("generation failed: {}", message);
            }
        }
    }
    tracker.wait(&course.id).await;

    // 逐课学习：查看、提交练习、观察解锁级联与进度变化
    let lesson_count = engine.course(&course.id).await?.lessons.len();
    for i in 0..lesson_count {
        engine.mark_lesson_viewed(&course.id, i).await?;
        engine
            .submit_activity(
                &course.id,
                i,
                ActivitySubmission {
                    score: 82.0 + i as f32,
                    mastery_decision: MasteryDecision::Meets,
                    time_spent_seconds: 300,
                },
            )
            .await?;
        let progress = engine.progress(&course.id).await?;
        println!(
            "📈 Lesson {} completed — {:.1}% ({}/{} lessons)",
            i, progress.percentage, progress.lessons_completed, progress.lesson_count
        );
    }

    let snapshot = engine
        .request_transition(&course.id, CourseStatus::AssessmentReady)
        .await?;
    println!("📝 Course is now {}", snapshot.status);

    let snapshot = engine.submit_assessment(&course.id, 88.0).await?;
    println!("🎓 Assessment scored 88.0, course is {}", snapshot.status);

    // 归档再恢复
    let archived = engine
        .request_transition(&course.id, CourseStatus::Archived)
        .await?;
    println!(
        "🗄️  Archived (was {})",
        archived
            .pre_archive_state
            .map(|s| s.to_string())
            .unwrap_or_default()
    );
    let restored = engine
        .request_transition(&course.id, CourseStatus::Completed)
        .await?;
    println!("♻️  Restored to {}", restored.status);

    let progress = engine.progress(&course.id).await?;
    println!(
        "\n📊 Final: {:.1}% complete, {} seconds spent, average score {:?}",
        progress.percentage, progress.total_time_seconds, progress.average_score
    );
    match &cfg.app.audit_log_path {
        Some(path) => println!("🧾 Attempt records appended to {}", path.display()),
        None => println!("🧾 Attempt records kept in memory"),
    }

    Ok(())
}
