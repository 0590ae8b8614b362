//! 生成任务追踪器
//!
//! 每门课程同一时刻至多一个在途生成任务：重复启动被拒绝。任务进度以广播事件
//! 对外发布（Started / StepCompleted / Completed / Failed），任务结束后从
//! 在途表中清理。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::core::{CourseEngine, EngineError};
use crate::domain::{CourseStatus, StepKind};
use crate::pipeline::PipelineEvent;

/// 生成任务对外事件
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    Started {
        course_id: String,
    },
    StepCompleted {
        course_id: String,
        objective_index: usize,
        step: StepKind,
        attempts: u32,
    },
    Completed {
        course_id: String,
        lesson_count: usize,
    },
    Failed {
        course_id: String,
        message: String,
    },
}

pub struct GenerationTracker {
    engine: Arc<CourseEngine>,
    running: Mutex<HashMap<String, JoinHandle<()>>>,
    event_tx: broadcast::Sender<GenerationEvent>,
}

impl GenerationTracker {
    pub fn new(engine: Arc<CourseEngine>) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            engine,
            running: Mutex::new(HashMap::new()),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GenerationEvent> {
        self.event_tx.subscribe()
    }

    /// 课程是否有在途生成任务
    pub async fn is_running(&self, course_id: &str) -> bool {
        let mut running = self.running.lock().await;
        running.retain(|_, handle| !handle.is_finished());
        running.contains_key(course_id)
    }

    /// 在后台启动一次生成；同课程已有在途任务或课程不在 draft 时同步拒绝
    pub async fn start(&self, course_id: &str) -> Result<(), EngineError> {
        let mut running = self.running.lock().await;
        running.retain(|_, handle| !handle.is_finished());
        if running.contains_key(course_id) {
            return Err(EngineError::GenerationAlreadyRunning(course_id.to_string()));
        }

        let course = self.engine.course(course_id).await?;
        if course.status != CourseStatus::Draft {
            return Err(EngineError::NotInDraft(course_id.to_string()));
        }

        let engine = self.engine.clone();
        let event_tx = self.event_tx.clone();
        let id = course_id.to_string();
        let course_name = course.name;

        let handle = tokio::spawn(async move {
            let _ = event_tx.send(GenerationEvent::Started {
                course_id: id.clone(),
            });

            // 流水线事件无序号的订阅窗口必须先于任务开跑
            let mut pipeline_rx = engine.subscribe_pipeline_events();
            let mut run = Box::pin(engine.start_generation(&id));

            // 引擎的事件通道是全局的，按课程名过滤后转发
            let forward = |event: PipelineEvent| {
                if let PipelineEvent::StepCompleted {
                    course,
                    objective_index,
                    step,
                    attempts,
                } = event
                {
                    if course == course_name {
                        let _ = event_tx.send(GenerationEvent::StepCompleted {
                            course_id: id.clone(),
                            objective_index,
                            step,
                            attempts,
                        });
                    }
                }
            };

            loop {
                tokio::select! {
                    result = &mut run => {
                        // 最后一条进度事件与任务结束在同一次轮询内到达，
                        // 宣布终态前先清空已缓冲的进度事件
                        while let Ok(event) = pipeline_rx.try_recv() {
                            forward(event);
                        }
                        let event = match result {
                            Ok(course) => GenerationEvent::Completed {
                                course_id: id.clone(),
                                lesson_count: course.lessons.len(),
                            },
                            Err(e) => GenerationEvent::Failed {
                                course_id: id.clone(),
                                message: e.to_string(),
                            },
                        };
                        let _ = event_tx.send(event);
                        break;
                    }
                    event = pipeline_rx.recv() => {
                        if let Ok(event) = event {
                            forward(event);
                        }
                    }
                }
            }
        });

        running.insert(course_id.to_string(), handle);
        Ok(())
    }

    /// 等待指定课程的在途任务结束（测试与演示用）
    pub async fn wait(&self, course_id: &str) {
        let handle = self.running.lock().await.remove(course_id);
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
