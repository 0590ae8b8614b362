//! 持久化协作方抽象
//!
//! 核心以离散调用发出 load/save；调用方保证一次逻辑转换对应一次原子写入、
//! 同一课程同一时刻只有一个写者。当前提供内存实现，真实存储引擎在核心之外。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::CourseInstance;

/// 课程存取 trait：课时与练习作为 CourseInstance 聚合的一部分一并读写
#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn get(&self, course_id: &str) -> Option<CourseInstance>;

    async fn list(&self) -> Vec<CourseInstance>;

    /// 写入整个课程快照（单次逻辑转换 = 单次 upsert）
    async fn upsert(&self, course: CourseInstance);

    /// 整课级联删除（课时、练习随聚合一并消失）；课程存在时返回 true
    async fn delete(&self, course_id: &str) -> bool;
}

/// 内存实现：测试与演示用
#[derive(Default)]
pub struct InMemoryCourseStore {
    courses: RwLock<HashMap<String, CourseInstance>>,
}

impl InMemoryCourseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseStore for InMemoryCourseStore {
    async fn get(&self, course_id: &str) -> Option<CourseInstance> {
        self.courses.read().await.get(course_id).cloned()
    }

    async fn list(&self) -> Vec<CourseInstance> {
        self.courses.read().await.values().cloned().collect()
    }

    async fn upsert(&self, course: CourseInstance) {
        self.courses
            .write()
            .await
            .insert(course.id.clone(), course);
    }

    async fn delete(&self, course_id: &str) -> bool {
        self.courses.write().await.remove(course_id).is_some()
    }
}
