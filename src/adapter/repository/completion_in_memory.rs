use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entity::completion::{CompletionPair, CourseCompletion, CriteriaCompletion};
use crate::domain::entity::course::{Course, CourseLookupField};
use crate::domain::entity::user::{User, UserLookupField};
use crate::domain::repository::{CompletionRepository, CourseRepository, UserRepository};

#[derive(Default)]
struct StoreData {
    courses: Vec<Course>,
    users: Vec<User>,
    course_completions: Vec<CourseCompletion>,
    criteria_completions: Vec<CriteriaCompletion>,
}

/// InMemoryCompletionStore はコース・ユーザー・修了レコードを保持するインメモリ実装（開発・テスト用）。
/// 1つのロックで保護するため、修了レコードの組の更新は原子的に行われる。
#[derive(Default)]
pub struct InMemoryCompletionStore {
    data: RwLock<StoreData>,
}

impl InMemoryCompletionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_course(&self, course: Course) {
        self.data.write().await.courses.push(course);
    }

    pub async fn add_user(&self, user: User) {
        self.data.write().await.users.push(user);
    }

    pub async fn add_course_completion(&self, completion: CourseCompletion) {
        self.data.write().await.course_completions.push(completion);
    }

    pub async fn add_criteria_completion(&self, completion: CriteriaCompletion) {
        self.data.write().await.criteria_completions.push(completion);
    }
}

#[async_trait]
impl CourseRepository for InMemoryCompletionStore {
    async fn find_by_field(
        &self,
        field: CourseLookupField,
        value: &str,
    ) -> anyhow::Result<Vec<Course>> {
        let data = self.data.read().await;
        Ok(data
            .courses
            .iter()
            .filter(|c| c.matches(field, value))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryCompletionStore {
    async fn find_by_field(
        &self,
        field: UserLookupField,
        value: &str,
    ) -> anyhow::Result<Vec<User>> {
        let data = self.data.read().await;
        Ok(data
            .users
            .iter()
            .filter(|u| u.matches(field, value))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CompletionRepository for InMemoryCompletionStore {
    async fn is_course_complete(&self, user_id: i64, course_id: i64) -> anyhow::Result<bool> {
        let data = self.data.read().await;
        Ok(data
            .course_completions
            .iter()
            .any(|c| c.user_id == user_id && c.course_id == course_id && c.is_complete()))
    }

    async fn find_course_completion(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> anyhow::Result<Option<CourseCompletion>> {
        let data = self.data.read().await;
        Ok(data
            .course_completions
            .iter()
            .find(|c| c.user_id == user_id && c.course_id == course_id)
            .cloned())
    }

    async fn find_criteria_completion(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> anyhow::Result<Option<CriteriaCompletion>> {
        let data = self.data.read().await;
        Ok(data
            .criteria_completions
            .iter()
            .find(|c| c.user_id == user_id && c.course_id == course_id)
            .cloned())
    }

    async fn update_completion_pair(&self, pair: &CompletionPair) -> anyhow::Result<()> {
        let mut data = self.data.write().await;

        // 書き込み前に両方の存在を確認し、片方だけが更新されることを防ぐ
        let primary_idx = match &pair.primary {
            Some(p) => Some(
                data.course_completions
                    .iter()
                    .position(|c| c.id == p.id)
                    .ok_or_else(|| anyhow::anyhow!("course completion not found: {}", p.id))?,
            ),
            None => None,
        };
        let criterion_idx = match &pair.criterion {
            Some(p) => Some(
                data.criteria_completions
                    .iter()
                    .position(|c| c.id == p.id)
                    .ok_or_else(|| anyhow::anyhow!("criteria completion not found: {}", p.id))?,
            ),
            None => None,
        };

        if let (Some(idx), Some(p)) = (primary_idx, &pair.primary) {
            data.course_completions[idx].time_completed = p.time_completed;
        }
        if let (Some(idx), Some(c)) = (criterion_idx, &pair.criterion) {
            data.criteria_completions[idx].time_completed = c.time_completed;
        }
        Ok(())
    }
}
