use async_trait::async_trait;

use crate::domain::entity::completion::{CompletionPair, CourseCompletion, CriteriaCompletion};

/// CompletionRepository はコース修了レコードのリポジトリトレイト。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// ユーザーがコースを修了済み（主レコードに修了日時あり）かを返す。
    async fn is_course_complete(&self, user_id: i64, course_id: i64) -> anyhow::Result<bool>;

    /// 主レコードを取得する。
    async fn find_course_completion(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> anyhow::Result<Option<CourseCompletion>>;

    /// 修了条件レコードを取得する。
    async fn find_criteria_completion(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> anyhow::Result<Option<CriteriaCompletion>>;

    /// 主レコードと条件レコードの修了日時を原子的に更新する。
    async fn update_completion_pair(&self, pair: &CompletionPair) -> anyhow::Result<()>;
}
