use std::sync::Arc;

use crate::domain::entity::completion::CompletionPair;
use crate::domain::entity::course::{Course, CourseLookupField};
use crate::domain::entity::import_row::ImportRow;
use crate::domain::entity::revert_log::RevertEntry;
use crate::domain::entity::row_outcome::RowOutcome;
use crate::domain::entity::user::{User, UserLookupField};
use crate::domain::repository::{CompletionRepository, CourseRepository, UserRepository};

/// UpdateCompletionDateUseCase は検証済みの1行を適用し、修了日時を書き換える。
pub struct UpdateCompletionDateUseCase {
    course_repo: Arc<dyn CourseRepository>,
    user_repo: Arc<dyn UserRepository>,
    completion_repo: Arc<dyn CompletionRepository>,
    course_field: CourseLookupField,
    user_field: UserLookupField,
}

impl UpdateCompletionDateUseCase {
    pub fn new(
        course_repo: Arc<dyn CourseRepository>,
        user_repo: Arc<dyn UserRepository>,
        completion_repo: Arc<dyn CompletionRepository>,
    ) -> Self {
        Self {
            course_repo,
            user_repo,
            completion_repo,
            course_field: CourseLookupField::default(),
            user_field: UserLookupField::default(),
        }
    }

    /// 照合に使う列を変更する。
    pub fn with_lookup_fields(
        mut self,
        course_field: CourseLookupField,
        user_field: UserLookupField,
    ) -> Self {
        self.course_field = course_field;
        self.user_field = user_field;
        self
    }

    /// コースを一意に特定する。0件または複数件一致の場合は None。
    pub async fn find_course_by_id(&self, course_id: &str) -> anyhow::Result<Option<Course>> {
        let courses = self
            .course_repo
            .find_by_field(self.course_field, course_id)
            .await?;
        Ok(exactly_one(courses))
    }

    /// ユーザーを一意に特定する。0件または複数件一致の場合は None。
    pub async fn find_user_by_id(&self, user_id: &str) -> anyhow::Result<Option<User>> {
        let users = self.user_repo.find_by_field(self.user_field, user_id).await?;
        Ok(exactly_one(users))
    }

    pub async fn fetch_completion_pair(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> anyhow::Result<CompletionPair> {
        let primary = self
            .completion_repo
            .find_course_completion(user_id, course_id)
            .await?;
        let criterion = self
            .completion_repo
            .find_criteria_completion(user_id, course_id)
            .await?;
        Ok(CompletionPair { primary, criterion })
    }

    /// 1行を適用する。照合失敗や修了記録なしは RowOutcome で返し、
    /// リポジトリの失敗のみエラーとして伝播する。
    pub async fn apply(&self, row: &ImportRow) -> anyhow::Result<RowOutcome> {
        let Some(course) = self.find_course_by_id(&row.course_id).await? else {
            return Ok(RowOutcome::course_not_found(&row.course_id));
        };
        let Some(user) = self.find_user_by_id(&row.user_id).await? else {
            return Ok(RowOutcome::user_not_found(course, &row.user_id));
        };

        if !self
            .completion_repo
            .is_course_complete(user.id, course.id)
            .await?
        {
            return Ok(RowOutcome::no_completion(
                course,
                user,
                &row.user_id,
                &row.course_id,
            ));
        }

        let new_timestamp = row.timestamp_seconds()?;
        let mut pair = self.fetch_completion_pair(user.id, course.id).await?;
        let Some(previous) = pair.overwrite_time_completed(new_timestamp) else {
            // 判定後に主レコードが削除された
            tracing::warn!(
                user_id = user.id,
                course_id = course.id,
                "completion disappeared before update"
            );
            return Ok(RowOutcome::no_completion(
                course,
                user,
                &row.user_id,
                &row.course_id,
            ));
        };

        self.completion_repo.update_completion_pair(&pair).await?;

        let prior = previous.map(|t| t.to_string()).unwrap_or_default();
        let revert = RevertEntry::new(&row.user_id, &row.course_id, &prior);
        Ok(RowOutcome::modified(course, user, revert, &row.timestamp))
    }
}

fn exactly_one<T>(mut items: Vec<T>) -> Option<T> {
    if items.len() == 1 {
        items.pop()
    } else {
        None
    }
}
