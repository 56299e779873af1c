use async_trait::async_trait;

use crate::domain::entity::course::{Course, CourseLookupField};

/// CourseRepository はコース参照のためのリポジトリトレイト。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// 指定列が値と一致するコースをすべて返す。
    async fn find_by_field(
        &self,
        field: CourseLookupField,
        value: &str,
    ) -> anyhow::Result<Vec<Course>>;
}
