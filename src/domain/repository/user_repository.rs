use async_trait::async_trait;

use crate::domain::entity::user::{User, UserLookupField};

/// UserRepository はユーザー参照のためのリポジトリトレイト。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 指定列が値と一致するユーザーをすべて返す。
    async fn find_by_field(&self, field: UserLookupField, value: &str)
        -> anyhow::Result<Vec<User>>;
}
