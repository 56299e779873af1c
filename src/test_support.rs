//! テスト用インメモリリポジトリとヘルパー。
//! 統合テスト（tests/integration_test.rs）から利用する。

use std::sync::Arc;

use crate::adapter::handler::AppState;
use crate::adapter::repository::InMemoryCompletionStore;
use crate::domain::entity::completion::{CourseCompletion, CriteriaCompletion};
use crate::domain::entity::course::Course;
use crate::domain::entity::user::User;
use crate::infrastructure::config::ImportConfig;
use crate::infrastructure::file_storage::{FileStorage, InMemoryFileStorage};
use crate::usecase::UpdateCompletionDateUseCase;

/// 修了日時 1600000000 の修了レコードを持つユーザー1・コース10を登録したストアを作成する。
pub async fn seeded_store() -> Arc<InMemoryCompletionStore> {
    let store = Arc::new(InMemoryCompletionStore::new());
    store
        .add_course(Course::new(10, "ALG-101", "algebra", "Algebra I"))
        .await;
    store
        .add_course(Course::new(11, "GEO-101", "geometry", "Geometry I"))
        .await;
    store.add_user(User::new(1, "U-0001", "alice")).await;
    store.add_user(User::new(2, "U-0002", "bob")).await;
    store
        .add_course_completion(CourseCompletion {
            id: 100,
            user_id: 1,
            course_id: 10,
            time_completed: Some(1_600_000_000),
        })
        .await;
    store
        .add_criteria_completion(CriteriaCompletion {
            id: 200,
            user_id: 1,
            course_id: 10,
            criteria_id: 5,
            time_completed: Some(1_600_000_000),
        })
        .await;
    store
}

/// テスト用 AppState を生成する。
pub fn make_test_app_state(
    store: Arc<InMemoryCompletionStore>,
    file_storage: Arc<dyn FileStorage>,
    import_config: ImportConfig,
) -> AppState {
    let update_completion_uc = Arc::new(
        UpdateCompletionDateUseCase::new(store.clone(), store.clone(), store)
            .with_lookup_fields(
                import_config.course_lookup_field,
                import_config.user_lookup_field,
            ),
    );
    AppState {
        update_completion_uc,
        file_storage,
        import_config: Arc::new(import_config),
    }
}

/// 既定設定とインメモリストレージで AppState を生成する。
pub async fn make_default_app_state() -> (AppState, Arc<InMemoryCompletionStore>) {
    let store = seeded_store().await;
    let state = make_test_app_state(
        store.clone(),
        Arc::new(InMemoryFileStorage::new()),
        ImportConfig::default(),
    );
    (state, store)
}
