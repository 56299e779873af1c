use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entity::completion::{CompletionPair, CourseCompletion, CriteriaCompletion};
use crate::domain::entity::course::{Course, CourseLookupField};
use crate::domain::entity::user::{User, UserLookupField};
use crate::domain::repository::{CompletionRepository, CourseRepository, UserRepository};

/// CompletionPostgresRepository はPostgreSQL実装のコース・ユーザー・修了レコードリポジトリ。
pub struct CompletionPostgresRepository {
    pool: PgPool,
}

impl CompletionPostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for CompletionPostgresRepository {
    async fn find_by_field(
        &self,
        field: CourseLookupField,
        value: &str,
    ) -> anyhow::Result<Vec<Course>> {
        let query = match field {
            CourseLookupField::Id => {
                let Ok(id) = value.parse::<i64>() else {
                    return Ok(vec![]);
                };
                sqlx::query_as::<_, CourseRow>(
                    "SELECT id, idnumber, shortname, fullname FROM completion.courses WHERE id = $1",
                )
                .bind(id)
            }
            CourseLookupField::IdNumber => sqlx::query_as::<_, CourseRow>(
                "SELECT id, idnumber, shortname, fullname FROM completion.courses WHERE idnumber = $1",
            )
            .bind(value.to_string()),
            CourseLookupField::ShortName => sqlx::query_as::<_, CourseRow>(
                "SELECT id, idnumber, shortname, fullname FROM completion.courses WHERE shortname = $1",
            )
            .bind(value.to_string()),
        };

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl UserRepository for CompletionPostgresRepository {
    async fn find_by_field(
        &self,
        field: UserLookupField,
        value: &str,
    ) -> anyhow::Result<Vec<User>> {
        let query = match field {
            UserLookupField::Id => {
                let Ok(id) = value.parse::<i64>() else {
                    return Ok(vec![]);
                };
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, idnumber, username FROM completion.users WHERE id = $1",
                )
                .bind(id)
            }
            UserLookupField::IdNumber => sqlx::query_as::<_, UserRow>(
                "SELECT id, idnumber, username FROM completion.users WHERE idnumber = $1",
            )
            .bind(value.to_string()),
            UserLookupField::Username => sqlx::query_as::<_, UserRow>(
                "SELECT id, idnumber, username FROM completion.users WHERE username = $1",
            )
            .bind(value.to_string()),
        };

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CompletionRepository for CompletionPostgresRepository {
    async fn is_course_complete(&self, user_id: i64, course_id: i64) -> anyhow::Result<bool> {
        let complete: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM completion.course_completions
                WHERE user_id = $1 AND course_id = $2 AND time_completed IS NOT NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(complete)
    }

    async fn find_course_completion(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> anyhow::Result<Option<CourseCompletion>> {
        let row = sqlx::query_as::<_, CourseCompletionRow>(
            r#"
            SELECT id, user_id, course_id, time_completed
            FROM completion.course_completions
            WHERE user_id = $1 AND course_id = $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_criteria_completion(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> anyhow::Result<Option<CriteriaCompletion>> {
        let row = sqlx::query_as::<_, CriteriaCompletionRow>(
            r#"
            SELECT id, user_id, course_id, criteria_id, time_completed
            FROM completion.course_completion_crit_compl
            WHERE user_id = $1 AND course_id = $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn update_completion_pair(&self, pair: &CompletionPair) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(primary) = &pair.primary {
            sqlx::query(
                r#"
                UPDATE completion.course_completions
                SET time_completed = $2
                WHERE id = $1
                "#,
            )
            .bind(primary.id)
            .bind(primary.time_completed)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(criterion) = &pair.criterion {
            sqlx::query(
                r#"
                UPDATE completion.course_completion_crit_compl
                SET time_completed = $2
                WHERE id = $1
                "#,
            )
            .bind(criterion.id)
            .bind(criterion.time_completed)
            .execute(&mut *tx)
            .await?;
        }

        // 途中で失敗した場合は tx のドロップでロールバックされる
        tx.commit().await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: i64,
    idnumber: String,
    shortname: String,
    fullname: String,
}

impl From<CourseRow> for Course {
    fn from(r: CourseRow) -> Self {
        Course {
            id: r.id,
            idnumber: r.idnumber,
            shortname: r.shortname,
            fullname: r.fullname,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    idnumber: String,
    username: String,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            idnumber: r.idnumber,
            username: r.username,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CourseCompletionRow {
    id: i64,
    user_id: i64,
    course_id: i64,
    time_completed: Option<i64>,
}

impl From<CourseCompletionRow> for CourseCompletion {
    fn from(r: CourseCompletionRow) -> Self {
        CourseCompletion {
            id: r.id,
            user_id: r.user_id,
            course_id: r.course_id,
            time_completed: r.time_completed,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CriteriaCompletionRow {
    id: i64,
    user_id: i64,
    course_id: i64,
    criteria_id: i64,
    time_completed: Option<i64>,
}

impl From<CriteriaCompletionRow> for CriteriaCompletion {
    fn from(r: CriteriaCompletionRow) -> Self {
        CriteriaCompletion {
            id: r.id,
            user_id: r.user_id,
            course_id: r.course_id,
            criteria_id: r.criteria_id,
            time_completed: r.time_completed,
        }
    }
}
