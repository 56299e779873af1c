use serde::{Deserialize, Serialize};

/// CourseCompletion はコース修了の主レコード（course_completions）を表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCompletion {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub time_completed: Option<i64>,
}

impl CourseCompletion {
    /// 修了日時が記録されているかを返す。
    pub fn is_complete(&self) -> bool {
        self.time_completed.is_some()
    }
}

/// CriteriaCompletion は修了条件ごとの修了レコード（course_completion_crit_compl）を表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaCompletion {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub criteria_id: i64,
    pub time_completed: Option<i64>,
}

/// CompletionPair は同一ユーザー・コースの主レコードと条件レコードの組。
/// 修了日時は両方を揃えて更新しなければならない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionPair {
    pub primary: Option<CourseCompletion>,
    pub criterion: Option<CriteriaCompletion>,
}

impl CompletionPair {
    /// 両レコードの修了日時を上書きし、更新前の主レコードの修了日時を返す。
    /// 主レコードが存在しない場合は何もせず None を返す。
    pub fn overwrite_time_completed(&mut self, time_completed: i64) -> Option<Option<i64>> {
        let primary = self.primary.as_mut()?;
        let previous = primary.time_completed.replace(time_completed);
        if let Some(criterion) = self.criterion.as_mut() {
            criterion.time_completed = Some(time_completed);
        }
        Some(previous)
    }
}
