use serde::{Deserialize, Serialize};

/// RevertEntry は変更を取り消すための (userId, courseId, 変更前タイムスタンプ)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertEntry {
    pub user_id: String,
    pub course_id: String,
    pub prior_timestamp: String,
}

impl RevertEntry {
    pub fn new(user_id: &str, course_id: &str, prior_timestamp: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            prior_timestamp: prior_timestamp.to_string(),
        }
    }

    /// CSV の1行として出力する。クォートやエスケープは行わない。
    pub fn to_csv_line(&self) -> String {
        [
            self.user_id.as_str(),
            self.course_id.as_str(),
            self.prior_timestamp.as_str(),
        ]
        .join(",")
    }
}

/// RevertLog は1回のインポート実行で変更した行の取り消しデータを蓄積する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertLog {
    entries: Vec<RevertEntry>,
}

impl RevertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RevertEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RevertEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 各行を改行で終端した CSV 文字列に変換する。ヘッダー行は含めない。
    pub fn to_csv_string(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{}\n", entry.to_csv_line()))
            .collect()
    }
}
