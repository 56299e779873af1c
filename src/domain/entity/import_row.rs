use serde::{Deserialize, Serialize};

/// ImportRow は CSV の1行から取り出した (userId, courseId, timestamp) の生テキスト。
/// 列の位置は必須ヘッダーの順序で固定される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub user_id: String,
    pub course_id: String,
    pub timestamp: String,
}

impl ImportRow {
    /// CSV レコードのフィールド列から ImportRow を組み立てる。
    /// 3列に満たない場合は None を返す。4列目以降は無視する。
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Option<Self> {
        match fields {
            [user_id, course_id, timestamp, ..] => Some(Self {
                user_id: user_id.as_ref().to_string(),
                course_id: course_id.as_ref().to_string(),
                timestamp: timestamp.as_ref().to_string(),
            }),
            _ => None,
        }
    }

    /// 検証済みの行からタイムスタンプを数値として取り出す。
    pub fn timestamp_seconds(&self) -> anyhow::Result<i64> {
        self.timestamp
            .parse::<i64>()
            .map_err(|e| anyhow::anyhow!("invalid timestamp '{}': {}", self.timestamp, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields() {
        let row = ImportRow::from_fields(&["1", "10", "1700000000", "extra"]).unwrap();
        assert_eq!(row.user_id, "1");
        assert_eq!(row.course_id, "10");
        assert_eq!(row.timestamp, "1700000000");
    }

    #[test]
    fn test_from_fields_too_short() {
        assert!(ImportRow::from_fields(&["1", "10"]).is_none());
        assert!(ImportRow::from_fields::<&str>(&[]).is_none());
    }

    #[test]
    fn test_timestamp_seconds() {
        let row = ImportRow::from_fields(&["1", "10", "1700000000"]).unwrap();
        assert_eq!(row.timestamp_seconds().unwrap(), 1_700_000_000);

        let bad = ImportRow::from_fields(&["1", "10", "abc"]).unwrap();
        assert!(bad.timestamp_seconds().is_err());
    }
}
