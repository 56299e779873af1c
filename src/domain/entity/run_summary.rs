use serde::{Deserialize, Serialize};

use crate::domain::entity::row_outcome::{OutcomeKind, RowOutcome};

/// RunSummary は1回のインポート実行の集計。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: u64,
    pub modified: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl RunSummary {
    /// 検証に失敗した行を集計する。
    pub fn record_invalid(&mut self) {
        self.total += 1;
        self.errors += 1;
    }

    /// 適用結果を集計する。errors は検証に失敗した行だけを数え、
    /// 照合できなかった行は skipped に含める。
    pub fn record_outcome(&mut self, outcome: &RowOutcome) {
        self.total += 1;
        match outcome.kind {
            OutcomeKind::Modified => self.modified += 1,
            OutcomeKind::Skipped | OutcomeKind::ErrorLookup => self.skipped += 1,
        }
    }

    /// トラッカーの結果表示に使う4行のメッセージ。
    pub fn messages(&self) -> [String; 4] {
        [
            format!("Completions total: {}", self.total),
            format!("Completions modified: {}", self.modified),
            format!("Completions skipped: {}", self.skipped),
            format!("Completions errors: {}", self.errors),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::course::Course;

    #[test]
    fn test_record_counts() {
        let mut summary = RunSummary::default();
        summary.record_invalid();
        summary.record_outcome(&RowOutcome::course_not_found("9"));
        summary.record_outcome(&RowOutcome::user_not_found(
            Course::new(1, "", "c", "C"),
            "3",
        ));
        assert_eq!(
            summary,
            RunSummary {
                total: 3,
                modified: 0,
                skipped: 2,
                errors: 1,
            }
        );
    }

    #[test]
    fn test_messages() {
        let summary = RunSummary {
            total: 2,
            modified: 1,
            skipped: 0,
            errors: 1,
        };
        let messages = summary.messages();
        assert_eq!(messages[0], "Completions total: 2");
        assert_eq!(messages[3], "Completions errors: 1");
    }
}
