use std::sync::Arc;

use serde::Serialize;

use crate::domain::entity::import_row::ImportRow;
use crate::domain::entity::revert_log::RevertLog;
use crate::domain::entity::run_summary::RunSummary;
use crate::domain::service::validate_import_record;
use crate::infrastructure::csv_reader::ImportSource;
use crate::infrastructure::progress_tracker::{ProgressTracker, RevertPublisher};
use crate::usecase::update_completion_date::UpdateCompletionDateUseCase;

/// インポート CSV に必須の列。行の値はこの順に位置で取り出す。
pub const REQUIRED_HEADERS: [&str; 3] = ["useridnumber", "courseidnumber", "timestamp"];

const INVALID_RECORD_STATUS: &str = "Invalid Import Record";

/// ProcessorState はインポート処理の状態遷移を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessorState {
    Created,
    Validated,
    Ready,
    Running,
    Finished,
}

impl std::fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Validated => write!(f, "VALIDATED"),
            Self::Ready => write!(f, "READY"),
            Self::Running => write!(f, "RUNNING"),
            Self::Finished => write!(f, "FINISHED"),
        }
    }
}

/// ImportProcessorError はインポート処理のエラーを型安全に表現する。
#[derive(Debug, thiserror::Error)]
pub enum ImportProcessorError {
    #[error("cannot read file")]
    CannotReadFile,
    #[error("column count mismatch")]
    ColumnCountMismatch,
    #[error("process already started")]
    AlreadyStarted,
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

/// RunReport は1回のインポート実行の結果。
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub revert_log: RevertLog,
    pub revert_download_url: String,
}

/// ImportProcessor は行ソースを1回だけ走査し、各行を検証・適用する。
pub struct ImportProcessor<S: ImportSource> {
    source: S,
    updater: Arc<UpdateCompletionDateUseCase>,
    publisher: RevertPublisher,
    state: ProcessorState,
    line: u64,
    revert_log: RevertLog,
}

impl<S: ImportSource> ImportProcessor<S> {
    /// ソースのヘッダーを検査し、実行可能な状態の ImportProcessor を作成する。
    /// 取り消し CSV は出力形式に関係なく publisher を通じて保存する。
    pub fn new(
        source: S,
        updater: Arc<UpdateCompletionDateUseCase>,
        publisher: RevertPublisher,
    ) -> Result<Self, ImportProcessorError> {
        let mut processor = Self {
            source,
            updater,
            publisher,
            state: ProcessorState::Created,
            line: 0,
            revert_log: RevertLog::new(),
        };
        processor.validate_headers()?;
        processor.reset()?;
        Ok(processor)
    }

    fn validate_headers(&mut self) -> Result<(), ImportProcessorError> {
        let found = self.source.columns();
        if found.is_empty() {
            return Err(ImportProcessorError::CannotReadFile);
        }
        if found.len() < REQUIRED_HEADERS.len() {
            return Err(ImportProcessorError::ColumnCountMismatch);
        }
        self.state = ProcessorState::Validated;
        Ok(())
    }

    pub fn list_required_headers() -> Vec<String> {
        REQUIRED_HEADERS.iter().map(|h| h.to_string()).collect()
    }

    pub fn list_found_headers(&self) -> &[String] {
        self.source.columns()
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// ソースを先頭に戻し、行番号と取り消しデータを初期化して再実行可能にする。
    pub fn reset(&mut self) -> Result<(), ImportProcessorError> {
        self.source.init()?;
        self.line = 0;
        self.revert_log.clear();
        self.state = ProcessorState::Ready;
        Ok(())
    }

    /// インポートを実行する。tracker が None の場合は何も出力しない。
    /// 行単位の失敗は集計して処理を続け、永続化の失敗のみ実行を中断する。
    pub async fn execute(
        &mut self,
        tracker: Option<&mut ProgressTracker>,
    ) -> Result<RunReport, ImportProcessorError> {
        if self.state != ProcessorState::Ready {
            return Err(ImportProcessorError::AlreadyStarted);
        }
        self.state = ProcessorState::Running;

        let mut silent = ProgressTracker::silent();
        let tracker = match tracker {
            Some(tracker) => tracker,
            None => &mut silent,
        };

        let result = self.run(tracker).await;
        self.source.close();
        self.state = ProcessorState::Finished;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(line = self.line, error = %e, "import run aborted");
                self.publish_partial_revert(tracker).await;
                return Err(e);
            }
        };

        tracker.finish()?;
        tracker.results(&summary)?;
        let revert_download_url = tracker
            .revert_download(&self.publisher, &self.revert_log)
            .await?;

        tracing::info!(
            total = summary.total,
            modified = summary.modified,
            skipped = summary.skipped,
            errors = summary.errors,
            "import run finished"
        );

        Ok(RunReport {
            summary,
            revert_log: self.revert_log.clone(),
            revert_download_url,
        })
    }

    /// 中断までに書き込んだ行の取り消しデータを保存する。
    /// 何も書き込んでいない場合は前回の取り消し CSV を残す。
    async fn publish_partial_revert(&self, tracker: &mut ProgressTracker) {
        if self.revert_log.is_empty() {
            return;
        }
        match tracker
            .revert_download(&self.publisher, &self.revert_log)
            .await
        {
            Ok(url) => tracing::warn!(
                entries = self.revert_log.len(),
                url = %url,
                "partial revert file stored for aborted run"
            ),
            Err(e) => tracing::error!(
                entries = self.revert_log.len(),
                error = %e,
                "failed to store revert file for aborted run"
            ),
        }
    }

    async fn run(
        &mut self,
        tracker: &mut ProgressTracker,
    ) -> Result<RunSummary, ImportProcessorError> {
        let mut summary = RunSummary::default();
        tracker.start()?;

        while let Some(fields) = self.source.next_row()? {
            self.line += 1;

            let row = if validate_import_record(&fields) {
                ImportRow::from_fields(&fields)
            } else {
                None
            };
            let Some(row) = row else {
                summary.record_invalid();
                tracing::debug!(line = self.line, "invalid import record");
                tracker.output(self.line, false, &[INVALID_RECORD_STATUS.to_string()], None)?;
                continue;
            };

            let outcome = self.updater.apply(&row).await?;
            summary.record_outcome(&outcome);
            tracing::debug!(
                line = self.line,
                outcome = %outcome.kind,
                user_id = %row.user_id,
                course_id = %row.course_id,
                "import record applied"
            );
            if let Some(entry) = outcome.revert.clone() {
                self.revert_log.push(entry);
            }
            // 検証を通過した行は照合結果にかかわらず成功として出力する
            tracker.output(
                self.line,
                true,
                &outcome.status_messages(),
                Some(&outcome),
            )?;
        }

        Ok(summary)
    }
}
