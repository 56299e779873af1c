use std::io::Write;
use std::sync::Arc;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

use crate::domain::entity::revert_log::RevertLog;
use crate::domain::entity::row_outcome::RowOutcome;
use crate::domain::entity::run_summary::RunSummary;
use crate::infrastructure::file_storage::{FileRecord, FileStorage};

pub const REVERT_COMPONENT: &str = "tool_modifycompletions";
pub const REVERT_FILE_AREA: &str = "temp";
pub const REVERT_FILE_NAME: &str = "modify-completions-undo.csv";

/// 取り消し CSV の保存先。実行ごとに同じ位置へ上書きする。
pub fn revert_file_record() -> FileRecord {
    FileRecord {
        component: REVERT_COMPONENT.to_string(),
        file_area: REVERT_FILE_AREA.to_string(),
        item_id: 0,
        file_path: "/".to_string(),
        file_name: REVERT_FILE_NAME.to_string(),
    }
}

/// OutputMode はトラッカーの出力形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Silent,
    Plain,
    Html,
}

impl OutputMode {
    pub fn from_str_value(s: &str) -> anyhow::Result<Self> {
        match s {
            "silent" | "none" => Ok(Self::Silent),
            "plain" | "text" => Ok(Self::Plain),
            "html" => Ok(Self::Html),
            _ => anyhow::bail!("invalid output mode: {}", s),
        }
    }

    fn renderer(self) -> anyhow::Result<Box<dyn TrackerRenderer>> {
        Ok(match self {
            Self::Silent => Box::new(SilentRenderer),
            Self::Plain => Box::new(PlainRenderer),
            Self::Html => Box::new(HtmlRenderer::new()?),
        })
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Silent => write!(f, "silent"),
            Self::Plain => write!(f, "plain"),
            Self::Html => write!(f, "html"),
        }
    }
}

/// TrackerRenderer は出力形式ごとの描画戦略。
/// None を返した場合は何も出力しない。
trait TrackerRenderer: Send {
    fn header(&mut self) -> anyhow::Result<Option<String>>;
    fn row(
        &mut self,
        line: u64,
        succeeded: bool,
        statuses: &[String],
        outcome: Option<&RowOutcome>,
    ) -> anyhow::Result<Option<String>>;
    fn footer(&mut self) -> anyhow::Result<Option<String>>;
    fn results(&mut self, summary: &RunSummary) -> anyhow::Result<Option<String>>;
    fn download_link(&mut self, url: &str) -> anyhow::Result<Option<String>>;
}

/// 行に表示する解決済みのユーザー・コース情報。
fn resolved_columns(outcome: Option<&RowOutcome>) -> [String; 4] {
    let user = outcome.and_then(|o| o.user.as_ref());
    let course = outcome.and_then(|o| o.course.as_ref());
    [
        user.map(|u| u.id.to_string()).unwrap_or_default(),
        user.map(|u| u.username.clone()).unwrap_or_default(),
        course.map(|c| c.id.to_string()).unwrap_or_default(),
        course.map(|c| c.shortname.clone()).unwrap_or_default(),
    ]
}

struct SilentRenderer;

impl TrackerRenderer for SilentRenderer {
    fn header(&mut self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn row(
        &mut self,
        _: u64,
        _: bool,
        _: &[String],
        _: Option<&RowOutcome>,
    ) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn footer(&mut self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn results(&mut self, _: &RunSummary) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn download_link(&mut self, _: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

struct PlainRenderer;

impl TrackerRenderer for PlainRenderer {
    // status 列は次の行に出力するためヘッダーには含めない
    fn header(&mut self) -> anyhow::Result<Option<String>> {
        Ok(Some(["line", "result", "user", "id", "fullname"].join("\t")))
    }

    fn row(
        &mut self,
        line: u64,
        succeeded: bool,
        statuses: &[String],
        outcome: Option<&RowOutcome>,
    ) -> anyhow::Result<Option<String>> {
        let indicator = if succeeded { "OK" } else { "NOK" };
        let mut fields = vec![line.to_string(), indicator.to_string()];
        fields.extend(resolved_columns(outcome));
        let mut text = fields.join("\t");
        text.push('\n');
        text.push_str(&statuses.join("\t  "));
        Ok(Some(text))
    }

    fn footer(&mut self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn results(&mut self, summary: &RunSummary) -> anyhow::Result<Option<String>> {
        Ok(Some(summary.messages().join("\n")))
    }

    fn download_link(&mut self, url: &str) -> anyhow::Result<Option<String>> {
        Ok(Some(url.to_string()))
    }
}

const HEADER_TEMPLATE: &str = "progress_tracker/header.html";
const ROW_TEMPLATE: &str = "progress_tracker/row.html";
const FOOTER_TEMPLATE: &str = "progress_tracker/footer.html";
const RESULTS_TEMPLATE: &str = "progress_tracker/results.html";
const DOWNLOAD_LINK_TEMPLATE: &str = "progress_tracker/download_link.html";

const HTML_HEADINGS: [&str; 7] = [
    "Line",
    "Result",
    "User ID",
    "Username",
    "Course ID",
    "Course short name",
    "Status",
];

/// HtmlRenderer は Tera テンプレートで表形式の HTML を描画する。
/// 埋め込む値はすべて自動エスケープされる。
struct HtmlRenderer {
    tera: Tera,
    row_number: u64,
}

impl HtmlRenderer {
    fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_templates(vec![
            (
                HEADER_TEMPLATE,
                include_str!("../../templates/progress_tracker/header.html"),
            ),
            (
                ROW_TEMPLATE,
                include_str!("../../templates/progress_tracker/row.html"),
            ),
            (
                FOOTER_TEMPLATE,
                include_str!("../../templates/progress_tracker/footer.html"),
            ),
            (
                RESULTS_TEMPLATE,
                include_str!("../../templates/progress_tracker/results.html"),
            ),
            (
                DOWNLOAD_LINK_TEMPLATE,
                include_str!("../../templates/progress_tracker/download_link.html"),
            ),
        ])
        .context("failed to load progress tracker templates")?;
        Ok(Self {
            tera,
            row_number: 0,
        })
    }

    fn render(&self, template_name: &str, ctx: &Context) -> anyhow::Result<Option<String>> {
        let rendered = self
            .tera
            .render(template_name, ctx)
            .with_context(|| format!("failed to render {template_name}"))?;
        Ok(Some(rendered.trim_end_matches('\n').to_string()))
    }
}

impl TrackerRenderer for HtmlRenderer {
    fn header(&mut self) -> anyhow::Result<Option<String>> {
        let mut ctx = Context::new();
        ctx.insert("headings", &HTML_HEADINGS);
        self.render(HEADER_TEMPLATE, &ctx)
    }

    fn row(
        &mut self,
        line: u64,
        succeeded: bool,
        statuses: &[String],
        outcome: Option<&RowOutcome>,
    ) -> anyhow::Result<Option<String>> {
        self.row_number += 1;
        let mut ctx = Context::new();
        ctx.insert("parity", &(self.row_number % 2));
        ctx.insert("line", &line);
        ctx.insert("succeeded", &succeeded);
        ctx.insert("cells", &resolved_columns(outcome));
        ctx.insert("statuses", statuses);
        self.render(ROW_TEMPLATE, &ctx)
    }

    fn footer(&mut self) -> anyhow::Result<Option<String>> {
        self.render(FOOTER_TEMPLATE, &Context::new())
    }

    fn results(&mut self, summary: &RunSummary) -> anyhow::Result<Option<String>> {
        let mut ctx = Context::new();
        ctx.insert("messages", &summary.messages());
        self.render(RESULTS_TEMPLATE, &ctx)
    }

    fn download_link(&mut self, url: &str) -> anyhow::Result<Option<String>> {
        let mut ctx = Context::new();
        ctx.insert("url", url);
        self.render(DOWNLOAD_LINK_TEMPLATE, &ctx)
    }
}

/// RevertPublisher は取り消し CSV を保存し、ダウンロード URL を組み立てる。
#[derive(Clone)]
pub struct RevertPublisher {
    storage: Arc<dyn FileStorage>,
    download_endpoint: String,
}

impl std::fmt::Debug for RevertPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevertPublisher")
            .field("download_endpoint", &self.download_endpoint)
            .finish_non_exhaustive()
    }
}

impl RevertPublisher {
    pub fn new(storage: Arc<dyn FileStorage>, download_endpoint: impl Into<String>) -> Self {
        Self {
            storage,
            download_endpoint: download_endpoint.into(),
        }
    }

    pub fn download_url(&self) -> String {
        format!("{}?downloadcsv=1", self.download_endpoint)
    }

    /// 取り消し CSV を固定の保存先へ上書き保存し、ダウンロード URL を返す。
    pub async fn publish(&self, log: &RevertLog) -> anyhow::Result<String> {
        let stored = self
            .storage
            .create_file_from_string(&revert_file_record(), &log.to_csv_string())
            .await?;
        tracing::info!(
            path_name_hash = %stored.path_name_hash,
            entries = log.len(),
            size_bytes = stored.size_bytes,
            "revert file stored"
        );
        Ok(self.download_url())
    }
}

/// ProgressTracker はインポート行ごとの結果を描画・蓄積し、
/// 実行終了時に集計と取り消し CSV へのリンクを出力する。
pub struct ProgressTracker {
    mode: OutputMode,
    renderer: Box<dyn TrackerRenderer>,
    buffer: String,
    passthrough: Option<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("mode", &self.mode)
            .field("buffered_bytes", &self.buffer.len())
            .field("passthrough", &self.passthrough.is_some())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new(mode: OutputMode) -> anyhow::Result<Self> {
        Ok(Self::with_renderer(mode, mode.renderer()?))
    }

    /// 何も出力しないトラッカー。
    pub fn silent() -> Self {
        Self::with_renderer(OutputMode::Silent, Box::new(SilentRenderer))
    }

    fn with_renderer(mode: OutputMode, renderer: Box<dyn TrackerRenderer>) -> Self {
        Self {
            mode,
            renderer,
            buffer: String::new(),
            passthrough: None,
        }
    }

    /// 描画した各行を指定の Writer にも逐次書き出す。
    pub fn with_passthrough(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.passthrough = Some(writer);
        self
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    fn emit(&mut self, text: Option<String>) {
        let Some(text) = text else {
            return;
        };
        self.buffer.push_str(&text);
        self.buffer.push('\n');
        if let Some(writer) = self.passthrough.as_mut() {
            if let Err(e) = writeln!(writer, "{text}").and_then(|_| writer.flush()) {
                tracing::warn!(error = %e, "failed to write tracker passthrough output");
            }
        }
    }

    pub fn start(&mut self) -> anyhow::Result<()> {
        let text = self.renderer.header()?;
        self.emit(text);
        Ok(())
    }

    pub fn output(
        &mut self,
        line: u64,
        succeeded: bool,
        statuses: &[String],
        outcome: Option<&RowOutcome>,
    ) -> anyhow::Result<()> {
        let text = self.renderer.row(line, succeeded, statuses, outcome)?;
        self.emit(text);
        Ok(())
    }

    pub fn finish(&mut self) -> anyhow::Result<()> {
        let text = self.renderer.footer()?;
        self.emit(text);
        Ok(())
    }

    pub fn results(&mut self, summary: &RunSummary) -> anyhow::Result<()> {
        let text = self.renderer.results(summary)?;
        self.emit(text);
        Ok(())
    }

    /// 取り消し CSV を保存してダウンロードリンクを出力する。
    /// 保存は出力形式に関係なく常に行う。
    pub async fn revert_download(
        &mut self,
        publisher: &RevertPublisher,
        log: &RevertLog,
    ) -> anyhow::Result<String> {
        let url = publisher.publish(log).await?;
        let text = self.renderer.download_link(&url)?;
        self.emit(text);
        Ok(url)
    }

    /// 蓄積済みのテキスト出力を返す。Silent では常に空。
    pub fn get_buffer(&self) -> &str {
        &self.buffer
    }
}
