use std::io::Cursor;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// ImportSource はインポート行を先頭から順に返す、再開可能な行ソース。
pub trait ImportSource: Send {
    /// ヘッダー行の列名。
    fn columns(&self) -> &[String];

    /// 読み取り位置を先頭のデータ行に戻す。
    fn init(&mut self) -> anyhow::Result<()>;

    /// 次のデータ行を返す。終端では None。
    fn next_row(&mut self) -> anyhow::Result<Option<Vec<String>>>;

    /// 読み取りを終了し、保持しているリソースを解放する。
    fn close(&mut self);
}

/// Delimiter は CSV の区切り文字の選択肢。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
    Colon,
    /// 設定ファイルの既定区切り文字
    #[default]
    Cfg,
}

impl Delimiter {
    pub fn from_str_value(s: &str) -> anyhow::Result<Self> {
        match s {
            "comma" => Ok(Self::Comma),
            "semicolon" => Ok(Self::Semicolon),
            "tab" => Ok(Self::Tab),
            "colon" => Ok(Self::Colon),
            "cfg" => Ok(Self::Cfg),
            _ => anyhow::bail!("invalid delimiter: {}", s),
        }
    }

    /// 区切り文字のバイト値を返す。Cfg は設定の既定値に解決する。
    pub fn as_byte(self, configured: u8) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Semicolon => b';',
            Self::Tab => b'\t',
            Self::Colon => b':',
            Self::Cfg => configured,
        }
    }
}

/// CsvEncoding はアップロード CSV の文字コードの選択肢。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CsvEncoding {
    #[default]
    #[serde(rename = "UTF-8")]
    Utf8,
    #[serde(rename = "UTF-16LE")]
    Utf16Le,
    #[serde(rename = "UTF-16BE")]
    Utf16Be,
    #[serde(rename = "ISO-8859-1")]
    Iso8859_1,
    #[serde(rename = "windows-1252")]
    Windows1252,
    #[serde(rename = "Shift_JIS")]
    ShiftJis,
    #[serde(rename = "EUC-JP")]
    EucJp,
}

impl CsvEncoding {
    pub fn from_str_value(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Ok(Self::Utf8),
            "UTF-16LE" => Ok(Self::Utf16Le),
            "UTF-16BE" => Ok(Self::Utf16Be),
            "ISO-8859-1" | "LATIN1" => Ok(Self::Iso8859_1),
            "WINDOWS-1252" | "CP1252" => Ok(Self::Windows1252),
            "SHIFT_JIS" | "SJIS" => Ok(Self::ShiftJis),
            "EUC-JP" => Ok(Self::EucJp),
            _ => anyhow::bail!("unsupported encoding: {}", s),
        }
    }

    // ISO-8859-1 は WHATWG Encoding Standard に従い windows-1252 として扱う
    fn codec(self) -> &'static encoding_rs::Encoding {
        match self {
            Self::Utf8 => encoding_rs::UTF_8,
            Self::Utf16Le => encoding_rs::UTF_16LE,
            Self::Utf16Be => encoding_rs::UTF_16BE,
            Self::Iso8859_1 | Self::Windows1252 => encoding_rs::WINDOWS_1252,
            Self::ShiftJis => encoding_rs::SHIFT_JIS,
            Self::EucJp => encoding_rs::EUC_JP,
        }
    }

    /// バイト列を UTF-8 文字列に変換する。BOM は取り除く。
    pub fn decode(self, content: &[u8]) -> Result<String, CsvReadError> {
        let (text, _, had_errors) = self.codec().decode(content);
        if had_errors {
            return Err(CsvReadError::Decode(self));
        }
        Ok(text.into_owned())
    }
}

impl std::fmt::Display for CsvEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Iso8859_1 => "ISO-8859-1",
            Self::Windows1252 => "windows-1252",
            Self::ShiftJis => "Shift_JIS",
            Self::EucJp => "EUC-JP",
        };
        write!(f, "{label}")
    }
}

/// ImportLimits はアップロード1件あたりの上限。行処理の開始前に検査する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_file_size_bytes: usize,
    pub max_rows: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 50 * 1024 * 1024,
            max_rows: 100_000,
        }
    }
}

/// CsvReadOptions は CSV の読み取り設定。
#[derive(Debug, Clone, Copy)]
pub struct CsvReadOptions {
    pub delimiter: u8,
    pub encoding: CsvEncoding,
    pub limits: ImportLimits,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: CsvEncoding::Utf8,
            limits: ImportLimits::default(),
        }
    }
}

/// CsvReadError は CSV 読み込み時のエラー。
#[derive(Debug, thiserror::Error)]
pub enum CsvReadError {
    #[error("file is empty")]
    Empty,
    #[error("file size {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },
    #[error("file has more than {limit} data rows")]
    TooManyRows { limit: usize },
    #[error("file is not valid {0}")]
    Decode(CsvEncoding),
    #[error("malformed csv at line {line}: {message}")]
    Parse { line: u64, message: String },
}

/// CsvImportReader はアップロードされた CSV を保持し、データ行を順に返す。
pub struct CsvImportReader {
    content: Arc<[u8]>,
    delimiter: u8,
    columns: Vec<String>,
    row_count: usize,
    reader: Option<csv::Reader<Cursor<Arc<[u8]>>>>,
}

impl std::fmt::Debug for CsvImportReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvImportReader")
            .field("columns", &self.columns)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl CsvImportReader {
    /// CSV を読み込み、ヘッダーと全行の形式を検査する。
    pub fn load(content: &[u8], options: &CsvReadOptions) -> Result<Self, CsvReadError> {
        let limit = options.limits.max_file_size_bytes;
        if content.len() > limit {
            return Err(CsvReadError::FileTooLarge {
                size: content.len(),
                limit,
            });
        }

        let text = options.encoding.decode(content)?;
        if text.trim().is_empty() {
            return Err(CsvReadError::Empty);
        }
        let content: Arc<[u8]> = Arc::from(text.into_bytes());

        let mut reader = build_reader(content.clone(), options.delimiter);
        let columns: Vec<String> = reader
            .headers()
            .map_err(parse_error)?
            .iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();

        let mut row_count = 0usize;
        for record in reader.records() {
            record.map_err(parse_error)?;
            row_count += 1;
            if row_count > options.limits.max_rows {
                return Err(CsvReadError::TooManyRows {
                    limit: options.limits.max_rows,
                });
            }
        }

        tracing::debug!(
            columns = columns.len(),
            rows = row_count,
            encoding = %options.encoding,
            "csv content loaded"
        );

        Ok(Self {
            content,
            delimiter: options.delimiter,
            columns,
            row_count,
            reader: None,
        })
    }

    /// データ行の件数（ヘッダー行を除く）。
    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

fn build_reader(content: Arc<[u8]>, delimiter: u8) -> csv::Reader<Cursor<Arc<[u8]>>> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(content))
}

fn parse_error(e: csv::Error) -> CsvReadError {
    let line = e.position().map_or(0, csv::Position::line);
    CsvReadError::Parse {
        line,
        message: e.to_string(),
    }
}

impl ImportSource for CsvImportReader {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn init(&mut self) -> anyhow::Result<()> {
        let mut reader = build_reader(self.content.clone(), self.delimiter);
        // ヘッダー行を読み飛ばす
        reader.headers()?;
        self.reader = Some(reader);
        Ok(())
    }

    fn next_row(&mut self) -> anyhow::Result<Option<Vec<String>>> {
        if self.reader.is_none() {
            self.init()?;
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        let mut record = csv::StringRecord::new();
        if reader.read_record(&mut record)? {
            Ok(Some(record.iter().map(ToString::to_string).collect()))
        } else {
            Ok(None)
        }
    }

    fn close(&mut self) {
        self.reader = None;
    }
}
