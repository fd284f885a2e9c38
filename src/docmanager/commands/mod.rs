use crate::batch::{self, Batch, LoadOutcome};
use crate::config::DocManagerConfig;
use crate::document::Document;
use crate::error::{DocManagerError, Result, ReturnCode};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub mod analyze;
pub mod attributes;
pub mod config;
pub mod delete;
pub mod get;
pub mod helpers;
pub mod init;
pub mod set;

/// Per-invocation settings handed to every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: DocManagerConfig,
    /// Where `config` was read from and where `config` changes are saved.
    pub config_path: Option<PathBuf>,
}

impl Context {
    pub fn new(config: DocManagerConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub(crate) fn load(&self, files: &[PathBuf]) -> Result<Batch> {
        batch::load_all(files, self.config.jobs, self.config.stop_on_error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    /// Processed, but part of the request could not be applied.
    Notice,
    Failed,
    Skipped,
}

/// Outcome of one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip)]
    pub code: ReturnCode,
}

impl FileReport {
    pub fn ok(file: impl Into<PathBuf>, detail: Option<String>) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Ok,
            detail,
            code: ReturnCode::Ok,
        }
    }

    pub fn notice(file: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Notice,
            detail: Some(detail.into()),
            code: ReturnCode::Ok,
        }
    }

    pub fn failed(file: impl Into<PathBuf>, err: &DocManagerError) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Failed,
            detail: Some(err.to_string()),
            code: err.return_code(),
        }
    }

    pub fn skipped(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Skipped,
            detail: Some("skipped after an earlier error".to_string()),
            code: ReturnCode::Ok,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.status, FileStatus::Ok | FileStatus::Notice)
    }
}

/// A property value read from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyValue {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileProperties {
    pub file: PathBuf,
    pub properties: Vec<PropertyValue>,
}

/// Attributes of one property in one file.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyAttributes {
    pub file: PathBuf,
    pub property: String,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub reports: Vec<FileReport>,
    pub properties: Vec<FileProperties>,
    pub attributes: Vec<PropertyAttributes>,
    /// Rendered `analyze` lines in output order.
    pub lines: Vec<String>,
    pub config: Option<DocManagerConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_config(mut self, config: DocManagerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn valid_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.reports.len() - self.valid_count()
    }

    /// Exit classification: the code of the first failed file, if any.
    pub fn return_code(&self) -> ReturnCode {
        self.reports
            .iter()
            .find(|r| r.status == FileStatus::Failed)
            .map(|r| r.code)
            .unwrap_or(ReturnCode::Ok)
    }

    pub(crate) fn add_write_summary(&mut self) {
        let valid = self.valid_count();
        let invalid = self.invalid_count();
        let mut parts = Vec::new();
        if valid > 0 {
            parts.push(format!("Wrote {} valid XML file{}.", valid, plural(valid)));
        }
        if invalid > 0 {
            parts.push(format!(
                "Skipped {} XML file{} due to errors.",
                invalid,
                plural(invalid)
            ));
        }
        if !parts.is_empty() {
            self.add_message(CmdMessage::info(parts.join(" ")));
        }
    }
}

pub(crate) fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Loads `files` and hands every valid document to `read`, in input order.
///
/// Failures of `read` are reported per file. Under stop-on-error a load
/// failure means no document is read at all.
pub(crate) fn read_files<F>(ctx: &Context, files: &[PathBuf], mut read: F) -> Result<CmdResult>
where
    F: FnMut(&Path, &Document, &mut CmdResult) -> Result<()>,
{
    let batch = ctx.load(files)?;
    let mut result = CmdResult::default();
    let proceed = !(ctx.config.stop_on_error && batch.first_error().is_some());

    for loaded in &batch.files {
        match &loaded.outcome {
            LoadOutcome::Loaded(doc) if proceed => match read(&loaded.file, doc, &mut result) {
                Ok(()) => result.reports.push(FileReport::ok(&loaded.file, None)),
                Err(err) => result.reports.push(FileReport::failed(&loaded.file, &err)),
            },
            LoadOutcome::Failed(err) => result.reports.push(FileReport::failed(&loaded.file, err)),
            _ => result.reports.push(FileReport::skipped(&loaded.file)),
        }
    }
    Ok(result)
}

/// What a mutating command did to one document.
pub(crate) enum Change {
    Done(Option<String>),
    /// Applied, with a note about the parts that were not.
    Partial(String),
}

/// Loads `files` and runs `change` on each valid document, writing it back
/// when modified.
///
/// A file whose change fails is reported and left untouched on disk. Under
/// stop-on-error a load failure prevents every change, and a change failure
/// skips the files after it.
pub(crate) fn apply_to_files<F>(ctx: &Context, files: &[PathBuf], mut change: F) -> Result<CmdResult>
where
    F: FnMut(&mut Document) -> Result<Change>,
{
    let stop_on_error = ctx.config.stop_on_error;
    let mut batch = ctx.load(files)?;
    let mut result = CmdResult::default();
    let mut proceed = !(stop_on_error && batch.first_error().is_some());

    for loaded in batch.iter_mut() {
        let file = loaded.file.clone();
        let doc = match &mut loaded.outcome {
            LoadOutcome::Loaded(doc) => doc,
            LoadOutcome::Failed(err) => {
                result.reports.push(FileReport::failed(&file, err));
                continue;
            }
            LoadOutcome::Skipped => {
                result.reports.push(FileReport::skipped(&file));
                continue;
            }
        };
        if !proceed {
            result.reports.push(FileReport::skipped(&file));
            continue;
        }

        match change(doc).and_then(|outcome| write_if_modified(doc, &file).map(|_| outcome)) {
            Ok(Change::Done(detail)) => result.reports.push(FileReport::ok(&file, detail)),
            Ok(Change::Partial(detail)) => result.reports.push(FileReport::notice(&file, detail)),
            Err(err) => {
                warn!(file = %file.display(), error = %err, "change rejected");
                result.reports.push(FileReport::failed(&file, &err));
                if stop_on_error {
                    proceed = false;
                }
            }
        }
    }
    Ok(result)
}

fn write_if_modified(doc: &mut Document, file: &Path) -> Result<()> {
    if doc.is_modified() {
        doc.write()
    } else {
        debug!(file = %file.display(), "unchanged, not writing");
        Ok(())
    }
}
