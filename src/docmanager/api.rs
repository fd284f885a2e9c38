//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every docmanager operation, whatever the UI.
//!
//! It:
//! - **Dispatches** an [`Action`] to its command with one `match`
//! - **Normalizes inputs** (drops directories from the file list, rejects an empty one)
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It does not print, exit, or format anything.

use crate::commands::{self, Context};
use crate::error::{DocManagerError, Result};
use crate::model::PropertyPath;
use std::path::PathBuf;
use tracing::debug;

pub use crate::analyzer::Filter;
pub use crate::commands::analyze::AnalyzeOptions;
pub use crate::commands::config::ConfigAction;
pub use crate::commands::init::InitOptions;
pub use crate::commands::{
    CmdMessage, CmdResult, FileProperties, FileReport, FileStatus, MessageLevel,
    PropertyAttributes, PropertyValue,
};

/// A document operation, applied to every input file.
#[derive(Debug, Clone)]
pub enum Action {
    Get {
        properties: Vec<PropertyPath>,
    },
    Set {
        pairs: Vec<(PropertyPath, String)>,
    },
    Delete {
        conditions: Vec<(PropertyPath, Option<String>)>,
    },
    SetAttr {
        property: PropertyPath,
        attributes: Vec<(String, String)>,
    },
    DelAttr {
        property: PropertyPath,
        names: Vec<String>,
    },
    GetAttr {
        properties: Vec<PropertyPath>,
        names: Vec<String>,
    },
    Init(InitOptions),
    Analyze(AnalyzeOptions),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Get { .. } => "get",
            Action::Set { .. } => "set",
            Action::Delete { .. } => "del",
            Action::SetAttr { .. } => "set-attr",
            Action::DelAttr { .. } => "del-attr",
            Action::GetAttr { .. } => "get-attr",
            Action::Init(_) => "init",
            Action::Analyze(_) => "analyze",
        }
    }
}

/// The main API facade for docmanager operations.
pub struct DocManagerApi {
    ctx: Context,
}

impl DocManagerApi {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn run(&self, action: &Action, files: &[PathBuf]) -> Result<CmdResult> {
        let files = normalize_files(files)?;
        debug!(action = action.name(), files = files.len(), "dispatching");
        let ctx = &self.ctx;
        match action {
            Action::Get { properties } => commands::get::run(ctx, &files, properties),
            Action::Set { pairs } => commands::set::run(ctx, &files, pairs),
            Action::Delete { conditions } => commands::delete::run(ctx, &files, conditions),
            Action::SetAttr {
                property,
                attributes,
            } => commands::attributes::set(ctx, &files, property, attributes),
            Action::DelAttr { property, names } => {
                commands::attributes::delete(ctx, &files, property, names)
            }
            Action::GetAttr { properties, names } => {
                commands::attributes::get(ctx, &files, properties, names)
            }
            Action::Init(options) => commands::init::run(ctx, &files, options),
            Action::Analyze(options) => commands::analyze::run(ctx, &files, options),
        }
    }

    pub fn config(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.ctx, action)
    }
}

/// Drops directories and duplicate paths, keeping the first occurrence.
fn normalize_files(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut result: Vec<PathBuf> = Vec::with_capacity(files.len());
    for file in files {
        if file.is_dir() {
            debug!(dir = %file.display(), "ignoring directory");
            continue;
        }
        if !result.contains(file) {
            result.push(file.clone());
        }
    }
    if result.is_empty() {
        return Err(DocManagerError::NoFiles);
    }
    Ok(result)
}
