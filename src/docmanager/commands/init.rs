use crate::commands::{apply_to_files, Change, CmdMessage, CmdResult, Context};
use crate::error::Result;
use crate::model::PropertyPath;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Reset properties that already exist.
    pub force: bool,
    pub with_bugtracker: bool,
    /// Initial values, applied over empty properties (any property with `force`).
    pub values: Vec<(PropertyPath, String)>,
}

/// Creates the default properties in every file.
pub fn run(ctx: &Context, files: &[PathBuf], options: &InitOptions) -> Result<CmdResult> {
    let mut result = apply_to_files(ctx, files, |doc| {
        let skipped = doc.init_defaults(options.force, options.with_bugtracker)?;
        for (path, value) in &options.values {
            let empty = doc.get(path).map_or(true, |current| current.is_empty());
            if empty || options.force {
                doc.set(path, value)?;
            }
        }
        if skipped == 0 {
            Ok(Change::Done(Some("Initialized default properties".to_string())))
        } else {
            info!(skipped, "some default properties already exist");
            Ok(Change::Partial(format!(
                "{} propert{} already set and left unchanged, use --force to reset",
                skipped,
                if skipped == 1 { "y was" } else { "ies were" }
            )))
        }
    })?;

    result.add_message(CmdMessage::info(format!(
        "Initialized successfully {} files. {} files failed.",
        result.valid_count(),
        result.invalid_count()
    )));
    Ok(result)
}
