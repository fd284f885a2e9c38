use crate::commands::{apply_to_files, Change, CmdMessage, CmdResult, Context, FileStatus};
use crate::error::{DocManagerError, Result};
use crate::model::PropertyPath;
use std::path::PathBuf;

/// Deletes properties, each optionally only when its value equals the condition.
pub fn run(
    ctx: &Context,
    files: &[PathBuf],
    conditions: &[(PropertyPath, Option<String>)],
) -> Result<CmdResult> {
    if conditions.is_empty() {
        return Err(DocManagerError::MissingArgument(
            "no properties to delete, use -p PROPERTY[=VALUE]".to_string(),
        ));
    }

    let mut deleted = 0usize;
    let mut failed = 0usize;
    let mut result = apply_to_files(ctx, files, |doc| {
        let mut missed = Vec::new();
        for (path, condition) in conditions {
            if doc.delete(path, condition.as_deref())? {
                deleted += 1;
            } else {
                failed += 1;
                missed.push(match condition {
                    Some(cond) => format!("{}={}", path, cond),
                    None => path.to_string(),
                });
            }
        }
        if missed.is_empty() {
            Ok(Change::Done(None))
        } else {
            Ok(Change::Partial(format!(
                "Couldn't delete these properties: {}",
                missed.join(", ")
            )))
        }
    })?;

    let invalid = result
        .reports
        .iter()
        .filter(|r| r.status == FileStatus::Failed)
        .count();
    result.add_message(CmdMessage::info(format!(
        "Deleted successfully {} propert{}, {} propert{} couldn't be deleted, and {} {} invalid.",
        deleted,
        if deleted == 1 { "y" } else { "ies" },
        failed,
        if failed == 1 { "y" } else { "ies" },
        invalid,
        if invalid == 1 { "file was" } else { "files were" },
    )));
    Ok(result)
}
