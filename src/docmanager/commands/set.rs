use crate::commands::{apply_to_files, Change, CmdResult, Context};
use crate::error::{DocManagerError, Result};
use crate::model::PropertyPath;
use std::path::PathBuf;
use tracing::debug;

/// Sets every pair on every file and writes each valid file once.
pub fn run(ctx: &Context, files: &[PathBuf], pairs: &[(PropertyPath, String)]) -> Result<CmdResult> {
    if pairs.is_empty() {
        return Err(DocManagerError::MissingArgument(
            "no properties to set, use -p PROPERTY=VALUE".to_string(),
        ));
    }

    let mut result = apply_to_files(ctx, files, |doc| {
        for (path, value) in pairs {
            debug!(property = %path, value = %value, "setting property");
        }
        doc.set_many(pairs)?;
        Ok(Change::Done(None))
    })?;
    result.add_write_summary();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::parse_assignments;
    use crate::commands::testing::*;
    use crate::commands::FileStatus;
    use crate::document::Document;
    use crate::error::ReturnCode;

    fn pairs(items: &[&str]) -> Vec<(PropertyPath, String)> {
        let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        parse_assignments(&items, None).unwrap()
    }

    #[test]
    fn sets_properties_and_keeps_the_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.xml", ARTICLE);

        let result = run(
            &context(),
            &[file.clone()],
            &pairs(&["maintainer=tux", "status=edited"]),
        )
        .unwrap();
        assert_eq!(result.valid_count(), 1);
        assert_eq!(result.messages[0].content, "Wrote 1 valid XML file.");

        let text = std::fs::read_to_string(&file).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE article ["));
        assert!(text.contains("<title>About &product;</title>"));

        let doc = Document::load(&file).unwrap();
        assert_eq!(doc.get(&"maintainer".parse().unwrap()).as_deref(), Some("tux"));
        assert_eq!(doc.get(&"status".parse().unwrap()).as_deref(), Some("edited"));
    }

    #[test]
    fn setting_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.xml", ARTICLE);
        let change = pairs(&["bugtracker/url=https://bugs"]);

        run(&context(), &[file.clone()], &change).unwrap();
        let once = std::fs::read_to_string(&file).unwrap();
        run(&context(), &[file.clone()], &change).unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), once);
    }

    #[test]
    fn invalid_files_are_reported_and_others_written() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(dir.path(), "good.xml", ARTICLE);
        let missing = dir.path().join("missing.xml");

        let result = run(
            &context(),
            &[missing, good.clone()],
            &pairs(&["priority=3"]),
        )
        .unwrap();
        assert_eq!(result.reports[0].status, FileStatus::Failed);
        assert_eq!(result.reports[1].status, FileStatus::Ok);
        assert_eq!(result.return_code(), ReturnCode::FileNotFound);
        assert!(std::fs::read_to_string(&good)
            .unwrap()
            .contains("<dm:priority>3</dm:priority>"));
    }

    #[test]
    fn requires_pairs() {
        assert!(matches!(
            run(&context(), &[], &[]),
            Err(DocManagerError::MissingArgument(_))
        ));
    }
}
