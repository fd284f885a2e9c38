use crate::analyzer::{self, AnalyzedRow, Analyzer, Filter, FILENAME_SORT_KEY};
use crate::commands::{read_files, CmdMessage, CmdResult, Context};
use crate::error::{DocManagerError, Result};
use crate::model::PropertyPath;
use std::path::PathBuf;

const CONSTANTS: &[&str] = &["{os.file}", "{os.mtime}"];

#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub queryformat: String,
    pub filters: Vec<Filter>,
    pub sort: Option<String>,
    pub default_output: Option<String>,
    /// Leave out the trailing summary.
    pub quiet: bool,
}

/// Renders one line per document from the query format.
pub fn run(ctx: &Context, files: &[PathBuf], options: &AnalyzeOptions) -> Result<CmdResult> {
    check_query(options)?;

    let mut rows: Vec<AnalyzedRow> = Vec::new();
    let mut result = read_files(ctx, files, |file, doc, result| {
        let mut analyzer = Analyzer::new(doc);
        let template = analyzer.replace_constants(&options.queryformat);
        analyzer.extract_fields(&template);
        let data = analyzer.fetch_data(
            &options.filters,
            options.sort.as_deref(),
            options.default_output.as_deref(),
        )?;

        // Documents rejected by a filter produce no line.
        let Some(data) = data else {
            return Ok(());
        };
        match options.sort {
            Some(_) => rows.push(AnalyzedRow {
                file: file.display().to_string(),
                template,
                data,
            }),
            None => result.lines.push(analyzer::format_output(&template, &data)),
        }
        Ok(())
    })?;

    if let Some(key) = &options.sort {
        analyzer::sort_rows(&mut rows, key);
        result.lines.extend(rows.iter().map(AnalyzedRow::render));
    }

    if !options.quiet {
        result.add_message(CmdMessage::success(format!(
            "Successfully analyzed {} XML files.",
            result.valid_count()
        )));
        let errors = result.invalid_count();
        if errors > 0 {
            result.add_message(CmdMessage::error(format!(
                "Got {} errors in the analyzed files:",
                errors
            )));
        }
    }
    Ok(result)
}

/// Rejects field names and sort keys that can never match, before any file is read.
fn check_query(options: &AnalyzeOptions) -> Result<()> {
    if options.queryformat.is_empty() {
        return Err(DocManagerError::MissingArgument(
            "a query format is required, use -qf or set the queryformat config key".to_string(),
        ));
    }
    let bare = CONSTANTS
        .iter()
        .fold(options.queryformat.clone(), |qf, c| qf.replace(c, ""));
    let fields = analyzer::extract_fields(&bare);
    for field in &fields {
        field
            .parse::<PropertyPath>()
            .map_err(|_| DocManagerError::InvalidQueryProperty(field.clone()))?;
    }
    if let Some(key) = &options.sort {
        analyzer::check_sort_key(key, &fields)?;
        if key != FILENAME_SORT_KEY {
            key.parse::<PropertyPath>()
                .map_err(|_| DocManagerError::InvalidQueryProperty(key.clone()))?;
        }
    }
    Ok(())
}
