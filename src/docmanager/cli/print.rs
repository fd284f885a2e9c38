use colored::Colorize;
use docmanager::api::{
    CmdMessage, FileProperties, FileReport, FileStatus, MessageLevel, PropertyAttributes,
};
use docmanager::error::{DocManagerError, Result};
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

const COLUMN_GAP: usize = 2;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

/// Messages on stderr, so that stdout stays machine readable.
pub(super) fn eprint_messages(messages: &[CmdMessage]) {
    for message in messages {
        eprintln!("{}", message.content);
    }
}

fn status_label(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Ok => "[ ok ]",
        FileStatus::Notice => "[ notice ]",
        FileStatus::Failed => "[ error ]",
        FileStatus::Skipped => "[ skipped ]",
    }
}

pub(super) fn render_report(report: &FileReport) -> String {
    let mut line = format!("{} {}", status_label(report.status), report.file.display());
    if let Some(detail) = &report.detail {
        line.push_str(" -> ");
        line.push_str(detail);
    }
    line
}

pub(super) fn print_reports<'a>(reports: impl IntoIterator<Item = &'a FileReport>) {
    for report in reports {
        let line = render_report(report);
        match report.status {
            FileStatus::Ok => println!("{}", line.green()),
            FileStatus::Notice => println!("{}", line.yellow()),
            FileStatus::Failed => println!("{}", line.red()),
            FileStatus::Skipped => println!("{}", line.dimmed()),
        }
    }
}

/// `FILE -> name=value ...` per file; a lone value when one file was asked for one property.
pub(super) fn render_properties(files: &[FileProperties], asked: usize) -> Vec<String> {
    if let [single] = files {
        if asked == 1 && single.properties.len() == 1 {
            return vec![single.properties[0].value.clone().unwrap_or_default()];
        }
    }
    files
        .iter()
        .map(|fp| {
            let values: Vec<String> = fp
                .properties
                .iter()
                .map(|p| format!("{}={}", p.name, p.value.as_deref().unwrap_or("")))
                .collect();
            format!("{} -> {}", fp.file.display(), values.join(" "))
        })
        .collect()
}

pub(super) fn render_attributes(attrs: &[PropertyAttributes]) -> Vec<String> {
    attrs
        .iter()
        .map(|pa| {
            let values: Vec<String> = pa
                .attributes
                .iter()
                .map(|(name, value)| format!("{}={:?}", name, value))
                .collect();
            format!(
                "{} -> {}: {}",
                pa.file.display(),
                pa.property,
                values.join(" ")
            )
        })
        .collect()
}

/// Left-aligned columns padded to their widest cell.
pub(super) fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        let last = cells.len().saturating_sub(1);
        let mut line = String::new();
        for (i, cell) in cells.into_iter().enumerate() {
            line.push_str(cell);
            if i < last {
                let pad = widths[i].saturating_sub(cell.width()) + COLUMN_GAP;
                line.push_str(&" ".repeat(pad));
            }
        }
        line.push('\n');
        line
    };

    let mut output = format_row(headers.to_vec());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&format_row(rule.iter().map(String::as_str).collect()));
    for row in rows {
        output.push_str(&format_row(row.iter().map(String::as_str).collect()));
    }
    output
}

pub(super) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(DocManagerError::from)
}
