//! # Query-format engine
//!
//! Projects the properties of many documents into one line per document.
//! A template such as `{os.file}: {maintainer} ({status})` is handled in
//! three steps:
//!
//! 1. [`Analyzer::replace_constants`] substitutes the built-in tokens
//!    (`{os.file}`, `{os.mtime}`) textually.
//! 2. [`extract_fields`] scans the result for `{name}` placeholders. `{{...}}`
//!    is a literal block and a backslash makes the next character inert.
//! 3. [`Analyzer::fetch_data`] reads the referenced properties and applies
//!    the filters; [`format_output`] substitutes the values back.
//!
//! Filters are all-or-nothing: one failing filter rejects the whole document.

use crate::document::Document;
use crate::error::{DocManagerError, Result};
use crate::model::PropertyPath;
use chrono::{DateTime, Local};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Field name to rendered value.
pub type FieldData = BTreeMap<String, String>;

/// Sort key that orders by source path instead of a property.
pub const FILENAME_SORT_KEY: &str = "filename";

const MTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// The property must equal the condition.
    Include,
    /// The property must differ from the condition.
    Exclude,
}

/// A `[+|-]property=value` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub mode: FilterMode,
    pub property: PropertyPath,
    pub condition: String,
}

impl Filter {
    /// Whether a document whose property holds `value` passes this filter.
    ///
    /// An absent property never passes, whatever the mode.
    pub fn accepts(&self, value: Option<&str>) -> bool {
        match (self.mode, value) {
            (_, None) => false,
            (FilterMode::Include, Some(v)) => v == self.condition,
            (FilterMode::Exclude, Some(v)) => v != self.condition,
        }
    }
}

impl FromStr for Filter {
    type Err = DocManagerError;

    fn from_str(s: &str) -> Result<Self> {
        let (mode, rest) = match s.chars().next() {
            Some('+') => (FilterMode::Include, &s[1..]),
            Some('-') => (FilterMode::Exclude, &s[1..]),
            _ => (FilterMode::Include, s),
        };
        let (property, condition) = rest
            .split_once('=')
            .ok_or_else(|| DocManagerError::InvalidFilter(s.to_string()))?;
        let property: PropertyPath = property
            .parse()
            .map_err(|_| DocManagerError::InvalidFilter(s.to_string()))?;
        Ok(Self {
            mode,
            property,
            condition: condition.to_string(),
        })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.mode {
            FilterMode::Include => '+',
            FilterMode::Exclude => '-',
        };
        write!(f, "{}{}={}", sign, self.property, self.condition)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    Capturing,
    EscapedLiteral,
}

/// Property names referenced by `{name}` placeholders, in order of first appearance.
pub fn extract_fields(template: &str) -> Vec<String> {
    let chars: Vec<char> = template.chars().collect();
    let mut fields: Vec<String> = Vec::new();
    let mut state = ScanState::Normal;
    let mut field = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '\\' {
            // The escaped character is copied as-is and never changes state.
            if let (ScanState::Capturing, Some(escaped)) = (state, next) {
                field.push(escaped);
            }
            i += 2;
            continue;
        }

        match state {
            ScanState::Normal => {
                if c == '{' {
                    if next == Some('{') {
                        state = ScanState::EscapedLiteral;
                        i += 1;
                    } else {
                        state = ScanState::Capturing;
                    }
                }
            }
            ScanState::Capturing => {
                if c == '}' {
                    if !fields.contains(&field) {
                        fields.push(field.clone());
                    }
                    field.clear();
                    state = ScanState::Normal;
                } else {
                    field.push(c);
                }
            }
            ScanState::EscapedLiteral => {
                if c == '}' && next == Some('}') {
                    state = ScanState::Normal;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    trace!(?fields, "extracted query fields");
    fields
}

/// Replaces every `{key}` in `template` with its value.
///
/// Values are not scanned again, so a value containing `{other}` stays as is.
pub fn format_output(template: &str, data: &FieldData) -> String {
    data.iter().fold(template.to_string(), |out, (key, value)| {
        out.replace(&format!("{{{}}}", key), value)
    })
}

/// Orders two property values, comparing all-digit values as integers.
///
/// Numbers sort before any non-numeric value.
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.len().cmp(&y.len()).then_with(|| x.cmp(y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Digits of `value` without leading zeros, if it is a non-empty digit string.
fn as_number(value: &str) -> Option<&str> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = value.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0" } else { trimmed })
}

/// One analyzed document waiting to be printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedRow {
    pub file: String,
    pub template: String,
    pub data: FieldData,
}

impl AnalyzedRow {
    pub fn render(&self) -> String {
        format_output(&self.template, &self.data)
    }
}

/// Checks that `key` can be used to sort rows built from `fields`.
pub fn check_sort_key(key: &str, fields: &[String]) -> Result<()> {
    if key == FILENAME_SORT_KEY || fields.iter().any(|f| f == key) {
        Ok(())
    } else {
        Err(DocManagerError::InvalidSortKey(key.to_string()))
    }
}

/// Stable sort of `rows` by `key`, which must have passed [`check_sort_key`].
pub fn sort_rows(rows: &mut [AnalyzedRow], key: &str) {
    if key == FILENAME_SORT_KEY {
        rows.sort_by(|a, b| a.file.cmp(&b.file));
        return;
    }
    rows.sort_by(|a, b| {
        let left = a.data.get(key).map(String::as_str).unwrap_or("");
        let right = b.data.get(key).map(String::as_str).unwrap_or("");
        compare_values(left, right)
    });
}

/// Read-only view of one document for query-format rendering.
pub struct Analyzer<'a> {
    doc: &'a Document,
    fields: Vec<String>,
}

impl<'a> Analyzer<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            fields: Vec::new(),
        }
    }

    /// Substitutes `{os.file}` and `{os.mtime}`.
    ///
    /// Both are empty for documents that were not read from a file.
    pub fn replace_constants(&self, template: &str) -> String {
        let file = self
            .doc
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let mtime = self
            .doc
            .path()
            .and_then(|p| std::fs::metadata(p).ok())
            .and_then(|m| m.modified().ok())
            .map(|t| DateTime::<Local>::from(t).format(MTIME_FORMAT).to_string())
            .unwrap_or_default();

        template
            .replace("{os.file}", &file)
            .replace("{os.mtime}", &mtime)
    }

    /// Scans `template` and remembers the referenced fields for [`Self::fetch_data`].
    pub fn extract_fields(&mut self, template: &str) -> &[String] {
        self.fields = extract_fields(template);
        &self.fields
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Values of the extracted fields plus the sort key.
    ///
    /// Missing or empty properties render as `default_output` (or nothing).
    /// Returns `Ok(None)` when any filter rejects the document.
    pub fn fetch_data(
        &self,
        filters: &[Filter],
        sort: Option<&str>,
        default_output: Option<&str>,
    ) -> Result<Option<FieldData>> {
        let mut wanted: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        if let Some(key) = sort {
            if key != FILENAME_SORT_KEY && !wanted.contains(&key) {
                wanted.push(key);
            }
        }

        let mut data = FieldData::new();
        for name in wanted {
            let path: PropertyPath = name
                .parse()
                .map_err(|_| DocManagerError::InvalidQueryProperty(name.to_string()))?;
            let value = self
                .doc
                .get(&path)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default_output.unwrap_or("").to_string());
            data.insert(name.to_string(), value);
        }

        for filter in filters {
            let value = self.doc.get(&filter.property);
            if !filter.accepts(value.as_deref()) {
                trace!(%filter, "document rejected by filter");
                return Ok(None);
            }
        }

        Ok(Some(data))
    }
}
