use crate::error::{DocManagerError, Result};
use crate::model::{PropertyPath, LANGUAGE_CODES};
use once_cell::sync::Lazy;
use regex::Regex;

pub const STATUS_VALUES: &[&str] = &["editing", "edited", "proofing", "proofed", "comment", "ready"];

static DEADLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("deadline pattern is valid"));

/// Splits `-p a,b;c` style arguments into single items.
pub fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split([',', ';']))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Property paths from `-p` arguments, duplicates removed.
pub fn parse_properties(values: &[String]) -> Result<Vec<PropertyPath>> {
    let mut paths: Vec<PropertyPath> = Vec::new();
    for item in split_list(values) {
        let path: PropertyPath = item.parse()?;
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Splits `key=value` on the first `=`.
pub fn split_pair(item: &str) -> Result<(String, String)> {
    item.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| {
            DocManagerError::Usage(format!(
                "{:?} is not of the form property=value",
                item
            ))
        })
}

/// `key=value` items; each argument may hold several items separated by `;`.
///
/// Commas are kept so that values such as language lists survive.
pub fn parse_pairs(values: &[String]) -> Result<Vec<(String, String)>> {
    values
        .iter()
        .flat_map(|v| v.split(';'))
        .filter(|s| !s.trim().is_empty())
        .map(split_pair)
        .collect()
}

/// Property assignments, checked and normalized; `prefix` is prepended to every path.
pub fn parse_assignments(
    values: &[String],
    prefix: Option<&str>,
) -> Result<Vec<(PropertyPath, String)>> {
    parse_pairs(values)?
        .into_iter()
        .map(|(key, value)| -> Result<(PropertyPath, String)> {
            let key = match prefix {
                Some(prefix) => format!("{}/{}", prefix, key),
                None => key,
            };
            let path: PropertyPath = key.parse()?;
            let value = check_value(&path, &value)?;
            Ok((path, value))
        })
        .collect()
}

/// `PROP[=COND]` items for `del`.
pub fn parse_conditions(values: &[String]) -> Result<Vec<(PropertyPath, Option<String>)>> {
    split_list(values)
        .into_iter()
        .map(|item| -> Result<(PropertyPath, Option<String>)> {
            match item.split_once('=') {
                Some((prop, cond)) => Ok((prop.parse()?, Some(cond.to_string()))),
                None => Ok((item.parse()?, None)),
            }
        })
        .collect()
}

/// Checks values of the predefined properties and normalizes `languages`.
///
/// Other properties pass through unchanged.
pub fn check_value(path: &PropertyPath, value: &str) -> Result<String> {
    if path.segments().len() != 1 {
        return Ok(value.to_string());
    }
    let invalid = |msg: String| Err(DocManagerError::InvalidInput(msg));
    match path.leaf() {
        "status" if !STATUS_VALUES.contains(&value) => invalid(format!(
            "Value of 'status' is incorrect. Expecting one of these values: {}",
            STATUS_VALUES.join(", ")
        )),
        "deadline" if !DEADLINE.is_match(value) => invalid(
            "Value of 'deadline' is incorrect. Use this date format: YYYY-MM-DD".to_string(),
        ),
        "priority" if !matches!(value.parse::<u8>(), Ok(1..=10)) => invalid(
            "Value of 'priority' is incorrect. Expecting a value between 1 and 10.".to_string(),
        ),
        "translation" if value != "yes" && value != "no" => invalid(
            "Value of 'translation' is incorrect. Expecting one of these values: yes or no"
                .to_string(),
        ),
        "languages" => normalize_languages(value),
        _ => Ok(value.to_string()),
    }
}

/// Validates a comma separated language list and drops repeated codes.
pub fn normalize_languages(value: &str) -> Result<String> {
    let mut codes: Vec<&str> = Vec::new();
    for code in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if LANGUAGE_CODES.binary_search(&code).is_err() {
            return Err(DocManagerError::InvalidInput(format!(
                "Value of 'languages' is incorrect. Language code '{}' is not supported.",
                code
            )));
        }
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    Ok(codes.join(","))
}
