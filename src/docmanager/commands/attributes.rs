//! Attribute commands: `set-attr`, `del-attr` and `get-attr`.
//!
//! Setting or deleting attributes on a property that does not exist fails
//! for that file only; reading simply skips it.

use crate::commands::{apply_to_files, read_files, Change, CmdResult, Context, PropertyAttributes};
use crate::error::{DocManagerError, Result};
use crate::model::PropertyPath;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

static ATTRIBUTE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][-A-Za-z0-9._]*$").expect("attribute name pattern is valid")
});

pub fn check_attribute_name(name: &str) -> Result<()> {
    if ATTRIBUTE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(DocManagerError::InvalidInput(format!(
            "Invalid attribute name {:?}",
            name
        )))
    }
}

pub fn set(
    ctx: &Context,
    files: &[PathBuf],
    property: &PropertyPath,
    attrs: &[(String, String)],
) -> Result<CmdResult> {
    if attrs.is_empty() {
        return Err(DocManagerError::MissingArgument(
            "at least one attribute is required, use -a NAME=VALUE".to_string(),
        ));
    }
    for (name, _) in attrs {
        check_attribute_name(name)?;
    }

    let mut result = apply_to_files(ctx, files, |doc| {
        doc.set_attrs(property, attrs)?;
        Ok(Change::Done(Some("Set attributes".to_string())))
    })?;
    result.add_write_summary();
    Ok(result)
}

pub fn delete(
    ctx: &Context,
    files: &[PathBuf],
    property: &PropertyPath,
    names: &[String],
) -> Result<CmdResult> {
    if names.is_empty() {
        return Err(DocManagerError::MissingArgument(
            "at least one attribute is required, use -a NAME".to_string(),
        ));
    }

    let mut result = apply_to_files(ctx, files, |doc| {
        let missing = doc.del_attrs(property, names)?;
        if missing.is_empty() {
            Ok(Change::Done(Some("Deleted attributes".to_string())))
        } else {
            Ok(Change::Partial(format!(
                "These attributes couldn't be deleted: {}",
                missing.join(", ")
            )))
        }
    })?;
    result.add_write_summary();
    Ok(result)
}

/// Attributes of `properties` (every property when empty), limited to
/// `names` when given.
pub fn get(
    ctx: &Context,
    files: &[PathBuf],
    properties: &[PropertyPath],
    names: &[String],
) -> Result<CmdResult> {
    read_files(ctx, files, |file, doc, result| {
        let paths = if properties.is_empty() {
            doc.property_paths()
        } else {
            properties.to_vec()
        };
        for path in paths {
            let attributes = match doc.get_attrs(&path) {
                Ok(attrs) => attrs,
                Err(DocManagerError::PropertyNotFound(_)) => continue,
                Err(err) => return Err(err),
            };
            let attributes: Vec<(String, String)> = attributes
                .into_iter()
                .filter(|(name, _)| names.is_empty() || names.contains(name))
                .collect();
            if !attributes.is_empty() {
                result.attributes.push(PropertyAttributes {
                    file: file.to_path_buf(),
                    property: path.to_string(),
                    attributes,
                });
            }
        }
        Ok(())
    })
}
