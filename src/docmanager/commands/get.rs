use crate::commands::{read_files, CmdResult, Context, FileProperties, PropertyValue};
use crate::error::Result;
use crate::model::PropertyPath;
use std::path::PathBuf;

/// Reads `properties` from every file, or all direct properties when none are named.
pub fn run(ctx: &Context, files: &[PathBuf], properties: &[PropertyPath]) -> Result<CmdResult> {
    read_files(ctx, files, |file, doc, result| {
        let values: Vec<PropertyValue> = if properties.is_empty() {
            doc.get_all()
                .into_iter()
                .map(|(name, value)| PropertyValue {
                    name,
                    value: Some(value),
                })
                .collect()
        } else {
            doc.get_selected(properties)
                .into_iter()
                .map(|(path, value)| PropertyValue {
                    name: path.to_string(),
                    value,
                })
                .collect()
        };
        result.properties.push(FileProperties {
            file: file.to_path_buf(),
            properties: values,
        });
        Ok(())
    })
}
