use std::path::PathBuf;
use thiserror::Error;

/// Process exit classifier attached to every error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ReturnCode {
    Ok = 0,
    FileNotFound = 1,
    CouldNotSetValue = 2,
    XmlParseError = 3,
    InvalidUsageKeyVal = 5,
    CallWithoutParams = 8,
    InvalidXmlDocument = 9,
    InvalidArguments = 10,
    PropertyNotFound = 11,
    WrongInputFormat = 12,
    NotDocbook5File = 13,
    InvalidRootElement = 14,
    PermissionDenied = 15,
    InvalidConfigProperty = 16,
    AnalyzeFilterInvalidSyntax = 17,
    InvalidXmlProperties = 18,
    InternalError = 19,
}

impl ReturnCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Error, Debug)]
pub enum DocManagerError {
    #[error("Could not find a root element in {0}")]
    MalformedDocument(String),

    #[error("XML parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: u32,
        column: u32,
    },

    #[error("The document is not a DocBook 5 file (namespace {found:?})")]
    NotTargetNamespace { found: String },

    #[error("Cannot add info element to {0}. Not a valid root element.")]
    InvalidRootElement(String),

    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Could not find file {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid filter syntax: {0}")]
    InvalidFilter(String),

    #[error("Sort key {0:?} is not part of the query format")]
    InvalidSortKey(String),

    #[error("Invalid property in query format or sort key: {0:?}")]
    InvalidQueryProperty(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid usage: {0}")]
    Usage(String),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("No XML files given")]
    NoFiles,

    #[error("Unknown config key: {0}")]
    ConfigKey(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocManagerError {
    pub fn return_code(&self) -> ReturnCode {
        match self {
            DocManagerError::MalformedDocument(_) => ReturnCode::InvalidXmlDocument,
            DocManagerError::Parse { .. } => ReturnCode::XmlParseError,
            DocManagerError::NotTargetNamespace { .. } => ReturnCode::NotDocbook5File,
            DocManagerError::InvalidRootElement(_) => ReturnCode::InvalidRootElement,
            DocManagerError::PropertyNotFound(_) => ReturnCode::PropertyNotFound,
            DocManagerError::FileNotFound(_) => ReturnCode::FileNotFound,
            DocManagerError::PermissionDenied(_) => ReturnCode::PermissionDenied,
            DocManagerError::Io(_) => ReturnCode::CouldNotSetValue,
            DocManagerError::Serialization(_) => ReturnCode::InvalidConfigProperty,
            DocManagerError::InvalidFilter(_) => ReturnCode::AnalyzeFilterInvalidSyntax,
            DocManagerError::InvalidSortKey(_) => ReturnCode::InvalidXmlProperties,
            DocManagerError::InvalidQueryProperty(_) => ReturnCode::InvalidXmlProperties,
            DocManagerError::InvalidInput(_) => ReturnCode::WrongInputFormat,
            DocManagerError::Usage(_) => ReturnCode::InvalidUsageKeyVal,
            DocManagerError::MissingArgument(_) => ReturnCode::InvalidArguments,
            DocManagerError::NoFiles => ReturnCode::CallWithoutParams,
            DocManagerError::ConfigKey(_) => ReturnCode::InvalidConfigProperty,
            DocManagerError::Internal(_) => ReturnCode::InternalError,
        }
    }

    /// Classifies an IO failure on `path` into the matching variant.
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => DocManagerError::FileNotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => DocManagerError::PermissionDenied(path.into()),
            _ => DocManagerError::Io(err),
        }
    }
}

impl From<xot::Error> for DocManagerError {
    fn from(err: xot::Error) -> Self {
        DocManagerError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocManagerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_errors_are_classified_by_kind() {
        let missing = DocManagerError::from_io(io::Error::from(io::ErrorKind::NotFound), "a.xml");
        assert!(matches!(missing, DocManagerError::FileNotFound(_)));
        assert_eq!(missing.return_code(), ReturnCode::FileNotFound);

        let denied =
            DocManagerError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), "a.xml");
        assert_eq!(denied.return_code(), ReturnCode::PermissionDenied);
        assert_eq!(denied.return_code().code(), 15);
    }

    #[test]
    fn no_files_is_a_call_without_params() {
        assert_eq!(DocManagerError::NoFiles.return_code().code(), 8);
    }

    #[test]
    fn parse_error_mentions_position() {
        let err = DocManagerError::Parse {
            message: "unexpected end".into(),
            line: 3,
            column: 7,
        };
        assert_eq!(
            err.to_string(),
            "XML parse error at line 3, column 7: unexpected end"
        );
    }
}
