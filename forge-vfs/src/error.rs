use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No match: {0}")]
    NoMatch(String),
    #[error("Ambiguous match: {0}")]
    AmbiguousMatch(String),
    #[error("Invalid line: {0}")]
    InvalidLine(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("No history: {0}")]
    NoHistory(String),
    #[error("Not a file: {0}")]
    NotAFile(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VfsError {
    pub fn code(&self) -> &str {
        match self {
            Self::InvalidPath(_) => "VFS_INVALID_PATH",
            Self::NotFound(_) => "VFS_NOT_FOUND",
            Self::NoMatch(_) => "VFS_NO_MATCH",
            Self::AmbiguousMatch(_) => "VFS_AMBIGUOUS_MATCH",
            Self::InvalidLine(_) => "VFS_INVALID_LINE",
            Self::AlreadyExists(_) => "VFS_ALREADY_EXISTS",
            Self::NoHistory(_) => "VFS_NO_HISTORY",
            Self::NotAFile(_) => "VFS_NOT_FILE",
            Self::NotADirectory(_) => "VFS_NOT_DIRECTORY",
            Self::InvalidOperation(_) => "VFS_INVALID_OPERATION",
            Self::LimitExceeded(_) => "VFS_LIMIT_EXCEEDED",
            Self::InvalidArgument(_) => "VFS_INVALID_ARGUMENT",
            Self::Io(_) => "VFS_IO_ERROR",
            Self::Json(_) => "VFS_JSON_ERROR",
        }
    }

    pub fn to_json_rpc_error(&self) -> serde_json::Value {
        serde_json::json!({
            "vfsCode": self.code(),
            "message": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(VfsError::NoMatch("x".into()).code(), "VFS_NO_MATCH");
        assert_eq!(
            VfsError::AmbiguousMatch("x".into()).code(),
            "VFS_AMBIGUOUS_MATCH"
        );
        assert_eq!(VfsError::NoHistory("x".into()).code(), "VFS_NO_HISTORY");
    }

    #[test]
    fn json_rpc_error_carries_code_and_message() {
        let err = VfsError::NotFound("/App.jsx".into());
        let body = err.to_json_rpc_error();
        assert_eq!(body["vfsCode"], "VFS_NOT_FOUND");
        assert_eq!(body["message"], "Not found: /App.jsx");
    }
}
