//! Error types for the cache shell

use std::fmt;

#[derive(Debug)]
pub enum ShellError {
    Cache(file_cache::CacheError),
    Parse(String),
    Json(String),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Cache(err) => write!(f, "Cache error: {}", err),
            ShellError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ShellError::Json(msg) => write!(f, "JSON error: {}", msg),
            ShellError::Io(err) => write!(f, "IO error: {}", err),
            ShellError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShellError::Cache(err) => Some(err),
            ShellError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<file_cache::CacheError> for ShellError {
    fn from(err: file_cache::CacheError) -> Self {
        ShellError::Cache(err)
    }
}

impl From<serde_json::Error> for ShellError {
    fn from(err: serde_json::Error) -> Self {
        ShellError::Json(err.to_string())
    }
}

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        ShellError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ShellError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ShellError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display() {
        let err = ShellError::Cache(file_cache::CacheError::NotFound("k".to_string()));
        assert_eq!(format!("{}", err), "Cache error: Item not found: k");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ShellError::Parse("missing key".to_string());
        assert_eq!(format!("{}", err), "Parse error: missing key");
    }

    #[test]
    fn test_json_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ShellError = serde_err.into();
        assert!(matches!(err, ShellError::Json(_)));
        assert!(format!("{}", err).starts_with("JSON error: "));
    }

    #[test]
    fn test_config_error_display() {
        let err = ShellError::Config("bad directive".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad directive");
    }

    #[test]
    fn test_error_is_debug() {
        let err = ShellError::Parse("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Parse"));
    }
}
