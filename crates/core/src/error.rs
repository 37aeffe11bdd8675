use thiserror::Error;

/// Faults reported by an [`Oracle`](crate::oracle::Oracle).
///
/// Only the first two kinds are recognized: relations treat them as "no value"
/// for the element being resolved. Everything else is `Unexpected` and aborts
/// the query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Invalid element state: {0}")]
    InvalidElementState(String),

    #[error("Unknown server error: {0}")]
    UnknownServer(String),

    #[error("Unexpected oracle fault: {0}")]
    Unexpected(String),
}

impl OracleError {
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::InvalidElementState(_) | Self::UnknownServer(_))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_kinds() {
        assert!(OracleError::InvalidElementState("stale".into()).is_recognized());
        assert!(OracleError::UnknownServer("boom".into()).is_recognized());
        assert!(!OracleError::Unexpected("socket closed".into()).is_recognized());
    }

    #[test]
    fn test_oracle_error_keeps_diagnostic() {
        let err: Error = OracleError::Unexpected("socket closed".into()).into();
        assert!(err.to_string().contains("socket closed"));
    }
}
