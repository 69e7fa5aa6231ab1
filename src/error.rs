use thiserror::Error;

/// Failure classes surfaced by the equilibrium engine.
///
/// Every failure on the parse → build → solve path maps onto one of these
/// classes. The API boundary flattens whichever class occurred into the
/// `{ "error": string }` response body, so nothing here escapes as an
/// uncaught fault.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed topology: unknown node kind, duplicate id, dangling edge
    /// reference, missing or negative source demand, empty edge set.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed cost expression, or one outside the closed set of shapes
    /// the engine can integrate.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Failure while deriving flow constraints, e.g. an edge id missing
    /// from the flow index.
    #[error("Constraint error: {0}")]
    Constraint(String),

    /// One of the two minimizations failed to converge. The payload
    /// carries the solver's message verbatim.
    #[error("Optimization failed: {0}")]
    Optimization(String),

    /// Catch-all for anything uncategorized.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    pub fn optimization(msg: impl Into<String>) -> Self {
        Self::Optimization(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Short class name, used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation",
            Self::Parse(_) => "Parse",
            Self::Constraint(_) => "Constraint",
            Self::Optimization(_) => "Optimization",
            Self::Unexpected(_) => "Unexpected",
        }
    }
}

/// Convenience alias for fallible engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_class_prefix() {
        let err = EngineError::validation("edge 'e1' references unknown node 'n9'");
        assert_eq!(
            err.to_string(),
            "Validation error: edge 'e1' references unknown node 'n9'"
        );

        let err = EngineError::optimization("did not converge");
        assert_eq!(err.to_string(), "Optimization failed: did not converge");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(EngineError::parse("x").kind(), "Parse");
        assert_eq!(EngineError::constraint("x").kind(), "Constraint");
        assert_eq!(EngineError::unexpected("x").kind(), "Unexpected");
    }
}
