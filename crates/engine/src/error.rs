use api_types::ValidationIssue;
use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The wallet does not exist or belongs to a different user. The two
    /// cases are deliberately indistinguishable to callers.
    #[error("access denied")]
    AccessDenied,

    /// The batch failed validation. Carries every issue found, not just
    /// the first one, so callers can report them all at once.
    #[error("batch rejected: {} validation issue(s)", .0.len())]
    ValidationFailed(Vec<ValidationIssue>),

    /// No sentinel category is configured for the given kind. This is a
    /// deployment problem, not a bad request.
    #[error("no sentinel category configured for kind \"{0}\"")]
    CategoryConfigMissing(String),

    #[error("\"{0}\" not found")]
    KeyNotFound(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Every error leaves the store untouched: the surrounding
    /// transaction is rolled back before the error escapes.
    pub fn rolled_back(&self) -> bool {
        true
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AccessDenied, Self::AccessDenied) => true,
            (Self::ValidationFailed(a), Self::ValidationFailed(b)) => a == b,
            (Self::CategoryConfigMissing(a), Self::CategoryConfigMissing(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a == b,
            _ => false,
        }
    }
}
