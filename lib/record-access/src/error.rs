use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Raised by the store. `constraint` is the violated constraint's name and
    /// `code` the driver's error code (SQLSTATE on PostgreSQL), when reported.
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        message: String,
        constraint: Option<String>,
        code: Option<String>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Operation requires a non-empty filter: {0}")]
    EmptyFilter(&'static str),

    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// True for errors raised by the store for unique, foreign key, not-null
    /// or check constraints.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
