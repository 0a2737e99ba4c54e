use record_access::StoreError;
use sqlx::error::ErrorKind;

/// Classify an sqlx error: constraint violations are kept apart from other
/// driver failures.
pub fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => StoreError::ConstraintViolation {
                message: db.message().to_string(),
                constraint: db.constraint().map(str::to_string),
                code: db.code().map(|code| code.into_owned()),
            },
            _ => StoreError::Driver(e.to_string()),
        },
        _ => StoreError::Driver(e.to_string()),
    }
}
