//! Error types for sqlmigrate

use thiserror::Error;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Error types for migration statements
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Input rejected before any SQL was sent (identifier, column definition, value map)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Driver error reported by the database collaborator
    #[error("Database error: {0}")]
    Database(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Table referenced by the statement does not exist
    #[error("Undefined table: {0}")]
    UndefinedTable(String),

    /// Column referenced by the statement does not exist
    #[error("Undefined column: {0}")]
    UndefinedColumn(String),

    /// Table or database being created already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Database referenced by the statement does not exist
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl MigrationError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is an undefined table error
    pub fn is_undefined_table(&self) -> bool {
        matches!(self, Self::UndefinedTable(_))
    }

    /// Check if this is an already-exists error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// Parse a tokio_postgres error into a more specific MigrationError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    return Self::UniqueViolation(format!("{}: {}", constraint, message));
                }
                "23503" => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "42P01" => return Self::UndefinedTable(message.to_string()),
                "42703" => return Self::UndefinedColumn(message.to_string()),
                "42P07" | "42P04" => return Self::AlreadyExists(message.to_string()),
                "3D000" => return Self::InvalidCatalog(message.to_string()),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

impl From<toml::de::Error> for MigrationError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
