use thiserror::Error;

/// Failures reported by a storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("foreign key constraint violated: {detail}")]
    ForeignKeyViolation { detail: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl StoreError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by the access layer to both the REST and GraphQL surfaces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{message}")]
    Conflict { message: String },

    // The store detail is logged where the error is raised, never rendered.
    #[error("internal storage error")]
    Store(#[from] StoreError),
}

impl AccessError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("migration {0} is already applied")]
    AlreadyApplied(String),

    #[error("migration {0} is not applied")]
    NotApplied(String),

    #[error("unknown migration: {0}")]
    UnknownMigration(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while bootstrapping the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_detail_is_not_rendered_by_access_error() {
        let err = AccessError::from(StoreError::database("disk I/O error at page 7"));
        assert_eq!(err.to_string(), "internal storage error");
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = AccessError::not_found("Post", 42);
        assert_eq!(err.to_string(), "Post not found");
        assert!(err.is_not_found());
    }
}
