use crate::constants::STORE_FAILURE_MESSAGE;
use crate::error::AccessError;
use async_graphql::{Error, ErrorExtensions};

impl AccessError {
    /// Machine-readable code carried in the GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::Validation { .. } => "VALIDATION_ERROR",
            AccessError::NotFound { .. } => "NOT_FOUND",
            AccessError::Conflict { .. } => "CONFLICT",
            AccessError::Store(_) => "INTERNAL",
        }
    }
}

impl ErrorExtensions for AccessError {
    fn extend(&self) -> Error {
        let message = match self {
            AccessError::Store(_) => STORE_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        };
        let code = self.code();
        let field = match self {
            AccessError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        Error::new(message).extend_with(move |_, e| {
            e.set("code", code);
            if let Some(field) = &field {
                e.set("field", field.as_str());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn store_errors_hide_their_detail() {
        let err = AccessError::Store(StoreError::database("no such table: posts")).extend();
        assert_eq!(err.message, STORE_FAILURE_MESSAGE);
    }

    #[test]
    fn not_found_keeps_its_message() {
        let err = AccessError::not_found("Account", 7).extend();
        assert_eq!(err.message, "Account not found");
        assert!(err.extensions.is_some());
    }
}
