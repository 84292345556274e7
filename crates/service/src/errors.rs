use thiserror::Error;

use crate::imaging::ImageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("image error: {0}")]
    Image(#[from] ImageError),
    #[error("export error: {0}")]
    Export(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// True for errors caused by the caller's input rather than by a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_) | ServiceError::Model(models::errors::ModelError::Validation(_))
        )
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self { ServiceError::Db(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let e = ServiceError::not_found("contact");
        assert_eq!(e.to_string(), "not found: contact not found");
        assert!(!e.is_client_error());
    }

    #[test]
    fn model_validation_is_client_error() {
        let e: ServiceError = models::errors::ModelError::Validation("name required".into()).into();
        assert!(e.is_client_error());
        let e: ServiceError = models::errors::ModelError::Db("boom".into()).into();
        assert!(!e.is_client_error());
    }
}
