use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::approval::TransitionError;
use common::error::{summarize, ValidationError};
use common::requests::ErrorBody;
use log::{error, warn};
use thiserror::Error;

use crate::platform::PlatformError;

/// Failure of an operation, as reported to the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", summarize(.0))]
    Validation(Vec<ValidationError>),
    #[error("Falha ao acessar a plataforma de dados. Tente novamente.")]
    RemoteQuery(#[source] PlatformError),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0} não encontrado")]
    NotFound(&'static str),
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("Operação interrompida: {succeeded} de {total} registros processados antes da falha.")]
    PartialBatchFailure {
        succeeded: usize,
        total: usize,
        #[source]
        cause: Box<AppError>,
    },
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(vec![e])
    }
}

impl From<Vec<ValidationError>> for AppError {
    fn from(errors: Vec<ValidationError>) -> Self {
        AppError::Validation(errors)
    }
}

impl From<PlatformError> for AppError {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::InvalidCredentials => AppError::Unauthenticated("E-mail ou senha inválidos"),
            other => AppError::RemoteQuery(other),
        }
    }
}

impl AppError {
    pub fn session_required() -> Self {
        AppError::Unauthenticated("Sessão inválida ou expirada")
    }

    /// Logs the failure of `operation` and converts it into a response.
    pub fn respond(self, operation: &str) -> HttpResponse {
        match &self {
            AppError::RemoteQuery(cause) => error!("{} failed: {}", operation, cause),
            AppError::PartialBatchFailure {
                succeeded,
                total,
                cause,
            } => error!(
                "{} stopped after {} of {}: {:?}",
                operation, succeeded, total, cause
            ),
            other => warn!("{} rejected: {}", operation, other),
        }
        self.error_response()
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RemoteQuery(_) => StatusCode::BAD_GATEWAY,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::PartialBatchFailure { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::record::RecordStatus;

    #[test]
    fn maps_to_status_codes() {
        let remote = AppError::from(PlatformError::Storage("boom".into()));
        assert_eq!(remote.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!remote.to_string().contains("boom"));

        let login = AppError::from(PlatformError::InvalidCredentials);
        assert_eq!(login.status_code(), StatusCode::UNAUTHORIZED);

        let conflict = AppError::from(TransitionError::AlreadyReviewed(RecordStatus::Official));
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let invalid = AppError::from(ValidationError::EmptyRejectionReason);
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.to_string(), "Informe o motivo da rejeição");
    }

    #[test]
    fn partial_failure_reports_count() {
        let err = AppError::PartialBatchFailure {
            succeeded: 100,
            total: 120,
            cause: Box::new(AppError::from(PlatformError::Storage("x".into()))),
        };
        assert!(err.to_string().contains("100 de 120"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
