use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::rentals::RentalStatus;

/// Every failure the dispatch core can report.
///
/// All variants except `InvariantViolation` and `Database` are ordinary,
/// recoverable outcomes the caller can act on (e.g. pick another open rental).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("driver {0} has no active assignment to a car owner")]
    NoActiveAssignment(Uuid),

    #[error("rental {0} does not require a driver")]
    DriverNotRequired(Uuid),

    #[error("rental {0} has already been claimed")]
    AlreadyClaimed(Uuid),

    #[error("rental {rental_id} is {actual:?}, expected {expected:?}")]
    WrongStatus {
        rental_id: Uuid,
        expected: RentalStatus,
        actual: RentalStatus,
    },

    #[error("driver {driver_id} is not assigned to the owner of rental {rental_id}")]
    NotAuthorizedForOwner { driver_id: Uuid, rental_id: Uuid },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        CoreError::NotFound { entity, id }
    }

    /// Stable machine-readable name used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "not_found",
            CoreError::NoActiveAssignment(_) => "no_active_assignment",
            CoreError::DriverNotRequired(_) => "driver_not_required",
            CoreError::AlreadyClaimed(_) => "already_claimed",
            CoreError::WrongStatus { .. } => "wrong_status",
            CoreError::NotAuthorizedForOwner { .. } => "not_authorized_for_owner",
            CoreError::InvalidState(_) => "invalid_state",
            CoreError::InvariantViolation(_) => "internal",
            CoreError::Validation(_) => "validation",
            CoreError::Database(_) => "internal",
        }
    }

    /// Internal failures are never shown to the caller verbatim.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CoreError::InvariantViolation(_) | CoreError::Database(_)
        )
    }
}

impl ResponseError for CoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::NoActiveAssignment(_) | CoreError::NotAuthorizedForOwner { .. } => {
                StatusCode::FORBIDDEN
            }
            CoreError::AlreadyClaimed(_)
            | CoreError::WrongStatus { .. }
            | CoreError::InvalidState(_) => StatusCode::CONFLICT,
            CoreError::DriverNotRequired(_) | CoreError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            CoreError::InvariantViolation(_) | CoreError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            tracing::error!(error = %self, "internal failure");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": message,
            "kind": self.kind(),
        }))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
