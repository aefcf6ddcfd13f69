use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::{Actor, Role};
use shared_models::error::AppError;

use crate::models::{PatientError, PatientProfile};
use crate::services::PatientDirectory;

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(_) => AppError::NotFound(err.to_string()),
            PatientError::AlreadyRegistered(_) => AppError::Conflict(err.to_string()),
            PatientError::ValidationError(msg) => AppError::ValidationError(msg),
            PatientError::Unavailable(_) => AppError::Internal(err.to_string()),
        }
    }
}

/// A patient completes their own profile after signing up.
#[axum::debug_handler]
pub async fn register_patient(
    State(directory): State<Arc<dyn PatientDirectory>>,
    Extension(actor): Extension<Actor>,
    Json(profile): Json<PatientProfile>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if actor.role != Role::Patient {
        return Err(AppError::Forbidden("Only patients can register their own profile".to_string()));
    }

    let patient = directory.register_account(actor.id, profile).await?;

    Ok((StatusCode::CREATED, Json(json!(patient))))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(directory): State<Arc<dyn PatientDirectory>>,
    Extension(actor): Extension<Actor>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if actor.role == Role::Patient && actor.id != patient_id {
        return Err(AppError::Forbidden("Patients can only view their own profile".to_string()));
    }

    let patient = directory
        .find(patient_id)
        .await?
        .ok_or(PatientError::NotFound(patient_id))?;

    Ok(Json(json!(patient)))
}
