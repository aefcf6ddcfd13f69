use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{get_patient, register_patient};
use crate::services::PatientDirectory;

pub fn create_patient_router(config: Arc<AppConfig>, directory: Arc<dyn PatientDirectory>) -> Router {
    Router::new()
        .route("/", post(register_patient))
        .route("/{patient_id}", get(get_patient))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(directory)
}
