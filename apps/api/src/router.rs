use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::{appointment_routes, SchedulingService};
use patient_cell::{create_patient_router, PatientDirectory};
use shared_config::AppConfig;

pub fn create_router(
    config: Arc<AppConfig>,
    scheduling: Arc<SchedulingService>,
    directory: Arc<dyn PatientDirectory>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/appointments", appointment_routes(config.clone(), scheduling))
        .nest("/patients", create_patient_router(config, directory))
}
