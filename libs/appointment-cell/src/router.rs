// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::SchedulingService;

pub fn appointment_routes(config: Arc<AppConfig>, service: Arc<SchedulingService>) -> Router {
    // All scheduling operations require an authenticated actor
    let protected_routes = Router::new()
        // Slot registry
        .route("/slots", post(handlers::create_slot))
        .route("/slots/available", get(handlers::list_available_slots))
        .route("/doctors/{doctor_id}/slots", get(handlers::list_doctor_slots))

        // Booking
        .route("/book", post(handlers::book_slot))
        .route("/walkin", post(handlers::book_walk_in))

        // Appointment ledger
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/doctor-notes", put(handlers::set_doctor_notes))
        .route("/{appointment_id}/status", put(handlers::update_status))

        // Listings
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route("/doctors/{doctor_id}/appointments", get(handlers::get_doctor_appointments))

        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(service)
}
