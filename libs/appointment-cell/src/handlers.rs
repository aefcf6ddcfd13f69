// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Months, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{
    AvailableSlotsQuery, BookSlotRequest, CreateSlotRequest, SlotRangeQuery, StatusUpdateQuery,
    WalkInBookingRequest,
};
use crate::services::SchedulingService;

/// Missing bounds default to the start of today and one month after that.
fn resolve_range(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = from.unwrap_or_else(|| {
        Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or_else(Utc::now)
    });
    let to = to.unwrap_or_else(|| {
        from.checked_add_months(Months::new(1))
            .unwrap_or(from + Duration::days(30))
    });
    (from, to)
}

// ==============================================================================
// SLOT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_slot(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let slot = service
        .create_slot(request.doctor_id, request.start_time, request.end_time, &actor)
        .await?;

    Ok((StatusCode::CREATED, Json(json!(slot))))
}

#[axum::debug_handler]
pub async fn list_available_slots(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let (from, to) = resolve_range(query.from, query.to);
    let slots = service
        .list_available_slots(query.doctor_id, from, to, &actor)
        .await?;

    Ok(Json(json!({
        "slots": slots,
        "total": slots.len(),
        "from": from,
        "to": to
    })))
}

#[axum::debug_handler]
pub async fn list_doctor_slots(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let (from, to) = resolve_range(query.from, query.to);
    let slots = service.list_doctor_slots(doctor_id, from, to, &actor).await?;

    Ok(Json(json!({
        "doctorId": doctor_id,
        "slots": slots,
        "total": slots.len()
    })))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_slot(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<BookSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = service
        .book_standard(request.slot_id, actor.id, request.notes, &actor)
        .await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn book_walk_in(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<WalkInBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking = service
        .book_walk_in(request.slot_id, request.patient, request.notes, &actor)
        .await?;

    Ok((StatusCode::CREATED, Json(json!(booking.appointment))))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.get_appointment(appointment_id, &actor).await?;
    Ok(Json(json!(appointment)))
}

/// The body is the note text itself, sent as `text/plain`.
#[axum::debug_handler]
pub async fn set_doctor_notes(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Path(appointment_id): Path<Uuid>,
    doctor_notes: String,
) -> Result<Json<Value>, AppError> {
    let appointment = service
        .set_doctor_notes(appointment_id, &doctor_notes, &actor)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_status(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Path(appointment_id): Path<Uuid>,
    Query(query): Query<StatusUpdateQuery>,
) -> Result<Json<Value>, AppError> {
    let change = service
        .update_status(appointment_id, query.new_status, &actor)
        .await?;

    Ok(Json(json!(change)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.list_by_patient(patient_id, &actor).await?;

    Ok(Json(json!({
        "patientId": patient_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(service): State<Arc<SchedulingService>>,
    Extension(actor): Extension<Actor>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.list_by_doctor(doctor_id, &actor).await?;

    Ok(Json(json!({
        "doctorId": doctor_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn open_range_defaults_to_a_month_from_midnight() {
        let (from, to) = resolve_range(None, None);
        assert_eq!(from.time(), chrono::NaiveTime::MIN);
        assert!(to > from + Duration::days(27));
    }

    #[test]
    fn explicit_bounds_are_kept() {
        let from = Utc.with_ymd_and_hms(2030, 1, 31, 8, 0, 0).unwrap();
        let (resolved_from, to) = resolve_range(Some(from), None);
        assert_eq!(resolved_from, from);
        assert_eq!(to, Utc.with_ymd_and_hms(2030, 2, 28, 8, 0, 0).unwrap());
    }
}
