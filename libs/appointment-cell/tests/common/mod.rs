#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use appointment_cell::SchedulingService;
use patient_cell::{Gender, InMemoryPatientDirectory, PatientDirectory, PatientProfile, WalkInProfile};
use shared_config::AppConfig;
use shared_models::auth::Actor;
use shared_utils::test_utils::TestConfig;

pub struct Clinic {
    pub service: Arc<SchedulingService>,
    pub directory: Arc<InMemoryPatientDirectory>,
    pub config: Arc<AppConfig>,
}

impl Clinic {
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let config = test_config.to_arc();
        let directory = Arc::new(InMemoryPatientDirectory::new());
        let service = Arc::new(SchedulingService::new(&config, directory.clone()));
        Self { service, directory, config }
    }

    /// A patient who signed up and completed their profile.
    pub async fn registered_patient(&self) -> Actor {
        let id = Uuid::new_v4();
        self.directory
            .register_account(id, profile("Ada", "Obi"))
            .await
            .expect("account registration");
        Actor::patient(id)
    }

    pub async fn slot(&self, doctor: &Actor, start: DateTime<Utc>, minutes: i64) -> Uuid {
        self.service
            .create_slot(doctor.id, start, start + Duration::minutes(minutes), doctor)
            .await
            .expect("slot creation")
            .id
    }
}

pub fn profile(first_name: &str, last_name: &str) -> PatientProfile {
    PatientProfile {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: Some(format!("{}@example.com", first_name.to_lowercase())),
        phone_number: "+2348012345678".to_string(),
        date_of_birth: None,
        gender: Gender::Male,
        address: "4 Broad Street".to_string(),
        blood_group: None,
        genotype: None,
        marital_status: None,
        occupation: None,
    }
}

pub fn walk_in_profile() -> WalkInProfile {
    profile("Walkin", "Patient123")
}

/// `days` from now at `hour:minute` UTC.
pub fn days_ahead_at(days: i64, hour: u32, minute: u32) -> DateTime<Utc> {
    let day = (Utc::now() + Duration::days(days)).date_naive();
    day.and_hms_opt(hour, minute, 0)
        .expect("valid wall clock time")
        .and_utc()
}
