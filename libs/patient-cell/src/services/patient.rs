use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Patient, PatientError, PatientProfile, RegistrationSource, WalkInProfile};
use crate::services::validation::validate_profile;

/// Seam to the identity store that owns patient records.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn find(&self, patient_id: Uuid) -> Result<Option<Patient>, PatientError>;

    /// Create the profile for an account patient whose identifier was issued at sign-up.
    async fn register_account(&self, patient_id: Uuid, profile: PatientProfile) -> Result<Patient, PatientError>;

    /// Create a fresh identity for a walk-in. No deduplication is attempted.
    async fn register_walk_in(&self, profile: WalkInProfile) -> Result<Patient, PatientError>;

    /// Remove a walk-in identity whose booking did not go through.
    async fn discard_walk_in(&self, patient_id: Uuid) -> Result<(), PatientError>;
}

#[derive(Default)]
pub struct InMemoryPatientDirectory {
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl InMemoryPatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.patients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.patients.read().await.is_empty()
    }
}

#[async_trait]
impl PatientDirectory for InMemoryPatientDirectory {
    async fn find(&self, patient_id: Uuid) -> Result<Option<Patient>, PatientError> {
        debug!("Looking up patient {}", patient_id);
        Ok(self.patients.read().await.get(&patient_id).cloned())
    }

    async fn register_account(&self, patient_id: Uuid, profile: PatientProfile) -> Result<Patient, PatientError> {
        validate_profile(&profile)?;

        let mut patients = self.patients.write().await;
        if patients.contains_key(&patient_id) {
            return Err(PatientError::AlreadyRegistered(patient_id));
        }

        let patient = Patient::from_profile(patient_id, profile, RegistrationSource::Account);
        patients.insert(patient_id, patient.clone());

        info!("Registered account patient {}", patient_id);
        Ok(patient)
    }

    async fn register_walk_in(&self, profile: WalkInProfile) -> Result<Patient, PatientError> {
        validate_profile(&profile)?;

        let patient = Patient::from_profile(Uuid::new_v4(), profile, RegistrationSource::WalkIn);
        self.patients.write().await.insert(patient.id, patient.clone());

        info!("Registered walk-in patient {} ({})", patient.id, patient.full_name());
        Ok(patient)
    }

    async fn discard_walk_in(&self, patient_id: Uuid) -> Result<(), PatientError> {
        let mut patients = self.patients.write().await;
        match patients.get(&patient_id) {
            Some(patient) if patient.registration_source == RegistrationSource::WalkIn => {
                patients.remove(&patient_id);
                debug!("Discarded walk-in patient {}", patient_id);
                Ok(())
            }
            Some(_) => Err(PatientError::ValidationError(format!(
                "Patient {} is not a walk-in registration",
                patient_id
            ))),
            None => Err(PatientError::NotFound(patient_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use assert_matches::assert_matches;

    fn profile(first_name: &str) -> PatientProfile {
        PatientProfile {
            first_name: first_name.to_string(),
            last_name: "Patient123".to_string(),
            email: Some("walkin@example.com".to_string()),
            phone_number: "08012345678".to_string(),
            date_of_birth: None,
            gender: Gender::Male,
            address: "1 Hospital Road".to_string(),
            blood_group: None,
            genotype: None,
            marital_status: None,
            occupation: Some("Trader".to_string()),
        }
    }

    #[tokio::test]
    async fn walk_ins_are_always_fresh_identities() {
        let directory = InMemoryPatientDirectory::new();

        let first = directory.register_walk_in(profile("Walkin")).await.unwrap();
        let second = directory.register_walk_in(profile("Walkin")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(directory.len().await, 2);
        assert_eq!(first.registration_source, RegistrationSource::WalkIn);
    }

    #[tokio::test]
    async fn account_registration_is_unique_per_identifier() {
        let directory = InMemoryPatientDirectory::new();
        let id = Uuid::new_v4();

        directory.register_account(id, profile("Owen")).await.unwrap();
        let again = directory.register_account(id, profile("Owen")).await;

        assert_matches!(again, Err(PatientError::AlreadyRegistered(existing)) if existing == id);
    }

    #[tokio::test]
    async fn invalid_profiles_are_not_stored() {
        let directory = InMemoryPatientDirectory::new();
        let mut bad = profile("Walkin");
        bad.first_name = String::new();

        assert_matches!(directory.register_walk_in(bad).await, Err(PatientError::ValidationError(_)));
        assert!(directory.is_empty().await);
    }

    #[tokio::test]
    async fn only_walk_ins_can_be_discarded() {
        let directory = InMemoryPatientDirectory::new();
        let account = directory.register_account(Uuid::new_v4(), profile("Owen")).await.unwrap();
        let walk_in = directory.register_walk_in(profile("Walkin")).await.unwrap();

        assert_matches!(directory.discard_walk_in(account.id).await, Err(PatientError::ValidationError(_)));
        directory.discard_walk_in(walk_in.id).await.unwrap();
        assert!(directory.find(walk_in.id).await.unwrap().is_none());
    }
}
