use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    #[serde(alias = "male")]
    Male,
    #[serde(alias = "female")]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+", alias = "A_POSITIVE")]
    APositive,
    #[serde(rename = "A-", alias = "A_NEGATIVE")]
    ANegative,
    #[serde(rename = "B+", alias = "B_POSITIVE")]
    BPositive,
    #[serde(rename = "B-", alias = "B_NEGATIVE")]
    BNegative,
    #[serde(rename = "AB+", alias = "AB_POSITIVE")]
    AbPositive,
    #[serde(rename = "AB-", alias = "AB_NEGATIVE")]
    AbNegative,
    #[serde(rename = "O+", alias = "O_POSITIVE")]
    OPositive,
    #[serde(rename = "O-", alias = "O_NEGATIVE")]
    ONegative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Genotype {
    #[serde(alias = "aa")]
    Aa,
    #[serde(alias = "as")]
    As,
    #[serde(alias = "ac")]
    Ac,
    #[serde(alias = "ss")]
    Ss,
    #[serde(alias = "sc")]
    Sc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    #[serde(alias = "single")]
    Single,
    #[serde(alias = "married")]
    Married,
    #[serde(alias = "divorced")]
    Divorced,
    #[serde(alias = "widowed")]
    Widowed,
}

/// How a patient identity entered the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationSource {
    Account,
    WalkIn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub address: String,
    pub blood_group: Option<BloodGroup>,
    pub genotype: Option<Genotype>,
    pub marital_status: Option<MaritalStatus>,
    pub occupation: Option<String>,
    pub registration_source: RegistrationSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn from_profile(id: Uuid, profile: PatientProfile, source: RegistrationSource) -> Self {
        let now = Utc::now();
        Self {
            id,
            first_name: profile.first_name.trim().to_string(),
            last_name: profile.last_name.trim().to_string(),
            email: profile.email,
            phone_number: profile.phone_number.trim().to_string(),
            date_of_birth: profile.date_of_birth,
            gender: profile.gender,
            address: profile.address.trim().to_string(),
            blood_group: profile.blood_group,
            genotype: profile.genotype,
            marital_status: profile.marital_status,
            occupation: profile.occupation,
            registration_source: source,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Demographic fields captured when a patient is registered, either by
/// the patient for their own account or by the front desk for a walk-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub address: String,
    pub blood_group: Option<BloodGroup>,
    pub genotype: Option<Genotype>,
    pub marital_status: Option<MaritalStatus>,
    pub occupation: Option<String>,
}

pub type WalkInProfile = PatientProfile;

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found: {0}")]
    NotFound(Uuid),

    #[error("Patient already registered: {0}")]
    AlreadyRegistered(Uuid),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Patient directory unavailable: {0}")]
    Unavailable(String),
}
