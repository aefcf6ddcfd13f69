use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub user_metadata: Option<serde_json::Value>,
    pub iat: Option<u64>,
}

/// Identity resolved from a validated session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Closed set of roles the scheduling core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Patient,
    Receptionist,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
            Role::Receptionist => write!(f, "receptionist"),
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "patient" | "user" => Ok(Role::Patient),
            "receptionist" => Ok(Role::Receptionist),
            other => Err(AppError::Auth(format!("Unsupported role: {}", other))),
        }
    }
}

/// The authenticated caller as seen by the scheduling core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn doctor(id: Uuid) -> Self {
        Self::new(id, Role::Doctor)
    }

    pub fn patient(id: Uuid) -> Self {
        Self::new(id, Role::Patient)
    }

    pub fn receptionist(id: Uuid) -> Self {
        Self::new(id, Role::Receptionist)
    }
}

impl TryFrom<&User> for Actor {
    type Error = AppError;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth("Session subject is not a valid identifier".to_string()))?;
        let role = user
            .role
            .as_deref()
            .ok_or_else(|| AppError::Auth("Session carries no role".to_string()))?
            .parse()?;

        Ok(Actor { id, role })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Option<&str>) -> User {
        User {
            id: id.to_string(),
            email: None,
            role: role.map(str::to_string),
            metadata: None,
            created_at: None,
        }
    }

    #[test]
    fn resolves_actor_from_user() {
        let id = Uuid::new_v4();
        let actor = Actor::try_from(&user(&id.to_string(), Some("Receptionist"))).unwrap();
        assert_eq!(actor, Actor::receptionist(id));
    }

    #[test]
    fn legacy_user_role_maps_to_patient() {
        let id = Uuid::new_v4();
        let actor = Actor::try_from(&user(&id.to_string(), Some("USER"))).unwrap();
        assert_eq!(actor.role, Role::Patient);
    }

    #[test]
    fn rejects_unknown_role_and_bad_subject() {
        assert!(Actor::try_from(&user(&Uuid::new_v4().to_string(), Some("admin"))).is_err());
        assert!(Actor::try_from(&user("not-a-uuid", Some("doctor"))).is_err());
        assert!(Actor::try_from(&user(&Uuid::new_v4().to_string(), None)).is_err());
    }
}
