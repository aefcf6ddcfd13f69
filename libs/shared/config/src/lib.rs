use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What happens to a booked slot when its appointment is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotReleasePolicy {
    /// The slot stays consumed forever.
    Never,
    /// The slot returns to the pool if no doctor notes were attached and it has not started yet.
    BeforeNotes,
}

impl SlotReleasePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "never" => Some(Self::Never),
            "before_notes" => Some(Self::BeforeNotes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session_jwt_secret: String,
    pub api_port: u16,
    pub booking_lock_timeout_ms: u64,
    pub slot_release_policy: SlotReleasePolicy,
    pub event_queue_capacity: usize,
    pub event_journal_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_jwt_secret: String::new(),
            api_port: 3000,
            booking_lock_timeout_ms: 2000,
            slot_release_policy: SlotReleasePolicy::Never,
            event_queue_capacity: 1024,
            event_journal_capacity: 10_000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            session_jwt_secret: env::var("SESSION_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SESSION_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            api_port: env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("API_PORT not set or invalid, using default {}", defaults.api_port);
                    defaults.api_port
                }),
            booking_lock_timeout_ms: env::var("BOOKING_LOCK_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("BOOKING_LOCK_TIMEOUT_MS not set or invalid, using default {}", defaults.booking_lock_timeout_ms);
                    defaults.booking_lock_timeout_ms
                }),
            slot_release_policy: env::var("SLOT_RELEASE_ON_CANCEL")
                .ok()
                .and_then(|v| SlotReleasePolicy::parse(&v))
                .unwrap_or_else(|| {
                    warn!("SLOT_RELEASE_ON_CANCEL not set or invalid, slots stay consumed on cancel");
                    defaults.slot_release_policy
                }),
            event_queue_capacity: env::var("EVENT_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|capacity: &usize| *capacity > 0)
                .unwrap_or(defaults.event_queue_capacity),
            event_journal_capacity: env::var("EVENT_JOURNAL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|capacity: &usize| *capacity > 0)
                .unwrap_or(defaults.event_journal_capacity),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.session_jwt_secret.is_empty()
    }

    pub fn booking_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.booking_lock_timeout_ms)
    }
}
