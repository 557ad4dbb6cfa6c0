//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    tasks::Outcome,
    timer::TimerView,
    workout::{Wod, WodRequest},
};

/// API response structure for timer endpoints
#[derive(Debug, Clone, Serialize)]
pub struct TimerResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerView,
}

impl TimerResponse {
    /// Create a new timer response
    pub fn new(status: &str, message: String, timer: TimerView) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// Report the outcome of a timer operation
    pub fn from_outcome(action: &str, outcome: Outcome) -> Self {
        if outcome.accepted {
            Self::new("accepted", format!("Timer {} applied", action), outcome.view)
        } else {
            let message = format!(
                "Timer {} ignored while {:?}",
                action, outcome.view.phase
            );
            Self::new("ignored", message, outcome.view)
        }
    }

    /// Report a freshly loaded workout
    pub fn loaded(workout: &Wod, timer: TimerView) -> Self {
        Self::new("loaded", format!("Workout loaded: {}", workout.wod_title), timer)
    }
}

/// Response for workout loading endpoints
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutResponse {
    pub workout: Wod,
    #[serde(flatten)]
    pub timer: TimerResponse,
}

/// Error body for failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        Self {
            error,
            timestamp: Utc::now(),
        }
    }
}

/// Preferences body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub preferences: WodRequest,
    pub timestamp: DateTime<Utc>,
}

/// Status response with the loaded workout and its timer
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub workout: Option<Wod>,
    pub timer: Option<TimerView>,
    pub generator_configured: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
