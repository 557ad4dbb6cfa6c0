//! Workout (WOD) request and result types

use serde::{Deserialize, Serialize};

use crate::timer::TimerConfig;

/// What the athlete asked for, merged with their saved preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WodRequest {
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub available_equipment: String,
    #[serde(default)]
    pub preferences: String,
    #[serde(default)]
    pub limitations: String,
    #[serde(default)]
    pub notes: String,
}

impl WodRequest {
    /// Goal and equipment are required to program a workout
    pub fn validate(&self) -> Result<(), String> {
        if self.goal.trim().is_empty() || self.available_equipment.trim().is_empty() {
            return Err(
                "Missing required fields: goal and available_equipment are required".to_string(),
            );
        }
        Ok(())
    }

    /// Fill blank fields from saved preferences
    pub fn merged_with(&self, saved: &WodRequest) -> WodRequest {
        fn pick(primary: &str, fallback: &str) -> String {
            if primary.trim().is_empty() {
                fallback.to_string()
            } else {
                primary.to_string()
            }
        }

        WodRequest {
            goal: pick(&self.goal, &saved.goal),
            available_equipment: pick(&self.available_equipment, &saved.available_equipment),
            preferences: pick(&self.preferences, &saved.preferences),
            limitations: pick(&self.limitations, &saved.limitations),
            notes: pick(&self.notes, &saved.notes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WodSection {
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// A generated workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wod {
    pub wod_title: String,
    pub format: String,
    #[serde(default)]
    pub time_cap_minutes: Option<u32>,
    pub sections: Vec<WodSection>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl Wod {
    /// Reject workouts the timer cannot be built from
    pub fn validate(&self) -> Result<(), String> {
        if self.wod_title.trim().is_empty() {
            return Err("Workout has no title".to_string());
        }
        if self.format.trim().is_empty() {
            return Err("Workout has no format".to_string());
        }
        Ok(())
    }

    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig::new(&self.format, self.time_cap_minutes)
    }
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fences(content: &str) -> &str {
    let content = content.trim();

    let body = if let Some(rest) = content.strip_prefix("```json") {
        rest
    } else if let Some(rest) = content.strip_prefix("```") {
        rest
    } else {
        return content;
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a workout out of generated text
pub fn parse_wod(content: &str) -> Result<Wod, String> {
    let wod: Wod = serde_json::from_str(strip_code_fences(content))
        .map_err(|e| format!("Invalid workout JSON: {}", e))?;
    wod.validate()?;
    Ok(wod)
}
