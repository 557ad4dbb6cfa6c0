//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    config::CueBackend,
    services::WodGenerator,
    tasks::{spawn_timer, Outcome, TimerHandle, TimerOp},
    timer::{CueEmitter, LogCues, SilentCues, TimerView, WorkoutTimer},
    workout::{Wod, WodRequest},
};

/// The workout currently on screen and the timer session driving it
#[derive(Debug, Clone)]
pub struct Session {
    pub workout: Wod,
    pub timer: TimerHandle,
}

/// Main application state shared by the HTTP handlers
#[derive(Debug)]
pub struct AppState {
    /// Loaded workout and its timer, if any
    pub session: Arc<Mutex<Option<Session>>>,
    /// Saved preferences merged into every generation request
    pub preferences: Arc<Mutex<WodRequest>>,
    /// Workout generator, absent when not configured
    pub generator: Option<WodGenerator>,
    /// Timer settings
    pub cue_backend: CueBackend,
    pub tabata_work_seconds: u32,
    pub tabata_rest_seconds: u32,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Create a new AppState with no workout loaded
    pub fn new(port: u16, host: String, cue_backend: CueBackend) -> Self {
        Self {
            session: Arc::new(Mutex::new(None)),
            preferences: Arc::new(Mutex::new(WodRequest::default())),
            generator: None,
            cue_backend,
            tabata_work_seconds: crate::timer::engine::TABATA_WORK_SECONDS,
            tabata_rest_seconds: crate::timer::engine::TABATA_REST_SECONDS,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_generator(mut self, generator: WodGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_tabata(mut self, work_seconds: u32, rest_seconds: u32) -> Self {
        self.tabata_work_seconds = work_seconds;
        self.tabata_rest_seconds = rest_seconds;
        self
    }

    /// Build the cue emitter for a new timer session
    pub fn make_cues(&self) -> Box<dyn CueEmitter> {
        match self.cue_backend {
            CueBackend::Silent => Box::new(SilentCues),
            CueBackend::Log => Box::new(LogCues::default()),
            #[cfg(feature = "speaker")]
            CueBackend::Speaker => Box::new(crate::audio::SpeakerCues::new()),
            #[cfg(not(feature = "speaker"))]
            CueBackend::Speaker => {
                warn!("Built without the speaker feature, logging cues instead");
                Box::new(LogCues::default())
            }
        }
    }

    /// Display a workout: build a fresh timer for it and tear down the
    /// previous session
    pub async fn load_workout(&self, workout: Wod) -> Result<TimerView, String> {
        workout.validate()?;

        let config = workout
            .timer_config()
            .with_tabata(self.tabata_work_seconds, self.tabata_rest_seconds);
        info!(
            "Loading workout {:?} as {:?}, cap {:?}s",
            workout.wod_title, config.format, config.time_cap_seconds
        );

        let timer = spawn_timer(WorkoutTimer::new(config, self.make_cues()));
        let view = timer.view();

        let previous = {
            let mut session = self.session.lock()
                .map_err(|e| format!("Failed to lock session: {}", e))?;
            session.replace(Session { workout, timer })
        };

        if let Some(previous) = previous {
            previous.timer.shutdown().await;
        }

        self.record_action("load-workout");
        Ok(view)
    }

    /// Get the current session, if a workout is loaded
    pub fn get_session(&self) -> Result<Option<Session>, String> {
        self.session.lock()
            .map(|session| session.clone())
            .map_err(|e| format!("Failed to lock session: {}", e))
    }

    /// Apply a timer operation to the current session. `Ok(None)` means no
    /// workout is loaded.
    pub async fn apply(&self, op: TimerOp) -> Result<Option<Outcome>, String> {
        let Some(session) = self.get_session()? else {
            return Ok(None);
        };

        let outcome = session.timer.apply(op).await?;
        if outcome.accepted {
            self.record_action(op.name());
        }
        Ok(Some(outcome))
    }

    /// Tear down the current session. Returns false if nothing was loaded.
    pub async fn clear_session(&self) -> Result<bool, String> {
        let previous = {
            let mut session = self.session.lock()
                .map_err(|e| format!("Failed to lock session: {}", e))?;
            session.take()
        };

        match previous {
            Some(session) => {
                session.timer.shutdown().await;
                info!("Workout {:?} unloaded", session.workout.wod_title);
                self.record_action("unload-workout");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Get saved preferences
    pub fn get_preferences(&self) -> Result<WodRequest, String> {
        self.preferences.lock()
            .map(|prefs| prefs.clone())
            .map_err(|e| format!("Failed to lock preferences: {}", e))
    }

    /// Replace saved preferences
    pub fn set_preferences(&self, preferences: WodRequest) -> Result<WodRequest, String> {
        let mut prefs = self.preferences.lock()
            .map_err(|e| format!("Failed to lock preferences: {}", e))?;
        *prefs = preferences;
        let updated = prefs.clone();
        drop(prefs);

        self.record_action("save-preferences");
        Ok(updated)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        } else {
            warn!("Failed to record last action {}", action);
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Phase;
    use crate::workout::WodSection;

    fn wod(format: &str, cap: Option<u32>) -> Wod {
        Wod {
            wod_title: "Test".to_string(),
            format: format.to_string(),
            time_cap_minutes: cap,
            sections: vec![WodSection {
                name: "Workout".to_string(),
                items: vec!["10 burpees".to_string()],
            }],
            equipment: vec![],
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn apply_without_workout_is_none() {
        let state = AppState::new(0, "127.0.0.1".to_string(), CueBackend::Silent);
        assert!(state.apply(TimerOp::Start).await.unwrap().is_none());
        assert!(!state.clear_session().await.unwrap());
    }

    #[tokio::test]
    async fn loading_replaces_previous_session() {
        let state = AppState::new(0, "127.0.0.1".to_string(), CueBackend::Silent);

        state.load_workout(wod("AMRAP", Some(12))).await.unwrap();
        let first = state.get_session().unwrap().unwrap().timer;
        state.apply(TimerOp::Start).await.unwrap();

        let view = state.load_workout(wod("Tabata", None)).await.unwrap();
        assert!(view.is_tabata);
        assert_eq!(view.phase, Phase::Idle);
        assert!(first.apply(TimerOp::Reset).await.is_err());

        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("load-workout"));
        assert!(time.is_some());
    }

    #[tokio::test]
    async fn tabata_split_applies_to_new_sessions() {
        let state = AppState::new(0, "127.0.0.1".to_string(), CueBackend::Silent)
            .with_tabata(40, 20);
        let view = state.load_workout(wod("tabata", None)).await.unwrap();
        assert_eq!(view.tabata_phase_remaining, Some(40));
    }

    #[tokio::test]
    async fn rejects_untitled_workout() {
        let state = AppState::new(0, "127.0.0.1".to_string(), CueBackend::Silent);
        let mut untitled = wod("AMRAP", None);
        untitled.wod_title.clear();
        assert!(state.load_workout(untitled).await.is_err());
        assert!(state.get_session().unwrap().is_none());
    }
}
