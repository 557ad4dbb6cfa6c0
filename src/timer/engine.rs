//! Workout timer state machine
//!
//! The engine is synchronous. It never sleeps or spawns; the caller delivers
//! one [`WorkoutTimer::tick`] per second while [`WorkoutTimer::schedule`]
//! reports an armed callback, and invokes user operations in between.

use serde::Serialize;
use tracing::{debug, info};

use super::cues::{Cue, CueEmitter};
use super::format::FormatTag;

/// Length of the pre-start countdown
pub const COUNTDOWN_SECONDS: u32 = 10;
pub const TABATA_WORK_SECONDS: u32 = 20;
pub const TABATA_REST_SECONDS: u32 = 10;
/// Rounds shown on the Tabata display. The timer does not stop after them.
pub const TABATA_ROUNDS: u32 = 8;

/// Immutable settings for one timer instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    pub format_label: String,
    pub format: FormatTag,
    pub time_cap_seconds: Option<u32>,
    pub tabata_work_seconds: u32,
    pub tabata_rest_seconds: u32,
}

impl TimerConfig {
    /// Build a configuration from a workout's format label and time cap.
    /// A zero cap counts as no cap.
    pub fn new(format_label: &str, time_cap_minutes: Option<u32>) -> Self {
        Self {
            format_label: format_label.to_string(),
            format: FormatTag::classify(format_label),
            time_cap_seconds: time_cap_minutes
                .filter(|&minutes| minutes > 0)
                .map(|minutes| minutes.saturating_mul(60)),
            tabata_work_seconds: TABATA_WORK_SECONDS,
            tabata_rest_seconds: TABATA_REST_SECONDS,
        }
    }

    /// Override the Tabata work/rest split
    pub fn with_tabata(mut self, work_seconds: u32, rest_seconds: u32) -> Self {
        self.tabata_work_seconds = work_seconds;
        self.tabata_rest_seconds = rest_seconds;
        self
    }

    /// Length of one work+rest cycle, never zero
    pub fn tabata_cycle_seconds(&self) -> u32 {
        self.tabata_work_seconds
            .saturating_add(self.tabata_rest_seconds)
            .max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Idle,
    CountingDown,
    Running,
    Paused,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TabataPhase {
    Work,
    Rest,
}

/// The periodic callback currently armed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Countdown,
    Elapsed,
}

/// Mutable timer state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerState {
    pub phase: Phase,
    pub elapsed_seconds: u32,
    /// Present only while counting down
    pub countdown_remaining: Option<u32>,
    pub rounds_completed: u32,
    pub emom_minute: u32,
    pub tabata_cycle_index: u32,
}

/// Interval timer for a single displayed workout
#[derive(Debug)]
pub struct WorkoutTimer<C: CueEmitter> {
    config: TimerConfig,
    state: TimerState,
    schedule: Option<Schedule>,
    cues: C,
    torn_down: bool,
}

impl<C: CueEmitter> WorkoutTimer<C> {
    pub fn new(config: TimerConfig, cues: C) -> Self {
        Self {
            config,
            state: TimerState::default(),
            schedule: None,
            cues,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn schedule(&self) -> Option<Schedule> {
        self.schedule
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Begin the pre-start countdown. Only valid from `Idle`.
    ///
    /// Primes the cue emitter, so this must run inside the user action
    /// that asked for the start.
    pub fn start(&mut self) -> bool {
        if !self.accepts("start", &[Phase::Idle]) {
            return false;
        }

        self.cues.prime();
        self.state.phase = Phase::CountingDown;
        self.state.countdown_remaining = Some(COUNTDOWN_SECONDS);
        self.schedule = Some(Schedule::Countdown);
        info!("Timer countdown started ({}s)", COUNTDOWN_SECONDS);
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.accepts("pause", &[Phase::Running]) {
            return false;
        }

        self.emit(Cue::PAUSE);
        self.state.phase = Phase::Paused;
        self.schedule = None;
        info!("Timer paused at {}s", self.state.elapsed_seconds);
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.accepts("resume", &[Phase::Paused]) {
            return false;
        }

        self.emit(Cue::RESUME);
        self.state.phase = Phase::Running;
        self.schedule = Some(Schedule::Elapsed);
        info!("Timer resumed at {}s", self.state.elapsed_seconds);
        true
    }

    /// Return to `Idle` with all counters cleared. The configuration is kept.
    pub fn reset(&mut self) -> bool {
        if !self.accepts(
            "reset",
            &[
                Phase::CountingDown,
                Phase::Running,
                Phase::Paused,
                Phase::Expired,
            ],
        ) {
            return false;
        }

        self.emit(Cue::RESET);
        self.schedule = None;
        self.state = TimerState::default();
        info!("Timer reset");
        true
    }

    /// Count a completed round. Any format may count rounds; only AMRAP
    /// displays them.
    pub fn add_round(&mut self) -> bool {
        if !self.accepts("add round", &[Phase::Running]) {
            return false;
        }

        self.emit(Cue::ROUND_ADDED);
        self.state.rounds_completed = self.state.rounds_completed.saturating_add(1);
        debug!("Rounds completed: {}", self.state.rounds_completed);
        true
    }

    pub fn subtract_round(&mut self) -> bool {
        if !self.accepts("subtract round", &[Phase::Running]) {
            return false;
        }

        self.emit(Cue::ROUND_REMOVED);
        self.state.rounds_completed = self.state.rounds_completed.saturating_sub(1);
        debug!("Rounds completed: {}", self.state.rounds_completed);
        true
    }

    /// Deliver one clock tick. Returns false when no callback is armed.
    pub fn tick(&mut self) -> bool {
        match self.schedule {
            Some(Schedule::Countdown) => {
                self.countdown_tick();
                true
            }
            Some(Schedule::Elapsed) => {
                self.elapsed_tick();
                true
            }
            None => false,
        }
    }

    fn countdown_tick(&mut self) {
        let Some(remaining) = self.state.countdown_remaining else {
            self.schedule = None;
            return;
        };

        let remaining = remaining.saturating_sub(1);

        if (1..=3).contains(&remaining) {
            self.emit(Cue::COUNTDOWN);
        }

        if remaining == 0 {
            self.emit(Cue::GO);
            self.state.countdown_remaining = None;
            self.state.phase = Phase::Running;
            self.schedule = Some(Schedule::Elapsed);
            info!("Countdown finished, timer running");
        } else {
            self.state.countdown_remaining = Some(remaining);
        }
    }

    fn elapsed_tick(&mut self) {
        let elapsed = self.state.elapsed_seconds.saturating_add(1);
        self.state.elapsed_seconds = elapsed;

        let format = self.config.format;
        let on_minute = elapsed % 60 == 0;

        if format.is_emom() && on_minute {
            self.emit(Cue::EMOM_MINUTE);
            self.state.emom_minute = elapsed / 60;
        }

        if !format.is_emom() && !format.is_tabata() && on_minute {
            self.emit(Cue::MINUTE_MARKER);
        }

        if let Some(cap) = self.config.time_cap_seconds {
            let remaining = cap.saturating_sub(elapsed);

            if elapsed == cap / 2 {
                self.emit(Cue::HALFWAY);
            }
            if remaining == 30 {
                self.emit(Cue::THIRTY_LEFT);
            }
            if remaining > 0 && remaining <= 10 {
                self.emit(Cue::FINAL_TEN);
            }
        }

        if format.is_tabata() {
            let cycle = self.config.tabata_cycle_seconds();
            let position = elapsed % cycle;

            if position == 0 {
                self.emit(Cue::TABATA_WORK);
            } else if position == self.config.tabata_work_seconds {
                self.emit(Cue::TABATA_REST);
            }
            self.state.tabata_cycle_index = elapsed / cycle;
        }

        if let Some(cap) = self.config.time_cap_seconds {
            if elapsed >= cap {
                self.state.elapsed_seconds = cap;
                self.emit(Cue::TIME_UP);
                self.state.phase = Phase::Expired;
                self.schedule = None;
                info!("Time cap of {}s reached", cap);
            }
        }
    }

    /// Seconds left under the cap, if one is set
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.config
            .time_cap_seconds
            .map(|cap| cap.saturating_sub(self.state.elapsed_seconds))
    }

    pub fn is_time_up(&self) -> bool {
        self.config
            .time_cap_seconds
            .is_some_and(|cap| self.state.elapsed_seconds >= cap)
    }

    /// Position inside the current Tabata cycle
    pub fn cycle_position(&self) -> Option<u32> {
        self.config
            .format
            .is_tabata()
            .then(|| self.state.elapsed_seconds % self.config.tabata_cycle_seconds())
    }

    pub fn tabata_phase(&self) -> Option<TabataPhase> {
        self.cycle_position().map(|position| {
            if position < self.config.tabata_work_seconds {
                TabataPhase::Work
            } else {
                TabataPhase::Rest
            }
        })
    }

    /// Seconds left in the current work or rest segment
    pub fn tabata_phase_remaining(&self) -> Option<u32> {
        self.cycle_position().map(|position| {
            if position < self.config.tabata_work_seconds {
                self.config.tabata_work_seconds - position
            } else {
                self.config.tabata_cycle_seconds() - position
            }
        })
    }

    /// Cancel any armed callback and release the cue emitter. Every later
    /// call is a no-op.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.schedule = None;
        self.cues.release();
        self.torn_down = true;
        debug!("Timer torn down in phase {:?}", self.state.phase);
    }

    fn accepts(&self, operation: &str, valid: &[Phase]) -> bool {
        if self.torn_down {
            debug!("Ignoring {} on a torn down timer", operation);
            return false;
        }
        if !valid.contains(&self.state.phase) {
            debug!("Ignoring {} while phase={:?}", operation, self.state.phase);
            return false;
        }
        true
    }

    fn emit(&mut self, cue: Cue) {
        self.cues.beep(cue.frequency_hz, cue.duration_secs);
    }
}

impl<C: CueEmitter> Drop for WorkoutTimer<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
