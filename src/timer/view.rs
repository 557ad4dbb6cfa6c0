//! Read-only projection of a timer for display

use serde::Serialize;

use super::cues::CueEmitter;
use super::engine::{Phase, TabataPhase, WorkoutTimer, TABATA_ROUNDS};
use super::format::FormatTag;

/// Format seconds as `MM:SS`.
///
/// From 100 minutes on the value rolls over to `H:MM:SS` instead of growing
/// a third minute digit.
pub fn format_duration(seconds: u32) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;

    if minutes < 100 {
        format!("{:02}:{:02}", minutes, secs)
    } else {
        format!("{}:{:02}:{:02}", minutes / 60, minutes % 60, secs)
    }
}

/// Everything a display needs to render one frame of the timer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerView {
    pub phase: Phase,
    pub format: FormatTag,
    pub format_label: String,
    pub is_amrap: bool,
    pub is_emom: bool,
    pub is_tabata: bool,
    pub is_countdown: bool,
    pub is_time_up: bool,
    pub elapsed_seconds: u32,
    pub formatted_elapsed: String,
    pub remaining_seconds: Option<u32>,
    pub formatted_remaining: Option<String>,
    pub time_cap_seconds: Option<u32>,
    pub formatted_time_cap: Option<String>,
    pub countdown: Option<u32>,
    pub rounds_completed: u32,
    /// Round counter controls are live
    pub rounds_enabled: bool,
    pub emom_minute: u32,
    pub tabata_phase: Option<TabataPhase>,
    pub tabata_phase_remaining: Option<u32>,
    pub formatted_tabata_phase_remaining: Option<String>,
    pub tabata_round: u32,
    pub tabata_rounds_total: Option<u32>,
    pub instructions: &'static str,
}

impl TimerView {
    pub fn project<C: CueEmitter>(timer: &WorkoutTimer<C>) -> Self {
        let config = timer.config();
        let state = timer.state();
        let format = config.format;
        let remaining = timer.remaining_seconds();
        let tabata_phase_remaining = timer.tabata_phase_remaining();

        Self {
            phase: state.phase,
            format,
            format_label: config.format_label.clone(),
            is_amrap: format.is_amrap(),
            is_emom: format.is_emom(),
            is_tabata: format.is_tabata(),
            is_countdown: state.countdown_remaining.is_some(),
            is_time_up: timer.is_time_up(),
            elapsed_seconds: state.elapsed_seconds,
            formatted_elapsed: format_duration(state.elapsed_seconds),
            remaining_seconds: remaining,
            formatted_remaining: remaining.map(format_duration),
            time_cap_seconds: config.time_cap_seconds,
            formatted_time_cap: config.time_cap_seconds.map(format_duration),
            countdown: state.countdown_remaining,
            rounds_completed: state.rounds_completed,
            rounds_enabled: format.is_amrap() && state.phase == Phase::Running,
            emom_minute: state.emom_minute,
            tabata_phase: timer.tabata_phase(),
            tabata_phase_remaining,
            formatted_tabata_phase_remaining: tabata_phase_remaining.map(format_duration),
            tabata_round: state.tabata_cycle_index,
            tabata_rounds_total: format.is_tabata().then_some(TABATA_ROUNDS),
            instructions: format.instructions(),
        }
    }
}
