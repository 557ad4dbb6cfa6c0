//! Audio cue contract and in-process emitters
//!
//! Cues are best-effort: every emitter method returns `()` and an emitter
//! must swallow its own failures.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

/// A short tone: pitch and length
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cue {
    pub frequency_hz: f32,
    pub duration_secs: f32,
}

impl Cue {
    const fn new(frequency_hz: f32, duration_secs: f32) -> Self {
        Self {
            frequency_hz,
            duration_secs,
        }
    }

    /// Pre-start countdown at 3, 2, 1
    pub const COUNTDOWN: Cue = Cue::new(1000.0, 0.15);
    /// Countdown reached zero
    pub const GO: Cue = Cue::new(1200.0, 0.3);
    pub const EMOM_MINUTE: Cue = Cue::new(880.0, 0.1);
    /// Progress marker for formats without their own minute cue
    pub const MINUTE_MARKER: Cue = Cue::new(600.0, 0.08);
    pub const HALFWAY: Cue = Cue::new(700.0, 0.2);
    pub const THIRTY_LEFT: Cue = Cue::new(900.0, 0.15);
    pub const FINAL_TEN: Cue = Cue::new(1000.0, 0.1);
    pub const TABATA_WORK: Cue = Cue::new(1000.0, 0.1);
    pub const TABATA_REST: Cue = Cue::new(440.0, 0.1);
    pub const TIME_UP: Cue = Cue::new(220.0, 0.5);
    pub const PAUSE: Cue = Cue::new(500.0, 0.1);
    pub const RESUME: Cue = Cue::new(600.0, 0.1);
    pub const RESET: Cue = Cue::new(400.0, 0.15);
    pub const ROUND_ADDED: Cue = Cue::new(800.0, 0.08);
    pub const ROUND_REMOVED: Cue = Cue::new(600.0, 0.08);
}

/// Sink for audible cues
pub trait CueEmitter: Send {
    /// Acquire (or resume) the output device. Must be called from the user
    /// action that starts the timer. Idempotent.
    fn prime(&mut self);

    /// Schedule a tone. Fire-and-forget.
    fn beep(&mut self, frequency_hz: f32, duration_secs: f32);

    /// Release the output device. Idempotent.
    fn release(&mut self);
}

impl<C: CueEmitter + ?Sized> CueEmitter for Box<C> {
    fn prime(&mut self) {
        (**self).prime()
    }

    fn beep(&mut self, frequency_hz: f32, duration_secs: f32) {
        (**self).beep(frequency_hz, duration_secs)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Emitter that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCues;

impl CueEmitter for SilentCues {
    fn prime(&mut self) {}

    fn beep(&mut self, _frequency_hz: f32, _duration_secs: f32) {}

    fn release(&mut self) {}
}

/// Emitter that writes each cue to the log instead of a speaker
#[derive(Debug, Default)]
pub struct LogCues {
    primed: bool,
}

impl CueEmitter for LogCues {
    fn prime(&mut self) {
        if !self.primed {
            debug!("Cue output primed");
            self.primed = true;
        }
    }

    fn beep(&mut self, frequency_hz: f32, duration_secs: f32) {
        debug!("Cue: {}Hz for {}s", frequency_hz, duration_secs);
    }

    fn release(&mut self) {
        if self.primed {
            debug!("Cue output released");
            self.primed = false;
        }
    }
}

#[derive(Debug, Default)]
struct MemoryLog {
    cues: Vec<Cue>,
    primes: usize,
    releases: usize,
}

/// Emitter that records everything it is asked to do.
///
/// Clones share the same log, so a caller can keep one clone and hand the
/// other to a timer.
#[derive(Debug, Default, Clone)]
pub struct MemoryCues {
    log: Arc<Mutex<MemoryLog>>,
}

impl MemoryCues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cue emitted so far, oldest first
    pub fn cues(&self) -> Vec<Cue> {
        self.log.lock().map(|log| log.cues.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.log.lock().map(|log| log.cues.len()).unwrap_or(0)
    }

    pub fn last(&self) -> Option<Cue> {
        self.log.lock().ok().and_then(|log| log.cues.last().copied())
    }

    pub fn primes(&self) -> usize {
        self.log.lock().map(|log| log.primes).unwrap_or(0)
    }

    pub fn releases(&self) -> usize {
        self.log.lock().map(|log| log.releases).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.cues.clear();
        }
    }
}

impl CueEmitter for MemoryCues {
    fn prime(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.primes += 1;
        }
    }

    fn beep(&mut self, frequency_hz: f32, duration_secs: f32) {
        if let Ok(mut log) = self.log.lock() {
            log.cues.push(Cue {
                frequency_hz,
                duration_secs,
            });
        }
    }

    fn release(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.releases += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cues_share_log_between_clones() {
        let probe = MemoryCues::new();
        let mut emitter: Box<dyn CueEmitter> = Box::new(probe.clone());

        emitter.prime();
        emitter.beep(Cue::GO.frequency_hz, Cue::GO.duration_secs);
        emitter.release();

        assert_eq!(probe.primes(), 1);
        assert_eq!(probe.releases(), 1);
        assert_eq!(probe.cues(), vec![Cue::GO]);
    }

    #[test]
    fn log_cues_release_without_prime_is_harmless() {
        let mut cues = LogCues::default();
        cues.release();
        cues.prime();
        cues.prime();
        cues.release();
        cues.release();
        assert!(!cues.primed);
    }
}
