//! Timer session driver task
//!
//! Each loaded workout gets one task that exclusively owns its
//! [`WorkoutTimer`]. The task is the timer's clock: it delivers a tick every
//! second while the engine has a callback armed, and it serialises user
//! operations arriving from any number of [`TimerHandle`] clones.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::timer::{CueEmitter, TimerView, WorkoutTimer};

/// Tick period of the clock source
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// User operations that can be applied to a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOp {
    Start,
    Pause,
    Resume,
    Reset,
    AddRound,
    SubtractRound,
}

impl TimerOp {
    /// Apply the operation, returning whether the timer accepted it
    pub fn apply<C: CueEmitter>(self, timer: &mut WorkoutTimer<C>) -> bool {
        match self {
            TimerOp::Start => timer.start(),
            TimerOp::Pause => timer.pause(),
            TimerOp::Resume => timer.resume(),
            TimerOp::Reset => timer.reset(),
            TimerOp::AddRound => timer.add_round(),
            TimerOp::SubtractRound => timer.subtract_round(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TimerOp::Start => "start",
            TimerOp::Pause => "pause",
            TimerOp::Resume => "resume",
            TimerOp::Reset => "reset",
            TimerOp::AddRound => "add-round",
            TimerOp::SubtractRound => "subtract-round",
        }
    }
}

/// Result of applying one operation
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub accepted: bool,
    pub view: TimerView,
}

enum TimerCommand {
    Apply {
        op: TimerOp,
        reply: oneshot::Sender<Outcome>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a timer session.
///
/// The session is torn down by [`TimerHandle::shutdown`] or once every
/// clone has been dropped.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<TimerCommand>,
    updates: watch::Receiver<TimerView>,
}

impl TimerHandle {
    /// Apply an operation and wait for the resulting projection
    pub async fn apply(&self, op: TimerOp) -> Result<Outcome, String> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(TimerCommand::Apply { op, reply })
            .await
            .map_err(|_| "Timer session has ended".to_string())?;

        response
            .await
            .map_err(|_| "Timer session ended before replying".to_string())
    }

    /// Latest projection published by the session
    pub fn view(&self) -> TimerView {
        self.updates.borrow().clone()
    }

    /// Tear the session down and wait until the timer has released its
    /// audio device. Shutting down an ended session is not an error.
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self
            .commands
            .send(TimerCommand::Shutdown { reply })
            .await
            .is_ok()
        {
            let _ = done.await;
        }
    }
}

/// Move a timer into its own driver task
pub fn spawn_timer<C>(timer: WorkoutTimer<C>) -> TimerHandle
where
    C: CueEmitter + 'static,
{
    let (commands, command_rx) = mpsc::channel(32);
    let (update_tx, updates) = watch::channel(TimerView::project(&timer));

    tokio::spawn(timer_driver_task(timer, command_rx, update_tx));

    TimerHandle { commands, updates }
}

/// Background task that owns a timer until the session ends
async fn timer_driver_task<C: CueEmitter>(
    mut timer: WorkoutTimer<C>,
    mut commands: mpsc::Receiver<TimerCommand>,
    updates: watch::Sender<TimerView>,
) {
    info!("Starting timer driver for {:?}", timer.config().format_label);

    let mut interval = tokio::time::interval(TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let armed = timer.schedule().is_some();

        tokio::select! {
            _ = interval.tick(), if armed => {
                timer.tick();
                updates.send_replace(TimerView::project(&timer));
            }

            command = commands.recv() => {
                match command {
                    Some(TimerCommand::Apply { op, reply }) => {
                        let accepted = op.apply(&mut timer);

                        // First tick lands one full period after arming
                        if !armed && timer.schedule().is_some() {
                            interval.reset();
                        }

                        let view = TimerView::project(&timer);
                        updates.send_replace(view.clone());
                        let _ = reply.send(Outcome { accepted, view });
                    }
                    Some(TimerCommand::Shutdown { reply }) => {
                        timer.teardown();
                        updates.send_replace(TimerView::project(&timer));
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        debug!("All timer handles dropped");
                        timer.teardown();
                        break;
                    }
                }
            }
        }
    }

    info!("Timer driver stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{MemoryCues, Phase, TimerConfig};
    use tokio::time::sleep;

    fn spawn_probe(label: &str, cap_minutes: Option<u32>) -> (TimerHandle, MemoryCues) {
        let probe = MemoryCues::new();
        let timer = WorkoutTimer::new(TimerConfig::new(label, cap_minutes), probe.clone());
        (spawn_timer(timer), probe)
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_then_runs() {
        let (handle, probe) = spawn_probe("For time", None);

        let outcome = handle.apply(TimerOp::Start).await.unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.view.countdown, Some(10));
        assert_eq!(probe.primes(), 1);

        sleep(Duration::from_millis(9_500)).await;
        assert_eq!(handle.view().phase, Phase::CountingDown);
        assert_eq!(handle.view().countdown, Some(1));

        sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.view().phase, Phase::Running);
        assert_eq!(handle.view().elapsed_seconds, 0);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.view().elapsed_seconds, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_the_clock() {
        let (handle, _) = spawn_probe("AMRAP", None);
        handle.apply(TimerOp::Start).await.unwrap();
        sleep(Duration::from_millis(13_500)).await;
        assert_eq!(handle.view().elapsed_seconds, 3);

        assert!(handle.apply(TimerOp::Pause).await.unwrap().accepted);
        sleep(Duration::from_secs(20)).await;
        assert_eq!(handle.view().elapsed_seconds, 3);

        assert!(handle.apply(TimerOp::Resume).await.unwrap().accepted);
        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(handle.view().elapsed_seconds, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_operation_reports_unchanged_view() {
        let (handle, probe) = spawn_probe("AMRAP", None);

        let outcome = handle.apply(TimerOp::AddRound).await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.view.rounds_completed, 0);
        assert_eq!(outcome.view.phase, Phase::Idle);
        assert_eq!(probe.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expires_at_cap() {
        let (handle, _) = spawn_probe("AMRAP 1", Some(1));
        handle.apply(TimerOp::Start).await.unwrap();

        sleep(Duration::from_secs(75)).await;
        let view = handle.view();
        assert_eq!(view.phase, Phase::Expired);
        assert_eq!(view.elapsed_seconds, 60);
        assert!(view.is_time_up);
        assert_eq!(view.formatted_remaining.as_deref(), Some("00:00"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_ticks_and_cues() {
        let (handle, probe) = spawn_probe("Tabata", None);
        handle.apply(TimerOp::Start).await.unwrap();
        sleep(Duration::from_millis(25_500)).await;

        handle.shutdown().await;
        assert_eq!(probe.releases(), 1);

        let cues = probe.count();
        let view = handle.view();
        sleep(Duration::from_secs(120)).await;
        assert_eq!(probe.count(), cues);
        assert_eq!(handle.view(), view);
        assert!(handle.apply(TimerOp::Pause).await.is_err());

        handle.shutdown().await;
        assert_eq!(probe.releases(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_handle_tears_down() {
        let (handle, probe) = spawn_probe("EMOM", None);
        handle.apply(TimerOp::Start).await.unwrap();

        let extra = handle.clone();
        drop(handle);
        sleep(Duration::from_secs(2)).await;
        assert_eq!(probe.releases(), 0);

        drop(extra);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(probe.releases(), 1);

        let cues = probe.count();
        sleep(Duration::from_secs(120)).await;
        assert_eq!(probe.count(), cues);
    }
}
