use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use log::{info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time,
};

use crate::{notify::Notifier, settings::SettingsStore};

use super::{Phase, PhaseTimer, TickOutcome, TimerSnapshot};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Pushed to the display surface over the broadcast channel. `PhaseSwitched`
/// is the only variant that coincides with a notification; `reset()` and
/// plain ticks produce `StateChanged`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum TimerEvent {
    StateChanged { snapshot: TimerSnapshot },
    PhaseSwitched { phase: Phase, snapshot: TimerSnapshot },
}

/// Drives a [`PhaseTimer`] with a one-second tokio ticker and wires its
/// transitions to the settings store, the notifier and the display channel.
///
/// The `ticker` slot holds the handle of the single active tick task;
/// together with the running flag inside [`PhaseTimer`] it guarantees that
/// at most one tick source exists per controller, so a double `start()`
/// can never double-decrement.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<PhaseTimer>>,
    settings: Arc<SettingsStore>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<TimerEvent>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl TimerController {
    /// Builds the controller with durations already loaded from the store,
    /// so the first snapshot a subscriber sees reflects persisted settings
    /// rather than the built-in defaults.
    pub fn new(settings: Arc<SettingsStore>, notifier: Arc<dyn Notifier>) -> Self {
        let durations = settings.durations();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            state: Arc::new(Mutex::new(PhaseTimer::new(
                durations.work_minutes,
                durations.break_minutes,
            ))),
            settings,
            notifier,
            events,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Starts the countdown. Idempotent: calling while already running
    /// leaves the existing ticker in place.
    pub async fn start(&self) -> TimerSnapshot {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.start() {
                return state.snapshot();
            }
            state.snapshot()
        };

        self.spawn_ticker().await;
        info!("Timer started ({})", snapshot.phase_label);
        self.emit_state_changed(snapshot.clone());
        snapshot
    }

    /// Pauses the countdown. Idempotent when already paused.
    pub async fn pause(&self) -> TimerSnapshot {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.pause() {
                return state.snapshot();
            }
            state.snapshot()
        };

        self.cancel_ticker().await;
        info!("Timer paused at {}:{}", snapshot.minutes_text, snapshot.seconds_text);
        self.emit_state_changed(snapshot.clone());
        snapshot
    }

    /// Stops any running ticker and rewinds to a full work phase. Fires no
    /// notification; only a natural phase switch does.
    pub async fn reset(&self) -> TimerSnapshot {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.reset();
            state.snapshot()
        };

        self.cancel_ticker().await;
        info!("Timer reset to {}:00 work", snapshot.minutes_text);
        self.emit_state_changed(snapshot.clone());
        snapshot
    }

    /// Validates and applies new durations, persists them, then resets.
    /// A failed persist is logged and swallowed: the new durations still
    /// apply for this session and nothing stops the timer over storage.
    pub async fn apply_settings(&self, work_minutes: u32, break_minutes: u32) -> Result<TimerSnapshot> {
        if work_minutes == 0 || break_minutes == 0 {
            return Err(anyhow!("durations must be greater than zero minutes"));
        }

        if let Err(err) = self.settings.update(work_minutes, break_minutes) {
            warn!("Failed to persist settings, keeping them for this session: {err:#}");
        }

        let snapshot = {
            let mut state = self.state.lock().await;
            state.set_durations(work_minutes, break_minutes);
            state.snapshot()
        };

        self.cancel_ticker().await;
        info!("Settings applied: {work_minutes}min work / {break_minutes}min break");
        self.emit_state_changed(snapshot.clone());
        Ok(snapshot)
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let notifier = self.notifier.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            // The first interval tick completes immediately; consume it so
            // the countdown only moves a full second after start.
            interval.tick().await;

            loop {
                interval.tick().await;

                let (outcome, snapshot) = {
                    let mut guard = state.lock().await;
                    let outcome = guard.tick();
                    (outcome, guard.snapshot())
                };

                match outcome {
                    TickOutcome::Ignored => break,
                    TickOutcome::Decremented => {
                        let _ = events.send(TimerEvent::StateChanged { snapshot });
                    }
                    TickOutcome::PhaseSwitched(phase) => {
                        info!("Phase switched to {}", phase.label());
                        notifier.notify("Pomotick", phase.notification_message());
                        let _ = events.send(TimerEvent::PhaseSwitched { phase, snapshot });
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    fn emit_state_changed(&self, snapshot: TimerSnapshot) {
        let _ = self.events.send(TimerEvent::StateChanged { snapshot });
    }

    #[cfg(test)]
    pub(crate) fn state_handle(&self) -> Arc<Mutex<PhaseTimer>> {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct RecordingNotifier {
        sent: StdMutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: StdMutex::new(Vec::new()),
            })
        }

        fn messages(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, message: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }

    fn controller_with_notifier() -> (TimerController, Arc<RecordingNotifier>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")));
        let notifier = RecordingNotifier::new();
        let controller = TimerController::new(settings, notifier.clone());
        (controller, notifier, dir)
    }

    async fn remaining(controller: &TimerController) -> (u32, u32) {
        let state = controller.state_handle();
        let guard = state.lock().await;
        (guard.remaining_minutes, guard.remaining_seconds)
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_a_single_ticker() {
        let (controller, _notifier, _dir) = controller_with_notifier();

        controller.start().await;
        controller.start().await;

        // With two tickers this would lose six seconds instead of three.
        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(remaining(&controller).await, (24, 57));
    }

    #[tokio::test(start_paused = true)]
    async fn boundary_tick_switches_phase_and_notifies_once() {
        let (controller, notifier, _dir) = controller_with_notifier();
        controller.apply_settings(1, 2).await.unwrap();
        controller.start().await;

        // 60 decrements reach 00:00, the 61st tick is the switch.
        time::sleep(Duration::from_millis(61_500)).await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Break);
        assert_eq!(snapshot.minutes_text, "02");
        assert_eq!(snapshot.seconds_text, "00");
        assert!(snapshot.running, "switch must not pause the countdown");

        let sent = notifier.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("Pomotick".to_string(), "Time to break!".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_the_countdown() {
        let (controller, _notifier, _dir) = controller_with_notifier();

        controller.start().await;
        time::sleep(Duration::from_millis(2500)).await;
        controller.pause().await;
        let before = remaining(&controller).await;

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(remaining(&controller).await, before);

        let snapshot = controller.snapshot().await;
        assert!(snapshot.start_enabled);
        assert!(!snapshot.pause_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_is_silent_and_rewinds_to_work() {
        let (controller, notifier, _dir) = controller_with_notifier();

        controller.start().await;
        time::sleep(Duration::from_millis(5500)).await;
        controller.reset().await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Work);
        assert_eq!(snapshot.minutes_text, "25");
        assert_eq!(snapshot.seconds_text, "00");
        assert!(!snapshot.running);
        assert!(notifier.messages().is_empty());

        // No orphaned ticker keeps decrementing after the reset.
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(remaining(&controller).await, (25, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn apply_settings_rejects_zero_durations() {
        let (controller, _notifier, _dir) = controller_with_notifier();

        assert!(controller.apply_settings(0, 5).await.is_err());
        assert!(controller.apply_settings(10, 0).await.is_err());

        // Rejected input leaves the defaults intact.
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.minutes_text, "25");
    }

    #[tokio::test(start_paused = true)]
    async fn apply_settings_resets_to_new_work_duration() {
        let (controller, notifier, _dir) = controller_with_notifier();

        controller.start().await;
        time::sleep(Duration::from_millis(3500)).await;

        let snapshot = controller.apply_settings(10, 2).await.unwrap();
        assert_eq!(snapshot.phase, Phase::Work);
        assert_eq!(snapshot.minutes_text, "10");
        assert_eq!(snapshot.seconds_text, "00");
        assert!(!snapshot.running, "apply_settings forces a pause via reset");
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn events_reach_subscribers() {
        let (controller, _notifier, _dir) = controller_with_notifier();
        let mut events = controller.subscribe();

        controller.start().await;
        match events.recv().await.unwrap() {
            TimerEvent::StateChanged { snapshot } => {
                assert!(snapshot.running);
                assert_eq!(snapshot.minutes_text, "25");
            }
            other => panic!("expected StateChanged, got {other:?}"),
        }

        time::sleep(Duration::from_millis(1500)).await;
        match events.recv().await.unwrap() {
            TimerEvent::StateChanged { snapshot } => {
                assert_eq!(snapshot.seconds_text, "59");
            }
            other => panic!("expected StateChanged, got {other:?}"),
        }
    }
}
