use serde::{Deserialize, Serialize};

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Work,
    Break,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Work
    }
}

impl Phase {
    pub fn flipped(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work Time",
            Phase::Break => "Break Time",
        }
    }

    pub fn notification_message(self) -> &'static str {
        match self {
            Phase::Work => "Time to work!",
            Phase::Break => "Time to break!",
        }
    }
}

/// Result of feeding one tick into the state machine. The controller uses
/// this to decide whether a notification should fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick arrived while not running; state untouched.
    Ignored,
    /// Remaining time went down by one second.
    Decremented,
    /// Remaining time was already 00:00; the phase flipped and remaining
    /// time was reloaded from the new phase's duration. The tick that lands
    /// on 00:00 is consumed by the switch, not spent going negative.
    PhaseSwitched(Phase),
}

/// Pure countdown state machine: two phases, minute/second counters, a
/// running flag. No clocks, no channels, no I/O; the [`TimerController`]
/// owns the tick source and side effects.
///
/// [`TimerController`]: super::TimerController
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTimer {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub phase: Phase,
    pub remaining_minutes: u32,
    pub remaining_seconds: u32,
    pub running: bool,
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_MINUTES, DEFAULT_BREAK_MINUTES)
    }
}

impl PhaseTimer {
    pub fn new(work_minutes: u32, break_minutes: u32) -> Self {
        Self {
            work_minutes,
            break_minutes,
            phase: Phase::Work,
            remaining_minutes: work_minutes,
            remaining_seconds: 0,
            running: false,
        }
    }

    fn duration_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes,
            Phase::Break => self.break_minutes,
        }
    }

    /// Marks the timer running. Returns false when it already was, so the
    /// caller knows not to spawn a second tick source.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Marks the timer paused. Returns false when it already was.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// Stops the countdown and rewinds to a full work phase. Silent: a reset
    /// is not a phase switch and must not produce a notification.
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.remaining_minutes = self.work_minutes;
        self.remaining_seconds = 0;
    }

    /// Overwrites both durations and rewinds. Callers validate that the
    /// minutes are positive before getting here.
    pub fn set_durations(&mut self, work_minutes: u32, break_minutes: u32) {
        self.work_minutes = work_minutes;
        self.break_minutes = break_minutes;
        self.reset();
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            // Stray tick after a pause; the ticker task may race its own
            // shutdown by one event.
            return TickOutcome::Ignored;
        }

        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
            TickOutcome::Decremented
        } else if self.remaining_minutes > 0 {
            self.remaining_minutes -= 1;
            self.remaining_seconds = 59;
            TickOutcome::Decremented
        } else {
            TickOutcome::PhaseSwitched(self.switch_phase())
        }
    }

    /// Flips to the other phase and reloads remaining time from its
    /// configured duration. Running state is untouched: the countdown
    /// rolls straight into the new phase.
    fn switch_phase(&mut self) -> Phase {
        self.phase = self.phase.flipped();
        self.remaining_minutes = self.duration_for(self.phase);
        self.remaining_seconds = 0;
        self.phase
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            phase_label: self.phase.label(),
            minutes_text: format!("{:02}", self.remaining_minutes),
            seconds_text: format!("{:02}", self.remaining_seconds),
            running: self.running,
            start_enabled: !self.running,
            pause_enabled: self.running,
        }
    }
}

/// What the display surface renders: pre-padded digit strings, the phase
/// label, and which of the start/pause controls is currently enabled.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub phase_label: &'static str,
    pub minutes_text: String,
    pub seconds_text: String,
    pub running: bool,
    pub start_enabled: bool,
    pub pause_enabled: bool,
}
