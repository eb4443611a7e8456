pub mod controller;
pub mod state;

pub use controller::{TimerController, TimerEvent};
pub use state::{
    Phase, PhaseTimer, TickOutcome, TimerSnapshot, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES,
};
