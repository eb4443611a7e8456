pub mod notify;
pub mod settings;
pub mod timer;

pub use notify::{DesktopNotifier, Notifier};
pub use settings::{SettingsStore, TimerDurations};
pub use timer::{Phase, PhaseTimer, TimerController, TimerEvent, TimerSnapshot};
