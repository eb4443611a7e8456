use log::error;
use notify_rust::Notification;

/// Fire-and-forget alert at a phase boundary. No delivery guarantee and no
/// error surfaced to the timer; implementations log failures themselves.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Desktop notifications via the platform notification service.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Err(err) = Notification::new().summary(title).body(message).show() {
            error!("Failed to send notification: {err}");
        }
    }
}
