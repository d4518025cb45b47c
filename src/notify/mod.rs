//! Chat alerts.
//!
//! - `message` builds the alert text from a run's results
//! - `telegram` delivers it through the bot api
//! - `retry` is the fixed-delay retry policy used for delivery

pub mod message;
pub mod retry;
pub mod telegram;

use tracing::debug;

pub use telegram::TelegramNotifier;

/// Delivery is best effort: implementations log failures and return.
pub trait Notifier {
    fn send(&self, text: &str);
}

/// Used for offline runs.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send(&self, text: &str) {
        debug!(chars = text.chars().count(), "offline, alert not sent");
    }
}
