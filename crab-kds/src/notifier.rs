//! New-arrival notifier
//!
//! Fire-and-forget: a notifier must never block or fail the recompute that
//! triggers it, so `notify` has no return value and implementations swallow
//! their own errors.

use std::io::Write;
use tokio::sync::mpsc;

use crate::adapter::NewIds;

pub trait Notifier: Send + Sync {
    /// Called at most once per recompute, only with a non-empty set
    fn notify(&self, new_ids: &NewIds);
}

/// Logs new arrivals
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, new_ids: &NewIds) {
        tracing::info!(count = new_ids.len(), "New orders in kitchen");
    }
}

/// Forwards new arrivals to a channel (e.g. an audio player task)
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<NewIds>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NewIds>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, new_ids: &NewIds) {
        if self.tx.send(new_ids.clone()).is_err() {
            tracing::debug!("Notifier receiver dropped, alert skipped");
        }
    }
}

/// Rings the terminal bell
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn notify(&self, _new_ids: &NewIds) {
        let mut out = std::io::stdout();
        // Ignored to keep the board responsive
        let _ = out.write_all(b"\x07").and_then(|_| out.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::kitchen::OrderId;

    #[test]
    fn test_channel_notifier_forwards() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let ids: NewIds = [OrderId::new("a")].into_iter().collect();

        notifier.notify(&ids);
        assert_eq!(rx.try_recv().unwrap(), ids);
    }

    #[test]
    fn test_channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify(&[OrderId::new("a")].into_iter().collect());
    }
}
