//! Progress events from concurrently running transfers
//!
//! Every transfer holds a clone of one [`ProgressSink`]; a single consumer
//! drains the receiving end.

use tokio::sync::mpsc;

use crate::orchestrator::TransferStep;

/// What happened to a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressKind {
    /// Transfer began; `total` steps to go
    Started { total: usize },
    /// A step finished successfully
    StepCompleted {
        step: TransferStep,
        completed: usize,
        total: usize,
    },
    /// Transfer finished, successfully or not
    Finished { success: bool },
}

/// Progress of one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Position of the image in the deduplicated input
    pub index: usize,
    /// Image reference being transferred
    pub image: String,
    pub kind: ProgressKind,
}

/// Sending half of the progress channel
///
/// A disabled sink drops every event.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    /// Create a sink and its receiver
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// Sink that drops every event
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Deliver an event
    ///
    /// Events sent after the receiver is gone are dropped.
    pub fn emit(&self, index: usize, image: &str, kind: ProgressKind) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(ProgressEvent {
                index,
                image: image.to_string(),
                kind,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_send_order() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.emit(0, "nginx", ProgressKind::Started { total: 5 });
        sink.emit(0, "nginx", ProgressKind::Finished { success: true });
        drop(sink);

        assert_eq!(rx.recv().await.unwrap().kind, ProgressKind::Started { total: 5 });
        assert_eq!(
            rx.recv().await.unwrap().kind,
            ProgressKind::Finished { success: true }
        );
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn disabled_sink_drops_events() {
        let sink = ProgressSink::disabled();
        sink.emit(0, "nginx", ProgressKind::Started { total: 5 });
    }

    #[test]
    fn closed_receiver_is_ignored() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.emit(1, "redis", ProgressKind::Finished { success: false });
    }
}
