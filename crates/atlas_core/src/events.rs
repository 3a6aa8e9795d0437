//! Change Notification Bus
//!
//! Resources push "I changed" and "this failed" events; consumers (materials,
//! editors) hold a [`flume::Receiver`] per topic and pull programs again when
//! something arrives. Nothing is recompiled on their behalf.

use flume::{Receiver, Sender};

use crate::errors::{ScriptError, ShaderError};
use crate::variant::VariantKey;

/// Channel an event is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Modified,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderEvent {
    /// The resource was reparsed from new text.
    Modified { name: String, fingerprint: u64 },
    /// The resource's programs were dropped because a dependency changed.
    Invalidated { name: String, dependency: String },
    /// Building a variant failed permanently.
    ProgramFailed {
        name: String,
        key: VariantKey,
        error: ShaderError,
    },
    /// The script host rejected the resource's init script.
    ScriptFailed { name: String, error: ScriptError },
}

impl ShaderEvent {
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::Modified { .. } | Self::Invalidated { .. } => Topic::Modified,
            Self::ProgramFailed { .. } | Self::ScriptFailed { .. } => Topic::Error,
        }
    }

    /// Name of the resource the event is about.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Modified { name, .. }
            | Self::Invalidated { name, .. }
            | Self::ProgramFailed { name, .. }
            | Self::ScriptFailed { name, .. } => name,
        }
    }
}

/// Fan-out of [`ShaderEvent`]s to per-topic subscribers.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(Topic, Sender<ShaderEvent>)>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Opens an unbounded subscription to `topic`.
    ///
    /// Dropping the receiver unsubscribes; the sender is pruned on the next
    /// broadcast.
    pub fn subscribe(&mut self, topic: Topic) -> Receiver<ShaderEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push((topic, tx));
        rx
    }

    pub fn broadcast(&mut self, event: &ShaderEvent) {
        let topic = event.topic();
        self.subscribers.retain(|(sub_topic, tx)| {
            if *sub_topic != topic {
                return !tx.is_disconnected();
            }
            tx.send(event.clone()).is_ok()
        });
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modified(name: &str) -> ShaderEvent {
        ShaderEvent::Modified {
            name: name.to_string(),
            fingerprint: 7,
        }
    }

    #[test]
    fn test_broadcast_reaches_topic_subscribers_only() {
        let mut bus = EventBus::new();
        let modified_rx = bus.subscribe(Topic::Modified);
        let error_rx = bus.subscribe(Topic::Error);

        bus.broadcast(&modified("a.shader"));

        assert_eq!(modified_rx.try_recv().unwrap(), modified("a.shader"));
        assert!(error_rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let mut bus = EventBus::new();
        let kept = bus.subscribe(Topic::Modified);
        drop(bus.subscribe(Topic::Modified));
        drop(bus.subscribe(Topic::Error));
        assert_eq!(bus.subscriber_count(), 3);

        bus.broadcast(&modified("a.shader"));

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.len(), 1);
    }
}
