use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

/// Change signals published after mutations. Events carry no payload;
/// observers re-query the store for current values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// An unread total may have changed; badge counters should re-fetch.
    UnreadChanged,
    /// A thread entered the reported state; compose affordances should lock.
    ThreadReported,
}

/// Registry of subscriber channels. Publishing walks the list and prunes
/// subscribers whose receiving end has been dropped.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<StoreEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    pub fn publish(&self, event: StoreEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_every_subscriber() {
        let bus = EventBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();
        bus.publish(StoreEvent::UnreadChanged);
        assert_eq!(first.try_recv(), Ok(StoreEvent::UnreadChanged));
        assert_eq!(second.try_recv(), Ok(StoreEvent::UnreadChanged));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        bus.publish(StoreEvent::ThreadReported);
        bus.publish(StoreEvent::UnreadChanged);
        assert_eq!(keep.try_recv(), Ok(StoreEvent::ThreadReported));
        assert_eq!(keep.try_recv(), Ok(StoreEvent::UnreadChanged));
    }
}
