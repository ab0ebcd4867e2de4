// ABOUTME: In-process publish/subscribe for progress messages and change notifications
// ABOUTME: Delivery is synchronous on the publishing thread; subscribers must re-dispatch if needed

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Callback registry shared by the message bus and the progress tracker.
///
/// Callbacks run on whichever thread calls [`Subscribers::notify`], in
/// subscription order. A UI subscriber has to marshal onto its own thread.
pub struct Subscribers<T> {
    next_id: AtomicU64,
    callbacks: RwLock<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            callbacks: RwLock::new(Vec::new()),
        }
    }
}

impl<T> Subscribers<T> {
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.write().push((id, Arc::new(callback)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.write();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(&self, value: &T) {
        // Snapshot so a callback may (un)subscribe without deadlocking.
        let callbacks: Vec<Callback<T>> = self
            .callbacks
            .read()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(value);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressMessage {
    /// Display name of the action the message belongs to, if any.
    pub action: Option<String>,
    pub text: String,
}

#[derive(Default)]
pub struct ProgressMessageBus {
    subscribers: Subscribers<ProgressMessage>,
}

impl ProgressMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&ProgressMessage) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn publish(&self, text: impl Into<String>) {
        self.subscribers.notify(&ProgressMessage {
            action: None,
            text: text.into(),
        });
    }

    pub fn publish_for(&self, action: impl Into<String>, text: impl Into<String>) {
        self.subscribers.notify(&ProgressMessage {
            action: Some(action.into()),
            text: text.into(),
        });
    }
}

/// Subscriber that keeps every message it receives, in arrival order.
#[derive(Clone, Default)]
pub struct MessageLog {
    entries: Arc<Mutex<Vec<ProgressMessage>>>,
}

impl MessageLog {
    /// Creates a log already subscribed to `bus`.
    pub fn attach(bus: &ProgressMessageBus) -> (Self, SubscriptionId) {
        let log = Self::default();
        let sink = log.clone();
        let id = bus.subscribe(move |message| sink.entries.lock().push(message.clone()));
        (log, id)
    }

    pub fn entries(&self) -> Vec<ProgressMessage> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
