// ABOUTME: Action-index cursor for the running migration
// ABOUTME: -1 before start, 0..N-1 for catalog entries, N once every action has completed

use parking_lot::Mutex;
use std::sync::Arc;

use crate::bus::{SubscriptionId, Subscribers};
use crate::catalog::ActionCatalog;

pub const FINISHED_MESSAGE: &str = "Migration Finished.";

const NOT_STARTED: i64 = -1;

/// What progress subscribers receive after every index change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub index: i64,
    pub name: String,
    pub message: String,
}

pub struct ProgressTracker {
    catalog: Arc<ActionCatalog>,
    index: Mutex<i64>,
    subscribers: Subscribers<ProgressSnapshot>,
}

impl ProgressTracker {
    pub fn new(catalog: Arc<ActionCatalog>) -> Self {
        Self {
            catalog,
            index: Mutex::new(NOT_STARTED),
            subscribers: Subscribers::default(),
        }
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn current_index(&self) -> i64 {
        *self.index.lock()
    }

    /// Moves the cursor one action forward. Ignored once the cursor is past
    /// the last action.
    pub fn advance(&self) {
        let next = self.current_index() + 1;
        self.set_index(next);
    }

    pub fn reset(&self) {
        self.set_index(NOT_STARTED);
    }

    /// Values above the action count are ignored rather than clamped, so a
    /// late duplicate hook delivery cannot push the cursor out of range.
    /// Returns whether the index changed.
    pub fn set_index(&self, value: i64) -> bool {
        let total = self.catalog.len() as i64;
        {
            let mut index = self.index.lock();
            if value > total || value < NOT_STARTED {
                tracing::debug!(
                    "Ignoring action index {} (action count {})",
                    value,
                    total
                );
                return false;
            }
            *index = value;
        }

        self.subscribers.notify(&self.snapshot());
        true
    }

    pub fn current_name(&self) -> String {
        let index = self.current_index();
        if index < 0 {
            return String::new();
        }
        self.catalog
            .get(index as usize)
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn current_message(&self) -> String {
        let index = self.current_index();
        if index < 0 {
            String::new()
        } else if index >= self.catalog.len() as i64 {
            FINISHED_MESSAGE.to_string()
        } else {
            self.current_name()
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            index: self.current_index(),
            name: self.current_name(),
            message: self.current_message(),
        }
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&ProgressSnapshot) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}
