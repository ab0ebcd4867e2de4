// ABOUTME: Callbacks the engine invokes as actions and content batches complete
// ABOUTME: Advances the progress cursor and publishes a status block per finished batch

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bus::ProgressMessageBus;
use crate::engine::{BatchItem, ContentType, ItemStatus};
use crate::parser::format_error_block;
use crate::progress::ProgressTracker;

pub trait ActionCompletedHook: Send + Sync {
    fn on_action_completed(&self);
}

pub trait BatchCompletedHook: Send + Sync {
    fn on_batch_completed(&self, items: &[BatchItem]);
}

/// Hooks attached to a plan. Engines call into it from any task; delivery is
/// serialized so hook state never sees concurrent writers.
#[derive(Clone, Default)]
pub struct HookRegistry {
    action_hooks: Vec<Arc<dyn ActionCompletedHook>>,
    batch_hooks: HashMap<String, Vec<Arc<dyn BatchCompletedHook>>>,
    delivery: Arc<Mutex<()>>,
}

impl HookRegistry {
    pub fn add_action_hook(&mut self, hook: Arc<dyn ActionCompletedHook>) {
        self.action_hooks.push(hook);
    }

    pub fn add_batch_hook(&mut self, content_type: &ContentType, hook: Arc<dyn BatchCompletedHook>) {
        self.batch_hooks
            .entry(content_type.config_key.clone())
            .or_default()
            .push(hook);
    }

    pub fn action_hook_count(&self) -> usize {
        self.action_hooks.len()
    }

    pub fn batch_hook_count(&self, content_type: &ContentType) -> usize {
        self.batch_hooks
            .get(&content_type.config_key)
            .map_or(0, Vec::len)
    }

    pub fn action_completed(&self) {
        let _guard = self.delivery.lock();
        for hook in &self.action_hooks {
            hook.on_action_completed();
        }
    }

    pub fn batch_completed(&self, content_type: &ContentType, items: &[BatchItem]) {
        let _guard = self.delivery.lock();
        if let Some(hooks) = self.batch_hooks.get(&content_type.config_key) {
            for hook in hooks {
                hook.on_batch_completed(items);
            }
        }
    }
}

pub struct ActionProgressHook {
    tracker: Option<Arc<ProgressTracker>>,
}

impl ActionProgressHook {
    pub fn new(tracker: Option<Arc<ProgressTracker>>) -> Self {
        Self { tracker }
    }
}

impl ActionCompletedHook for ActionProgressHook {
    fn on_action_completed(&self) {
        if let Some(tracker) = &self.tracker {
            tracker.advance();
        }
    }
}

pub struct BatchCompletionHook {
    content_type: ContentType,
    display_name: String,
    bus: Option<Arc<ProgressMessageBus>>,
}

impl BatchCompletionHook {
    pub fn new(content_type: ContentType, bus: Option<Arc<ProgressMessageBus>>) -> Self {
        let display_name = content_type.display_name();
        Self {
            content_type,
            display_name,
            bus,
        }
    }
}

impl BatchCompletedHook for BatchCompletionHook {
    fn on_batch_completed(&self, items: &[BatchItem]) {
        if items.is_empty() {
            tracing::debug!(
                "Batch for {} completed with no items",
                self.content_type.config_key
            );
            return;
        }

        let Some(bus) = &self.bus else {
            return;
        };

        bus.publish_for(&self.display_name, format_batch(items));
    }
}

pub fn status_icon(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Pending => "🟡",
        ItemStatus::Skipped => "🔵",
        ItemStatus::Migrated => "🟢",
        ItemStatus::Error | ItemStatus::Canceled => "🔴",
    }
}

/// One status line per item, each followed by the item's error blocks.
pub fn format_batch(items: &[BatchItem]) -> String {
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        lines.push(format!(
            "{} [{}] to [{}] → {}",
            status_icon(item.status),
            item.source_location,
            item.destination_location,
            item.status
        ));
        lines.extend(item.errors.iter().map(|raw| format_error_block(raw)));
    }

    lines.join("\n")
}
