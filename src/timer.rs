// ABOUTME: Records run and per-action start times and formats elapsed durations
// ABOUTME: An action ends when the next action starts, so only start times are stored

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::ActionCatalog;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Default)]
struct TimerState {
    run_start: Option<DateTime<Utc>>,
    run_stop: Option<DateTime<Utc>>,
    action_starts: HashMap<String, DateTime<Utc>>,
}

pub struct MigrationTimer {
    catalog: Arc<ActionCatalog>,
    clock: Arc<dyn Clock>,
    state: Mutex<TimerState>,
}

impl MigrationTimer {
    pub fn new(catalog: Arc<ActionCatalog>) -> Self {
        Self::with_clock(catalog, Arc::new(SystemClock))
    }

    pub fn with_clock(catalog: Arc<ActionCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            clock,
            state: Mutex::new(TimerState::default()),
        }
    }

    pub fn update_on_start(&self) {
        self.state.lock().run_start = Some(self.clock.now());
    }

    pub fn update_on_finish(&self) {
        self.state.lock().run_stop = Some(self.clock.now());
    }

    /// Records the start of `action_name`. Empty names and names that already
    /// have a start time are reported and otherwise ignored.
    pub fn update_on_action_completed(&self, action_name: &str) {
        if action_name.is_empty() {
            tracing::error!("Cannot record start time for an action with an empty name");
            return;
        }

        let now = self.clock.now();
        let mut state = self.state.lock();
        if state.action_starts.contains_key(action_name) {
            tracing::warn!(
                "Start time for action '{}' already recorded, keeping the first one",
                action_name
            );
            return;
        }
        state.action_starts.insert(action_name.to_string(), now);
    }

    pub fn action_started_at(&self, action_name: &str) -> Option<DateTime<Utc>> {
        self.state.lock().action_starts.get(action_name).copied()
    }

    pub fn total_elapsed(&self) -> String {
        let state = self.state.lock();
        let Some(start) = state.run_start else {
            return String::new();
        };
        let stop = state.run_stop.unwrap_or_else(|| self.clock.now());
        format_duration(stop - start)
    }

    pub fn action_elapsed(&self, action_name: &str) -> String {
        let state = self.state.lock();
        let Some(start) = state.action_starts.get(action_name).copied() else {
            return String::new();
        };

        let next_start = match self.catalog.index_of(action_name) {
            -1 => None,
            i => self
                .catalog
                .get(i as usize + 1)
                .and_then(|next| state.action_starts.get(next).copied()),
        };
        let end = next_start.unwrap_or_else(|| self.clock.now());

        format_duration(end - start)
    }

    pub fn reset(&self) {
        *self.state.lock() = TimerState::default();
    }
}

/// `HH:MM:SS`, prefixed with `N days, ` once the span exceeds a day.
/// Negative spans (clock skew) are shown as zero.
pub fn format_duration(span: Duration) -> String {
    let total = span.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{} days, {:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}
