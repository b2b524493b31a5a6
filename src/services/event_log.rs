use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::SearchConfig;
use crate::db::{SearchEventInput, Store};

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("query_text required")]
    MissingQueryText,

    #[error("results_count must be non-negative")]
    NegativeResultsCount,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Typed log request; `device_type` is accepted at the HTTP boundary but
/// carries no meaning yet, so it never reaches this layer.
#[derive(Debug, Clone, Default)]
pub struct LogSearchInput {
    pub user_id: Option<i64>,
    pub query_text: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub results_count: i32,
}

/// Validates and appends search events. A sliding window per caller identity
/// guards the write path; a window limit of 0 disables it.
pub struct EventLogService {
    store: Store,
    max_events: u32,
    window: Duration,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl EventLogService {
    #[must_use]
    pub fn new(store: Store, config: &SearchConfig) -> Self {
        Self {
            store,
            max_events: config.log_max_events_per_window,
            window: Duration::from_secs(config.log_window_seconds),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Appends exactly one immutable event and returns its id. Fails before
    /// touching the store on blank query text, negative result counts, or an
    /// exhausted rate window.
    pub async fn record(&self, input: LogSearchInput, caller: &str) -> Result<i64, EventLogError> {
        if input.query_text.trim().is_empty() {
            return Err(EventLogError::MissingQueryText);
        }

        if input.results_count < 0 {
            return Err(EventLogError::NegativeResultsCount);
        }

        if self.max_events > 0 {
            let now = Instant::now();
            let mut windows = self.windows.lock().await;
            sweep(&mut windows, now, self.window);
            let events = windows.entry(caller.to_string()).or_default();
            if !admit(events, now, self.max_events, self.window) {
                debug!(caller, "search log rate limit exceeded");
                return Err(EventLogError::RateLimited);
            }
        }

        let event = SearchEventInput {
            user_id: input.user_id,
            query_text: input.query_text,
            category: input.category,
            location: input.location,
            results_count: input.results_count,
        };

        Ok(self.store.record_search_event(&event).await?)
    }
}

/// Drops callers whose newest event has aged out of the window, so the map
/// never accumulates entries for identities that stopped calling.
fn sweep(windows: &mut HashMap<String, VecDeque<Instant>>, now: Instant, window: Duration) {
    windows.retain(|_, events| {
        events
            .back()
            .is_some_and(|newest| now.duration_since(*newest) <= window)
    });
}

/// Sliding-window admission: prunes entries older than the window, then
/// admits the call only if capacity remains.
fn admit(events: &mut VecDeque<Instant>, now: Instant, max: u32, window: Duration) -> bool {
    while let Some(front) = events.front() {
        if now.duration_since(*front) > window {
            events.pop_front();
        } else {
            break;
        }
    }

    if events.len() >= max as usize {
        return false;
    }

    events.push_back(now);
    true
}
