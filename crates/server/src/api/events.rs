//! Recent status events, kept in memory for clients that poll.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use snapcart_core::{StatusEvent, StatusObserver};

use crate::state::AppState;

/// Number of events kept by default.
pub const DEFAULT_CAPACITY: usize = 200;

/// Bounded log of the latest status events, oldest first.
#[derive(Debug)]
pub struct RecentEvents {
    capacity: usize,
    events: Mutex<VecDeque<StatusEvent>>,
}

impl RecentEvents {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// The newest `limit` events, oldest first.
    pub fn latest(&self, limit: usize) -> Vec<StatusEvent> {
        let events = self.events.lock().unwrap_or_else(|p| p.into_inner());
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecentEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StatusObserver for RecentEvents {
    fn on_status(&self, event: &StatusEvent) {
        let mut events = self.events.lock().unwrap_or_else(|p| p.into_inner());
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<StatusEvent>,
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Json<EventsResponse> {
    Json(EventsResponse {
        events: state.recent_events().latest(query.limit),
    })
}
