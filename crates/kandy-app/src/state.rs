// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global application state: reactive signals for the Dioxus UI.

use chrono::{DateTime, Local};

use crate::services::app_services::UiEvent;

/// Oldest log lines are dropped past this.
const EVENT_LOG_LIMIT: usize = 200;

/// One line in the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    pub at: DateTime<Local>,
    pub label: String,
    pub detail: String,
}

/// Shared state accessible to all pages via `use_context`.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Last widget document revision seen; pages re-render when it moves.
    pub revision: u64,
    /// Newest first.
    pub events: Vec<LoggedEvent>,
    /// Status message for user feedback.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn record(&mut self, event: UiEvent) {
        let (label, detail) = match event {
            UiEvent::Alert(message) => {
                self.status_message = Some(message.clone());
                ("alert".to_string(), message)
            }
            UiEvent::Notification { listener, data } => (listener.action_name().to_string(), data.to_string()),
            UiEvent::Hook { name, data } => (format!("hook {name}"), data.to_string()),
        };
        self.events.insert(
            0,
            LoggedEvent {
                at: Local::now(),
                label,
                detail,
            },
        );
        self.events.truncate(EVENT_LOG_LIMIT);
    }
}
