//! Latest-outcome status slot backing the UI status bar.
//!
//! # Invariants
//! - The slot holds at most one message; posting overwrites (last write wins).
//! - Dismissal timing belongs to the UI; core never expires messages.

use serde::Serialize;
use std::sync::Mutex;

/// Severity shown by the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

impl StatusLevel {
    /// Stable lowercase label, same as the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Single-slot message store shared across command calls.
#[derive(Debug, Default)]
pub struct StatusSlot {
    current: Mutex<Option<StatusMessage>>,
}

impl StatusSlot {
    pub const fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// Replaces whatever message is pending.
    pub fn post(&self, message: StatusMessage) {
        *self.lock() = Some(message);
    }

    pub fn current(&self) -> Option<StatusMessage> {
        self.lock().clone()
    }

    /// Returns the pending message and clears the slot.
    pub fn take(&self) -> Option<StatusMessage> {
        self.lock().take()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<StatusMessage>> {
        // A poisoned slot still holds a valid Option; keep serving it.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
