// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! Reminder settings.
//!
//! A singleton configuration row consumed by the external reminder job: the
//! hour of day to nag about unsent notes and the overdue-day offsets at which
//! to re-remind.

use serde::{Deserialize, Serialize};

/// Singleton reminder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    /// Hour of day (0-23) at which to remind about unsent notes.
    pub unsent_hour: u8,
    /// Days past due at which to send overdue reminders.
    pub overdue_days: Vec<i64>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        ReminderSettings {
            unsent_hour: 9,
            overdue_days: Vec::new(),
        }
    }
}
