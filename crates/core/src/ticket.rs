// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! Ticket types.
//!
//! A ticket is the parent work item that notes hang off. Only minimal CRUD is
//! provided here; field-level authorization lives with the transport layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Workflow status of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// No correspondence planned yet.
    NotPlanned,
    /// Correspondence planned but not drafted.
    NotWritten,
    /// A note is drafted and awaiting review.
    WaitingReview,
    /// A note passed review and awaits sending.
    WaitingSent,
    /// Correspondence has been sent.
    Sent,
    /// Parked until a scheduled milestone.
    MilestoneScheduled,
    /// All correspondence finished.
    Completed,
    /// Dropped without completion.
    Forgotten,
}

impl TicketStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::NotPlanned => "not_planned",
            TicketStatus::NotWritten => "not_written",
            TicketStatus::WaitingReview => "waiting_review",
            TicketStatus::WaitingSent => "waiting_sent",
            TicketStatus::Sent => "sent",
            TicketStatus::MilestoneScheduled => "milestone_scheduled",
            TicketStatus::Completed => "completed",
            TicketStatus::Forgotten => "forgotten",
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Forgotten)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "not_planned" => Ok(TicketStatus::NotPlanned),
            "not_written" => Ok(TicketStatus::NotWritten),
            "waiting_review" => Ok(TicketStatus::WaitingReview),
            "waiting_sent" => Ok(TicketStatus::WaitingSent),
            "sent" => Ok(TicketStatus::Sent),
            "milestone_scheduled" => Ok(TicketStatus::MilestoneScheduled),
            "completed" => Ok(TicketStatus::Completed),
            "forgotten" => Ok(TicketStatus::Forgotten),
            _ => Err(Error::InvalidTicketStatus(s.to_string())),
        }
    }
}

/// A tracked piece of outbound correspondence work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Database-assigned identifier.
    pub id: i64,
    /// Short description of the correspondence.
    pub title: String,
    /// Longer description providing context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Current workflow state.
    pub status: TicketStatus,
    /// Person responsible for the correspondence.
    pub assignee: String,
    /// Date the correspondence is due, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    /// When the ticket was created.
    pub created_at: DateTime<Utc>,
    /// When the ticket was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating or fully updating a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketParams {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TicketStatus,
    pub assignee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
}

#[cfg(test)]
#[path = "ticket_tests.rs"]
mod tests;
