// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! Note types.
//!
//! A note is one piece of correspondence content attached to a ticket. Its
//! status only moves forward: once the review quorum promotes a note to
//! `waiting_sent` it never regresses as a side effect of later review edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Direction of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    /// Correspondence meant to be sent out once approved.
    Outgoing,
    /// Internal memo, never sent.
    Internal,
}

impl NoteType {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Outgoing => "outgoing",
            NoteType::Internal => "internal",
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "outgoing" => Ok(NoteType::Outgoing),
            "internal" => Ok(NoteType::Internal),
            _ => Err(Error::InvalidNoteType(s.to_string())),
        }
    }
}

/// Lifecycle status of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    /// Being written; not yet in review.
    Draft,
    /// Collecting reviews.
    WaitingReview,
    /// Approval quorum reached; ready to send.
    WaitingSent,
    /// Sent out.
    Sent,
}

impl NoteStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Draft => "draft",
            NoteStatus::WaitingReview => "waiting_review",
            NoteStatus::WaitingSent => "waiting_sent",
            NoteStatus::Sent => "sent",
        }
    }

    /// True once the note has passed the approval gate.
    ///
    /// The quorum evaluator never touches a note in one of these states.
    pub fn is_promoted(&self) -> bool {
        matches!(self, NoteStatus::WaitingSent | NoteStatus::Sent)
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NoteStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(NoteStatus::Draft),
            "waiting_review" => Ok(NoteStatus::WaitingReview),
            "waiting_sent" => Ok(NoteStatus::WaitingSent),
            "sent" => Ok(NoteStatus::Sent),
            _ => Err(Error::InvalidNoteStatus(s.to_string())),
        }
    }
}

/// A piece of correspondence content attached to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Database-assigned identifier.
    pub id: i64,
    /// The ticket this note belongs to.
    pub ticket_id: i64,
    /// Identity of the person who wrote the note.
    pub author: String,
    /// The correspondence text.
    pub content: String,
    /// Direction of the note.
    pub note_type: NoteType,
    /// Current lifecycle state.
    pub status: NoteStatus,
    /// When the note was created.
    pub created_at: DateTime<Utc>,
    /// When the note was last modified.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "note_tests.rs"]
mod tests;
