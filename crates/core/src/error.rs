// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! Error types for ng-core operations.

use thiserror::Error;

/// All possible errors that can occur in ng-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("ticket not found: {0}")]
    TicketNotFound(i64),

    #[error("note not found: {0}")]
    NoteNotFound(i64),

    #[error("review not found: {0}")]
    ReviewNotFound(i64),

    #[error("review {0} can only be modified by its author")]
    ReviewForbidden(i64),

    #[error("an active review by {author} already exists on note {note_id}")]
    ReviewAlreadyExists { note_id: i64, author: String },

    #[error("invalid review type: '{0}'\n  hint: valid types are: approve, change_request, comment, system")]
    InvalidReviewType(String),

    #[error("invalid review weight: {0}")]
    InvalidReviewWeight(String),

    #[error("invalid review status: '{0}'\n  hint: valid statuses are: active, stale")]
    InvalidReviewStatus(String),

    #[error("invalid note type: '{0}'\n  hint: valid types are: outgoing, internal")]
    InvalidNoteType(String),

    #[error("invalid note status: '{0}'\n  hint: valid statuses are: draft, waiting_review, waiting_sent, sent")]
    InvalidNoteStatus(String),

    #[error("invalid ticket status: '{0}'")]
    InvalidTicketStatus(String),

    #[error("invalid role: '{0}'\n  hint: valid roles are: manager, assistant, member")]
    InvalidRole(String),

    #[error("reminder settings have not been configured")]
    SettingsNotFound,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for ng-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
