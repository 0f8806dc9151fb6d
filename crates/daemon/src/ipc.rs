// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! IPC protocol for daemon-client communication.
//!
//! Messages are serialized as JSON with length-prefixed framing. Review
//! payloads reuse the [`ng_core`] model types directly, so the wire format
//! and the storage layer cannot drift apart.

use ng_core::{CreateReviewParams, Error, Review, UpdateReviewParams};
use serde::{Deserialize, Serialize};

/// Request sent from a client to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonRequest {
    /// Get daemon status.
    Status,
    /// Graceful shutdown.
    Shutdown,
    /// Ping to check if daemon is alive.
    Ping,
    /// Version handshake request.
    Hello { version: String },
    /// Review ledger operation.
    Review(ReviewOp),
}

/// Operations on the review ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op")]
pub enum ReviewOp {
    /// Create a review on a note.
    Create {
        ticket_id: i64,
        note_id: i64,
        reviewer: String,
        review: CreateReviewParams,
    },
    /// Partially update an existing review.
    Update {
        ticket_id: i64,
        note_id: i64,
        review_id: i64,
        reviewer: String,
        #[serde(flatten)]
        update: UpdateReviewParams,
    },
    /// Retract a review.
    Delete {
        ticket_id: i64,
        note_id: i64,
        review_id: i64,
        reviewer: String,
    },
    /// List all reviews on a note.
    List { ticket_id: i64, note_id: i64 },
}

/// Response sent from the daemon to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonResponse {
    /// Status response.
    Status(DaemonStatus),
    /// Shutdown acknowledged.
    ShuttingDown,
    /// Pong response.
    Pong,
    /// Error response.
    Error { code: ErrorCode, message: String },
    /// Version handshake response.
    Hello { version: String },
    /// Review operation result.
    Review(ReviewResult),
}

/// Results from review operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "result")]
pub enum ReviewResult {
    /// The created or updated review.
    Review { review: Review },
    /// All reviews on a note, oldest first.
    Reviews { reviews: Vec<Review> },
    /// Retraction succeeded.
    Deleted,
}

/// Machine-readable error category for [`DaemonResponse::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    TicketNotFound,
    NoteNotFound,
    ReviewNotFound,
    ReviewForbidden,
    ReviewExists,
    InvalidWeight,
    InvalidInput,
    Internal,
}

/// Convert a core error into an error response.
///
/// Domain errors carry their message to the client. Infrastructure errors
/// are logged on the daemon side and reported as a generic internal error,
/// so storage details never cross the socket.
pub fn error_response(err: &Error) -> DaemonResponse {
    let code = match err {
        Error::TicketNotFound(_) => ErrorCode::TicketNotFound,
        Error::NoteNotFound(_) => ErrorCode::NoteNotFound,
        Error::ReviewNotFound(_) => ErrorCode::ReviewNotFound,
        Error::ReviewForbidden(_) => ErrorCode::ReviewForbidden,
        Error::ReviewAlreadyExists { .. } => ErrorCode::ReviewExists,
        Error::InvalidReviewWeight(_) => ErrorCode::InvalidWeight,
        Error::InvalidReviewType(_)
        | Error::InvalidReviewStatus(_)
        | Error::InvalidNoteType(_)
        | Error::InvalidNoteStatus(_)
        | Error::InvalidTicketStatus(_)
        | Error::InvalidRole(_)
        | Error::SettingsNotFound => ErrorCode::InvalidInput,
        Error::Database(_) | Error::Io(_) | Error::Json(_) | Error::CorruptedData(_) => {
            tracing::error!(error = %err, "internal error while handling request");
            return DaemonResponse::Error {
                code: ErrorCode::Internal,
                message: "internal error".to_string(),
            };
        }
    };

    DaemonResponse::Error {
        code,
        message: err.to_string(),
    }
}

/// Daemon status information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonStatus {
    /// Current daemon PID.
    pub pid: u32,
    /// Uptime in seconds.
    pub uptime_secs: u64,
}

impl DaemonStatus {
    /// Create a new status with the given parameters.
    pub fn new(pid: u32, uptime_secs: u64) -> Self {
        Self { pid, uptime_secs }
    }
}

/// IPC message framing.
///
/// Messages are framed as:
/// - 4 bytes: message length (big-endian u32)
/// - N bytes: JSON-encoded message
pub mod framing {
    use std::io::{Read, Write};

    use super::*;

    /// Maximum message size (1MB) to prevent malformed messages from causing hangs.
    const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

    /// Read a request from the given reader.
    pub fn read_request<R: Read>(reader: &mut R) -> std::io::Result<DaemonRequest> {
        read_frame(reader)
    }

    /// Read a response from the given reader.
    pub fn read_response<R: Read>(reader: &mut R) -> std::io::Result<DaemonResponse> {
        read_frame(reader)
    }

    /// Write a request to the given writer.
    pub fn write_request<W: Write>(writer: &mut W, request: &DaemonRequest) -> std::io::Result<()> {
        write_frame(writer, request)
    }

    /// Write a response to the given writer.
    pub fn write_response<W: Write>(
        writer: &mut W,
        response: &DaemonResponse,
    ) -> std::io::Result<()> {
        write_frame(writer, response)
    }

    fn read_frame<R: Read, T: serde::de::DeserializeOwned>(reader: &mut R) -> std::io::Result<T> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > MAX_MESSAGE_SIZE {
            return Err(std::io::Error::other(format!(
                "message too large: {} bytes (max {})",
                len, MAX_MESSAGE_SIZE
            )));
        }

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;

        serde_json::from_slice(&buf)
            .map_err(|e| std::io::Error::other(format!("deserialize error: {}", e)))
    }

    fn write_frame<W: Write, T: Serialize>(writer: &mut W, message: &T) -> std::io::Result<()> {
        let json = serde_json::to_vec(message)
            .map_err(|e| std::io::Error::other(format!("serialize error: {}", e)))?;
        let len =
            u32::try_from(json.len()).map_err(|_| std::io::Error::other("message too large"))?;
        writer.write_all(&len.to_be_bytes())?;
        writer.write_all(&json)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "ipc_tests.rs"]
mod tests;
