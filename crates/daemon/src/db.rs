// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! Database adapter for the daemon.
//!
//! Thin wrapper over [`ng_core::Database`] that dispatches IPC review
//! operations. Each operation runs as one atomic unit in core; this layer
//! only translates between the wire protocol and the library API.

use std::path::Path;

use crate::ipc::{ReviewOp, ReviewResult};

/// Database adapter that delegates to core.
pub struct Database {
    core: ng_core::Database,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> ng_core::Result<Self> {
        let core = ng_core::Database::open(path)?;
        Ok(Database { core })
    }

    /// Execute a review operation and return the result.
    pub fn execute(&mut self, op: ReviewOp) -> ng_core::Result<ReviewResult> {
        match op {
            ReviewOp::Create {
                ticket_id,
                note_id,
                reviewer,
                review,
            } => {
                let review = self
                    .core
                    .create_review(ticket_id, note_id, &reviewer, &review)?;
                Ok(ReviewResult::Review { review })
            }
            ReviewOp::Update {
                ticket_id,
                note_id,
                review_id,
                reviewer,
                update,
            } => {
                let review =
                    self.core
                        .update_review(ticket_id, note_id, review_id, &reviewer, &update)?;
                Ok(ReviewResult::Review { review })
            }
            ReviewOp::Delete {
                ticket_id,
                note_id,
                review_id,
                reviewer,
            } => {
                self.core
                    .delete_review(ticket_id, note_id, review_id, &reviewer)?;
                Ok(ReviewResult::Deleted)
            }
            ReviewOp::List { ticket_id, note_id } => {
                let reviews = self.core.get_reviews(ticket_id, note_id)?;
                Ok(ReviewResult::Reviews { reviews })
            }
        }
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
