// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! The review ledger: transactional create/update/retract of reviews and the
//! quorum evaluation that promotes a note once enough approval weight is in.
//!
//! Every mutation runs in a single `BEGIN IMMEDIATE` transaction, which takes
//! the database write lock up front. Concurrent reviewers on the same note
//! are therefore fully serialized: the second writer blocks until the first
//! commits (bounded by the busy timeout) and then observes its committed
//! duplicate-check state and weight sum. Any error rolls the whole unit back,
//! so a failed mutation never leaves a partial review row or a half-applied
//! status promotion.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};

use crate::db::{parse_db, parse_timestamp, Database};
use crate::error::{Error, Result};
use crate::note::NoteStatus;
use crate::policy::{Role, WeightPolicy};
use crate::review::{CreateReviewParams, Review, ReviewType, UpdateReviewParams};

impl Database {
    /// Create a review on a note and re-evaluate the promotion quorum, all in
    /// one atomic unit.
    ///
    /// The note must exist under `ticket_id` and not be soft-deleted. For
    /// approve reviews the weight is required and capped by the reviewer's
    /// role; other types carry weight 0 regardless of input. A reviewer may
    /// hold at most one active review per note; the note's own author is not
    /// excluded from reviewing it.
    pub fn create_review(
        &mut self,
        ticket_id: i64,
        note_id: i64,
        reviewer: &str,
        review: &CreateReviewParams,
    ) -> Result<Review> {
        let Database { conn, policy } = self;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let note_status = note_status_locked(&tx, ticket_id, note_id)?;
        let role = resolve_role(&tx, reviewer)?;
        let weight = validate_weight(review.review_type, review.weight, None, role, policy)?;
        ensure_no_active_review(&tx, note_id, reviewer)?;

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO reviews (note_id, type, status, weight, author, comment, created_at, updated_at)
             VALUES (?1, ?2, 'active', ?3, ?4, ?5, ?6, ?6)",
            params![
                note_id,
                review.review_type.as_str(),
                weight,
                reviewer,
                review.comment,
                now,
            ],
        )?;
        let review_id = tx.last_insert_rowid();

        evaluate_quorum(&tx, note_id, note_status, policy)?;

        let created = get_review_tx(&tx, review_id)?;
        tx.commit()?;
        Ok(created)
    }

    /// Partially update a review and re-evaluate the promotion quorum.
    ///
    /// Only the review's author may update it. Fields left unset keep their
    /// current values. If the effective type after the update is approve, the
    /// effective weight (new if supplied, else existing) is re-validated
    /// against the reviewer's current role exactly as on creation; any other
    /// effective type forces the weight back to 0.
    pub fn update_review(
        &mut self,
        ticket_id: i64,
        note_id: i64,
        review_id: i64,
        reviewer: &str,
        update: &UpdateReviewParams,
    ) -> Result<Review> {
        let Database { conn, policy } = self;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (current, note_status) = active_review_locked(&tx, ticket_id, note_id, review_id)?;
        if current.author != reviewer {
            return Err(Error::ReviewForbidden(review_id));
        }

        let new_type = update.review_type.unwrap_or(current.review_type);
        let role = resolve_role(&tx, reviewer)?;
        let new_weight =
            validate_weight(new_type, update.weight, Some(current.weight), role, policy)?;
        let new_comment = match &update.comment {
            Some(comment) => comment.clone(),
            None => current.comment.clone(),
        };

        tx.execute(
            "UPDATE reviews SET type = ?1, weight = ?2, comment = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                new_type.as_str(),
                new_weight,
                new_comment,
                Utc::now().to_rfc3339(),
                review_id,
            ],
        )?;

        evaluate_quorum(&tx, note_id, note_status, policy)?;

        let updated = get_review_tx(&tx, review_id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Retract a review by marking it stale.
    ///
    /// Only the review's author may retract it. The quorum is deliberately
    /// not re-evaluated: promotion is one-way, so removing approval weight
    /// after a note was promoted never demotes it.
    pub fn delete_review(
        &mut self,
        ticket_id: i64,
        note_id: i64,
        review_id: i64,
        reviewer: &str,
    ) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (current, _) = active_review_locked(&tx, ticket_id, note_id, review_id)?;
        if current.author != reviewer {
            return Err(Error::ReviewForbidden(review_id));
        }

        tx.execute(
            "UPDATE reviews SET status = 'stale', updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), review_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Get all reviews on a note, active and stale, oldest first.
    pub fn get_reviews(&self, ticket_id: i64, note_id: i64) -> Result<Vec<Review>> {
        // Scope check; NoteNotFound if the note is absent or soft-deleted.
        self.get_note(ticket_id, note_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT id, note_id, type, status, weight, author, comment, created_at, updated_at
             FROM reviews WHERE note_id = ?1 ORDER BY created_at",
        )?;

        let reviews = stmt
            .query_map(params![note_id], map_review)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(reviews)
    }
}

/// Read the note's current status inside the write transaction.
///
/// Under `BEGIN IMMEDIATE` this read is the serialization point for the
/// note: no other mutation can commit between it and our own commit.
fn note_status_locked(tx: &Transaction<'_>, ticket_id: i64, note_id: i64) -> Result<NoteStatus> {
    let status: Option<String> = tx
        .query_row(
            "SELECT status FROM notes WHERE id = ?1 AND ticket_id = ?2 AND deleted_at IS NULL",
            params![note_id, ticket_id],
            |row| row.get(0),
        )
        .optional()?;

    match status {
        Some(s) => Ok(s.parse()?),
        None => Err(Error::NoteNotFound(note_id)),
    }
}

/// Resolve a reviewer identity to a role via the roster.
///
/// Identities absent from the roster count as plain members (approval
/// weight cap 0); they are not rejected.
fn resolve_role(tx: &Transaction<'_>, identity: &str) -> Result<Role> {
    let role: Option<String> = tx
        .query_row(
            "SELECT role FROM users WHERE identity = ?1",
            params![identity],
            |row| row.get(0),
        )
        .optional()?;

    match role {
        Some(r) => Ok(r.parse()?),
        None => Ok(Role::Member),
    }
}

/// Normalize and validate a review weight.
///
/// Non-approve reviews always carry weight 0. Approve reviews take the
/// supplied weight, falling back to `current` on partial updates, and must
/// satisfy `0 <= weight <= cap(role)`. A zero-weight approval is valid.
fn validate_weight(
    review_type: ReviewType,
    supplied: Option<i64>,
    current: Option<i64>,
    role: Role,
    policy: &WeightPolicy,
) -> Result<i64> {
    if review_type != ReviewType::Approve {
        return Ok(0);
    }

    let weight = supplied.or(current).ok_or_else(|| {
        Error::InvalidReviewWeight("approve review requires a weight".to_string())
    })?;

    let max = policy.max_weight(role);
    if weight < 0 || weight > max {
        return Err(Error::InvalidReviewWeight(format!(
            "{weight} is outside 0..={max} allowed for role {role}"
        )));
    }

    Ok(weight)
}

/// Reject the mutation if the reviewer already holds an active review on the note.
fn ensure_no_active_review(tx: &Transaction<'_>, note_id: i64, reviewer: &str) -> Result<()> {
    let exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM reviews WHERE note_id = ?1 AND author = ?2 AND status = 'active' LIMIT 1",
            params![note_id, reviewer],
            |row| row.get(0),
        )
        .optional()?;

    if exists.is_some() {
        return Err(Error::ReviewAlreadyExists {
            note_id,
            author: reviewer.to_string(),
        });
    }
    Ok(())
}

/// Fetch an active review scoped to its note and ticket, together with the
/// note's current status.
fn active_review_locked(
    tx: &Transaction<'_>,
    ticket_id: i64,
    note_id: i64,
    review_id: i64,
) -> Result<(Review, NoteStatus)> {
    let row = tx
        .query_row(
            "SELECT r.id, r.note_id, r.type, r.status, r.weight, r.author, r.comment,
                    r.created_at, r.updated_at, n.status
             FROM reviews r
             JOIN notes n ON n.id = r.note_id
             WHERE r.id = ?1 AND r.note_id = ?2 AND n.ticket_id = ?3
               AND r.status = 'active' AND n.deleted_at IS NULL",
            params![review_id, note_id, ticket_id],
            |row| {
                let review = map_review(row)?;
                let note_status: String = row.get(9)?;
                Ok((review, parse_db(&note_status, "status")?))
            },
        )
        .optional()?;

    row.ok_or(Error::ReviewNotFound(review_id))
}

/// Recompute the active approve-weight sum for a note and promote it to
/// `waiting_sent` if the quorum is met.
///
/// Idempotent, and strictly one-way: a note already promoted (or sent) is
/// never touched, regardless of how the sum has changed since.
fn evaluate_quorum(
    tx: &Transaction<'_>,
    note_id: i64,
    current: NoteStatus,
    policy: &WeightPolicy,
) -> Result<()> {
    let total: i64 = tx.query_row(
        "SELECT COALESCE(SUM(weight), 0) FROM reviews
         WHERE note_id = ?1 AND status = 'active' AND type = 'approve'",
        params![note_id],
        |row| row.get(0),
    )?;

    if total < policy.quorum() || current.is_promoted() {
        return Ok(());
    }

    tx.execute(
        "UPDATE notes SET status = 'waiting_sent', updated_at = ?1 WHERE id = ?2",
        params![Utc::now().to_rfc3339(), note_id],
    )?;
    tracing::debug!(note_id, total_weight = total, "note promoted to waiting_sent");

    Ok(())
}

fn get_review_tx(tx: &Transaction<'_>, review_id: i64) -> Result<Review> {
    let review = tx.query_row(
        "SELECT id, note_id, type, status, weight, author, comment, created_at, updated_at
         FROM reviews WHERE id = ?1",
        params![review_id],
        map_review,
    )?;
    Ok(review)
}

fn map_review(row: &rusqlite::Row<'_>) -> std::result::Result<Review, rusqlite::Error> {
    let type_str: String = row.get(2)?;
    let status_str: String = row.get(3)?;
    let created_str: String = row.get(7)?;
    let updated_str: String = row.get(8)?;

    Ok(Review {
        id: row.get(0)?,
        note_id: row.get(1)?,
        review_type: parse_db(&type_str, "type")?,
        status: parse_db(&status_str, "status")?,
        weight: row.get(4)?,
        author: row.get(5)?,
        comment: row.get(6)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
        updated_at: parse_timestamp(&updated_str, "updated_at")?,
    })
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
