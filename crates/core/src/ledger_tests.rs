// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

#![allow(clippy::unwrap_used)]

use super::*;
use crate::note::NoteType;
use crate::review::ReviewStatus;
use crate::ticket::{TicketParams, TicketStatus};
use crate::user::User;
use std::collections::HashMap;
use std::path::Path;

fn seeded_db() -> Database {
    let mut db = Database::open_in_memory().unwrap();
    seed_roster(&mut db);
    db
}

fn seed_roster(db: &mut Database) {
    db.replace_users(&[
        User::new("meg", Role::Manager),
        User::new("mia", Role::Manager),
        User::new("abe", Role::Assistant),
        User::new("ada", Role::Assistant),
        User::new("moe", Role::Member),
    ])
    .unwrap();
}

/// Create a ticket with one outgoing note in waiting_review, authored by "moe".
fn note_in_review(db: &Database) -> (i64, i64) {
    let ticket = db
        .create_ticket(&TicketParams {
            title: "Quarterly greetings".to_string(),
            description: None,
            status: TicketStatus::WaitingReview,
            assignee: "moe".to_string(),
            due: None,
        })
        .unwrap();
    let note = db
        .create_note(ticket.id, "moe", "Dear partner,", NoteType::Outgoing)
        .unwrap();
    db.set_note_status(ticket.id, note.id, NoteStatus::WaitingReview)
        .unwrap();
    (ticket.id, note.id)
}

fn approve(weight: i64) -> CreateReviewParams {
    CreateReviewParams {
        review_type: ReviewType::Approve,
        weight: Some(weight),
        comment: None,
    }
}

fn note_status(db: &Database, ticket_id: i64, note_id: i64) -> NoteStatus {
    db.get_note(ticket_id, note_id).unwrap().status
}

// ----------------------------------------------------------------------
// Creation and weight caps
// ----------------------------------------------------------------------

#[test]
fn manager_weight_5_promotes_in_same_commit() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    let review = db
        .create_review(
            ticket_id,
            note_id,
            "meg",
            &CreateReviewParams {
                review_type: ReviewType::Approve,
                weight: Some(5),
                comment: Some("LGTM".to_string()),
            },
        )
        .unwrap();

    assert_eq!(review.note_id, note_id);
    assert_eq!(review.review_type, ReviewType::Approve);
    assert_eq!(review.status, ReviewStatus::Active);
    assert_eq!(review.weight, 5);
    assert_eq!(review.author, "meg");
    assert_eq!(review.comment.as_deref(), Some("LGTM"));
    assert_eq!(note_status(&db, ticket_id, note_id), NoteStatus::WaitingSent);
}

#[test]
fn manager_weight_6_rejected_and_nothing_written() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    let result = db.create_review(ticket_id, note_id, "meg", &approve(6));
    assert!(matches!(result, Err(Error::InvalidReviewWeight(_))));

    assert!(db.get_reviews(ticket_id, note_id).unwrap().is_empty());
    assert_eq!(
        note_status(&db, ticket_id, note_id),
        NoteStatus::WaitingReview
    );
}

#[test]
fn negative_weight_rejected() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    let result = db.create_review(ticket_id, note_id, "meg", &approve(-1));
    assert!(matches!(result, Err(Error::InvalidReviewWeight(_))));
}

#[test]
fn assistant_capped_at_4() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    let result = db.create_review(ticket_id, note_id, "abe", &approve(5));
    assert!(matches!(result, Err(Error::InvalidReviewWeight(_))));

    let review = db
        .create_review(ticket_id, note_id, "abe", &approve(4))
        .unwrap();
    assert_eq!(review.weight, 4);
    // 4 < 5: not promoted yet.
    assert_eq!(
        note_status(&db, ticket_id, note_id),
        NoteStatus::WaitingReview
    );
}

#[test]
fn approve_without_weight_rejected() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    let result = db.create_review(
        ticket_id,
        note_id,
        "meg",
        &CreateReviewParams {
            review_type: ReviewType::Approve,
            weight: None,
            comment: None,
        },
    );
    assert!(matches!(result, Err(Error::InvalidReviewWeight(_))));
}

#[test]
fn non_approve_weight_forced_to_zero() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    let review = db
        .create_review(
            ticket_id,
            note_id,
            "abe",
            &CreateReviewParams {
                review_type: ReviewType::ChangeRequest,
                weight: Some(3),
                comment: Some("not LGTM".to_string()),
            },
        )
        .unwrap();
    assert_eq!(review.weight, 0);
}

#[test]
fn zero_weight_approvals_allowed_and_do_not_promote() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    db.create_review(ticket_id, note_id, "abe", &approve(0))
        .unwrap();
    db.create_review(ticket_id, note_id, "ada", &approve(0))
        .unwrap();

    assert_eq!(db.get_reviews(ticket_id, note_id).unwrap().len(), 2);
    assert_eq!(
        note_status(&db, ticket_id, note_id),
        NoteStatus::WaitingReview
    );
}

#[test]
fn unknown_identity_is_treated_as_member() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    // "zed" is not on the roster: cap 0, so weight 1 is rejected...
    let result = db.create_review(ticket_id, note_id, "zed", &approve(1));
    assert!(matches!(result, Err(Error::InvalidReviewWeight(_))));

    // ...but a zero-weight approval goes through.
    let review = db
        .create_review(ticket_id, note_id, "zed", &approve(0))
        .unwrap();
    assert_eq!(review.weight, 0);
}

#[test]
fn rostered_member_carries_no_weight() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    let result = db.create_review(ticket_id, note_id, "moe", &approve(1));
    assert!(matches!(result, Err(Error::InvalidReviewWeight(_))));
}

#[test]
fn self_review_is_allowed() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    // "moe" authored the note; deduplication, not author-exclusion.
    let review = db
        .create_review(
            ticket_id,
            note_id,
            "moe",
            &CreateReviewParams {
                review_type: ReviewType::Comment,
                weight: None,
                comment: Some("please take a look".to_string()),
            },
        )
        .unwrap();
    assert_eq!(review.author, "moe");
}

#[test]
fn duplicate_active_review_rejected() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    db.create_review(ticket_id, note_id, "meg", &approve(2))
        .unwrap();

    let result = db.create_review(
        ticket_id,
        note_id,
        "meg",
        &CreateReviewParams {
            review_type: ReviewType::Comment,
            weight: None,
            comment: None,
        },
    );
    assert!(matches!(result, Err(Error::ReviewAlreadyExists { .. })));
}

#[test]
fn create_review_on_missing_note() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    assert!(matches!(
        db.create_review(ticket_id, 999, "meg", &approve(1)),
        Err(Error::NoteNotFound(999))
    ));

    // Wrong parent ticket.
    assert!(matches!(
        db.create_review(ticket_id + 1, note_id, "meg", &approve(1)),
        Err(Error::NoteNotFound(_))
    ));
}

#[test]
fn create_review_on_deleted_note() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);
    db.delete_note(ticket_id, note_id).unwrap();

    assert!(matches!(
        db.create_review(ticket_id, note_id, "meg", &approve(1)),
        Err(Error::NoteNotFound(_))
    ));
}

// ----------------------------------------------------------------------
// Quorum accumulation and one-way promotion
// ----------------------------------------------------------------------

#[test]
fn weights_accumulate_across_reviewers() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    db.create_review(ticket_id, note_id, "abe", &approve(4))
        .unwrap();
    assert_eq!(
        note_status(&db, ticket_id, note_id),
        NoteStatus::WaitingReview
    );

    db.create_review(ticket_id, note_id, "ada", &approve(1))
        .unwrap();
    assert_eq!(note_status(&db, ticket_id, note_id), NoteStatus::WaitingSent);
}

#[test]
fn stale_reviews_do_not_count_toward_quorum() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    let review = db
        .create_review(ticket_id, note_id, "abe", &approve(4))
        .unwrap();
    db.delete_review(ticket_id, note_id, review.id, "abe")
        .unwrap();

    // 4 stale + 4 active = only 4 counted.
    db.create_review(ticket_id, note_id, "ada", &approve(4))
        .unwrap();
    assert_eq!(
        note_status(&db, ticket_id, note_id),
        NoteStatus::WaitingReview
    );
}

#[test]
fn promotion_is_one_way() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    let review = db
        .create_review(ticket_id, note_id, "meg", &approve(5))
        .unwrap();
    assert_eq!(note_status(&db, ticket_id, note_id), NoteStatus::WaitingSent);

    // Retracting the qualifying approval does not demote.
    db.delete_review(ticket_id, note_id, review.id, "meg")
        .unwrap();
    assert_eq!(note_status(&db, ticket_id, note_id), NoteStatus::WaitingSent);

    // Neither does lowering a remaining approval below quorum.
    let second = db
        .create_review(ticket_id, note_id, "mia", &approve(5))
        .unwrap();
    db.update_review(
        ticket_id,
        note_id,
        second.id,
        "mia",
        &UpdateReviewParams {
            weight: Some(0),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(note_status(&db, ticket_id, note_id), NoteStatus::WaitingSent);
}

#[test]
fn evaluator_is_idempotent_after_promotion() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    db.create_review(ticket_id, note_id, "meg", &approve(5))
        .unwrap();
    let promoted_at = db.get_note(ticket_id, note_id).unwrap().updated_at;

    // Further non-qualifying mutations re-run the evaluator; status sticks.
    db.create_review(
        ticket_id,
        note_id,
        "abe",
        &CreateReviewParams {
            review_type: ReviewType::Comment,
            weight: None,
            comment: None,
        },
    )
    .unwrap();
    db.create_review(ticket_id, note_id, "ada", &approve(4))
        .unwrap();

    let note = db.get_note(ticket_id, note_id).unwrap();
    assert_eq!(note.status, NoteStatus::WaitingSent);
    // Already-promoted notes are not touched again by the evaluator.
    assert_eq!(note.updated_at, promoted_at);
}

#[test]
fn draft_note_can_reach_quorum() {
    // The evaluator keys on "not already promoted", not on waiting_review.
    let mut db = seeded_db();
    let ticket = db
        .create_ticket(&TicketParams {
            title: "Ticket".to_string(),
            description: None,
            status: TicketStatus::NotWritten,
            assignee: "moe".to_string(),
            due: None,
        })
        .unwrap();
    let note = db
        .create_note(ticket.id, "moe", "content", NoteType::Outgoing)
        .unwrap();

    db.create_review(ticket.id, note.id, "meg", &approve(5))
        .unwrap();
    assert_eq!(note_status(&db, ticket.id, note.id), NoteStatus::WaitingSent);
}

#[test]
fn alternate_policy_is_honored() {
    let caps = HashMap::from([(Role::Manager, 2), (Role::Assistant, 1)]);
    let mut db = Database::open_in_memory_with_policy(WeightPolicy::new(caps, 2)).unwrap();
    seed_roster(&mut db);
    let (ticket_id, note_id) = note_in_review(&db);

    // Manager cap is 2 under this policy.
    assert!(matches!(
        db.create_review(ticket_id, note_id, "meg", &approve(3)),
        Err(Error::InvalidReviewWeight(_))
    ));

    db.create_review(ticket_id, note_id, "meg", &approve(2))
        .unwrap();
    assert_eq!(note_status(&db, ticket_id, note_id), NoteStatus::WaitingSent);
}

// ----------------------------------------------------------------------
// Update
// ----------------------------------------------------------------------

#[test]
fn update_is_author_only() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);
    let review = db
        .create_review(ticket_id, note_id, "abe", &approve(2))
        .unwrap();

    let result = db.update_review(
        ticket_id,
        note_id,
        review.id,
        "meg",
        &UpdateReviewParams {
            weight: Some(3),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(Error::ReviewForbidden(_))));
}

#[test]
fn update_unset_fields_keep_current_values() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);
    let review = db
        .create_review(
            ticket_id,
            note_id,
            "abe",
            &CreateReviewParams {
                review_type: ReviewType::Approve,
                weight: Some(3),
                comment: Some("ok".to_string()),
            },
        )
        .unwrap();

    let updated = db
        .update_review(
            ticket_id,
            note_id,
            review.id,
            "abe",
            &UpdateReviewParams {
                comment: Some(Some("better".to_string())),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.review_type, ReviewType::Approve);
    assert_eq!(updated.weight, 3);
    assert_eq!(updated.comment.as_deref(), Some("better"));
}

#[test]
fn update_can_clear_comment() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);
    let review = db
        .create_review(
            ticket_id,
            note_id,
            "abe",
            &CreateReviewParams {
                review_type: ReviewType::Comment,
                weight: None,
                comment: Some("typo'd commnt".to_string()),
            },
        )
        .unwrap();

    let updated = db
        .update_review(
            ticket_id,
            note_id,
            review.id,
            "abe",
            &UpdateReviewParams {
                comment: Some(None),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.comment, None);
}

#[test]
fn update_weight_revalidated_against_current_role() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);
    let review = db
        .create_review(ticket_id, note_id, "abe", &approve(3))
        .unwrap();

    let result = db.update_review(
        ticket_id,
        note_id,
        review.id,
        "abe",
        &UpdateReviewParams {
            weight: Some(5),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(Error::InvalidReviewWeight(_))));
}

#[test]
fn update_type_change_to_approve_revalidates_weight() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    // Member "moe" holds a change request with weight 0.
    let review = db
        .create_review(
            ticket_id,
            note_id,
            "moe",
            &CreateReviewParams {
                review_type: ReviewType::ChangeRequest,
                weight: None,
                comment: None,
            },
        )
        .unwrap();

    // Flipping to approve with an explicit weight hits the member cap.
    let result = db.update_review(
        ticket_id,
        note_id,
        review.id,
        "moe",
        &UpdateReviewParams {
            review_type: Some(ReviewType::Approve),
            weight: Some(1),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(Error::InvalidReviewWeight(_))));

    // Without a new weight the existing 0 is re-validated and passes.
    let updated = db
        .update_review(
            ticket_id,
            note_id,
            review.id,
            "moe",
            &UpdateReviewParams {
                review_type: Some(ReviewType::Approve),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.review_type, ReviewType::Approve);
    assert_eq!(updated.weight, 0);
}

#[test]
fn update_type_away_from_approve_zeroes_weight() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);
    let review = db
        .create_review(ticket_id, note_id, "abe", &approve(4))
        .unwrap();

    let updated = db
        .update_review(
            ticket_id,
            note_id,
            review.id,
            "abe",
            &UpdateReviewParams {
                review_type: Some(ReviewType::Comment),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.weight, 0);
}

#[test]
fn update_can_push_note_over_quorum() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    db.create_review(ticket_id, note_id, "ada", &approve(2))
        .unwrap();
    let review = db
        .create_review(ticket_id, note_id, "abe", &approve(2))
        .unwrap();
    assert_eq!(
        note_status(&db, ticket_id, note_id),
        NoteStatus::WaitingReview
    );

    db.update_review(
        ticket_id,
        note_id,
        review.id,
        "abe",
        &UpdateReviewParams {
            weight: Some(3),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(note_status(&db, ticket_id, note_id), NoteStatus::WaitingSent);
}

#[test]
fn update_missing_or_stale_review() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);

    assert!(matches!(
        db.update_review(ticket_id, note_id, 999, "meg", &UpdateReviewParams::default()),
        Err(Error::ReviewNotFound(999))
    ));

    let review = db
        .create_review(ticket_id, note_id, "meg", &approve(1))
        .unwrap();
    db.delete_review(ticket_id, note_id, review.id, "meg")
        .unwrap();

    // Stale reviews cannot be edited.
    assert!(matches!(
        db.update_review(
            ticket_id,
            note_id,
            review.id,
            "meg",
            &UpdateReviewParams::default()
        ),
        Err(Error::ReviewNotFound(_))
    ));
}

// ----------------------------------------------------------------------
// Delete
// ----------------------------------------------------------------------

#[test]
fn delete_is_author_only() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);
    let review = db
        .create_review(ticket_id, note_id, "abe", &approve(2))
        .unwrap();

    let result = db.delete_review(ticket_id, note_id, review.id, "ada");
    assert!(matches!(result, Err(Error::ReviewForbidden(_))));

    db.delete_review(ticket_id, note_id, review.id, "abe")
        .unwrap();
}

#[test]
fn delete_marks_stale_and_frees_the_author_slot() {
    let mut db = seeded_db();
    let (ticket_id, note_id) = note_in_review(&db);
    let review = db
        .create_review(ticket_id, note_id, "abe", &approve(2))
        .unwrap();

    db.delete_review(ticket_id, note_id, review.id, "abe")
        .unwrap();

    // History is preserved.
    let reviews = db.get_reviews(ticket_id, note_id).unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].status, ReviewStatus::Stale);

    // The author may review again.
    db.create_review(ticket_id, note_id, "abe", &approve(4))
        .unwrap();

    // But the stale review cannot be deleted twice.
    assert!(matches!(
        db.delete_review(ticket_id, note_id, review.id, "abe"),
        Err(Error::ReviewNotFound(_))
    ));
}

// ----------------------------------------------------------------------
// Concurrency
// ----------------------------------------------------------------------

fn seeded_on_disk(path: &Path) -> (i64, i64) {
    let mut db = Database::open(path).unwrap();
    seed_roster(&mut db);
    note_in_review(&db)
}

#[test]
fn concurrent_reviewers_on_one_note_serialize() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notegate.db");
    let (ticket_id, note_id) = seeded_on_disk(&path);

    let handles: Vec<_> = [("abe", 4i64), ("ada", 3i64)]
        .into_iter()
        .map(|(who, weight)| {
            let path = path.clone();
            std::thread::spawn(move || {
                let mut db = Database::open(&path).unwrap();
                db.create_review(ticket_id, note_id, who, &approve(weight))
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(note_status(&db, ticket_id, note_id), NoteStatus::WaitingSent);
    assert_eq!(db.get_reviews(ticket_id, note_id).unwrap().len(), 2);
}

#[test]
fn concurrent_duplicates_cannot_race_past_the_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notegate.db");
    let (ticket_id, note_id) = seeded_on_disk(&path);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            std::thread::spawn(move || {
                let mut db = Database::open(&path).unwrap();
                db.create_review(ticket_id, note_id, "meg", &approve(1))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(Error::ReviewAlreadyExists { .. }))));

    let db = Database::open(&path).unwrap();
    assert_eq!(db.get_reviews(ticket_id, note_id).unwrap().len(), 1);
}
