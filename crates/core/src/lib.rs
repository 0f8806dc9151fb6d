// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! ng-core: Review ledger and note lifecycle engine for notegate.
//!
//! This crate provides the data model, the SQLite store, and the transactional
//! review ledger that gates outbound correspondence notes behind a weighted
//! approval quorum. It is consumed by the notegated daemon.

pub mod db;
pub mod error;
pub mod ledger;
pub mod note;
pub mod policy;
pub mod review;
pub mod settings;
pub mod ticket;
pub mod user;

pub use db::Database;
pub use error::{Error, Result};
pub use note::{Note, NoteStatus, NoteType};
pub use policy::{Role, WeightPolicy};
pub use review::{CreateReviewParams, Review, ReviewStatus, ReviewType, UpdateReviewParams};
pub use settings::ReminderSettings;
pub use ticket::{Ticket, TicketParams, TicketStatus};
pub use user::User;
