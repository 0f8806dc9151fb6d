// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! Review types.
//!
//! A review is one reviewer's verdict on a note. Reviews are never hard
//! deleted: retraction marks them stale, keeping the audit trail that backs
//! the one-way promotion invariant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kind of verdict a review carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    /// Approval carrying a weight toward the quorum.
    Approve,
    /// Request for changes before the note can be sent.
    ChangeRequest,
    /// Free-form remark with no verdict.
    Comment,
    /// Automated entry written by the system itself.
    System,
}

impl ReviewType {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewType::Approve => "approve",
            ReviewType::ChangeRequest => "change_request",
            ReviewType::Comment => "comment",
            ReviewType::System => "system",
        }
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReviewType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(ReviewType::Approve),
            "change_request" => Ok(ReviewType::ChangeRequest),
            "comment" => Ok(ReviewType::Comment),
            "system" => Ok(ReviewType::System),
            _ => Err(Error::InvalidReviewType(s.to_string())),
        }
    }
}

/// Whether a review still counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Counts toward quorum and the one-active-review-per-author rule.
    Active,
    /// Retracted; kept as history only.
    Stale,
}

impl ReviewStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Active => "active",
            ReviewStatus::Stale => "stale",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ReviewStatus::Active),
            "stale" => Ok(ReviewStatus::Stale),
            _ => Err(Error::InvalidReviewStatus(s.to_string())),
        }
    }
}

/// One reviewer's verdict on a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Database-assigned identifier.
    pub id: i64,
    /// The note this review belongs to.
    pub note_id: i64,
    /// Kind of verdict.
    pub review_type: ReviewType,
    /// Active or retracted.
    pub status: ReviewStatus,
    /// Approval weight; always 0 unless `review_type` is approve.
    pub weight: i64,
    /// Identity of the reviewer.
    pub author: String,
    /// Optional free-text remark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the review was created.
    pub created_at: DateTime<Utc>,
    /// When the review was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateReviewParams {
    /// Kind of verdict.
    pub review_type: ReviewType,
    /// Approval weight. Required for approve reviews, ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    /// Optional free-text remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Fields for partially updating a review.
///
/// `None` leaves the current value untouched. The doubled option on
/// `comment` distinguishes "keep" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateReviewParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_type: Option<ReviewType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub comment: Option<Option<String>>,
}

/// Deserialize a field where "absent", "null", and "value" all mean
/// different things: absent keeps the current value (outer `None`), null
/// clears it (`Some(None)`), a value replaces it.
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[path = "review_tests.rs"]
mod tests;
