// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! User roster entries.
//!
//! The roster maps an already-authenticated identity string to a [`Role`].
//! Identities absent from the roster are treated as plain members when a
//! review resolves its reviewer's role.

use serde::{Deserialize, Serialize};

use crate::policy::Role;

/// A roster entry mapping an identity to its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Authenticated identity string, as supplied by the caller.
    pub identity: String,
    /// Rank used to cap approval weights.
    pub role: Role,
}

impl User {
    /// Creates a roster entry.
    pub fn new(identity: impl Into<String>, role: Role) -> Self {
        User {
            identity: identity.into(),
            role,
        }
    }
}
