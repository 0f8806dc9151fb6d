// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! Reviewer roles and the approval-weight policy.
//!
//! The weight caps and the quorum threshold are carried as an explicit
//! [`WeightPolicy`] value injected into the database handle, so tests can
//! substitute alternate policies without touching the ledger code.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rank of a reviewer, resolved from the user roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full approval authority.
    Manager,
    /// Limited approval authority.
    Assistant,
    /// Ranked below assistant; may review but carries no approval weight.
    Member,
}

impl Role {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Assistant => "assistant",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "manager" => Ok(Role::Manager),
            "assistant" => Ok(Role::Assistant),
            "member" => Ok(Role::Member),
            _ => Err(Error::InvalidRole(s.to_string())),
        }
    }
}

/// Maximum approve weight per role, plus the promotion quorum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightPolicy {
    caps: HashMap<Role, i64>,
    quorum: i64,
}

impl WeightPolicy {
    /// Create a policy from explicit caps and a quorum threshold.
    ///
    /// Roles absent from `caps` get a cap of 0.
    pub fn new(caps: HashMap<Role, i64>, quorum: i64) -> Self {
        WeightPolicy { caps, quorum }
    }

    /// The maximum approve weight the given role may assign in one review.
    pub fn max_weight(&self, role: Role) -> i64 {
        self.caps.get(&role).copied().unwrap_or(0)
    }

    /// Total active approve weight required to promote a note.
    pub fn quorum(&self) -> i64 {
        self.quorum
    }
}

impl Default for WeightPolicy {
    /// The production policy: manager 5, assistant 4, member 0, quorum 5.
    fn default() -> Self {
        let caps = HashMap::from([(Role::Manager, 5), (Role::Assistant, 4), (Role::Member, 0)]);
        WeightPolicy { caps, quorum: 5 }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
