// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! SQLite-backed database for correspondence tracking.
//!
//! The [`Database`] struct provides data access for tickets, notes, the user
//! roster, and reminder settings. Review mutations live in the ledger module
//! because they need their own transactional treatment.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::{Error, Result};
use crate::note::{Note, NoteStatus, NoteType};
use crate::policy::WeightPolicy;
use crate::settings::ReminderSettings;
use crate::ticket::{Ticket, TicketParams, TicketStatus};
use crate::user::User;

/// SQL schema for the correspondence database.
pub const SCHEMA: &str = r#"
-- Parent work items
CREATE TABLE IF NOT EXISTS tickets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL,
    assignee TEXT NOT NULL,
    due TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
);

-- Correspondence drafts attached to tickets
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id INTEGER NOT NULL,
    author TEXT NOT NULL,
    content TEXT NOT NULL,
    type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (ticket_id) REFERENCES tickets(id)
);

-- Reviewer verdicts; retraction marks rows stale instead of deleting them
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id INTEGER NOT NULL,
    type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    weight INTEGER NOT NULL DEFAULT 0,
    author TEXT NOT NULL,
    comment TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (note_id) REFERENCES notes(id)
);

-- Identity -> role roster
CREATE TABLE IF NOT EXISTS users (
    identity TEXT PRIMARY KEY,
    role TEXT NOT NULL
);

-- Singleton reminder configuration
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    unsent_hour INTEGER NOT NULL,
    overdue_days TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
CREATE INDEX IF NOT EXISTS idx_notes_ticket ON notes(ticket_id);
CREATE INDEX IF NOT EXISTS idx_reviews_note ON reviews(note_id);
CREATE INDEX IF NOT EXISTS idx_reviews_note_author ON reviews(note_id, author);
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
pub(crate) fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
pub(crate) fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse an optional `YYYY-MM-DD` date from the database.
fn parse_date_opt(value: Option<String>) -> std::result::Result<Option<NaiveDate>, rusqlite::Error> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(Error::CorruptedData(format!("invalid date '{s}'"))),
                )
            }),
    }
}

/// Run schema creation on a database connection.
///
/// This is the single migration path for all crates (core and daemon); every
/// statement is idempotent so it can run against an existing database.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// SQLite database connection with correspondence-tracking operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
    pub(crate) policy: WeightPolicy,
}

impl Database {
    /// Open a database at the given path with the default weight policy,
    /// creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_policy(path, WeightPolicy::default())
    }

    /// Open a database at the given path with an explicit weight policy.
    pub fn open_with_policy(path: &Path, policy: WeightPolicy) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL plus a busy timeout so concurrent writers queue on the
        // database write lock instead of failing immediately.
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn, policy };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_policy(WeightPolicy::default())
    }

    /// Open an in-memory database with an explicit weight policy (for testing).
    pub fn open_in_memory_with_policy(policy: WeightPolicy) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn, policy };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// The weight policy this database enforces.
    pub fn policy(&self) -> &WeightPolicy {
        &self.policy
    }

    // ------------------------------------------------------------------
    // Tickets
    // ------------------------------------------------------------------

    /// Create a new ticket, returning the stored row.
    pub fn create_ticket(&self, ticket: &TicketParams) -> Result<Ticket> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO tickets (title, description, status, assignee, due, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                ticket.title,
                ticket.description,
                ticket.status.as_str(),
                ticket.assignee,
                ticket.due.map(|d| d.format("%Y-%m-%d").to_string()),
                now,
            ],
        )?;
        self.get_ticket(self.conn.last_insert_rowid())
    }

    /// Get a ticket by ID. Soft-deleted tickets are treated as absent.
    pub fn get_ticket(&self, id: i64) -> Result<Ticket> {
        let ticket = self
            .conn
            .query_row(
                "SELECT id, title, description, status, assignee, due, created_at, updated_at
                 FROM tickets WHERE id = ?1 AND deleted_at IS NULL",
                params![id],
                map_ticket,
            )
            .optional()?;

        ticket.ok_or(Error::TicketNotFound(id))
    }

    /// List tickets with optional status and assignee filters, newest first.
    pub fn list_tickets(
        &self,
        status: Option<TicketStatus>,
        assignee: Option<&str>,
    ) -> Result<Vec<Ticket>> {
        let mut sql = String::from(
            "SELECT id, title, description, status, assignee, due, created_at, updated_at
             FROM tickets WHERE deleted_at IS NULL",
        );

        let mut params_vec: Vec<String> = Vec::new();
        if let Some(s) = status {
            sql.push_str(" AND status = ?");
            params_vec.push(s.as_str().to_string());
        }
        if let Some(a) = assignee {
            sql.push_str(" AND assignee = ?");
            params_vec.push(a.to_string());
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();

        let tickets = stmt
            .query_map(params_refs.as_slice(), map_ticket)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tickets)
    }

    /// Replace all mutable fields of a ticket.
    pub fn update_ticket(&self, id: i64, ticket: &TicketParams) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE tickets SET title = ?1, description = ?2, status = ?3, assignee = ?4,
             due = ?5, updated_at = ?6 WHERE id = ?7 AND deleted_at IS NULL",
            params![
                ticket.title,
                ticket.description,
                ticket.status.as_str(),
                ticket.assignee,
                ticket.due.map(|d| d.format("%Y-%m-%d").to_string()),
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;

        if affected == 0 {
            return Err(Error::TicketNotFound(id));
        }
        Ok(())
    }

    /// Soft-delete a ticket.
    pub fn delete_ticket(&self, id: i64) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE tickets SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![Utc::now().to_rfc3339(), id],
        )?;

        if affected == 0 {
            return Err(Error::TicketNotFound(id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    /// Create a note on a ticket. New notes always start as drafts.
    pub fn create_note(
        &self,
        ticket_id: i64,
        author: &str,
        content: &str,
        note_type: NoteType,
    ) -> Result<Note> {
        // FK alone would not reject soft-deleted tickets.
        self.get_ticket(ticket_id)?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO notes (ticket_id, author, content, type, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'draft', ?5, ?5)",
            params![ticket_id, author, content, note_type.as_str(), now],
        )?;

        self.get_note(ticket_id, self.conn.last_insert_rowid())
    }

    /// Get a note by ID, scoped to its ticket. Soft-deleted notes are absent.
    pub fn get_note(&self, ticket_id: i64, note_id: i64) -> Result<Note> {
        let note = self
            .conn
            .query_row(
                "SELECT id, ticket_id, author, content, type, status, created_at, updated_at
                 FROM notes WHERE id = ?1 AND ticket_id = ?2 AND deleted_at IS NULL",
                params![note_id, ticket_id],
                map_note,
            )
            .optional()?;

        note.ok_or(Error::NoteNotFound(note_id))
    }

    /// Get all live notes on a ticket, oldest first.
    pub fn get_notes(&self, ticket_id: i64) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ticket_id, author, content, type, status, created_at, updated_at
             FROM notes WHERE ticket_id = ?1 AND deleted_at IS NULL ORDER BY created_at",
        )?;

        let notes = stmt
            .query_map(params![ticket_id], map_note)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    /// Update a note's content.
    pub fn update_note_content(&self, ticket_id: i64, note_id: i64, content: &str) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE notes SET content = ?1, updated_at = ?2
             WHERE id = ?3 AND ticket_id = ?4 AND deleted_at IS NULL",
            params![content, Utc::now().to_rfc3339(), note_id, ticket_id],
        )?;

        if affected == 0 {
            return Err(Error::NoteNotFound(note_id));
        }
        Ok(())
    }

    /// Set a note's lifecycle status.
    ///
    /// This is the entry point for the transitions driven from outside the
    /// review core (draft -> waiting_review, waiting_sent -> sent). The
    /// quorum evaluator owns waiting_review -> waiting_sent.
    pub fn set_note_status(&self, ticket_id: i64, note_id: i64, status: NoteStatus) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE notes SET status = ?1, updated_at = ?2
             WHERE id = ?3 AND ticket_id = ?4 AND deleted_at IS NULL",
            params![status.as_str(), Utc::now().to_rfc3339(), note_id, ticket_id],
        )?;

        if affected == 0 {
            return Err(Error::NoteNotFound(note_id));
        }
        Ok(())
    }

    /// Soft-delete a note.
    pub fn delete_note(&self, ticket_id: i64, note_id: i64) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE notes SET deleted_at = ?1 WHERE id = ?2 AND ticket_id = ?3 AND deleted_at IS NULL",
            params![Utc::now().to_rfc3339(), note_id, ticket_id],
        )?;

        if affected == 0 {
            return Err(Error::NoteNotFound(note_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // User roster
    // ------------------------------------------------------------------

    /// Get the full user roster, ordered by identity.
    pub fn get_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT identity, role FROM users ORDER BY identity")?;

        let users = stmt
            .query_map([], |row| {
                let role_str: String = row.get(1)?;
                Ok(User {
                    identity: row.get(0)?,
                    role: parse_db(&role_str, "role")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Replace the entire user roster in one transaction.
    pub fn replace_users(&mut self, users: &[User]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM users", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO users (identity, role) VALUES (?1, ?2)")?;
            for user in users {
                stmt.execute(params![user.identity, user.role.as_str()])?;
            }
        }
        tx.commit()?;
        tracing::debug!(count = users.len(), "user roster replaced");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reminder settings
    // ------------------------------------------------------------------

    /// Get the reminder settings, if they have been configured.
    pub fn reminder_settings(&self) -> Result<ReminderSettings> {
        let row = self
            .conn
            .query_row(
                "SELECT unsent_hour, overdue_days FROM settings WHERE id = 1",
                [],
                |row| {
                    let hour: u8 = row.get(0)?;
                    let days: String = row.get(1)?;
                    Ok((hour, days))
                },
            )
            .optional()?;

        let (unsent_hour, days_json) = row.ok_or(Error::SettingsNotFound)?;
        let overdue_days = serde_json::from_str(&days_json)
            .map_err(|_| Error::CorruptedData(format!("invalid overdue_days '{days_json}'")))?;

        Ok(ReminderSettings {
            unsent_hour,
            overdue_days,
        })
    }

    /// Insert or replace the reminder settings.
    pub fn set_reminder_settings(&self, settings: &ReminderSettings) -> Result<()> {
        let days_json = serde_json::to_string(&settings.overdue_days)?;
        self.conn.execute(
            "INSERT INTO settings (id, unsent_hour, overdue_days) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                unsent_hour = excluded.unsent_hour,
                overdue_days = excluded.overdue_days",
            params![settings.unsent_hour, days_json],
        )?;
        Ok(())
    }
}

fn map_ticket(row: &rusqlite::Row<'_>) -> std::result::Result<Ticket, rusqlite::Error> {
    let status_str: String = row.get(3)?;
    let due_str: Option<String> = row.get(5)?;
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;

    Ok(Ticket {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: parse_db(&status_str, "status")?,
        assignee: row.get(4)?,
        due: parse_date_opt(due_str)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
        updated_at: parse_timestamp(&updated_str, "updated_at")?,
    })
}

fn map_note(row: &rusqlite::Row<'_>) -> std::result::Result<Note, rusqlite::Error> {
    let type_str: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;

    Ok(Note {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        author: row.get(2)?,
        content: row.get(3)?,
        note_type: parse_db(&type_str, "type")?,
        status: parse_db(&status_str, "status")?,
        created_at: parse_timestamp(&created_str, "created_at")?,
        updated_at: parse_timestamp(&updated_str, "updated_at")?,
    })
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
