//! SQLite storage layer for mingle.
//!
//! Holds the user, session, friendship, and event tables behind typed row
//! structs and query methods. The friendship table is a flat edge relation:
//! one row per unordered pair of users, normalized so that
//! `user_low < user_high`, which makes the at-most-one-edge-per-pair
//! invariant a database constraint rather than application bookkeeping.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    NotFound(String),
    AlreadyExists(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Sqlite(e) => write!(f, "sqlite error: {e}"),
            StorageError::Io(e) => write!(f, "io error: {e}"),
            StorageError::NotFound(msg) => write!(f, "not found: {msg}"),
            StorageError::AlreadyExists(msg) => write!(f, "already exists: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Sqlite(e)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// User row stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub role: String,
    pub verified_at: Option<u64>,
    pub created_at: u64,
}

/// Friendship edge between two users.
///
/// The pair is stored normalized (`user_low < user_high`); `requester_id`
/// records which of the two initiated the request and is consulted only by
/// the accept transition, never by graph traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipRow {
    pub friendship_id: i64,
    pub user_low: i64,
    pub user_high: i64,
    pub requester_id: i64,
    pub status: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl FriendshipRow {
    /// The party on the edge that is not `user`.
    pub fn other_party(&self, user: i64) -> i64 {
        if self.user_low == user {
            self.user_high
        } else {
            self.user_low
        }
    }
}

/// Event row stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub event_id: i64,
    pub owner_id: i64,
    pub name: String,
    pub category: String,
    pub starts_at: u64,
    pub duration_mins: u32,
    pub location: String,
    pub coordinate_lat: Option<f64>,
    pub coordinate_lon: Option<f64>,
    pub privacy: String,
    pub max_participants: u32,
    pub photo_url: Option<String>,
    pub remarks: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Normalize an unordered user pair to `(low, high)` storage order.
pub fn normalize_pair(a: i64, b: i64) -> (i64, i64) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create a database at the given path. Creates schema if needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Create an in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                user_id        INTEGER PRIMARY KEY AUTOINCREMENT,
                name           TEXT NOT NULL,
                email          TEXT NOT NULL UNIQUE,
                password_hash  TEXT NOT NULL,
                password_salt  TEXT NOT NULL,
                role           TEXT NOT NULL DEFAULT 'ordinary',
                verified_at    INTEGER,
                created_at     INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token       TEXT PRIMARY KEY,
                user_id     INTEGER NOT NULL
                            REFERENCES users(user_id) ON DELETE CASCADE,
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS friendships (
                friendship_id  INTEGER PRIMARY KEY AUTOINCREMENT,
                user_low       INTEGER NOT NULL,
                user_high      INTEGER NOT NULL,
                requester_id   INTEGER NOT NULL,
                status         TEXT NOT NULL,
                created_at     INTEGER NOT NULL,
                updated_at     INTEGER NOT NULL,
                UNIQUE(user_low, user_high)
            );

            CREATE INDEX IF NOT EXISTS idx_friendships_low
                ON friendships(user_low, status);
            CREATE INDEX IF NOT EXISTS idx_friendships_high
                ON friendships(user_high, status);

            CREATE TABLE IF NOT EXISTS events (
                event_id          INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id          INTEGER NOT NULL
                                  REFERENCES users(user_id) ON DELETE CASCADE,
                name              TEXT NOT NULL,
                category          TEXT NOT NULL,
                starts_at         INTEGER NOT NULL,
                duration_mins     INTEGER NOT NULL,
                location          TEXT NOT NULL,
                coordinate_lat    REAL,
                coordinate_lon    REAL,
                privacy           TEXT NOT NULL,
                max_participants  INTEGER NOT NULL,
                photo_url         TEXT,
                remarks           TEXT,
                created_at        INTEGER NOT NULL,
                updated_at        INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_owner ON events(owner_id);

            CREATE TABLE IF NOT EXISTS event_participants (
                event_id   INTEGER NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
                user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
                joined_at  INTEGER NOT NULL,
                UNIQUE(event_id, user_id)
            );
            ",
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Users CRUD
    // -----------------------------------------------------------------------

    pub fn insert_user(&self, row: &UserRow) -> Result<i64, StorageError> {
        if self.get_user_by_email(&row.email)?.is_some() {
            return Err(StorageError::AlreadyExists(format!(
                "user with email {} already registered",
                row.email
            )));
        }
        self.conn.execute(
            "INSERT INTO users
             (name, email, password_hash, password_salt, role, verified_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                row.name,
                row.email,
                row.password_hash,
                row.password_salt,
                row.role,
                row.verified_at.map(|t| t as i64),
                row.created_at as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<UserRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, name, email, password_hash, password_salt, role,
                    verified_at, created_at
             FROM users WHERE user_id = ?1",
        )?;
        let row = stmt
            .query_row(params![user_id], Self::map_user_row)
            .optional()?;
        Ok(row)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, name, email, password_hash, password_salt, role,
                    verified_at, created_at
             FROM users WHERE email = ?1",
        )?;
        let row = stmt
            .query_row(params![email], Self::map_user_row)
            .optional()?;
        Ok(row)
    }

    /// Admin edit: overwrite the mutable profile fields of a user.
    pub fn update_user(
        &self,
        user_id: i64,
        name: &str,
        email: &str,
        role: &str,
        verified_at: Option<u64>,
    ) -> Result<(), StorageError> {
        let affected = self.conn.execute(
            "UPDATE users SET name = ?1, email = ?2, role = ?3, verified_at = ?4
             WHERE user_id = ?5",
            params![name, email, role, verified_at.map(|t| t as i64), user_id],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    /// Delete an account. Sessions, owned events (with their participant
    /// rows), and memberships in other events cascade with it; friendship
    /// edges are not constrained and callers skip dangling parties.
    pub fn delete_user(&self, user_id: i64) -> Result<bool, StorageError> {
        let affected = self
            .conn
            .execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
        Ok(affected > 0)
    }

    fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
        Ok(UserRow {
            user_id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            password_salt: row.get(4)?,
            role: row.get(5)?,
            verified_at: row.get::<_, Option<i64>>(6)?.map(|t| t as u64),
            created_at: row.get::<_, i64>(7)? as u64,
        })
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    pub fn insert_session(
        &self,
        token: &str,
        user_id: i64,
        created_at: u64,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, created_at as i64],
        )?;
        Ok(())
    }

    /// Invalidate a bearer token. Returns whether a session was removed.
    pub fn delete_session(&self, token: &str) -> Result<bool, StorageError> {
        let affected = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(affected > 0)
    }

    /// Resolve a bearer token to the user it was issued to.
    pub fn get_session_user(&self, token: &str) -> Result<Option<i64>, StorageError> {
        let user_id = self
            .conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }

    // -----------------------------------------------------------------------
    // Friendships (the friendship repository contract)
    // -----------------------------------------------------------------------

    /// Find the friendship record for an unordered pair, in any status.
    pub fn find_friendship_by_pair(
        &self,
        a: i64,
        b: i64,
    ) -> Result<Option<FriendshipRow>, StorageError> {
        let (low, high) = normalize_pair(a, b);
        let mut stmt = self.conn.prepare(
            "SELECT friendship_id, user_low, user_high, requester_id, status,
                    created_at, updated_at
             FROM friendships WHERE user_low = ?1 AND user_high = ?2",
        )?;
        let row = stmt
            .query_row(params![low, high], Self::map_friendship_row)
            .optional()?;
        Ok(row)
    }

    /// All friendship records touching `user`, in any status.
    pub fn list_friendships_involving(
        &self,
        user: i64,
    ) -> Result<Vec<FriendshipRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT friendship_id, user_low, user_high, requester_id, status,
                    created_at, updated_at
             FROM friendships WHERE user_low = ?1 OR user_high = ?1
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![user], Self::map_friendship_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// The accepted-friend ids of `user`, projected to the other party.
    /// Single filtered query over the edge relation; no graph structure is
    /// kept in memory.
    pub fn list_accepted_friend_ids(&self, user: i64) -> Result<Vec<i64>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT CASE WHEN user_low = ?1 THEN user_high ELSE user_low END
             FROM friendships
             WHERE (user_low = ?1 OR user_high = ?1) AND status = 'accepted'",
        )?;
        let rows = stmt.query_map(params![user], |row| row.get(0))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn insert_friendship(&self, row: &FriendshipRow) -> Result<i64, StorageError> {
        let (low, high) = normalize_pair(row.user_low, row.user_high);
        if self.find_friendship_by_pair(low, high)?.is_some() {
            return Err(StorageError::AlreadyExists(format!(
                "friendship between {low} and {high}"
            )));
        }
        self.conn.execute(
            "INSERT INTO friendships
             (user_low, user_high, requester_id, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                low,
                high,
                row.requester_id,
                row.status,
                row.created_at as i64,
                row.updated_at as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_friendship_status(
        &self,
        friendship_id: i64,
        status: &str,
    ) -> Result<(), StorageError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let affected = self.conn.execute(
            "UPDATE friendships SET status = ?1, updated_at = ?2 WHERE friendship_id = ?3",
            params![status, now as i64, friendship_id],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!(
                "friendship {friendship_id}"
            )));
        }
        Ok(())
    }

    pub fn delete_friendship(&self, friendship_id: i64) -> Result<(), StorageError> {
        let affected = self.conn.execute(
            "DELETE FROM friendships WHERE friendship_id = ?1",
            params![friendship_id],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!(
                "friendship {friendship_id}"
            )));
        }
        Ok(())
    }

    fn map_friendship_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FriendshipRow> {
        Ok(FriendshipRow {
            friendship_id: row.get(0)?,
            user_low: row.get(1)?,
            user_high: row.get(2)?,
            requester_id: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get::<_, i64>(5)? as u64,
            updated_at: row.get::<_, i64>(6)? as u64,
        })
    }

    // -----------------------------------------------------------------------
    // Events CRUD
    // -----------------------------------------------------------------------

    pub fn insert_event(&self, row: &EventRow) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO events
             (owner_id, name, category, starts_at, duration_mins, location,
              coordinate_lat, coordinate_lon, privacy, max_participants,
              photo_url, remarks, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                row.owner_id,
                row.name,
                row.category,
                row.starts_at as i64,
                row.duration_mins,
                row.location,
                row.coordinate_lat,
                row.coordinate_lon,
                row.privacy,
                row.max_participants,
                row.photo_url,
                row.remarks,
                row.created_at as i64,
                row.updated_at as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite the mutable fields of an event. `photo_url` is only
    /// replaced when a new one is supplied; the previous reference is
    /// superseded, not garbage-collected here.
    pub fn update_event(&self, row: &EventRow) -> Result<(), StorageError> {
        let affected = self.conn.execute(
            "UPDATE events SET
                name = ?1, category = ?2, starts_at = ?3, duration_mins = ?4,
                location = ?5, coordinate_lat = ?6, coordinate_lon = ?7,
                privacy = ?8, max_participants = ?9,
                photo_url = COALESCE(?10, photo_url), remarks = ?11,
                updated_at = ?12
             WHERE event_id = ?13",
            params![
                row.name,
                row.category,
                row.starts_at as i64,
                row.duration_mins,
                row.location,
                row.coordinate_lat,
                row.coordinate_lon,
                row.privacy,
                row.max_participants,
                row.photo_url,
                row.remarks,
                row.updated_at as i64,
                row.event_id,
            ],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("event {}", row.event_id)));
        }
        Ok(())
    }

    pub fn get_event(&self, event_id: i64) -> Result<Option<EventRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, owner_id, name, category, starts_at, duration_mins,
                    location, coordinate_lat, coordinate_lon, privacy,
                    max_participants, photo_url, remarks, created_at, updated_at
             FROM events WHERE event_id = ?1",
        )?;
        let row = stmt
            .query_row(params![event_id], Self::map_event_row)
            .optional()?;
        Ok(row)
    }

    /// Fetch an event only if `owner_id` owns it. Existence and ownership
    /// are checked in one lookup so a failed mutation by a non-owner is
    /// indistinguishable from a missing event.
    pub fn get_event_owned(
        &self,
        event_id: i64,
        owner_id: i64,
    ) -> Result<Option<EventRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, owner_id, name, category, starts_at, duration_mins,
                    location, coordinate_lat, coordinate_lon, privacy,
                    max_participants, photo_url, remarks, created_at, updated_at
             FROM events WHERE event_id = ?1 AND owner_id = ?2",
        )?;
        let row = stmt
            .query_row(params![event_id, owner_id], Self::map_event_row)
            .optional()?;
        Ok(row)
    }

    /// Delete an event only if `owner_id` owns it. Returns whether a row was
    /// deleted; the single statement keeps ownership and existence merged.
    pub fn delete_event_owned(&self, event_id: i64, owner_id: i64) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "DELETE FROM events WHERE event_id = ?1 AND owner_id = ?2",
            params![event_id, owner_id],
        )?;
        Ok(affected > 0)
    }

    pub fn list_events_by_owner(&self, owner_id: i64) -> Result<Vec<EventRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, owner_id, name, category, starts_at, duration_mins,
                    location, coordinate_lat, coordinate_lon, privacy,
                    max_participants, photo_url, remarks, created_at, updated_at
             FROM events WHERE owner_id = ?1 ORDER BY starts_at",
        )?;
        let rows = stmt.query_map(params![owner_id], Self::map_event_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn map_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
        Ok(EventRow {
            event_id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            category: row.get(3)?,
            starts_at: row.get::<_, i64>(4)? as u64,
            duration_mins: row.get(5)?,
            location: row.get(6)?,
            coordinate_lat: row.get(7)?,
            coordinate_lon: row.get(8)?,
            privacy: row.get(9)?,
            max_participants: row.get(10)?,
            photo_url: row.get(11)?,
            remarks: row.get(12)?,
            created_at: row.get::<_, i64>(13)? as u64,
            updated_at: row.get::<_, i64>(14)? as u64,
        })
    }

    // -----------------------------------------------------------------------
    // Event participants
    // -----------------------------------------------------------------------

    pub fn add_participant(
        &self,
        event_id: i64,
        user_id: i64,
        joined_at: u64,
    ) -> Result<(), StorageError> {
        if self.is_participant(event_id, user_id)? {
            return Err(StorageError::AlreadyExists(format!(
                "user {user_id} already participates in event {event_id}"
            )));
        }
        self.conn.execute(
            "INSERT INTO event_participants (event_id, user_id, joined_at)
             VALUES (?1, ?2, ?3)",
            params![event_id, user_id, joined_at as i64],
        )?;
        Ok(())
    }

    pub fn is_participant(&self, event_id: i64, user_id: i64) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_participants
             WHERE event_id = ?1 AND user_id = ?2",
            params![event_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn count_participants(&self, event_id: i64) -> Result<u32, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_participants WHERE event_id = ?1",
            params![event_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    /// Participant user projections for an event, join order preserved.
    pub fn list_participant_users(&self, event_id: i64) -> Result<Vec<UserRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT u.user_id, u.name, u.email, u.password_hash, u.password_salt,
                    u.role, u.verified_at, u.created_at
             FROM event_participants AS p
             INNER JOIN users AS u ON u.user_id = p.user_id
             WHERE p.event_id = ?1
             ORDER BY p.joined_at",
        )?;
        let rows = stmt.query_map(params![event_id], Self::map_user_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
