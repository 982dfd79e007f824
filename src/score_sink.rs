use chrono::Local;
use directories::ProjectDirs;
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

/// Opaque identifier correlating a session with its stored record.
pub type SessionId = i64;

/// External score-record collaborator. Called best-effort: every failure is
/// surfaced as a notice and never blocks or mutates gameplay state; the
/// in-memory score stays authoritative.
pub trait ScoreSink {
    /// Create a session record, returning its id.
    fn create_session(&mut self, initial_score: u32) -> Result<SessionId>;
    /// Mirror the current score. No retry on failure.
    fn update_score(&mut self, id: SessionId, score: u32) -> Result<()>;
    /// Attach the contact email the player left in the end dialog.
    fn attach_contact(&mut self, id: SessionId, email: &str) -> Result<()>;
}

/// SQLite-backed score sink.
#[derive(Debug)]
pub struct SqliteScoreSink {
    conn: Connection,
}

impl SqliteScoreSink {
    /// Open the database at the default state-directory location, creating
    /// the schema if needed.
    pub fn new() -> Result<Self> {
        let db_path = Self::db_path().unwrap_or_else(|| PathBuf::from("fokus_scores.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS game_plays (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                score INTEGER NOT NULL,
                contact_email TEXT,
                started_at TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_game_plays_started_at ON game_plays(started_at)",
            [],
        )?;

        Ok(SqliteScoreSink { conn })
    }

    /// Database file under $HOME/.local/state/fokus, with a system-specific
    /// fallback.
    fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home).join(".local").join("state").join("fokus");
            Some(state_dir.join("scores.db"))
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "fokus") {
            Some(proj_dirs.data_local_dir().join("scores.db"))
        } else {
            None
        }
    }

    /// Read back a stored record, used by tests and the session history view.
    pub fn record(&self, id: SessionId) -> Result<(u32, Option<String>)> {
        self.conn.query_row(
            "SELECT score, contact_email FROM game_plays WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
    }
}

impl ScoreSink for SqliteScoreSink {
    fn create_session(&mut self, initial_score: u32) -> Result<SessionId> {
        self.conn.execute(
            "INSERT INTO game_plays (score, started_at) VALUES (?1, ?2)",
            params![initial_score, Local::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_score(&mut self, id: SessionId, score: u32) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE game_plays SET score = ?1 WHERE id = ?2",
            params![score, id],
        )?;
        if changed == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    fn attach_contact(&mut self, id: SessionId, email: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE game_plays SET contact_email = ?1 WHERE id = ?2",
            params![email, id],
        )?;
        if changed == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }
}

/// In-memory sink recording every call, for headless tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub sessions: Vec<MemorySession>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySession {
    pub score: u32,
    pub contact_email: Option<String>,
    /// Every score value pushed through update_score, in order.
    pub updates: Vec<u32>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreSink for MemorySink {
    fn create_session(&mut self, initial_score: u32) -> Result<SessionId> {
        self.sessions.push(MemorySession {
            score: initial_score,
            contact_email: None,
            updates: Vec::new(),
        });
        Ok(self.sessions.len() as SessionId)
    }

    fn update_score(&mut self, id: SessionId, score: u32) -> Result<()> {
        let session = self
            .sessions
            .get_mut(id as usize - 1)
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        session.score = score;
        session.updates.push(score);
        Ok(())
    }

    fn attach_contact(&mut self, id: SessionId, email: &str) -> Result<()> {
        let session = self
            .sessions
            .get_mut(id as usize - 1)
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        session.contact_email = Some(email.to_string());
        Ok(())
    }
}

/// Sink whose every call fails, for degraded-mode tests.
#[derive(Debug, Default)]
pub struct FailingSink;

impl ScoreSink for FailingSink {
    fn create_session(&mut self, _initial_score: u32) -> Result<SessionId> {
        Err(rusqlite::Error::QueryReturnedNoRows)
    }

    fn update_score(&mut self, _id: SessionId, _score: u32) -> Result<()> {
        Err(rusqlite::Error::QueryReturnedNoRows)
    }

    fn attach_contact(&mut self, _id: SessionId, _email: &str) -> Result<()> {
        Err(rusqlite::Error::QueryReturnedNoRows)
    }
}
