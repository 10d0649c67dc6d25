use crate::error::{GameError, Result};
use crate::session::GameSession;
use crate::storage::{record, SessionStore};
use crate::types::{Address, GameId};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const CURRENT_GAME_KEY: &str = "current_game";

fn current_game_key(account: &Address) -> String {
    format!("{}:{}", CURRENT_GAME_KEY, account)
}

/// SQLite-backed session store, one row per (account, game).
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GameError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                account TEXT NOT NULL,
                game_id TEXT NOT NULL,
                player1 TEXT NOT NULL,
                player2 TEXT NOT NULL,
                phase TEXT NOT NULL,
                record TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (account, game_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn save(&self, account: &Address, session: &GameSession) -> Result<()> {
        let json = record::encode(session)?;
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR REPLACE INTO sessions (account, game_id, player1, player2, phase, record, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                account.to_string(),
                session.game_id.to_string(),
                session.player1.to_string(),
                session.player2.to_string(),
                session.phase.as_str(),
                json,
                Utc::now().timestamp(),
            ],
        )?;

        tracing::debug!("Saved session {} ({})", session.game_id, session.phase);
        Ok(())
    }

    fn load(&self, account: &Address, game: &GameId) -> Result<Option<GameSession>> {
        let conn = self.conn.lock();

        let json: Option<String> = conn
            .query_row(
                "SELECT record FROM sessions WHERE account = ?1 AND game_id = ?2",
                params![account.to_string(), game.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|json| record::decode(&json)).transpose()
    }

    fn list(&self, account: &Address) -> Result<Vec<GameSession>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT record FROM sessions WHERE account = ?1 ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![account.to_string()], |row| {
            row.get::<_, String>(0)
        })?;

        let mut sessions = Vec::new();
        for json in rows {
            sessions.push(record::decode(&json?)?);
        }

        Ok(sessions)
    }

    fn set_current(&self, account: &Address, game: &GameId) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![current_game_key(account), game.to_string()],
        )?;
        Ok(())
    }

    fn current(&self, account: &Address) -> Result<Option<GameId>> {
        let conn = self.conn.lock();

        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![current_game_key(account)],
                |row| row.get(0),
            )
            .optional()?;

        value.map(|v| v.parse()).transpose()
    }
}
