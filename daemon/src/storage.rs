//! SQLite storage for finished sessions.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::error::{Error, PersistError};
use crate::watcher::SessionRecord;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS twitch_streams (
    id INTEGER NOT NULL PRIMARY KEY,
    status TEXT,
    starttime TEXT NOT NULL,
    endtime TEXT NOT NULL,
    initialfollow INTEGER,
    initialsub INTEGER,
    endfollow INTEGER,
    endsub INTEGER,
    avgviewers INTEGER,
    maxviewers INTEGER,
    createdat TEXT NOT NULL,
    enterdate TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);
"#;

const COLUMNS: &str = "id, status, starttime, endtime, initialfollow, initialsub, \
                       endfollow, endsub, avgviewers, maxviewers, createdat";

/// Destination for finished sessions.
pub trait SessionSink {
    /// Insert or replace the row for `record.stream_id`.
    fn save(&self, record: &SessionRecord) -> Result<(), PersistError>;
}

/// Session table in a SQLite database.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Open the database at `dsn` and create the table if needed.
    ///
    /// `:memory:` opens a private in-memory database.
    pub fn open(dsn: &str) -> Result<Self, Error> {
        let conn = if dsn == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(dsn).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open(dsn)?
        };

        conn.execute_batch(SCHEMA)?;
        debug!(dsn, "Session table ready");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, PersistError> {
        self.conn
            .lock()
            .map_err(|_| PersistError::Connection("connection lock poisoned".to_string()))
    }

    /// Fetch the stored session for a stream id.
    #[cfg(test)]
    pub fn get(&self, stream_id: i64) -> Result<Option<SessionRecord>, PersistError> {
        use rusqlite::OptionalExtension;

        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM twitch_streams WHERE id = ?1", COLUMNS);
        let record = conn
            .query_row(&sql, params![stream_id], row_to_record)
            .optional()?;
        Ok(record)
    }

    /// Most recently started sessions first.
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>, PersistError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM twitch_streams ORDER BY starttime DESC LIMIT ?1",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<usize, PersistError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM twitch_streams", [], |row| {
            row.get(0)
        })?;
        Ok(n as usize)
    }
}

impl SessionSink for SessionStore {
    fn save(&self, record: &SessionRecord) -> Result<(), PersistError> {
        info!(
            stream_id = record.stream_id,
            title = %record.title,
            start = %record.start_time.to_rfc3339(),
            end = %record.end_time.to_rfc3339(),
            initial_followers = record.initial_followers,
            initial_subscribers = record.initial_subscribers,
            final_followers = record.final_followers,
            final_subscribers = record.final_subscribers,
            average_viewers = record.average_viewers,
            max_viewers = record.max_viewers,
            "Inserting session"
        );

        let conn = self.lock()?;
        let sql = format!(
            "INSERT OR REPLACE INTO twitch_streams ({}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            COLUMNS
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let affected = stmt.execute(params![
            record.stream_id,
            record.title,
            record.start_time.to_rfc3339(),
            record.end_time.to_rfc3339(),
            record.initial_followers,
            record.initial_subscribers,
            record.final_followers,
            record.final_subscribers,
            record.average_viewers,
            record.max_viewers,
            record.created_at.to_rfc3339(),
        ])?;

        if affected != 1 {
            return Err(PersistError::UnexpectedRows {
                stream_id: record.stream_id,
                affected,
            });
        }
        Ok(())
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        stream_id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        start_time: parse_time(row, 2)?,
        end_time: parse_time(row, 3)?,
        initial_followers: row.get(4)?,
        initial_subscribers: row.get(5)?,
        final_followers: row.get(6)?,
        final_subscribers: row.get(7)?,
        average_viewers: row.get(8)?,
        max_viewers: row.get(9)?,
        created_at: parse_time(row, 10)?,
    })
}

fn parse_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
