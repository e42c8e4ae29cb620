//! Adaptateur SQLite de la passerelle de session
//!
//! Connexion unique derrière un `Mutex`, schéma créé à l'ouverture. Les
//! transactions sont pilotées par instructions SQL explicites pour rester
//! utilisables à travers l'objet trait [`SessionStore`].

use crate::rows::{
    NewQueueSong, NewRegularSong, NewSinger, QueueSongRow, RegularSingerRow, RegularSongRow,
    SingerRow,
};
use crate::store::SessionStore;
use crate::{Error, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Passerelle de session sur base SQLite
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Ouvre (ou crée) la base de session au chemin donné
    ///
    /// Le répertoire parent est créé si nécessaire ; le schéma est créé à
    /// l'ouverture (`CREATE TABLE IF NOT EXISTS`).
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::setup(&conn)?;

        tracing::info!("Session database opened: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Ouvre une base en mémoire (tests, démos)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn setup(conn: &Connection) -> Result<()> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS singers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                position INTEGER NOT NULL,
                regular INTEGER NOT NULL DEFAULT 0,
                regular_id INTEGER,
                added_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS queue_songs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                singer_id INTEGER NOT NULL REFERENCES singers(id) ON DELETE CASCADE,
                song_id INTEGER NOT NULL,
                key_change INTEGER NOT NULL DEFAULT 0,
                played INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL,
                regular_mirror INTEGER NOT NULL DEFAULT 0,
                regular_song_id INTEGER
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS regular_singers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS regular_songs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                regular_singer_id INTEGER NOT NULL REFERENCES regular_singers(id) ON DELETE CASCADE,
                song_id INTEGER NOT NULL,
                key_change INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_queue_songs_singer
             ON queue_songs (singer_id, position)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_regular_songs_owner
             ON regular_songs (regular_singer_id, position)",
            [],
        )?;

        Ok(())
    }
}

impl SessionStore for SqliteStore {
    fn begin(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn insert_singer(&self, singer: &NewSinger<'_>) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO singers (name, position, regular, regular_id, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                singer.name,
                singer.position,
                singer.regular_id.is_some(),
                singer.regular_id,
                singer.added_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_singer(&self, row: &SingerRow) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE singers SET name = ?2, position = ?3, regular = ?4, regular_id = ?5
             WHERE id = ?1",
            params![row.id, row.name, row.position, row.regular, row.regular_id],
        )?;
        if updated == 0 {
            return Err(Error::RowNotFound(row.id));
        }
        Ok(())
    }

    fn delete_singer(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM singers WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(Error::RowNotFound(id));
        }
        Ok(())
    }

    fn load_singers(&self) -> Result<Vec<SingerRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, position, regular, regular_id, added_at
             FROM singers ORDER BY position ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(SingerRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    position: row.get(2)?,
                    regular: row.get(3)?,
                    regular_id: row.get(4)?,
                    added_at: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn clear_session(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM queue_songs", [])?;
        conn.execute("DELETE FROM singers", [])?;
        Ok(())
    }

    fn insert_queue_song(&self, song: &NewQueueSong) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO queue_songs
                 (singer_id, song_id, key_change, played, position, regular_mirror, regular_song_id)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6)",
            params![
                song.singer_id,
                song.song_id,
                song.key_change,
                song.position,
                song.regular_song_id.is_some(),
                song.regular_song_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_queue_song(&self, row: &QueueSongRow) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE queue_songs
             SET singer_id = ?2, song_id = ?3, key_change = ?4, played = ?5,
                 position = ?6, regular_mirror = ?7, regular_song_id = ?8
             WHERE id = ?1",
            params![
                row.id,
                row.singer_id,
                row.song_id,
                row.key_change,
                row.played,
                row.position,
                row.regular_mirror,
                row.regular_song_id,
            ],
        )?;
        if updated == 0 {
            return Err(Error::RowNotFound(row.id));
        }
        Ok(())
    }

    fn delete_queue_song(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM queue_songs WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(Error::RowNotFound(id));
        }
        Ok(())
    }

    fn delete_queue_for_singer(&self, singer_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM queue_songs WHERE singer_id = ?1",
            params![singer_id],
        )?;
        Ok(())
    }

    fn load_queue_songs(&self) -> Result<Vec<QueueSongRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, singer_id, song_id, key_change, played, position,
                    regular_mirror, regular_song_id
             FROM queue_songs ORDER BY singer_id ASC, position ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(QueueSongRow {
                    id: row.get(0)?,
                    singer_id: row.get(1)?,
                    song_id: row.get(2)?,
                    key_change: row.get(3)?,
                    played: row.get(4)?,
                    position: row.get(5)?,
                    regular_mirror: row.get(6)?,
                    regular_song_id: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn insert_regular_singer(&self, name: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO regular_singers (name) VALUES (?1)",
            params![name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_regular_singer(&self, row: &RegularSingerRow) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE regular_singers SET name = ?2 WHERE id = ?1",
            params![row.id, row.name],
        )?;
        if updated == 0 {
            return Err(Error::RowNotFound(row.id));
        }
        Ok(())
    }

    fn delete_regular_singer(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM regular_singers WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(Error::RowNotFound(id));
        }
        Ok(())
    }

    fn load_regular_singers(&self) -> Result<Vec<RegularSingerRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name FROM regular_singers ORDER BY name COLLATE NOCASE ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RegularSingerRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn insert_regular_song(&self, song: &NewRegularSong) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO regular_songs (regular_singer_id, song_id, key_change, position)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                song.regular_singer_id,
                song.song_id,
                song.key_change,
                song.position,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_regular_song(&self, row: &RegularSongRow) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE regular_songs
             SET regular_singer_id = ?2, song_id = ?3, key_change = ?4, position = ?5
             WHERE id = ?1",
            params![
                row.id,
                row.regular_singer_id,
                row.song_id,
                row.key_change,
                row.position,
            ],
        )?;
        if updated == 0 {
            return Err(Error::RowNotFound(row.id));
        }
        Ok(())
    }

    fn delete_regular_song(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM regular_songs WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(Error::RowNotFound(id));
        }
        Ok(())
    }

    fn delete_songs_for_regular(&self, regular_singer_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM regular_songs WHERE regular_singer_id = ?1",
            params![regular_singer_id],
        )?;
        Ok(())
    }

    fn load_regular_songs(&self) -> Result<Vec<RegularSongRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, regular_singer_id, song_id, key_change, position
             FROM regular_songs ORDER BY regular_singer_id ASC, position ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RegularSongRow {
                    id: row.get(0)?,
                    regular_singer_id: row.get(1)?,
                    song_id: row.get(2)?,
                    key_change: row.get(3)?,
                    position: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}
