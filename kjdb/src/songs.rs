//! Catalogue de chansons (lecture seule côté rotation)
//!
//! Le cœur de session ne gère pas la bibliothèque : il consulte un catalogue
//! pour résoudre les métadonnées (artiste, titre, disc id, durée, chemin du
//! média). `SqliteCatalog` fournit l'adaptateur concret ; `insert_song` ne
//! sert qu'au peuplement (import de bibliothèque, fixtures de test).

use crate::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;

/// Métadonnées d'une chanson du catalogue
#[derive(Debug, Clone, Serialize)]
pub struct SongInfo {
    pub id: i64,
    pub artist: String,
    pub title: String,
    /// Identifiant disque/piste du média karaoké (ex: "SC8125-04")
    pub disc_id: String,
    /// Chemin du fichier média
    pub path: String,
    /// Durée en secondes si connue
    pub duration_secs: Option<u32>,
}

/// Forme d'insertion pour le peuplement du catalogue
#[derive(Debug, Clone)]
pub struct NewSong<'a> {
    pub artist: &'a str,
    pub title: &'a str,
    pub disc_id: &'a str,
    pub path: &'a str,
    pub duration_secs: Option<u32>,
}

/// Consultation du catalogue de chansons
///
/// Collaboration à sens unique : le cœur de rotation lit, jamais n'écrit.
pub trait SongCatalog: Send + Sync {
    /// Résout une chanson par identifiant
    fn song(&self, id: i64) -> Result<Option<SongInfo>>;

    /// Résout une chanson par métadonnées (insensible à la casse)
    ///
    /// Utilisé par l'import de réguliers pour retrouver l'identifiant local
    /// d'une chanson décrite par ses tags.
    fn song_by_tags(&self, artist: &str, title: &str, disc_id: &str) -> Result<Option<SongInfo>>;
}

/// Catalogue sur base SQLite
#[derive(Debug)]
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Ouvre (ou crée) le catalogue au chemin donné
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::setup(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Ouvre un catalogue en mémoire (tests, démos)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn setup(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS songs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                artist TEXT NOT NULL,
                title TEXT NOT NULL,
                disc_id TEXT NOT NULL,
                path TEXT NOT NULL,
                duration_secs INTEGER
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_songs_tags
             ON songs (artist COLLATE NOCASE, title COLLATE NOCASE, disc_id COLLATE NOCASE)",
            [],
        )?;

        Ok(())
    }

    /// Insère une chanson et retourne son identifiant
    pub fn insert_song(&self, song: &NewSong<'_>) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO songs (artist, title, disc_id, path, duration_secs)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                song.artist,
                song.title,
                song.disc_id,
                song.path,
                song.duration_secs.map(|d| d as i64),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl SongCatalog for SqliteCatalog {
    fn song(&self, id: i64) -> Result<Option<SongInfo>> {
        let conn = self.conn.lock().unwrap();
        let info = conn
            .query_row(
                "SELECT id, artist, title, disc_id, path, duration_secs
                 FROM songs WHERE id = ?1",
                params![id],
                map_song,
            )
            .optional()?;

        Ok(info)
    }

    fn song_by_tags(&self, artist: &str, title: &str, disc_id: &str) -> Result<Option<SongInfo>> {
        let conn = self.conn.lock().unwrap();
        let info = conn
            .query_row(
                "SELECT id, artist, title, disc_id, path, duration_secs
                 FROM songs
                 WHERE artist = ?1 COLLATE NOCASE
                   AND title = ?2 COLLATE NOCASE
                   AND disc_id = ?3 COLLATE NOCASE",
                params![artist, title, disc_id],
                map_song,
            )
            .optional()?;

        Ok(info)
    }
}

fn map_song(row: &rusqlite::Row<'_>) -> rusqlite::Result<SongInfo> {
    let duration: Option<i64> = row.get(5)?;
    Ok(SongInfo {
        id: row.get(0)?,
        artist: row.get(1)?,
        title: row.get(2)?,
        disc_id: row.get(3)?,
        path: row.get(4)?,
        duration_secs: duration.map(|d| d as u32),
    })
}
