//! Fixtures partagées entre les binaires de test d'intégration
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use kjdb::{
    NewQueueSong, NewRegularSong, NewSinger, NewSong, QueueSongRow, RegularSingerRow,
    RegularSongRow, SessionStore, SingerRow, SqliteCatalog, SqliteStore,
};
use kjrotation::{Clock, Rotation, RotationOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Horloge figée : horodatages identiques d'un run à l'autre
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
    ))
}

/// Catalogue en mémoire avec quatre chansons connues
///
/// Identifiants attribués dans l'ordre : 1 Queen (355 s), 2 ABBA (170 s),
/// 3 Toto (296 s), 4 Journey (durée inconnue).
pub fn seeded_catalog() -> Arc<SqliteCatalog> {
    let catalog = SqliteCatalog::open_in_memory().unwrap();
    for (artist, title, disc_id, duration_secs) in [
        ("Queen", "Bohemian Rhapsody", "SC8125-04", Some(355)),
        ("ABBA", "Waterloo", "SC1002-11", Some(170)),
        ("Toto", "Africa", "SC2201-07", Some(296)),
        ("Journey", "Don't Stop Believin'", "SC3304-02", None),
    ] {
        let path = format!("/media/karaoke/{}.zip", disc_id);
        catalog
            .insert_song(&NewSong {
                artist,
                title,
                disc_id,
                path: &path,
                duration_secs,
            })
            .unwrap();
    }
    Arc::new(catalog)
}

/// Session vierge sur base en mémoire, catalogue peuplé, horloge figée
pub fn open_session() -> Rotation {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    Rotation::open(
        store,
        seeded_catalog(),
        fixed_clock(),
        RotationOptions::default(),
    )
    .unwrap()
}

/// Session sur une passerelle fournie (pour partager ou rouvrir la base)
pub fn open_session_on(store: Arc<dyn SessionStore>) -> Rotation {
    Rotation::open(
        store,
        seeded_catalog(),
        fixed_clock(),
        RotationOptions::default(),
    )
    .unwrap()
}

/// Positions d'une échelle, pour vérifier la densité 0..N-1
pub fn assert_dense(positions: &[usize]) {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    let expected: Vec<usize> = (0..positions.len()).collect();
    assert_eq!(sorted, expected, "positions not dense: {:?}", positions);
}

/// Passerelle à panne injectable : le prochain commit échoue une fois
///
/// La transaction SQL reste ouverte quand le commit injecté échoue : la
/// garde la rollbacke, exactement comme sur une vraie panne d'écriture.
pub struct FailingStore {
    inner: SqliteStore,
    fail_next_commit: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Arme la panne : le prochain commit échouera
    pub fn arm(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

impl SessionStore for FailingStore {
    fn begin(&self) -> kjdb::Result<()> {
        self.inner.begin()
    }

    fn commit(&self) -> kjdb::Result<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(kjdb::Error::Other(anyhow::anyhow!(
                "injected commit failure"
            )));
        }
        self.inner.commit()
    }

    fn rollback(&self) -> kjdb::Result<()> {
        self.inner.rollback()
    }

    fn insert_singer(&self, singer: &NewSinger<'_>) -> kjdb::Result<i64> {
        self.inner.insert_singer(singer)
    }

    fn update_singer(&self, row: &SingerRow) -> kjdb::Result<()> {
        self.inner.update_singer(row)
    }

    fn delete_singer(&self, id: i64) -> kjdb::Result<()> {
        self.inner.delete_singer(id)
    }

    fn load_singers(&self) -> kjdb::Result<Vec<SingerRow>> {
        self.inner.load_singers()
    }

    fn clear_session(&self) -> kjdb::Result<()> {
        self.inner.clear_session()
    }

    fn insert_queue_song(&self, song: &NewQueueSong) -> kjdb::Result<i64> {
        self.inner.insert_queue_song(song)
    }

    fn update_queue_song(&self, row: &QueueSongRow) -> kjdb::Result<()> {
        self.inner.update_queue_song(row)
    }

    fn delete_queue_song(&self, id: i64) -> kjdb::Result<()> {
        self.inner.delete_queue_song(id)
    }

    fn delete_queue_for_singer(&self, singer_id: i64) -> kjdb::Result<()> {
        self.inner.delete_queue_for_singer(singer_id)
    }

    fn load_queue_songs(&self) -> kjdb::Result<Vec<QueueSongRow>> {
        self.inner.load_queue_songs()
    }

    fn insert_regular_singer(&self, name: &str) -> kjdb::Result<i64> {
        self.inner.insert_regular_singer(name)
    }

    fn update_regular_singer(&self, row: &RegularSingerRow) -> kjdb::Result<()> {
        self.inner.update_regular_singer(row)
    }

    fn delete_regular_singer(&self, id: i64) -> kjdb::Result<()> {
        self.inner.delete_regular_singer(id)
    }

    fn load_regular_singers(&self) -> kjdb::Result<Vec<RegularSingerRow>> {
        self.inner.load_regular_singers()
    }

    fn insert_regular_song(&self, song: &NewRegularSong) -> kjdb::Result<i64> {
        self.inner.insert_regular_song(song)
    }

    fn update_regular_song(&self, row: &RegularSongRow) -> kjdb::Result<()> {
        self.inner.update_regular_song(row)
    }

    fn delete_regular_song(&self, id: i64) -> kjdb::Result<()> {
        self.inner.delete_regular_song(id)
    }

    fn delete_songs_for_regular(&self, regular_singer_id: i64) -> kjdb::Result<()> {
        self.inner.delete_songs_for_regular(regular_singer_id)
    }

    fn load_regular_songs(&self) -> kjdb::Result<Vec<RegularSongRow>> {
        self.inner.load_regular_songs()
    }
}
