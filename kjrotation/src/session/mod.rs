//! Rotation : agrégat central de la session
//!
//! La rotation possède tout l'état vivant (chanteurs ordonnés, une file par
//! chanteur, registre des réguliers, pointeurs courant / haut de rotation) et
//! orchestre chaque commande : mutation en mémoire, écritures dans la même
//! transaction SQL, notification des observateurs après commit. Une commande
//! qui échoue restaure l'état mémoire depuis un point de contrôle pris à
//! l'entrée : mémoire et base ne divergent jamais silencieusement.

mod queue_ops;
mod regular_ops;
mod singers;

use crate::clock::Clock;
use crate::config::RotationOptions;
use crate::events::{Observers, SessionEvent};
use crate::ids::{QueueSongId, RegularSingerId, RegularSongId, SingerId, SongId};
use crate::position;
use crate::queue::{QueueSong, SongQueue};
use crate::regulars::{RegularSinger, RegularSong, RegularsRegistry};
use crate::singer::Singer;
use crate::Result;
use chrono::{DateTime, Utc};
use kjdb::{QueueSongRow, RegularSongRow, SessionStore, SingerRow, SongCatalog, Transaction};
use std::collections::HashMap;
use std::sync::Arc;

/// Rotation de session : chanteurs ordonnés, files, réguliers
///
/// Toutes les dépendances (passerelle, catalogue, horloge) sont injectées à
/// la construction ; la rotation n'a aucune dépendance d'affichage.
pub struct Rotation {
    store: Arc<dyn SessionStore>,
    catalog: Arc<dyn SongCatalog>,
    clock: Arc<dyn Clock>,
    options: RotationOptions,
    /// Chanteurs triés par position (invariant maintenu par chaque commande)
    singers: Vec<Singer>,
    queues: HashMap<SingerId, SongQueue>,
    registry: RegularsRegistry,
    /// Chanteur au micro ; une référence, jamais un drapeau par ligne
    current: Option<SingerId>,
    /// Premier chanteur du tour en cours
    rotation_top: Option<SingerId>,
    observers: Observers,
}

/// État mémoire restaurable d'une commande annulée
struct Checkpoint {
    singers: Vec<Singer>,
    queues: HashMap<SingerId, SongQueue>,
    registry: RegularsRegistry,
    current: Option<SingerId>,
    rotation_top: Option<SingerId>,
}

impl Rotation {
    /// Ouvre une session : charge l'état durable et le répare si nécessaire
    ///
    /// Les échelles de positions non denses sont recompactées (journalisées
    /// en niveau erreur) et les liens réguliers pendants sont levés avec un
    /// avertissement ; les réparations sont réécrites en base en une seule
    /// transaction. Le chanteur courant démarre vide, le haut de rotation à
    /// la position la plus basse.
    pub fn open(
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn SongCatalog>,
        clock: Arc<dyn Clock>,
        options: RotationOptions,
    ) -> Result<Self> {
        let singer_rows = store.load_singers()?;
        let queue_rows = store.load_queue_songs()?;
        let regular_rows = store.load_regular_singers()?;
        let regular_song_rows = store.load_regular_songs()?;

        let mut songs_by_regular: HashMap<i64, Vec<RegularSong>> = HashMap::new();
        for row in regular_song_rows {
            songs_by_regular
                .entry(row.regular_singer_id)
                .or_default()
                .push(RegularSong {
                    id: RegularSongId(row.id),
                    song_id: SongId(row.song_id),
                    key_change: row.key_change,
                    position: row.position.max(0) as usize,
                });
        }
        let registry = RegularsRegistry::from_loaded(
            regular_rows
                .into_iter()
                .map(|row| {
                    RegularSinger::with_songs(
                        RegularSingerId(row.id),
                        row.name,
                        songs_by_regular.remove(&row.id).unwrap_or_default(),
                    )
                })
                .collect(),
        );

        let mut songs_by_singer: HashMap<SingerId, Vec<QueueSong>> = HashMap::new();
        for row in queue_rows {
            songs_by_singer
                .entry(SingerId(row.singer_id))
                .or_default()
                .push(QueueSong {
                    id: QueueSongId(row.id),
                    song_id: SongId(row.song_id),
                    key_change: row.key_change,
                    played: row.played,
                    position: row.position.max(0) as usize,
                    regular_song: row.regular_song_id.map(RegularSongId),
                });
        }

        let mut singers = Vec::with_capacity(singer_rows.len());
        let mut queues = HashMap::new();
        for row in singer_rows {
            let added_at = parse_timestamp(&row.added_at, clock.as_ref());
            let id = SingerId(row.id);
            singers.push(Singer {
                id,
                name: row.name,
                position: row.position.max(0) as usize,
                regular_id: row.regular_id.map(RegularSingerId),
                added_at,
            });
            queues.insert(
                id,
                SongQueue::from_songs(songs_by_singer.remove(&id).unwrap_or_default()),
            );
        }
        singers.sort_by_key(|s| s.position);

        let mut rotation = Self {
            store,
            catalog,
            clock,
            options,
            singers,
            queues,
            registry,
            current: None,
            rotation_top: None,
            observers: Observers::new(),
        };
        rotation.heal_after_load()?;
        rotation.rotation_top = rotation.singers.first().map(|s| s.id);

        tracing::info!(
            "Session loaded: {} singers, {} regulars",
            rotation.singers.len(),
            rotation.registry.len()
        );
        Ok(rotation)
    }

    // --- Accès en lecture ---

    /// Chanteurs de la rotation, triés par position
    pub fn singers(&self) -> &[Singer] {
        &self.singers
    }

    pub fn len(&self) -> usize {
        self.singers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.singers.is_empty()
    }

    pub fn singer(&self, id: SingerId) -> Option<&Singer> {
        self.singers.iter().find(|s| s.id == id)
    }

    /// Recherche par nom, insensible à la casse
    pub fn singer_by_name(&self, name: &str) -> Option<&Singer> {
        self.singers
            .iter()
            .find(|s| crate::singer::names_equal(&s.name, name))
    }

    /// Chanteur au micro
    pub fn current_singer(&self) -> Option<SingerId> {
        self.current
    }

    /// Premier chanteur du tour en cours
    pub fn rotation_top(&self) -> Option<SingerId> {
        self.rotation_top
    }

    /// Registre des réguliers
    pub fn registry(&self) -> &RegularsRegistry {
        &self.registry
    }

    pub fn options(&self) -> &RotationOptions {
        &self.options
    }

    // --- Observateurs ---

    /// Abonne un observateur ; retourne son jeton de désabonnement
    pub fn subscribe<F>(&self, callback: F) -> u64
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.observers.register(callback)
    }

    pub fn unsubscribe(&self, token: u64) {
        self.observers.unregister(token);
    }

    pub(crate) fn notify(&self, event: &SessionEvent) {
        self.observers.notify(event);
    }

    // --- Commandes communes ---

    /// Vide la session (chanteurs et files) ; les réguliers sont conservés
    pub fn clear_session(&mut self) -> Result<()> {
        let cleared_current = self.current.is_some();
        self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            store.clear_session()?;
            rot.singers.clear();
            rot.queues.clear();
            rot.current = None;
            rot.rotation_top = None;
            tx.commit()?;
            Ok(())
        })?;

        self.notify(&SessionEvent::RotationChanged);
        if cleared_current {
            self.notify(&SessionEvent::CurrentChanged { singer: None });
        }
        Ok(())
    }

    // --- Mécanique interne ---

    /// Exécute une commande ; sur erreur, restaure l'état mémoire d'entrée
    ///
    /// La transaction SQL ouverte par la commande se rollbacke elle-même au
    /// drop de sa garde : mémoire et base reviennent ensemble à l'état
    /// d'avant la commande.
    fn with_rollback<T>(&mut self, command: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let checkpoint = self.checkpoint();
        match command(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("Command failed, restoring in-memory state: {}", e);
                self.restore(checkpoint);
                Err(e)
            }
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            singers: self.singers.clone(),
            queues: self.queues.clone(),
            registry: self.registry.clone(),
            current: self.current,
            rotation_top: self.rotation_top,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.singers = checkpoint.singers;
        self.queues = checkpoint.queues;
        self.registry = checkpoint.registry;
        self.current = checkpoint.current;
        self.rotation_top = checkpoint.rotation_top;
    }

    pub(crate) fn singer_mut(&mut self, id: SingerId) -> Option<&mut Singer> {
        self.singers.iter_mut().find(|s| s.id == id)
    }

    /// Vérifie la densité des positions de la rotation ; répare sur défaut
    pub(crate) fn heal_rotation(&mut self) -> bool {
        match position::find_fault(&self.singers) {
            Some(fault) => {
                tracing::error!("Rotation positions corrupted ({}), recompacting", fault);
                position::compact(&mut self.singers);
                true
            }
            None => false,
        }
    }

    /// Réécrit toutes les lignes chanteur (après réordonnancement)
    pub(crate) fn persist_rotation_scope(&self, store: &dyn SessionStore) -> Result<()> {
        for singer in &self.singers {
            store.update_singer(&singer_row(singer))?;
        }
        Ok(())
    }

    /// Réécrit toutes les lignes de la file d'un chanteur
    pub(crate) fn persist_queue_scope(
        &self,
        store: &dyn SessionStore,
        singer_id: SingerId,
    ) -> Result<()> {
        if let Some(queue) = self.queues.get(&singer_id) {
            for song in queue.songs() {
                store.update_queue_song(&queue_song_row(singer_id, song))?;
            }
        }
        Ok(())
    }

    /// Réparation d'ouverture : densité des trois échelles + liens pendants
    fn heal_after_load(&mut self) -> Result<()> {
        let mut repaired = self.heal_rotation();

        for (id, queue) in &mut self.queues {
            if let Some(fault) = position::find_fault(queue.songs()) {
                tracing::error!(
                    "Queue positions corrupted for singer {} ({}), recompacting",
                    id,
                    fault
                );
                position::compact(queue.songs_mut());
                repaired = true;
            }
        }

        for regular in self.registry.iter_mut() {
            if let Some(fault) = position::find_fault(regular.songs()) {
                tracing::error!(
                    "Song list corrupted for regular '{}' ({}), recompacting",
                    regular.name,
                    fault
                );
                position::compact(regular.songs_mut());
                repaired = true;
            }
        }

        // Liens réguliers pendants : levés, miroirs de file dissous
        let mut dangling: Vec<SingerId> = Vec::new();
        for singer in &mut self.singers {
            if let Some(regular_id) = singer.regular_id {
                if self.registry.get(regular_id).is_none() {
                    tracing::warn!(
                        "Singer '{}' linked to missing regular {}, unlinking",
                        singer.name,
                        regular_id
                    );
                    singer.regular_id = None;
                    dangling.push(singer.id);
                }
            }
        }
        for &singer_id in &dangling {
            if let Some(queue) = self.queues.get_mut(&singer_id) {
                for song in queue.songs_mut() {
                    song.regular_song = None;
                }
            }
        }

        if repaired || !dangling.is_empty() {
            let store = Arc::clone(&self.store);
            let tx = Transaction::begin(store.as_ref())?;
            self.persist_rotation_scope(store.as_ref())?;
            let singer_ids: Vec<SingerId> = self.singers.iter().map(|s| s.id).collect();
            for singer_id in singer_ids {
                self.persist_queue_scope(store.as_ref(), singer_id)?;
            }
            for regular in self.registry.regulars() {
                for song in regular.songs() {
                    store.update_regular_song(&regular_song_row(regular.id, song))?;
                }
            }
            tx.commit()?;
            tracing::info!("Session state repaired and rewritten");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rotation")
            .field("singers", &self.singers.len())
            .field("regulars", &self.registry.len())
            .field("current", &self.current)
            .field("rotation_top", &self.rotation_top)
            .finish()
    }
}

fn parse_timestamp(text: &str, clock: &dyn Clock) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!("Unreadable timestamp '{}' ({}), using current time", text, e);
            clock.now()
        }
    }
}

pub(crate) fn singer_row(singer: &Singer) -> SingerRow {
    SingerRow {
        id: singer.id.0,
        name: singer.name.clone(),
        position: singer.position as i64,
        regular: singer.is_regular(),
        regular_id: singer.regular_id.map(|r| r.0),
        added_at: singer.added_at.to_rfc3339(),
    }
}

pub(crate) fn queue_song_row(singer_id: SingerId, song: &QueueSong) -> QueueSongRow {
    QueueSongRow {
        id: song.id.0,
        singer_id: singer_id.0,
        song_id: song.song_id.0,
        key_change: song.key_change,
        played: song.played,
        position: song.position as i64,
        regular_mirror: song.regular_song.is_some(),
        regular_song_id: song.regular_song.map(|r| r.0),
    }
}

pub(crate) fn regular_song_row(owner: RegularSingerId, song: &RegularSong) -> RegularSongRow {
    RegularSongRow {
        id: song.id.0,
        regular_singer_id: owner.0,
        song_id: song.song_id.0,
        key_change: song.key_change,
        position: song.position as i64,
    }
}
