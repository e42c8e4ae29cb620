//! Commandes de file d'attente et réplication vers les réguliers
//!
//! Les commandes passent par la rotation (propriétaire des files) pour que
//! réplication et transaction restent coordonnées : chaque mutation d'une
//! file suivie est traduite en écritures sur la liste du régulier lié, dans
//! la même transaction. Le chargement d'un historique régulier passe par le
//! chemin interne sans réplication : jamais de boucle de rétroaction.

use super::{queue_song_row, regular_song_row, Rotation};
use crate::events::SessionEvent;
use crate::ids::{QueueSongId, RegularSingerId, RegularSongId, SingerId, SongId};
use crate::queue::{QueueChange, QueueSong};
use crate::regulars::RegularSong;
use crate::{Error, Result};
use kjdb::{NewQueueSong, NewRegularSong, SessionStore, Transaction};
use std::sync::Arc;

impl Rotation {
    /// File d'un chanteur, dans l'ordre des positions
    pub fn queue(&self, singer_id: SingerId) -> Result<&[QueueSong]> {
        self.queues
            .get(&singer_id)
            .map(|q| q.songs())
            .ok_or(Error::UnknownSinger(singer_id))
    }

    /// Première chanson non jouée d'un chanteur
    pub fn next_unplayed(&self, singer_id: SingerId) -> Result<Option<&QueueSong>> {
        self.queues
            .get(&singer_id)
            .map(|q| q.next_unplayed())
            .ok_or(Error::UnknownSinger(singer_id))
    }

    /// Prochaine chanson à lancer : celle du chanteur courant
    pub fn next_song_for_playback(&self) -> Option<&QueueSong> {
        let current = self.current?;
        self.queues.get(&current).and_then(|q| q.next_unplayed())
    }

    /// Chemin du média de la prochaine chanson non jouée d'un chanteur
    pub fn next_song_path(&self, singer_id: SingerId) -> Result<Option<String>> {
        let next = self.next_unplayed(singer_id)?;
        match next {
            Some(song) => Ok(self.catalog.song(song.song_id.0)?.map(|info| info.path)),
            None => Ok(None),
        }
    }

    /// Ajoute une chanson à la file d'un chanteur
    ///
    /// Sans position, la chanson part en fin de file ; sinon tout ce qui suit
    /// recule d'un cran. La chanson doit exister au catalogue.
    pub fn add_song(
        &mut self,
        singer_id: SingerId,
        song_id: SongId,
        at: Option<usize>,
    ) -> Result<QueueSongId> {
        self.singer(singer_id).ok_or(Error::UnknownSinger(singer_id))?;
        if self.catalog.song(song_id.0)?.is_none() {
            return Err(Error::UnknownSong(song_id));
        }

        let (id, mirrored) = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            let (id, mirrored) =
                rot.insert_queue_song(store.as_ref(), singer_id, song_id, 0, at, None, true)?;
            tx.commit()?;
            Ok((id, mirrored))
        })?;

        self.notify(&SessionEvent::QueueChanged { singer: singer_id });
        if mirrored {
            self.notify(&SessionEvent::RegularsChanged);
        }
        Ok(id)
    }

    /// Déplace une chanson dans la file d'un chanteur
    pub fn move_song(&mut self, singer_id: SingerId, old_pos: usize, new_pos: usize) -> Result<()> {
        let len = self.queue(singer_id)?.len();
        for p in [old_pos, new_pos] {
            if p >= len {
                return Err(Error::PositionOutOfRange { position: p, len });
            }
        }
        if old_pos == new_pos {
            return Ok(());
        }

        let mirrored = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            if let Some(queue) = rot.queues.get_mut(&singer_id) {
                queue.move_position(old_pos, new_pos);
            }
            rot.persist_queue_scope(store.as_ref(), singer_id)?;
            let mirrored = rot.mirror_change(store.as_ref(), singer_id, QueueChange::Moved)?;
            tx.commit()?;
            Ok(mirrored)
        })?;

        self.notify(&SessionEvent::QueueChanged { singer: singer_id });
        if mirrored {
            self.notify(&SessionEvent::RegularsChanged);
        }
        Ok(())
    }

    /// Retire une chanson de la file ; le miroir régulier part en cascade
    pub fn delete_song(&mut self, singer_id: SingerId, id: QueueSongId) -> Result<()> {
        self.queue_song(singer_id, id)?;

        let mirrored = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            let removed = rot
                .queues
                .get_mut(&singer_id)
                .and_then(|q| q.remove(id))
                .ok_or(Error::UnknownQueueSong(id))?;
            store.delete_queue_song(id.0)?;
            rot.persist_queue_scope(store.as_ref(), singer_id)?;
            let mirrored = rot.mirror_change(
                store.as_ref(),
                singer_id,
                QueueChange::Removed {
                    mirror: removed.regular_song,
                },
            )?;
            tx.commit()?;
            Ok(mirrored)
        })?;

        self.notify(&SessionEvent::QueueChanged { singer: singer_id });
        if mirrored {
            self.notify(&SessionEvent::RegularsChanged);
        }
        Ok(())
    }

    /// Marque une chanson jouée (ou la refile) ; idempotent, jamais répliqué
    pub fn set_played(&mut self, singer_id: SingerId, id: QueueSongId, played: bool) -> Result<()> {
        self.queue_song(singer_id, id)?;

        self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            if let Some(queue) = rot.queues.get_mut(&singer_id) {
                queue.set_played(id, played);
            }
            if let Some(song) = rot.queues.get(&singer_id).and_then(|q| q.get(id)) {
                store.update_queue_song(&queue_song_row(singer_id, song))?;
            }
            tx.commit()?;
            Ok(())
        })?;

        self.notify(&SessionEvent::QueueChanged { singer: singer_id });
        Ok(())
    }

    /// Change la transposition ; répliquée vers le miroir régulier
    pub fn set_key_change(
        &mut self,
        singer_id: SingerId,
        id: QueueSongId,
        semitones: i32,
    ) -> Result<()> {
        self.queue_song(singer_id, id)?;

        let mirrored = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            let mut mirror = None;
            if let Some(queue) = rot.queues.get_mut(&singer_id) {
                queue.set_key_change(id, semitones);
                mirror = queue.get(id).and_then(|s| s.regular_song);
            }
            if let Some(song) = rot.queues.get(&singer_id).and_then(|q| q.get(id)) {
                store.update_queue_song(&queue_song_row(singer_id, song))?;
            }
            let mirrored = rot.mirror_change(
                store.as_ref(),
                singer_id,
                QueueChange::KeyChanged {
                    mirror,
                    key_change: semitones,
                },
            )?;
            tx.commit()?;
            Ok(mirrored)
        })?;

        self.notify(&SessionEvent::QueueChanged { singer: singer_id });
        if mirrored {
            self.notify(&SessionEvent::RegularsChanged);
        }
        Ok(())
    }

    /// Vide la file d'un chanteur ; les miroirs partent en cascade
    pub fn clear_queue(&mut self, singer_id: SingerId) -> Result<()> {
        self.singer(singer_id).ok_or(Error::UnknownSinger(singer_id))?;

        let mirrored = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            let removed = rot
                .queues
                .get_mut(&singer_id)
                .map(|q| q.clear())
                .unwrap_or_default();
            store.delete_queue_for_singer(singer_id.0)?;
            let mirrors: Vec<RegularSongId> =
                removed.iter().filter_map(|s| s.regular_song).collect();
            let mirrored =
                rot.mirror_change(store.as_ref(), singer_id, QueueChange::Cleared { mirrors })?;
            tx.commit()?;
            Ok(mirrored)
        })?;

        self.notify(&SessionEvent::QueueChanged { singer: singer_id });
        if mirrored {
            self.notify(&SessionEvent::RegularsChanged);
        }
        Ok(())
    }

    // --- Mécanique interne ---

    fn queue_song(&self, singer_id: SingerId, id: QueueSongId) -> Result<&QueueSong> {
        let queue = self
            .queues
            .get(&singer_id)
            .ok_or(Error::UnknownSinger(singer_id))?;
        queue.get(id).ok_or(Error::UnknownQueueSong(id))
    }

    /// Insertion commune : ajout par l'hôte (répliqué) ou chargement d'un
    /// historique régulier (`mirror = false`, lien prérempli)
    pub(crate) fn insert_queue_song(
        &mut self,
        store: &dyn SessionStore,
        singer_id: SingerId,
        song_id: SongId,
        key_change: i32,
        at: Option<usize>,
        link: Option<RegularSongId>,
        mirror: bool,
    ) -> Result<(QueueSongId, bool)> {
        let len = self.queues.get(&singer_id).map(|q| q.len()).unwrap_or(0);
        let at = at.unwrap_or(len).min(len);
        let row_id = store.insert_queue_song(&NewQueueSong {
            singer_id: singer_id.0,
            song_id: song_id.0,
            key_change,
            position: at as i64,
            regular_song_id: link.map(|l| l.0),
        })?;
        let id = QueueSongId(row_id);
        let queue = self.queues.entry(singer_id).or_default();
        queue.insert(QueueSong {
            id,
            song_id,
            key_change,
            played: false,
            position: at,
            regular_song: link,
        });
        if at < len {
            // Insertion en milieu de file : les positions décalées se réécrivent
            self.persist_queue_scope(store, singer_id)?;
        }
        let mirrored = if mirror {
            self.mirror_change(store, singer_id, QueueChange::Added { song: id })?
        } else {
            false
        };
        Ok((id, mirrored))
    }

    /// Traduit un changement de file en écritures sur le régulier lié
    ///
    /// Retourne faux sans rien écrire quand le chanteur n'est pas suivi.
    fn mirror_change(
        &mut self,
        store: &dyn SessionStore,
        singer_id: SingerId,
        change: QueueChange,
    ) -> Result<bool> {
        let regular_id = match self.singer(singer_id).and_then(|s| s.regular_id) {
            Some(regular_id) => regular_id,
            None => return Ok(false),
        };

        match change {
            QueueChange::Added { song } => {
                let copied = self
                    .queues
                    .get(&singer_id)
                    .and_then(|q| q.get(song))
                    .map(|s| (s.song_id, s.key_change));
                let (song_id, key_change) = match copied {
                    Some(pair) => pair,
                    None => return Ok(false),
                };

                let position = self
                    .registry
                    .get(regular_id)
                    .map(|r| r.songs().len())
                    .unwrap_or(0);
                let row_id = store.insert_regular_song(&NewRegularSong {
                    regular_singer_id: regular_id.0,
                    song_id: song_id.0,
                    key_change,
                    position: position as i64,
                })?;
                let mirror = RegularSongId(row_id);
                if let Some(regular) = self.registry.get_mut(regular_id) {
                    regular.push_song(RegularSong {
                        id: mirror,
                        song_id,
                        key_change,
                        position,
                    });
                }
                if let Some(queue) = self.queues.get_mut(&singer_id) {
                    queue.set_regular_link(song, Some(mirror));
                    if let Some(updated) = queue.get(song) {
                        store.update_queue_song(&queue_song_row(singer_id, updated))?;
                    }
                }
                // L'ordre du bloc miroir suit l'ordre de la file
                self.sync_mirror_order(store, singer_id, regular_id)?;
            }
            QueueChange::Moved => {
                self.sync_mirror_order(store, singer_id, regular_id)?;
            }
            QueueChange::Removed { mirror } => {
                if let Some(mirror) = mirror {
                    if let Some(regular) = self.registry.get_mut(regular_id) {
                        if regular.remove_song(mirror).is_some() {
                            store.delete_regular_song(mirror.0)?;
                        }
                    }
                }
                self.sync_mirror_order(store, singer_id, regular_id)?;
            }
            QueueChange::KeyChanged { mirror, key_change } => {
                if let Some(mirror) = mirror {
                    if let Some(regular) = self.registry.get_mut(regular_id) {
                        if regular.set_key_change(mirror, key_change) {
                            if let Some(song) = regular.song(mirror) {
                                store.update_regular_song(&regular_song_row(regular_id, song))?;
                            }
                        }
                    }
                }
            }
            QueueChange::Cleared { mirrors } => {
                if let Some(regular) = self.registry.get_mut(regular_id) {
                    for mirror in mirrors {
                        if regular.remove_song(mirror).is_some() {
                            store.delete_regular_song(mirror.0)?;
                        }
                    }
                }
                self.sync_mirror_order(store, singer_id, regular_id)?;
            }
        }
        Ok(true)
    }

    /// Réaligne le bloc miroir du régulier sur l'ordre courant de la file
    fn sync_mirror_order(
        &mut self,
        store: &dyn SessionStore,
        singer_id: SingerId,
        regular_id: RegularSingerId,
    ) -> Result<()> {
        let block = self
            .queues
            .get(&singer_id)
            .map(|q| q.mirror_block())
            .unwrap_or_default();
        if let Some(regular) = self.registry.get_mut(regular_id) {
            let changed = regular.sync_block_order(&block);
            for id in changed {
                if let Some(song) = regular.song(id) {
                    store.update_regular_song(&regular_song_row(regular_id, song))?;
                }
            }
        }
        Ok(())
    }
}
