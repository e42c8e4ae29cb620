//! Commandes du registre des réguliers : liaison, maintenance, échange
//!
//! Le registre vit dans l'agrégat pour que liaison et files restent
//! cohérentes : lier un chanteur, charger un historique ou supprimer un
//! régulier touche les deux côtés dans la même transaction.

use super::{queue_song_row, singer_row, Rotation};
use crate::events::SessionEvent;
use crate::export::{ImportReport, RegularExport, RegularSongExport, RegularsDocument};
use crate::ids::{RegularSingerId, RegularSongId, SingerId, SongId};
use crate::regulars::{RegularSinger, RegularSong};
use crate::singer::AddPolicy;
use crate::{Error, Result};
use kjdb::{NewRegularSong, SessionStore, Transaction};
use std::sync::Arc;

impl Rotation {
    /// Chansons d'un régulier, dans l'ordre de sa liste
    pub fn songs_for(&self, id: RegularSingerId) -> Result<&[RegularSong]> {
        self.registry
            .songs_for(id)
            .ok_or(Error::UnknownRegular(id))
    }

    /// Crée un régulier vide (unicité insensible à la casse)
    pub fn add_regular(&mut self, name: &str) -> Result<RegularSingerId> {
        let name = name.trim();
        if self.registry.contains_name(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }

        let id = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            let row_id = store.insert_regular_singer(name)?;
            let id = RegularSingerId(row_id);
            rot.registry.insert(RegularSinger::new(id, name.to_string()));
            tx.commit()?;
            Ok(id)
        })?;

        self.notify(&SessionEvent::RegularsChanged);
        Ok(id)
    }

    /// Lie un chanteur au régulier de même nom et active le suivi
    ///
    /// Régulier absent : créé, et la file courante est copiée dans son
    /// historique (chaque chanson liée à sa copie). Régulier déjà présent
    /// (reprise de suivi) : liaison seule, le suivi reprend à partir de
    /// maintenant sans rejouer l'historique manqué. Chanteur déjà lié :
    /// retour de son régulier, sans écriture.
    pub fn make_regular(&mut self, singer_id: SingerId) -> Result<RegularSingerId> {
        let singer = self
            .singer(singer_id)
            .ok_or(Error::UnknownSinger(singer_id))?;
        if let Some(existing) = singer.regular_id {
            return Ok(existing);
        }
        let name = singer.name.clone();

        let regular_id = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;

            let (regular_id, snapshot) = match rot.registry.by_name(&name) {
                Some(regular) => (regular.id, false),
                None => {
                    let row_id = store.insert_regular_singer(&name)?;
                    let id = RegularSingerId(row_id);
                    rot.registry.insert(RegularSinger::new(id, name.clone()));
                    (id, true)
                }
            };

            if snapshot {
                // Copie de la file courante, dans l'ordre relatif
                let songs: Vec<(crate::ids::QueueSongId, SongId, i32)> = rot
                    .queues
                    .get(&singer_id)
                    .map(|q| {
                        q.songs()
                            .iter()
                            .map(|s| (s.id, s.song_id, s.key_change))
                            .collect()
                    })
                    .unwrap_or_default();
                for (queue_song, song_id, key_change) in songs {
                    let position = rot
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
                    if let Some(regular) = rot.registry.get_mut(regular_id) {
                        regular.push_song(RegularSong {
                            id: mirror,
                            song_id,
                            key_change,
                            position,
                        });
                    }
                    if let Some(queue) = rot.queues.get_mut(&singer_id) {
                        queue.set_regular_link(queue_song, Some(mirror));
                        if let Some(song) = queue.get(queue_song) {
                            store.update_queue_song(&queue_song_row(singer_id, song))?;
                        }
                    }
                }
            }

            if let Some(singer) = rot.singer_mut(singer_id) {
                singer.regular_id = Some(regular_id);
            }
            if let Some(singer) = rot.singer(singer_id) {
                store.update_singer(&singer_row(singer))?;
            }
            tx.commit()?;
            Ok(regular_id)
        })?;

        tracing::info!("Singer {} now tracked as regular {}", singer_id, regular_id);
        self.notify(&SessionEvent::RotationChanged);
        self.notify(&SessionEvent::RegularsChanged);
        Ok(regular_id)
    }

    /// Coupe le suivi d'un chanteur sans rien supprimer d'aucun côté
    ///
    /// Idempotent : sans liaison, ne fait rien.
    pub fn disable_tracking(&mut self, singer_id: SingerId) -> Result<()> {
        let singer = self
            .singer(singer_id)
            .ok_or(Error::UnknownSinger(singer_id))?;
        if singer.regular_id.is_none() {
            return Ok(());
        }

        self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            rot.unlink_singer(store.as_ref(), singer_id)?;
            tx.commit()?;
            Ok(())
        })?;

        self.notify(&SessionEvent::RotationChanged);
        Ok(())
    }

    /// Charge un régulier dans la rotation avec son historique
    ///
    /// Le chanteur est créé lié, sa file reçoit la copie de la liste du
    /// régulier sans réplication retour : le chargement d'historique ne
    /// réécrit jamais l'historique.
    pub fn add_singer_from_regular(
        &mut self,
        regular_id: RegularSingerId,
        policy: AddPolicy,
    ) -> Result<SingerId> {
        let regular = self
            .registry
            .get(regular_id)
            .ok_or(Error::UnknownRegular(regular_id))?;
        let name = regular.name.clone();
        if self.singer_by_name(&name).is_some() {
            return Err(Error::DuplicateName(name));
        }
        let history: Vec<(RegularSongId, SongId, i32)> = regular
            .songs()
            .iter()
            .map(|s| (s.id, s.song_id, s.key_change))
            .collect();

        let id = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            let id = rot.insert_singer(store.as_ref(), &name, Some(regular_id))?;
            rot.place_new_singer(policy);
            rot.persist_rotation_scope(store.as_ref())?;
            for (mirror, song_id, key_change) in history {
                rot.insert_queue_song(
                    store.as_ref(),
                    id,
                    song_id,
                    key_change,
                    None,
                    Some(mirror),
                    false,
                )?;
            }
            tx.commit()?;
            Ok(id)
        })?;

        tracing::info!("Regular {} loaded into rotation as singer {}", regular_id, id);
        self.notify(&SessionEvent::RotationChanged);
        self.notify(&SessionEvent::QueueChanged { singer: id });
        Ok(id)
    }

    /// Renomme un régulier (unicité insensible à la casse)
    pub fn rename_regular(&mut self, id: RegularSingerId, name: &str) -> Result<()> {
        let name = name.trim();
        self.registry.get(id).ok_or(Error::UnknownRegular(id))?;
        if self
            .registry
            .regulars()
            .iter()
            .any(|r| r.id != id && crate::singer::names_equal(&r.name, name))
        {
            return Err(Error::DuplicateName(name.to_string()));
        }

        self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            rot.registry.rename(id, name);
            store.update_regular_singer(&kjdb::RegularSingerRow {
                id: id.0,
                name: name.to_string(),
            })?;
            tx.commit()?;
            Ok(())
        })?;

        self.notify(&SessionEvent::RegularsChanged);
        Ok(())
    }

    /// Supprime un régulier et sa liste ; tout chanteur lié est délié avant
    pub fn delete_regular(&mut self, id: RegularSingerId) -> Result<()> {
        self.registry.get(id).ok_or(Error::UnknownRegular(id))?;
        let linked: Vec<SingerId> = self
            .singers
            .iter()
            .filter(|s| s.regular_id == Some(id))
            .map(|s| s.id)
            .collect();

        self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            for &singer_id in &linked {
                rot.unlink_singer(store.as_ref(), singer_id)?;
            }
            store.delete_songs_for_regular(id.0)?;
            store.delete_regular_singer(id.0)?;
            rot.registry.remove(id);
            tx.commit()?;
            Ok(())
        })?;

        self.notify(&SessionEvent::RegularsChanged);
        if !linked.is_empty() {
            self.notify(&SessionEvent::RotationChanged);
        }
        Ok(())
    }

    /// Exporte le registre en document d'échange
    ///
    /// Les chansons introuvables au catalogue sont sautées avec un
    /// avertissement : le document ne transporte que des chansons décrites
    /// par leurs tags.
    pub fn export_regulars(&self) -> Result<RegularsDocument> {
        let mut doc = RegularsDocument::default();
        for regular in self.registry.regulars() {
            let mut songs = Vec::with_capacity(regular.songs().len());
            for song in regular.songs() {
                match self.catalog.song(song.song_id.0)? {
                    Some(info) => songs.push(RegularSongExport {
                        disc_id: info.disc_id,
                        artist: info.artist,
                        title: info.title,
                        key_change: song.key_change,
                    }),
                    None => tracing::warn!(
                        "Song {} for regular '{}' not in catalog, skipped from export",
                        song.song_id,
                        regular.name
                    ),
                }
            }
            doc.regulars.push(RegularExport {
                name: regular.name.clone(),
                songs,
            });
        }
        Ok(doc)
    }

    /// Importe un document d'échange dans le registre
    ///
    /// Les noms déjà présents sont sautés, les chansons introuvables au
    /// catalogue comptées ; l'import entier tient dans une transaction.
    pub fn import_regulars(&mut self, doc: &RegularsDocument) -> Result<ImportReport> {
        let report = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            let mut report = ImportReport::default();

            for entry in &doc.regulars {
                if rot.registry.contains_name(&entry.name) {
                    tracing::warn!("Regular '{}' already present, skipped", entry.name);
                    report.skipped_existing += 1;
                    continue;
                }
                let row_id = store.insert_regular_singer(&entry.name)?;
                let id = RegularSingerId(row_id);
                let mut regular = RegularSinger::new(id, entry.name.clone());
                for song in &entry.songs {
                    let resolved =
                        rot.catalog
                            .song_by_tags(&song.artist, &song.title, &song.disc_id)?;
                    match resolved {
                        Some(info) => {
                            let position = regular.songs().len();
                            let song_row_id = store.insert_regular_song(&NewRegularSong {
                                regular_singer_id: id.0,
                                song_id: info.id,
                                key_change: song.key_change,
                                position: position as i64,
                            })?;
                            regular.push_song(RegularSong {
                                id: RegularSongId(song_row_id),
                                song_id: SongId(info.id),
                                key_change: song.key_change,
                                position,
                            });
                        }
                        None => {
                            tracing::warn!(
                                "Song '{}' / '{}' ({}) not in catalog, skipped",
                                song.artist,
                                song.title,
                                song.disc_id
                            );
                            report.unresolved_songs += 1;
                        }
                    }
                }
                rot.registry.insert(regular);
                report.imported += 1;
            }

            tx.commit()?;
            Ok(report)
        })?;

        tracing::info!(
            "Regulars import: {} imported, {} skipped, {} unresolved songs",
            report.imported,
            report.skipped_existing,
            report.unresolved_songs
        );
        if report.imported > 0 {
            self.notify(&SessionEvent::RegularsChanged);
        }
        Ok(report)
    }

    // --- Mécanique interne ---

    /// Lève la liaison d'un chanteur : lien du chanteur et liens miroirs de
    /// sa file, sans toucher à la liste du régulier
    fn unlink_singer(&mut self, store: &dyn SessionStore, singer_id: SingerId) -> Result<()> {
        if let Some(singer) = self.singer_mut(singer_id) {
            singer.regular_id = None;
        }
        if let Some(singer) = self.singer(singer_id) {
            store.update_singer(&singer_row(singer))?;
        }
        if let Some(queue) = self.queues.get_mut(&singer_id) {
            for song in queue.songs_mut() {
                song.regular_song = None;
            }
        }
        self.persist_queue_scope(store, singer_id)?;
        Ok(())
    }
}
