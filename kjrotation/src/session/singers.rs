//! Commandes de rotation : chanteurs, pointeurs, arithmétique de tour

use super::{singer_row, Rotation};
use crate::events::SessionEvent;
use crate::ids::SingerId;
use crate::position;
use crate::queue::SongQueue;
use crate::singer::{names_equal, AddPolicy, Singer};
use crate::{Error, Result};
use kjdb::{NewSinger, Transaction};
use std::sync::Arc;

impl Rotation {
    /// Ajoute un chanteur et le place selon la politique demandée
    ///
    /// Sans chanteur courant, toutes les politiques laissent le nouveau en
    /// fin de rotation. `Next` et `Fair` désignent le même créneau : juste
    /// après le chanteur courant, pour un tour dans la passe en cours.
    pub fn add_singer(&mut self, name: &str, policy: AddPolicy) -> Result<SingerId> {
        let name = name.trim();
        if self.singers.iter().any(|s| names_equal(&s.name, name)) {
            return Err(Error::DuplicateName(name.to_string()));
        }

        let id = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            let id = rot.insert_singer(store.as_ref(), name, None)?;
            rot.place_new_singer(policy);
            rot.persist_rotation_scope(store.as_ref())?;
            tx.commit()?;
            Ok(id)
        })?;

        tracing::info!("Singer '{}' added ({} policy)", name, policy);
        self.notify(&SessionEvent::RotationChanged);
        Ok(id)
    }

    /// Renomme un chanteur (unicité insensible à la casse)
    pub fn rename_singer(&mut self, id: SingerId, name: &str) -> Result<()> {
        let name = name.trim();
        self.singer(id).ok_or(Error::UnknownSinger(id))?;
        if self
            .singers
            .iter()
            .any(|s| s.id != id && names_equal(&s.name, name))
        {
            return Err(Error::DuplicateName(name.to_string()));
        }

        self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            if let Some(singer) = rot.singer_mut(id) {
                singer.name = name.to_string();
            }
            if let Some(singer) = rot.singer(id) {
                store.update_singer(&singer_row(singer))?;
            }
            tx.commit()?;
            Ok(())
        })?;

        self.notify(&SessionEvent::RotationChanged);
        Ok(())
    }

    /// Déplace un chanteur d'une position à une autre
    pub fn move_singer(&mut self, old_pos: usize, new_pos: usize) -> Result<()> {
        self.check_position(old_pos)?;
        self.check_position(new_pos)?;
        if old_pos == new_pos {
            return Ok(());
        }

        self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            rot.apply_singer_move(old_pos, new_pos);
            rot.heal_rotation();
            rot.persist_rotation_scope(store.as_ref())?;
            tx.commit()?;
            Ok(())
        })?;

        self.notify(&SessionEvent::RotationChanged);
        Ok(())
    }

    /// Applique une série de déplacements en une seule transaction
    ///
    /// Le pendant structurel du glisser-déposer multi-lignes : N déplacements,
    /// exactement un commit. Chaque paire est validée contre la taille de la
    /// rotation avant toute mutation.
    pub fn move_singer_batch(&mut self, moves: &[(usize, usize)]) -> Result<()> {
        for &(old_pos, new_pos) in moves {
            self.check_position(old_pos)?;
            self.check_position(new_pos)?;
        }
        if moves.is_empty() {
            return Ok(());
        }

        self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            for &(old_pos, new_pos) in moves {
                rot.apply_singer_move(old_pos, new_pos);
            }
            rot.heal_rotation();
            rot.persist_rotation_scope(store.as_ref())?;
            tx.commit()?;
            Ok(())
        })?;

        self.notify(&SessionEvent::RotationChanged);
        Ok(())
    }

    /// Supprime un chanteur ; sa file part en cascade, les positions se
    /// resserrent, les pointeurs courant et haut de rotation sont ajustés
    pub fn delete_singer(&mut self, id: SingerId) -> Result<()> {
        let index = self
            .singers
            .iter()
            .position(|s| s.id == id)
            .ok_or(Error::UnknownSinger(id))?;

        let cleared_current = self.with_rollback(|rot| {
            let store = Arc::clone(&rot.store);
            let tx = Transaction::begin(store.as_ref())?;
            store.delete_queue_for_singer(id.0)?;
            store.delete_singer(id.0)?;

            let removed = rot.singers.remove(index);
            rot.queues.remove(&id);
            position::compact(&mut rot.singers);

            let cleared = rot.current == Some(id);
            if cleared {
                rot.current = None;
            }
            if rot.rotation_top == Some(id) {
                // Le haut de rotation avance au suivant sur l'anneau
                rot.rotation_top = if rot.singers.is_empty() {
                    None
                } else {
                    let next = removed.position % rot.singers.len();
                    Some(rot.singers[next].id)
                };
            }

            rot.persist_rotation_scope(store.as_ref())?;
            tx.commit()?;
            Ok(cleared)
        })?;

        tracing::info!("Singer {} removed from rotation", id);
        self.notify(&SessionEvent::RotationChanged);
        if cleared_current {
            self.notify(&SessionEvent::CurrentChanged { singer: None });
        }
        Ok(())
    }

    /// Désigne le chanteur au micro ; `None` efface la sélection
    pub fn set_current_singer(&mut self, id: Option<SingerId>) -> Result<()> {
        if let Some(id) = id {
            self.singer(id).ok_or(Error::UnknownSinger(id))?;
        }
        if self.current != id {
            self.current = id;
            self.notify(&SessionEvent::CurrentChanged { singer: id });
        }
        Ok(())
    }

    /// Désigne le premier chanteur du tour en cours
    pub fn set_rotation_top(&mut self, id: SingerId) -> Result<()> {
        self.singer(id).ok_or(Error::UnknownSinger(id))?;
        self.rotation_top = Some(id);
        Ok(())
    }

    /// Nombre de tours avant le passage du chanteur, sur l'anneau
    ///
    /// 0 pour le chanteur courant. Sans chanteur courant, la référence est le
    /// haut de rotation, à défaut la position 0.
    pub fn turn_distance(&self, id: SingerId) -> Result<usize> {
        let target = self.singer(id).ok_or(Error::UnknownSinger(id))?;
        Ok(position::ring_distance(
            self.singers.len(),
            self.reference_position(),
            target.position,
        ))
    }

    /// Attente estimée (secondes) avant le passage du chanteur
    ///
    /// Somme la prochaine chanson non jouée de chaque chanteur strictement
    /// entre la référence et la cible ; `current_remaining` (temps de lecture
    /// restant, fourni par le collaborateur de lecture) remplace la
    /// contribution propre du chanteur courant. 0 pour le chanteur courant.
    pub fn wait_seconds(&self, id: SingerId, current_remaining: u32) -> Result<u32> {
        let target = self.singer(id).ok_or(Error::UnknownSinger(id))?;
        let n = self.singers.len();
        let mut per_position = vec![0u32; n];
        for singer in &self.singers {
            per_position[singer.position] = self.next_song_seconds(singer.id)?;
        }
        Ok(position::ring_wait(
            n,
            self.reference_position(),
            target.position,
            &per_position,
            current_remaining,
        ))
    }

    // --- Mécanique interne ---

    fn reference_position(&self) -> usize {
        self.current
            .or(self.rotation_top)
            .and_then(|id| self.singer(id))
            .map(|s| s.position)
            .unwrap_or(0)
    }

    fn check_position(&self, p: usize) -> Result<()> {
        let len = self.singers.len();
        if p >= len {
            return Err(Error::PositionOutOfRange { position: p, len });
        }
        Ok(())
    }

    /// Durée de la prochaine chanson non jouée ; 0 sans chanson en attente
    fn next_song_seconds(&self, id: SingerId) -> Result<u32> {
        let next = self.queues.get(&id).and_then(|q| q.next_unplayed());
        let song = match next {
            Some(song) => song,
            None => return Ok(0),
        };
        let info = self.catalog.song(song.song_id.0)?;
        Ok(info
            .and_then(|i| i.duration_secs)
            .unwrap_or(self.options.fallback_song_seconds))
    }

    /// Insère la ligne chanteur (en fin de rotation) et l'entité associée
    pub(crate) fn insert_singer(
        &mut self,
        store: &dyn kjdb::SessionStore,
        name: &str,
        regular_id: Option<crate::ids::RegularSingerId>,
    ) -> Result<SingerId> {
        let position = self.singers.len();
        let added_at = self.clock.now();
        let row_id = store.insert_singer(&NewSinger {
            name,
            position: position as i64,
            regular_id: regular_id.map(|r| r.0),
            added_at: &added_at.to_rfc3339(),
        })?;
        let id = SingerId(row_id);
        self.singers.push(Singer {
            id,
            name: name.to_string(),
            position,
            regular_id,
            added_at,
        });
        self.queues.insert(id, SongQueue::default());
        if self.rotation_top.is_none() {
            self.rotation_top = Some(id);
        }
        Ok(id)
    }

    /// Replace le chanteur fraîchement ajouté (dernier) selon la politique
    pub(crate) fn place_new_singer(&mut self, policy: AddPolicy) {
        let end = self.singers.len() - 1;
        let target = match policy {
            AddPolicy::Bottom => return,
            AddPolicy::Next | AddPolicy::Fair => self
                .current
                .and_then(|id| self.singer(id))
                .map(|s| (s.position + 1).min(end)),
        };
        if let Some(to) = target {
            self.apply_singer_move(end, to);
        }
    }

    /// Décale l'intervalle entre les deux positions et replace le chanteur
    ///
    /// La rotation est triée par position : l'élément d'indice `from` porte
    /// la position `from`.
    pub(crate) fn apply_singer_move(&mut self, from: usize, to: usize) {
        if from == to || from >= self.singers.len() || to >= self.singers.len() {
            return;
        }
        let mover_id = self.singers[from].id;
        if from < to {
            position::shift_range(&mut self.singers, from as i64, to as i64, -1);
        } else {
            position::shift_range(&mut self.singers, to as i64 - 1, from as i64 - 1, 1);
        }
        if let Some(singer) = self.singer_mut(mover_id) {
            singer.position = to;
        }
        self.singers.sort_by_key(|s| s.position);
    }
}
