//! Registre des chanteurs réguliers
//!
//! Les réguliers survivent aux sessions : un chanteur lié voit sa file
//! répliquée ici, dans le même ordre relatif. Le registre ne parle jamais à
//! la persistance lui-même : la rotation applique les mutations en mémoire
//! et écrit les lignes correspondantes dans la même transaction.

use crate::ids::{RegularSingerId, RegularSongId, SongId};
use crate::position::Positioned;
use crate::singer::names_equal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Une chanson dans la liste d'un régulier
#[derive(Debug, Clone, Serialize)]
pub struct RegularSong {
    pub id: RegularSongId,
    pub song_id: SongId,
    pub key_change: i32,
    /// Position dense dans la liste (0..N-1)
    pub position: usize,
}

impl Positioned for RegularSong {
    fn position(&self) -> usize {
        self.position
    }
    fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

/// Un chanteur régulier et son historique ordonné
#[derive(Debug, Clone, Serialize)]
pub struct RegularSinger {
    pub id: RegularSingerId,
    /// Nom unique dans le registre (insensible à la casse)
    pub name: String,
    songs: Vec<RegularSong>,
}

impl RegularSinger {
    pub(crate) fn new(id: RegularSingerId, name: String) -> Self {
        Self {
            id,
            name,
            songs: Vec::new(),
        }
    }

    pub(crate) fn with_songs(id: RegularSingerId, name: String, mut songs: Vec<RegularSong>) -> Self {
        songs.sort_by_key(|s| s.position);
        Self { id, name, songs }
    }

    /// Chansons dans l'ordre de la liste
    pub fn songs(&self) -> &[RegularSong] {
        &self.songs
    }

    pub fn song(&self, id: RegularSongId) -> Option<&RegularSong> {
        self.songs.iter().find(|s| s.id == id)
    }

    pub(crate) fn songs_mut(&mut self) -> &mut Vec<RegularSong> {
        &mut self.songs
    }

    /// Ajoute une chanson en fin de liste
    pub(crate) fn push_song(&mut self, mut song: RegularSong) {
        song.position = self.songs.len();
        self.songs.push(song);
    }

    /// Retire une chanson sans renuméroter (la resynchronisation suit)
    pub(crate) fn remove_song(&mut self, id: RegularSongId) -> Option<RegularSong> {
        let index = self.songs.iter().position(|s| s.id == id)?;
        Some(self.songs.remove(index))
    }

    pub(crate) fn set_key_change(&mut self, id: RegularSongId, key_change: i32) -> bool {
        match self.songs.iter_mut().find(|s| s.id == id) {
            Some(song) => {
                song.key_change = key_change;
                true
            }
            None => false,
        }
    }

    /// Réordonne le bloc miroir pour suivre l'ordre de la file liée
    ///
    /// Les chansons hors bloc gardent leur ordre relatif et précèdent le
    /// bloc ; toutes les positions sont renumérotées 0..N-1. Retourne les
    /// identifiants dont la position a changé, à réécrire en base.
    pub(crate) fn sync_block_order(&mut self, block: &[RegularSongId]) -> Vec<RegularSongId> {
        self.songs.sort_by_key(|s| s.position);

        let block_set: HashSet<RegularSongId> = block.iter().copied().collect();
        let mut rebuilt = Vec::with_capacity(self.songs.len());
        let mut members: HashMap<RegularSongId, RegularSong> = HashMap::new();
        for song in self.songs.drain(..) {
            if block_set.contains(&song.id) {
                members.insert(song.id, song);
            } else {
                rebuilt.push(song);
            }
        }
        for id in block {
            if let Some(song) = members.remove(id) {
                rebuilt.push(song);
            }
        }

        let mut changed = Vec::new();
        for (index, song) in rebuilt.iter_mut().enumerate() {
            if song.position != index {
                song.position = index;
                changed.push(song.id);
            }
        }
        self.songs = rebuilt;
        changed
    }
}

/// Registre des réguliers, trié par nom
#[derive(Debug, Clone, Default)]
pub struct RegularsRegistry {
    regulars: Vec<RegularSinger>,
}

impl RegularsRegistry {
    pub(crate) fn from_loaded(mut regulars: Vec<RegularSinger>) -> Self {
        regulars.sort_by_key(|r| r.name.to_lowercase());
        Self { regulars }
    }

    /// Réguliers dans l'ordre alphabétique
    pub fn regulars(&self) -> &[RegularSinger] {
        &self.regulars
    }

    pub fn len(&self) -> usize {
        self.regulars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regulars.is_empty()
    }

    pub fn get(&self, id: RegularSingerId) -> Option<&RegularSinger> {
        self.regulars.iter().find(|r| r.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: RegularSingerId) -> Option<&mut RegularSinger> {
        self.regulars.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, RegularSinger> {
        self.regulars.iter_mut()
    }

    /// Recherche par nom, insensible à la casse
    pub fn by_name(&self, name: &str) -> Option<&RegularSinger> {
        self.regulars.iter().find(|r| names_equal(&r.name, name))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name(name).is_some()
    }

    /// Chansons d'un régulier, dans l'ordre de la liste
    pub fn songs_for(&self, id: RegularSingerId) -> Option<&[RegularSong]> {
        self.get(id).map(|r| r.songs())
    }

    pub(crate) fn insert(&mut self, regular: RegularSinger) {
        self.regulars.push(regular);
        self.regulars.sort_by_key(|r| r.name.to_lowercase());
    }

    pub(crate) fn remove(&mut self, id: RegularSingerId) -> Option<RegularSinger> {
        let index = self.regulars.iter().position(|r| r.id == id)?;
        Some(self.regulars.remove(index))
    }

    pub(crate) fn rename(&mut self, id: RegularSingerId, name: &str) -> bool {
        let renamed = match self.get_mut(id) {
            Some(regular) => {
                regular.name = name.to_string();
                true
            }
            None => false,
        };
        if renamed {
            self.regulars.sort_by_key(|r| r.name.to_lowercase());
        }
        renamed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular_song(id: i64, position: usize) -> RegularSong {
        RegularSong {
            id: RegularSongId(id),
            song_id: SongId(100 + id),
            key_change: 0,
            position,
        }
    }

    #[test]
    fn registry_names_are_case_insensitive() {
        let mut registry = RegularsRegistry::default();
        registry.insert(RegularSinger::new(RegularSingerId(1), "Alice".into()));

        assert!(registry.contains_name("ALICE"));
        assert_eq!(registry.by_name("alice").unwrap().id, RegularSingerId(1));
        assert!(!registry.contains_name("Bob"));
    }

    #[test]
    fn registry_stays_sorted_by_name() {
        let mut registry = RegularsRegistry::default();
        registry.insert(RegularSinger::new(RegularSingerId(1), "zoé".into()));
        registry.insert(RegularSinger::new(RegularSingerId(2), "Alice".into()));
        registry.insert(RegularSinger::new(RegularSingerId(3), "bob".into()));

        let names: Vec<&str> = registry.regulars().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "bob", "zoé"]);

        registry.rename(RegularSingerId(3), "Arthur");
        let names: Vec<&str> = registry.regulars().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Arthur", "zoé"]);
    }

    #[test]
    fn sync_block_keeps_history_prefix_and_follows_queue_order() {
        // Historique : deux chansons non liées, puis un bloc miroir de trois
        let mut regular = RegularSinger::with_songs(
            RegularSingerId(1),
            "Alice".into(),
            vec![
                regular_song(10, 0),
                regular_song(11, 1),
                regular_song(20, 2),
                regular_song(21, 3),
                regular_song(22, 4),
            ],
        );

        // La file liée a été réordonnée : 22, 20, 21
        let changed = regular.sync_block_order(&[
            RegularSongId(22),
            RegularSongId(20),
            RegularSongId(21),
        ]);

        let order: Vec<i64> = regular.songs().iter().map(|s| s.id.0).collect();
        assert_eq!(order, vec![10, 11, 22, 20, 21]);
        assert_eq!(
            regular.songs().iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        // Seul le bloc a bougé
        assert_eq!(
            changed,
            vec![RegularSongId(22), RegularSongId(20), RegularSongId(21)]
        );
    }

    #[test]
    fn sync_block_renumbers_after_removal() {
        let mut regular = RegularSinger::with_songs(
            RegularSingerId(1),
            "Alice".into(),
            vec![regular_song(20, 0), regular_song(21, 1), regular_song(22, 2)],
        );

        regular.remove_song(RegularSongId(21)).unwrap();
        let changed = regular.sync_block_order(&[RegularSongId(20), RegularSongId(22)]);

        assert_eq!(
            regular.songs().iter().map(|s| (s.id.0, s.position)).collect::<Vec<_>>(),
            vec![(20, 0), (22, 1)]
        );
        assert_eq!(changed, vec![RegularSongId(22)]);
    }
}
