//! File d'attente ordonnée d'un chanteur
//!
//! Collection pure : les positions restent denses (0..N-1) à travers
//! insertions, déplacements et suppressions. La persistance et la
//! réplication vers les réguliers sont orchestrées par la rotation, qui
//! consomme les [`QueueChange`] émis ici.

use crate::ids::{QueueSongId, RegularSongId, SongId};
use crate::position::{self, Positioned};
use serde::Serialize;

/// Une chanson dans la file d'un chanteur
#[derive(Debug, Clone, Serialize)]
pub struct QueueSong {
    pub id: QueueSongId,
    /// Clé dans le catalogue de chansons
    pub song_id: SongId,
    /// Transposition en demi-tons
    pub key_change: i32,
    pub played: bool,
    /// Position dense dans la file (0..N-1)
    pub position: usize,
    /// Chanson régulière miroir, si le chanteur est suivi
    pub regular_song: Option<RegularSongId>,
}

impl Positioned for QueueSong {
    fn position(&self) -> usize {
        self.position
    }
    fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

/// Changement de file répliqué vers le régulier lié
///
/// Émis par chaque mutation de file ; la rotation le traduit en écritures
/// sur la liste du régulier quand le chanteur est suivi. `set_played` n'émet
/// rien : le drapeau « jouée » n'existe pas côté régulier.
#[derive(Debug, Clone)]
pub(crate) enum QueueChange {
    /// Une chanson a été insérée (pas encore liée à un miroir)
    Added { song: QueueSongId },
    /// L'ordre de la file a changé
    Moved,
    /// Une chanson a été retirée
    Removed { mirror: Option<RegularSongId> },
    /// La transposition a changé
    KeyChanged {
        mirror: Option<RegularSongId>,
        key_change: i32,
    },
    /// La file a été vidée
    Cleared { mirrors: Vec<RegularSongId> },
}

/// File d'attente d'un chanteur, triée par position
#[derive(Debug, Clone, Default)]
pub(crate) struct SongQueue {
    songs: Vec<QueueSong>,
}

impl SongQueue {
    pub fn from_songs(mut songs: Vec<QueueSong>) -> Self {
        songs.sort_by_key(|s| s.position);
        Self { songs }
    }

    pub fn songs(&self) -> &[QueueSong] {
        &self.songs
    }

    pub fn songs_mut(&mut self) -> &mut [QueueSong] {
        &mut self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get(&self, id: QueueSongId) -> Option<&QueueSong> {
        self.songs.iter().find(|s| s.id == id)
    }

    /// Insère la chanson à sa position demandée (bornée à la fin de file),
    /// en décalant d'un cran tout ce qui suit
    pub fn insert(&mut self, mut song: QueueSong) {
        let at = song.position.min(self.songs.len());
        for existing in &mut self.songs {
            if existing.position >= at {
                existing.position += 1;
            }
        }
        song.position = at;
        self.songs.push(song);
        self.songs.sort_by_key(|s| s.position);
    }

    /// Déplace la chanson de `from` vers `to` (bornes déjà validées)
    pub fn move_position(&mut self, from: usize, to: usize) {
        if from == to || from >= self.songs.len() || to >= self.songs.len() {
            return;
        }
        // La file est triée : l'élément d'indice `from` porte la position `from`
        let mover_id = self.songs[from].id;
        if from < to {
            position::shift_range(&mut self.songs, from as i64, to as i64, -1);
        } else {
            position::shift_range(&mut self.songs, to as i64 - 1, from as i64 - 1, 1);
        }
        if let Some(song) = self.songs.iter_mut().find(|s| s.id == mover_id) {
            song.position = to;
        }
        self.songs.sort_by_key(|s| s.position);
    }

    /// Retire une chanson et compacte les positions
    pub fn remove(&mut self, id: QueueSongId) -> Option<QueueSong> {
        let index = self.songs.iter().position(|s| s.id == id)?;
        let removed = self.songs.remove(index);
        position::compact(&mut self.songs);
        Some(removed)
    }

    /// Vide la file et retourne les chansons retirées, dans l'ordre
    pub fn clear(&mut self) -> Vec<QueueSong> {
        std::mem::take(&mut self.songs)
    }

    pub fn set_played(&mut self, id: QueueSongId, played: bool) -> bool {
        match self.songs.iter_mut().find(|s| s.id == id) {
            Some(song) => {
                song.played = played;
                true
            }
            None => false,
        }
    }

    pub fn set_key_change(&mut self, id: QueueSongId, key_change: i32) -> bool {
        match self.songs.iter_mut().find(|s| s.id == id) {
            Some(song) => {
                song.key_change = key_change;
                true
            }
            None => false,
        }
    }

    pub fn set_regular_link(&mut self, id: QueueSongId, link: Option<RegularSongId>) -> bool {
        match self.songs.iter_mut().find(|s| s.id == id) {
            Some(song) => {
                song.regular_song = link;
                true
            }
            None => false,
        }
    }

    /// Première chanson non jouée, dans l'ordre de la file
    pub fn next_unplayed(&self) -> Option<&QueueSong> {
        self.songs.iter().find(|s| !s.played)
    }

    /// Identifiants miroirs dans l'ordre de la file (chansons liées seulement)
    pub fn mirror_block(&self) -> Vec<RegularSongId> {
        self.songs.iter().filter_map(|s| s.regular_song).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: i64, position: usize) -> QueueSong {
        QueueSong {
            id: QueueSongId(id),
            song_id: SongId(100 + id),
            key_change: 0,
            played: false,
            position,
            regular_song: None,
        }
    }

    fn ids(queue: &SongQueue) -> Vec<i64> {
        queue.songs().iter().map(|s| s.id.0).collect()
    }

    #[test]
    fn insert_appends_and_shifts() {
        let mut queue = SongQueue::default();
        queue.insert(song(1, 0));
        queue.insert(song(2, 1));
        // Insertion en tête : tout le monde recule
        queue.insert(song(3, 0));
        assert_eq!(ids(&queue), vec![3, 1, 2]);
        assert_eq!(
            queue.songs().iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        // Position au-delà de la fin : bornée à l'ajout en queue
        queue.insert(song(4, 99));
        assert_eq!(ids(&queue), vec![3, 1, 2, 4]);
    }

    #[test]
    fn move_last_to_front() {
        let mut queue = SongQueue::default();
        for (id, position) in [(1, 0), (2, 1), (3, 2)] {
            queue.insert(song(id, position));
        }

        // [S1, S2, S3] : déplacer la dernière en tête donne [S3, S1, S2]
        queue.move_position(2, 0);
        assert_eq!(ids(&queue), vec![3, 1, 2]);

        // Le déplacement inverse restaure l'ordre initial
        queue.move_position(0, 2);
        assert_eq!(ids(&queue), vec![1, 2, 3]);
    }

    #[test]
    fn move_down_shifts_intermediates_up() {
        let mut queue = SongQueue::default();
        for (id, position) in [(1, 0), (2, 1), (3, 2), (4, 3)] {
            queue.insert(song(id, position));
        }

        queue.move_position(0, 2);
        assert_eq!(ids(&queue), vec![2, 3, 1, 4]);
    }

    #[test]
    fn remove_compacts_positions() {
        let mut queue = SongQueue::default();
        for (id, position) in [(1, 0), (2, 1), (3, 2)] {
            queue.insert(song(id, position));
        }

        let removed = queue.remove(QueueSongId(2)).unwrap();
        assert_eq!(removed.position, 1);
        assert_eq!(ids(&queue), vec![1, 3]);
        assert_eq!(
            queue.songs().iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![0, 1]
        );

        assert!(queue.remove(QueueSongId(2)).is_none());
    }

    #[test]
    fn next_unplayed_skips_played_songs() {
        let mut queue = SongQueue::default();
        for (id, position) in [(1, 0), (2, 1), (3, 2)] {
            queue.insert(song(id, position));
        }

        assert_eq!(queue.next_unplayed().unwrap().id, QueueSongId(1));
        queue.set_played(QueueSongId(1), true);
        assert_eq!(queue.next_unplayed().unwrap().id, QueueSongId(2));
        queue.set_played(QueueSongId(2), true);
        queue.set_played(QueueSongId(3), true);
        assert!(queue.next_unplayed().is_none());

        // Re-filer une chanson déjà jouée
        queue.set_played(QueueSongId(2), false);
        assert_eq!(queue.next_unplayed().unwrap().id, QueueSongId(2));
    }

    #[test]
    fn mirror_block_follows_queue_order() {
        let mut queue = SongQueue::default();
        for (id, position) in [(1, 0), (2, 1), (3, 2)] {
            queue.insert(song(id, position));
        }
        queue.set_regular_link(QueueSongId(1), Some(RegularSongId(11)));
        queue.set_regular_link(QueueSongId(3), Some(RegularSongId(33)));

        assert_eq!(
            queue.mirror_block(),
            vec![RegularSongId(11), RegularSongId(33)]
        );

        queue.move_position(2, 0);
        assert_eq!(
            queue.mirror_block(),
            vec![RegularSongId(33), RegularSongId(11)]
        );
    }
}
