//! Formes de lignes échangées avec la passerelle de persistance
//!
//! Une struct par entité, plus une forme `New*` pour les insertions (la
//! passerelle attribue les identifiants). Les horodatages circulent en
//! RFC3339 ; le domaine les parse à la relecture.

use serde::Serialize;

/// Ligne chanteur (table `singers`)
#[derive(Debug, Clone, Serialize)]
pub struct SingerRow {
    /// Identifiant attribué par la passerelle
    pub id: i64,
    /// Nom affiché (unicité insensible à la casse côté domaine)
    pub name: String,
    /// Position dense dans la rotation (0..N-1)
    pub position: i64,
    /// Vrai si le chanteur est lié à un régulier
    pub regular: bool,
    /// Identifiant du régulier lié, le cas échéant
    pub regular_id: Option<i64>,
    /// Date d'ajout à la session (RFC3339)
    pub added_at: String,
}

/// Forme d'insertion d'un chanteur
#[derive(Debug, Clone)]
pub struct NewSinger<'a> {
    pub name: &'a str,
    pub position: i64,
    pub regular_id: Option<i64>,
    pub added_at: &'a str,
}

/// Ligne chanson de file d'attente (table `queue_songs`)
#[derive(Debug, Clone, Serialize)]
pub struct QueueSongRow {
    pub id: i64,
    pub singer_id: i64,
    /// Clé dans le catalogue de chansons
    pub song_id: i64,
    /// Transposition en demi-tons
    pub key_change: i32,
    pub played: bool,
    /// Position dense dans la file du chanteur (0..N-1)
    pub position: i64,
    /// Vrai si la chanson est miroir d'une entrée régulière
    pub regular_mirror: bool,
    /// Identifiant de la chanson régulière miroir, le cas échéant
    pub regular_song_id: Option<i64>,
}

/// Forme d'insertion d'une chanson de file (jamais jouée à l'insertion)
#[derive(Debug, Clone)]
pub struct NewQueueSong {
    pub singer_id: i64,
    pub song_id: i64,
    pub key_change: i32,
    pub position: i64,
    pub regular_song_id: Option<i64>,
}

/// Ligne chanteur régulier (table `regular_singers`)
#[derive(Debug, Clone, Serialize)]
pub struct RegularSingerRow {
    pub id: i64,
    pub name: String,
}

/// Ligne chanson régulière (table `regular_songs`)
#[derive(Debug, Clone, Serialize)]
pub struct RegularSongRow {
    pub id: i64,
    pub regular_singer_id: i64,
    pub song_id: i64,
    pub key_change: i32,
    /// Position dense dans la liste du régulier (0..N-1)
    pub position: i64,
}

/// Forme d'insertion d'une chanson régulière
#[derive(Debug, Clone)]
pub struct NewRegularSong {
    pub regular_singer_id: i64,
    pub song_id: i64,
    pub key_change: i32,
    pub position: i64,
}
