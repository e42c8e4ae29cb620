//! Types d'erreurs pour kjrotation

use crate::ids::{QueueSongId, RegularSingerId, SingerId, SongId};

/// Erreurs du cœur de rotation
///
/// Les erreurs de validation (doublon, entité inconnue, position hors borne)
/// sont retournées sans modifier l'état. Les erreurs de persistance annulent
/// la commande : transaction SQL et état mémoire sont restaurés ensemble.
/// Les défauts de densité de positions ne sont *pas* des erreurs : ils sont
/// réparés sur place (compactage) et journalisés en niveau erreur.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Name already in use: {0}")]
    DuplicateName(String),

    #[error("Unknown singer: {0}")]
    UnknownSinger(SingerId),

    #[error("Unknown queue song: {0}")]
    UnknownQueueSong(QueueSongId),

    #[error("Unknown regular singer: {0}")]
    UnknownRegular(RegularSingerId),

    #[error("Unknown song: {0}")]
    UnknownSong(SongId),

    #[error("Position {position} out of range for {len} items")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Unknown add policy: {0}")]
    UnknownPolicy(String),

    #[error("Invalid regulars document: {0}")]
    InvalidDocument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] kjdb::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type Result spécialisé pour kjrotation
pub type Result<T> = std::result::Result<T, Error>;
