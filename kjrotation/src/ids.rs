//! Identifiants typés des entités de session
//!
//! Les identifiants bruts (rowids SQLite) sont enveloppés dans des newtypes :
//! impossible de passer un identifiant de chanson régulière là où un
//! identifiant de chanteur est attendu. La propriété des entités reste dans
//! les collections du domaine, jamais dans des pointeurs partagés.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiant d'un chanteur de la rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SingerId(pub i64);

/// Identifiant d'une chanson de file d'attente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueSongId(pub i64);

/// Identifiant d'un chanteur régulier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegularSingerId(pub i64);

/// Identifiant d'une chanson de la liste d'un régulier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegularSongId(pub i64);

/// Clé d'une chanson dans le catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SongId(pub i64);

impl fmt::Display for SingerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QueueSongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RegularSingerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RegularSongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
