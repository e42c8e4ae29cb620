//! # kjdb - Persistance SQLite pour le cœur de session karaoké
//!
//! Cette crate fournit la couche de stockage durable du classeur de rotation :
//! - Formes de lignes pour les chanteurs, files d'attente et réguliers
//! - Trait `SessionStore` : passerelle de persistance transactionnelle
//! - Adaptateur SQLite (`SqliteStore`) avec création de schéma à l'ouverture
//! - Garde `Transaction` : rollback automatique si non committée
//! - Catalogue de chansons en lecture seule (`SongCatalog` / `SqliteCatalog`)
//!
//! ## Architecture
//!
//! ```text
//! kjdb
//!     ├── rows.rs    - Formes de lignes (une struct par entité)
//!     ├── store.rs   - Trait SessionStore + garde Transaction
//!     ├── sqlite.rs  - Adaptateur rusqlite
//!     └── songs.rs   - Catalogue de chansons (lecture seule)
//! ```
//!
//! Le domaine (`kjrotation`) ne voit que les traits : l'adaptateur SQLite est
//! injecté à la construction, jamais résolu via un singleton.

mod error;
pub mod rows;
pub mod songs;
mod sqlite;
mod store;

// Réexports publics
pub use error::{Error, Result};
pub use rows::{
    NewQueueSong, NewRegularSong, NewSinger, QueueSongRow, RegularSingerRow, RegularSongRow,
    SingerRow,
};
pub use songs::{NewSong, SongCatalog, SongInfo, SqliteCatalog};
pub use sqlite::SqliteStore;
pub use store::{SessionStore, Transaction};
