//! # kjrotation - Cœur de rotation d'une session karaoké
//!
//! Cette crate fournit le planificateur de rotation d'un hôte karaoké (KJ) :
//! - Rotation ordonnée de chanteurs, positions denses auto-réparées
//! - Une file de chansons ordonnée par chanteur, avec transposition
//! - Politiques de placement (fin de rotation, pli équitable dans le tour)
//! - Arithmétique d'anneau : tours d'attente, temps estimé avant passage
//! - Réguliers : historique durable répliqué depuis les files liées
//! - Import/export JSON du registre des réguliers
//!
//! # Architecture
//!
//! - **Rotation** : agrégat central ; chaque commande est une transaction
//!   (mutation mémoire + écritures SQL, rollback commun sur échec)
//! - **SongQueue** : file ordonnée d'un chanteur, positions denses
//! - **RegularsRegistry** : réguliers et leurs listes historiques
//! - **position** : primitives pures (compactage, décalage, anneau)
//!
//! La persistance et le catalogue sont des traits de `kjdb`, injectés à la
//! construction avec une horloge ; aucun singleton de processus.
//!
//! # Exemple d'utilisation
//!
//! ```no_run
//! use kjdb::{SqliteCatalog, SqliteStore};
//! use kjrotation::{AddPolicy, Rotation, RotationOptions, SystemClock};
//! use std::sync::Arc;
//!
//! # fn main() -> kjrotation::Result<()> {
//! let store = Arc::new(SqliteStore::open_in_memory()?);
//! let catalog = Arc::new(SqliteCatalog::open_in_memory()?);
//! let mut rotation = Rotation::open(
//!     store,
//!     catalog,
//!     Arc::new(SystemClock),
//!     RotationOptions::default(),
//! )?;
//!
//! let alice = rotation.add_singer("Alice", AddPolicy::Bottom)?;
//! let bob = rotation.add_singer("Bob", AddPolicy::Bottom)?;
//! rotation.set_current_singer(Some(alice))?;
//!
//! // Bob passe dans un tour ; son attente dépend des files
//! assert_eq!(rotation.turn_distance(bob)?, 1);
//! # Ok(())
//! # }
//! ```

mod clock;
mod config;
mod error;
mod events;
mod export;
mod ids;
mod position;
mod queue;
mod regulars;
mod session;
mod singer;

// Réexports publics
pub use clock::{Clock, SystemClock};
pub use config::{RotationOptions, SessionConfig};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use export::{ImportReport, RegularExport, RegularSongExport, RegularsDocument};
pub use ids::{QueueSongId, RegularSingerId, RegularSongId, SingerId, SongId};
pub use queue::QueueSong;
pub use regulars::{RegularSinger, RegularSong, RegularsRegistry};
pub use session::Rotation;
pub use singer::{AddPolicy, Singer};
