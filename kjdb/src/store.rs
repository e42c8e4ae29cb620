//! Trait de passerelle de persistance et garde de transaction
//!
//! Le domaine parle à ce trait, jamais à SQLite directement. Chaque commande
//! mutante du domaine ouvre une [`Transaction`], applique ses écritures puis
//! committe ; si la garde est lâchée sans commit (erreur, retour anticipé),
//! le rollback est automatique.

use crate::rows::{
    NewQueueSong, NewRegularSong, NewSinger, QueueSongRow, RegularSingerRow, RegularSongRow,
    SingerRow,
};
use crate::Result;

/// Passerelle de persistance de session
///
/// Contrat transactionnel : `begin`/`commit`/`rollback` encadrent les
/// écritures ; les insertions retournent l'identifiant attribué ; les
/// lectures `load_*` retournent toutes les lignes, triées par position.
pub trait SessionStore: Send + Sync {
    // --- Transactions ---

    fn begin(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;

    // --- Chanteurs ---

    /// Insère un chanteur et retourne son identifiant
    fn insert_singer(&self, singer: &NewSinger<'_>) -> Result<i64>;

    /// Réécrit les champs mutables d'un chanteur (nom, position, lien régulier)
    fn update_singer(&self, row: &SingerRow) -> Result<()>;

    /// Supprime un chanteur (la file associée est supprimée séparément)
    fn delete_singer(&self, id: i64) -> Result<()>;

    /// Charge tous les chanteurs, triés par position
    fn load_singers(&self) -> Result<Vec<SingerRow>>;

    /// Vide la session : chanteurs et files, les réguliers sont conservés
    fn clear_session(&self) -> Result<()>;

    // --- Chansons de file ---

    /// Insère une chanson de file et retourne son identifiant
    fn insert_queue_song(&self, song: &NewQueueSong) -> Result<i64>;

    /// Réécrit les champs mutables d'une chanson de file
    fn update_queue_song(&self, row: &QueueSongRow) -> Result<()>;

    fn delete_queue_song(&self, id: i64) -> Result<()>;

    /// Supprime en cascade la file complète d'un chanteur
    fn delete_queue_for_singer(&self, singer_id: i64) -> Result<()>;

    /// Charge toutes les chansons de file, triées par chanteur puis position
    fn load_queue_songs(&self) -> Result<Vec<QueueSongRow>>;

    // --- Chanteurs réguliers ---

    /// Insère un régulier et retourne son identifiant
    fn insert_regular_singer(&self, name: &str) -> Result<i64>;

    /// Renomme un régulier
    fn update_regular_singer(&self, row: &RegularSingerRow) -> Result<()>;

    fn delete_regular_singer(&self, id: i64) -> Result<()>;

    fn load_regular_singers(&self) -> Result<Vec<RegularSingerRow>>;

    // --- Chansons régulières ---

    /// Insère une chanson régulière et retourne son identifiant
    fn insert_regular_song(&self, song: &NewRegularSong) -> Result<i64>;

    /// Réécrit les champs mutables d'une chanson régulière
    fn update_regular_song(&self, row: &RegularSongRow) -> Result<()>;

    fn delete_regular_song(&self, id: i64) -> Result<()>;

    /// Supprime en cascade la liste complète d'un régulier
    fn delete_songs_for_regular(&self, regular_singer_id: i64) -> Result<()>;

    /// Charge toutes les chansons régulières, triées par régulier puis position
    fn load_regular_songs(&self) -> Result<Vec<RegularSongRow>>;
}

/// Garde de transaction : rollback au drop si non committée
///
/// ```no_run
/// # fn demo(store: &dyn kjdb::SessionStore) -> kjdb::Result<()> {
/// let tx = kjdb::Transaction::begin(store)?;
/// // ... écritures ...
/// tx.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct Transaction<'a> {
    store: &'a dyn SessionStore,
    committed: bool,
}

impl<'a> Transaction<'a> {
    /// Ouvre une transaction sur la passerelle
    pub fn begin(store: &'a dyn SessionStore) -> Result<Self> {
        store.begin()?;
        Ok(Self {
            store,
            committed: false,
        })
    }

    /// Committe la transaction ; consomme la garde
    pub fn commit(mut self) -> Result<()> {
        self.store.commit()?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = self.store.rollback() {
                tracing::error!("Failed to roll back session transaction: {}", e);
            }
        }
    }
}
