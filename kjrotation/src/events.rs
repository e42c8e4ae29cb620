//! Évènements de session et registre d'observateurs
//!
//! Le cœur de rotation ne dépend d'aucune couche d'affichage : les
//! collaborateurs (vues, télécommandes) s'abonnent par callback et sont
//! notifiés après chaque commande committée.

use crate::ids::SingerId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Évènement émis après une commande réussie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// La rotation a changé (ajout, déplacement, suppression, renommage)
    RotationChanged,
    /// Le chanteur courant a changé
    CurrentChanged { singer: Option<SingerId> },
    /// La file d'un chanteur a changé
    QueueChanged { singer: SingerId },
    /// Le registre des réguliers a changé
    RegularsChanged,
}

/// Registre de callbacks, désabonnement par jeton
pub(crate) struct Observers {
    callbacks: RwLock<HashMap<u64, Arc<dyn Fn(&SessionEvent) + Send + Sync>>>,
    counter: AtomicU64,
}

impl Observers {
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(HashMap::new()),
            counter: AtomicU64::new(1),
        }
    }

    /// Enregistre un callback et retourne son jeton
    pub fn register<F>(&self, callback: F) -> u64
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let token = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.callbacks.write().unwrap();
        guard.insert(token, Arc::new(callback));
        token
    }

    /// Désenregistre un callback via son jeton
    pub fn unregister(&self, token: u64) {
        let mut guard = self.callbacks.write().unwrap();
        guard.remove(&token);
    }

    /// Notifie tous les callbacks
    pub fn notify(&self, event: &SessionEvent) {
        let callbacks: Vec<_> = {
            let guard = self.callbacks.read().unwrap();
            guard.values().cloned().collect()
        };
        for callback in callbacks {
            callback(event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.callbacks.read().unwrap().len();
        f.debug_struct("Observers").field("callbacks", &count).finish()
    }
}
