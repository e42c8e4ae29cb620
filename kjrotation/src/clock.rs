//! Horloge injectable
//!
//! Le cœur de session n'appelle jamais `Utc::now()` directement : l'horloge
//! est injectée à la construction, ce qui rend les horodatages pilotables en
//! test.

use chrono::{DateTime, Utc};

/// Source de temps de la session
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Horloge système
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
