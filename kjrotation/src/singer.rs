//! Chanteur de rotation et politique d'insertion

use crate::ids::{RegularSingerId, SingerId};
use crate::position::Positioned;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Un chanteur de la session en cours
///
/// Le lien vers un régulier est un identifiant optionnel : `Some` vaut
/// « suivi activé », jamais un flag séparé qui pourrait se désynchroniser.
#[derive(Debug, Clone, Serialize)]
pub struct Singer {
    pub id: SingerId,
    /// Nom affiché, unique dans la rotation (insensible à la casse)
    pub name: String,
    /// Position dense dans la rotation (0..N-1)
    pub position: usize,
    /// Régulier lié, si le suivi est activé
    pub regular_id: Option<RegularSingerId>,
    /// Date d'ajout à la session
    pub added_at: DateTime<Utc>,
}

impl Singer {
    /// Vrai si le chanteur est suivi comme régulier
    pub fn is_regular(&self) -> bool {
        self.regular_id.is_some()
    }
}

impl Positioned for Singer {
    fn position(&self) -> usize {
        self.position
    }
    fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

/// Égalité de noms insensible à la casse, commune à tous les espaces de noms
pub(crate) fn names_equal(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Politique de placement d'un nouveau chanteur
///
/// Sans chanteur courant, toutes les politiques équivalent à `Bottom`. Sous
/// l'ordre de rotation canonique, le pli équitable et « chante juste après »
/// désignent le même créneau : celui qui suit immédiatement le chanteur
/// courant sur l'anneau.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddPolicy {
    /// En fin de rotation
    #[default]
    Bottom,
    /// Juste après le chanteur courant
    Next,
    /// Pli équitable dans le tour en cours
    Fair,
}

impl fmt::Display for AddPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AddPolicy::Bottom => "bottom",
            AddPolicy::Next => "next",
            AddPolicy::Fair => "fair",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for AddPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bottom" => Ok(AddPolicy::Bottom),
            "next" => Ok(AddPolicy::Next),
            "fair" => Ok(AddPolicy::Fair),
            other => Err(crate::Error::UnknownPolicy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_policy_parses_case_insensitively() {
        assert_eq!("FAIR".parse::<AddPolicy>().unwrap(), AddPolicy::Fair);
        assert_eq!("bottom".parse::<AddPolicy>().unwrap(), AddPolicy::Bottom);
        assert_eq!("Next".parse::<AddPolicy>().unwrap(), AddPolicy::Next);
        assert!("random".parse::<AddPolicy>().is_err());
    }

    #[test]
    fn add_policy_display_round_trips() {
        for policy in [AddPolicy::Bottom, AddPolicy::Next, AddPolicy::Fair] {
            assert_eq!(policy.to_string().parse::<AddPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn names_compare_case_insensitively() {
        assert!(names_equal("Alice", "ALICE"));
        assert!(names_equal("Zoé", "ZOÉ"));
        assert!(!names_equal("Alice", "Alicia"));
    }
}
