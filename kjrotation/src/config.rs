//! Configuration de session
//!
//! Structures serde chargées depuis YAML. La configuration est passée à la
//! construction de la rotation, jamais lue depuis un état global.

use crate::singer::AddPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options du planificateur de rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationOptions {
    /// Politique de placement quand l'hôte n'en précise pas
    pub default_add_policy: AddPolicy,
    /// Durée estimée (secondes) pour une chanson sans durée au catalogue
    pub fallback_song_seconds: u32,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            default_add_policy: AddPolicy::Bottom,
            fallback_song_seconds: 240,
        }
    }
}

/// Configuration complète d'une session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base de session (chanteurs, files, réguliers)
    pub db_path: PathBuf,
    /// Catalogue de chansons ; par défaut, la même base que la session
    pub catalog_path: Option<PathBuf>,
    pub rotation: RotationOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("session.db"),
            catalog_path: None,
            rotation: RotationOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Charge la configuration depuis un fichier YAML
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_yaml::from_str(&text).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = SessionConfig::default();
        assert_eq!(config.db_path, PathBuf::from("session.db"));
        assert!(config.catalog_path.is_none());
        assert_eq!(config.rotation.default_add_policy, AddPolicy::Bottom);
        assert_eq!(config.rotation.fallback_song_seconds, 240);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = r#"
db_path: /var/lib/kjsession/tonight.db
rotation:
  default_add_policy: fair
"#;
        let config: SessionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/kjsession/tonight.db"));
        assert_eq!(config.rotation.default_add_policy, AddPolicy::Fair);
        assert_eq!(config.rotation.fallback_song_seconds, 240);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let yaml = "rotation: { default_add_policy: shuffle }";
        assert!(serde_yaml::from_str::<SessionConfig>(yaml).is_err());
    }
}
