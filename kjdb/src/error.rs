//! Types d'erreurs pour kjdb

/// Erreurs de la couche de persistance
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Row not found: {0}")]
    RowNotFound(i64),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type Result spécialisé pour kjdb
pub type Result<T> = std::result::Result<T, Error>;
