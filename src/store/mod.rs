pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub players: sled::Tree,
    pub battles: sled::Tree,
    pub progress: sled::Tree,
    pub meta: sled::Tree,
    // Secondary index trees
    pub players_by_exp: sled::Tree,
    pub battles_by_player: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let players = db.open_tree(trees::PLAYERS)?;
        let battles = db.open_tree(trees::BATTLES)?;
        let progress = db.open_tree(trees::PROGRESS)?;
        let meta = db.open_tree(trees::META)?;
        let players_by_exp = db.open_tree(trees::PLAYERS_BY_EXP)?;
        let battles_by_player = db.open_tree(trees::BATTLES_BY_PLAYER)?;

        Ok(Self {
            db,
            players,
            battles,
            progress,
            meta,
            players_by_exp,
            battles_by_player,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Cheap read used by the health probe.
    pub fn ping(&self) -> Result<(), StoreError> {
        self.meta.get(migrate::VERSION_KEY.as_bytes())?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
