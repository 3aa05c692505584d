use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;

use crate::adaptive::directory::PlayerProfile;
use crate::adaptive::types::DifficultyTier;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: String,
    pub username: String,
    pub exp: u64,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub current_difficulty: Option<DifficultyTier>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn new(id: impl Into<String>, username: impl Into<String>, exp: u64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            username: username.into(),
            exp,
            rank: None,
            avatar_url: None,
            current_difficulty: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<PlayerRecord> for PlayerProfile {
    fn from(record: PlayerRecord) -> Self {
        PlayerProfile {
            id: record.id,
            username: record.username,
            exp: record.exp,
            rank: record.rank,
            avatar_url: record.avatar_url,
            current_difficulty: record.current_difficulty,
        }
    }
}

impl Store {
    /// Insert or replace a player, keeping the experience index in step.
    pub fn upsert_player(&self, player: &PlayerRecord) -> Result<(), StoreError> {
        let key = keys::player_key(&player.id)?;
        let exp_key = keys::player_exp_key(player.exp, &player.id)?;
        let bytes = Self::serialize(player)?;

        (&self.players, &self.players_by_exp)
            .transaction(|(players, index)| {
                if let Some(raw) = players.get(key.as_bytes())? {
                    let old: PlayerRecord =
                        Self::deserialize(&raw).map_err(ConflictableTransactionError::Abort)?;
                    let old_exp_key = keys::player_exp_key(old.exp, &old.id)
                        .map_err(ConflictableTransactionError::Abort)?;
                    index.remove(old_exp_key.as_bytes())?;
                }
                players.insert(key.as_bytes(), bytes.as_slice())?;
                index.insert(exp_key.as_bytes(), player.id.as_bytes())?;
                Ok(())
            })
            .map_err(|e: TransactionError<StoreError>| match e {
                TransactionError::Abort(inner) => inner,
                TransactionError::Storage(se) => StoreError::Sled(se),
            })
    }

    pub fn get_player(&self, player_id: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let key = keys::player_key(player_id)?;
        match self.players.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Players by experience, highest first.
    pub fn list_players_by_exp(
        &self,
        exclude_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PlayerRecord>, StoreError> {
        let mut players = Vec::with_capacity(limit.min(64));
        for item in self.players_by_exp.iter() {
            if players.len() >= limit {
                break;
            }
            let (_, value) = item?;
            let player_id = match std::str::from_utf8(&value) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid UTF-8 in player exp index");
                    continue;
                }
            };
            if exclude_id == Some(player_id) {
                continue;
            }
            match self.get_player(player_id)? {
                Some(player) => players.push(player),
                None => tracing::warn!(player_id, "Dangling entry in player exp index"),
            }
        }
        Ok(players)
    }

    /// Read-modify-write inside the same transaction as `upsert_player`, so a
    /// concurrent upsert either lands first or forces a retry.
    pub fn set_player_difficulty(
        &self,
        player_id: &str,
        tier: DifficultyTier,
    ) -> Result<(), StoreError> {
        let key = keys::player_key(player_id)?;

        (&self.players, &self.players_by_exp)
            .transaction(|(players, index)| {
                let raw = players.get(key.as_bytes())?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(StoreError::NotFound {
                        entity: "player".to_string(),
                        key: player_id.to_string(),
                    })
                })?;
                let mut player: PlayerRecord =
                    Self::deserialize(&raw).map_err(ConflictableTransactionError::Abort)?;
                player.current_difficulty = Some(tier);
                player.updated_at = Utc::now();

                let exp_key = keys::player_exp_key(player.exp, &player.id)
                    .map_err(ConflictableTransactionError::Abort)?;
                let bytes = Self::serialize(&player).map_err(ConflictableTransactionError::Abort)?;
                players.insert(key.as_bytes(), bytes)?;
                index.insert(exp_key.as_bytes(), player.id.as_bytes())?;
                Ok(())
            })
            .map_err(|e: TransactionError<StoreError>| match e {
                TransactionError::Abort(inner) => inner,
                TransactionError::Storage(se) => StoreError::Sled(se),
            })
    }

    pub fn count_players(&self) -> usize {
        self.players.len()
    }
}
