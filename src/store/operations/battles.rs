use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::TransactionError;
use sled::Transactional;

use crate::adaptive::directory::BattleStats;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battle {
    pub id: String,
    pub player1_id: String,
    pub player2_id: String,
    pub winner_id: Option<String>,
    pub status: BattleStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Battle {
    pub fn new(player1_id: impl Into<String>, player2_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            player1_id: player1_id.into(),
            player2_id: player2_id.into(),
            winner_id: None,
            status: BattleStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn involves(&self, player_id: &str) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }
}

impl Store {
    pub fn create_battle(&self, battle: &Battle) -> Result<(), StoreError> {
        if battle.player1_id == battle.player2_id {
            return Err(StoreError::Validation(
                "a battle needs two distinct players".to_string(),
            ));
        }
        let key = keys::battle_key(&battle.id)?;
        let idx1 = keys::battle_player_index_key(&battle.player1_id, &battle.id)?;
        let idx2 = keys::battle_player_index_key(&battle.player2_id, &battle.id)?;
        let bytes = Self::serialize(battle)?;

        (&self.battles, &self.battles_by_player)
            .transaction(|(battles, index)| {
                battles.insert(key.as_bytes(), bytes.as_slice())?;
                index.insert(idx1.as_bytes(), &[])?;
                index.insert(idx2.as_bytes(), &[])?;
                Ok(())
            })
            .map_err(|e: TransactionError<()>| match e {
                TransactionError::Abort(()) => StoreError::Validation("battle write aborted".to_string()),
                TransactionError::Storage(se) => StoreError::Sled(se),
            })
    }

    pub fn get_battle(&self, battle_id: &str) -> Result<Option<Battle>, StoreError> {
        let key = keys::battle_key(battle_id)?;
        match self.battles.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// `winner_id = None` records a draw.
    pub fn complete_battle(
        &self,
        battle_id: &str,
        winner_id: Option<&str>,
    ) -> Result<Battle, StoreError> {
        let mut battle = self
            .get_battle(battle_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "battle".to_string(),
                key: battle_id.to_string(),
            })?;
        if let Some(winner) = winner_id {
            if !battle.involves(winner) {
                return Err(StoreError::Validation(format!(
                    "winner {winner} did not take part in battle {battle_id}"
                )));
            }
        }
        battle.winner_id = winner_id.map(str::to_string);
        battle.status = BattleStatus::Completed;
        battle.completed_at = Some(Utc::now());

        let key = keys::battle_key(battle_id)?;
        self.battles
            .insert(key.as_bytes(), Self::serialize(&battle)?)?;
        Ok(battle)
    }

    /// Tallies over completed battles only.
    pub fn battle_stats(&self, player_id: &str) -> Result<BattleStats, StoreError> {
        let prefix = keys::battle_player_prefix(player_id)?;
        let mut stats = BattleStats::default();

        for item in self.battles_by_player.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            let Some(battle_id) = key
                .strip_prefix(prefix.as_bytes())
                .and_then(|rest| std::str::from_utf8(rest).ok())
            else {
                tracing::warn!(player_id, "Malformed battle index key");
                continue;
            };
            let Some(battle) = self.get_battle(battle_id)? else {
                tracing::warn!(player_id, battle_id, "Dangling entry in battle index");
                continue;
            };
            if battle.status != BattleStatus::Completed {
                continue;
            }
            stats.total += 1;
            if battle.winner_id.as_deref() == Some(player_id) {
                stats.wins += 1;
            }
        }

        Ok(stats)
    }

    pub fn battle_stats_by_ids(
        &self,
        player_ids: &[String],
    ) -> Result<HashMap<String, BattleStats>, StoreError> {
        let mut result = HashMap::with_capacity(player_ids.len());
        for player_id in player_ids {
            if result.contains_key(player_id) {
                continue;
            }
            let stats = self.battle_stats(player_id)?;
            if stats.total > 0 {
                result.insert(player_id.clone(), stats);
            }
        }
        Ok(result)
    }
}
