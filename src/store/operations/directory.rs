use std::collections::HashMap;

use crate::adaptive::directory::{BattleStats, PlayerDirectory, PlayerProfile};
use crate::adaptive::types::DifficultyTier;
use crate::store::{Store, StoreError};

impl PlayerDirectory for Store {
    fn fetch_top_players(
        &self,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<PlayerProfile>, StoreError> {
        Ok(self
            .list_players_by_exp(Some(exclude_id), limit)?
            .into_iter()
            .map(PlayerProfile::from)
            .collect())
    }

    fn fetch_player(&self, id: &str) -> Result<Option<PlayerProfile>, StoreError> {
        Ok(self.get_player(id)?.map(PlayerProfile::from))
    }

    fn write_difficulty(&self, user_id: &str, tier: DifficultyTier) -> Result<(), StoreError> {
        self.set_player_difficulty(user_id, tier)
    }

    fn fetch_battle_stats(
        &self,
        player_ids: &[String],
    ) -> Result<HashMap<String, BattleStats>, StoreError> {
        self.battle_stats_by_ids(player_ids)
    }

    fn fetch_recent_scores(&self, user_id: &str, limit: usize) -> Result<Vec<f64>, StoreError> {
        Ok(self
            .recent_progress(user_id, limit)?
            .into_iter()
            .map(|p| p.score)
            .collect())
    }
}
