//! Read/write surface of the learner-profile store as seen by the
//! orchestrator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::adaptive::types::DifficultyTier;
use crate::store::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: String,
    pub username: String,
    pub exp: u64,
    pub rank: Option<String>,
    pub avatar_url: Option<String>,
    pub current_difficulty: Option<DifficultyTier>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleStats {
    pub wins: u32,
    pub total: u32,
}

impl BattleStats {
    pub fn win_rate(&self, default_rate: f64) -> f64 {
        if self.total == 0 {
            default_rate
        } else {
            self.wins as f64 / self.total as f64
        }
    }
}

pub trait PlayerDirectory: Send + Sync {
    /// Highest-experience players first, `exclude_id` left out.
    fn fetch_top_players(
        &self,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<PlayerProfile>, StoreError>;

    fn fetch_player(&self, id: &str) -> Result<Option<PlayerProfile>, StoreError>;

    fn write_difficulty(&self, user_id: &str, tier: DifficultyTier) -> Result<(), StoreError>;

    /// Completed-battle tallies per player; players without battles may be absent.
    fn fetch_battle_stats(
        &self,
        player_ids: &[String],
    ) -> Result<HashMap<String, BattleStats>, StoreError>;

    /// Most recent puzzle scores first.
    fn fetch_recent_scores(&self, user_id: &str, limit: usize) -> Result<Vec<f64>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_defaults_without_battles() {
        assert_eq!(BattleStats::default().win_rate(0.5), 0.5);
        assert_eq!(BattleStats { wins: 3, total: 4 }.win_rate(0.5), 0.75);
    }
}
