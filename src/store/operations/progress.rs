use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleProgress {
    pub id: String,
    pub user_id: String,
    pub puzzle_id: String,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

impl PuzzleProgress {
    pub fn new(user_id: impl Into<String>, puzzle_id: impl Into<String>, score: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            puzzle_id: puzzle_id.into(),
            score,
            completed_at: Utc::now(),
        }
    }
}

impl Store {
    pub fn record_progress(&self, progress: &PuzzleProgress) -> Result<(), StoreError> {
        if !progress.score.is_finite() {
            return Err(StoreError::Validation("score must be finite".to_string()));
        }
        let key = keys::progress_key(
            &progress.user_id,
            progress.completed_at.timestamp_millis(),
            &progress.id,
        )?;
        self.progress
            .insert(key.as_bytes(), Self::serialize(progress)?)?;
        Ok(())
    }

    /// 按完成时间倒序返回最近的记录。
    pub fn recent_progress(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PuzzleProgress>, StoreError> {
        let prefix = keys::progress_prefix(user_id)?;
        let mut out = Vec::with_capacity(limit.min(64));
        for item in self.progress.scan_prefix(prefix.as_bytes()).take(limit) {
            let (_, value) = item?;
            out.push(Self::deserialize(&value)?);
        }
        Ok(out)
    }
}
