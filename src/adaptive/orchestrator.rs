use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adaptive::config::{AdaptiveConfig, MatchmakingConfig};
use crate::adaptive::directory::{BattleStats, PlayerDirectory, PlayerProfile};
use crate::adaptive::error::EngineError;
use crate::adaptive::metrics::{self, RawTelemetry};
use crate::adaptive::types::*;
use crate::adaptive::{dda, irt, kmeans, trend};
use crate::store::StoreError;
use crate::validation;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub telemetry: RawTelemetry,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustRequest {
    pub irt_status: Option<String>,
    pub current_difficulty: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullAnalysisRequest {
    pub user_id: Option<String>,
    pub current_difficulty: Option<String>,
    #[serde(flatten)]
    pub telemetry: RawTelemetry,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchmakingRequest {
    pub user_id: Option<String>,
    pub k: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub irt_status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub irt_status: StruggleStatus,
    pub recommended_difficulty: DifficultyTier,
}

pub struct SessionOrchestrator {
    config: AdaptiveConfig,
    directory: Arc<dyn PlayerDirectory>,
    store_timeout: Duration,
}

impl SessionOrchestrator {
    /// Fails when the configuration breaks an engine invariant or the store
    /// timeout is zero.
    pub fn new(
        config: AdaptiveConfig,
        directory: Arc<dyn PlayerDirectory>,
        store_timeout: Duration,
    ) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Compute)?;
        if store_timeout.is_zero() {
            return Err(EngineError::compute("store timeout must be > 0"));
        }
        Ok(Self {
            config,
            directory,
            store_timeout,
        })
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    /// Run a store call on the blocking pool, bounded by the store timeout.
    async fn call_store<T, F>(&self, op: &'static str, f: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn PlayerDirectory) -> Result<T, StoreError> + Send + 'static,
    {
        let directory = self.directory.clone();
        let task = tokio::task::spawn_blocking(move || f(directory.as_ref()));

        match tokio::time::timeout(self.store_timeout, task).await {
            Ok(Ok(result)) => result.map_err(EngineError::from),
            Ok(Err(join_err)) => Err(EngineError::dependency(format!(
                "{op} task failed: {join_err}"
            ))),
            Err(_) => Err(EngineError::dependency(format!(
                "{op} timed out after {}ms",
                self.store_timeout.as_millis()
            ))),
        }
    }

    fn ensure_finite(user_id: &str, metrics: &AttemptMetrics, report: &AbilityReport) -> Result<(), EngineError> {
        if report.theta.is_finite() && report.probability.is_finite() {
            return Ok(());
        }
        tracing::error!(
            user_id,
            time = metrics.time,
            errors = metrics.errors,
            hints = metrics.hints,
            theta = report.theta,
            probability = report.probability,
            "Ability estimate is not finite"
        );
        Err(EngineError::compute("ability estimate is not finite"))
    }

    pub fn analyze(&self, req: &AnalyzeRequest) -> Result<AbilityReport, EngineError> {
        let user_id = validation::require_user_id(req.user_id.as_deref())?;
        let metrics = metrics::normalize(&req.telemetry)?;

        tracing::info!(user_id, time = metrics.time, errors = metrics.errors, hints = metrics.hints, "[IRT] Analyzing attempt");
        let report = irt::analyze(user_id, &metrics, &self.config.irt);
        Self::ensure_finite(user_id, &metrics, &report)?;
        tracing::info!(user_id, status = %report.status, probability = report.probability, "[IRT] Result");

        Ok(report)
    }

    pub fn adjust_difficulty(&self, req: &AdjustRequest) -> Result<DdaReport, EngineError> {
        let status = validation::parse_status("irtStatus", req.irt_status.as_deref())?;
        let current =
            validation::parse_tier("currentDifficulty", req.current_difficulty.as_deref())?;

        let report = dda::adjust_with_report(status, current);
        tracing::info!(
            status = %status,
            previous = %current,
            new = %report.new_difficulty,
            "[DDA] Adjusted"
        );
        Ok(report)
    }

    pub fn recommend(&self, req: &RecommendRequest) -> Result<Recommendation, EngineError> {
        let status = validation::parse_status("irtStatus", req.irt_status.as_deref())?;
        Ok(Recommendation {
            irt_status: status,
            recommended_difficulty: dda::recommended_difficulty(status),
        })
    }

    pub async fn full_analysis(&self, req: &FullAnalysisRequest) -> Result<FullAnalysis, EngineError> {
        let user_id = validation::require_user_id(req.user_id.as_deref())?;
        let current =
            validation::parse_tier("currentDifficulty", req.current_difficulty.as_deref())?;
        let metrics = metrics::normalize(&req.telemetry)?;

        tracing::info!(user_id, time = metrics.time, errors = metrics.errors, hints = metrics.hints, "[Full Analysis] Step 1 - IRT");
        let irt = irt::analyze(user_id, &metrics, &self.config.irt);
        Self::ensure_finite(user_id, &metrics, &irt)?;

        let recent_trend = self.recent_trend(user_id).await;

        tracing::info!(user_id, status = %irt.status, current = %current, "[Full Analysis] Step 2 - DDA");
        let dda = dda::adjust_with_report(irt.status, current);

        let difficulty_persisted = if dda.difficulty_changed {
            self.persist_difficulty(user_id, dda.new_difficulty).await
        } else {
            false
        };

        let summary = AnalysisSummary {
            student_status: irt.status,
            recent_trend,
            previous_difficulty: current,
            new_difficulty: dda.new_difficulty,
            difficulty_changed: dda.difficulty_changed,
            difficulty_persisted,
        };

        tracing::info!(
            user_id,
            status = %summary.student_status,
            previous = %summary.previous_difficulty,
            new = %summary.new_difficulty,
            persisted = summary.difficulty_persisted,
            "[Full Analysis] Complete"
        );

        Ok(FullAnalysis { irt, dda, summary })
    }

    /// Best-effort: a failed write leaves the stored tier stale until the
    /// next successful analysis, so it is only logged.
    ///
    /// Returns whether the write was confirmed. A timed-out store call is not
    /// cancelled and may still commit after this returns `false`.
    async fn persist_difficulty(&self, user_id: &str, tier: DifficultyTier) -> bool {
        let uid = user_id.to_string();
        match self
            .call_store("write_difficulty", move |d| d.write_difficulty(&uid, tier))
            .await
        {
            Ok(()) => {
                tracing::info!(user_id, difficulty = %tier, "[Full Analysis] Updated stored difficulty");
                true
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    difficulty = %tier,
                    error = %e,
                    "[Full Analysis] Failed to persist difficulty; reported and stored tiers now diverge"
                );
                false
            }
        }
    }

    async fn recent_trend(&self, user_id: &str) -> PerformanceTrend {
        let uid = user_id.to_string();
        let window = self.config.trend.window;
        match self
            .call_store("fetch_recent_scores", move |d| d.fetch_recent_scores(&uid, window))
            .await
        {
            Ok(scores) => {
                let trend = trend::recent_trend(&scores, &self.config.trend);
                tracing::info!(user_id, samples = scores.len(), trend = ?trend, "[Full Analysis] Recent trend");
                trend
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to read recent scores, assuming stable trend");
                PerformanceTrend::Stable
            }
        }
    }

    /// Cluster count actually handed to k-means for `n` players.
    pub fn choose_k(&self, requested: usize, n: usize) -> usize {
        if n < self.config.matchmaking.low_population_threshold {
            tracing::info!(players = n, "[Matchmaking] Low population, grouping all ranks together");
            1
        } else {
            requested.min(n / 2).max(1)
        }
    }

    pub async fn matchmaking(&self, req: &MatchmakingRequest) -> Result<MatchmakingOutcome, EngineError> {
        let user_id = validation::require_user_id(req.user_id.as_deref())?;
        let requested_k = validation::parse_k(req.k, self.config.matchmaking.default_k)?;
        let mm = &self.config.matchmaking;

        let exclude = user_id.to_string();
        let pool_cap = mm.pool_cap;
        let pool = self
            .call_store("fetch_top_players", move |d| d.fetch_top_players(&exclude, pool_cap))
            .await?;

        if pool.len() < 2 {
            tracing::info!(user_id, candidates = pool.len(), "[Matchmaking] Not enough players");
            return Ok(MatchmakingOutcome::no_match(
                "Not enough players online for matchmaking",
            ));
        }

        let uid = user_id.to_string();
        let requester = self
            .call_store("fetch_player", move |d| d.fetch_player(&uid))
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "player".to_string(),
                key: user_id.to_string(),
            })?;

        let mut players = Vec::with_capacity(pool.len() + 1);
        players.push(requester);
        players.extend(pool);

        let ids: Vec<String> = players.iter().map(|p| p.id.clone()).collect();
        let stats = match self
            .call_store("fetch_battle_stats", move |d| d.fetch_battle_stats(&ids))
            .await
        {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "[Matchmaking] Battle stats unavailable, using default win rate");
                HashMap::new()
            }
        };

        let features: Vec<PlayerFeatureVector> = players
            .iter()
            .map(|p| feature_vector(p, stats.get(&p.id), mm))
            .collect();

        let k = self.choose_k(requested_k, features.len());
        tracing::info!(players = features.len(), k, "[Matchmaking] Running k-means");

        let result = kmeans::cluster(&features, k, &self.config.kmeans).map_err(|e| {
            tracing::error!(
                user_id,
                requested_k,
                k,
                players = features.len(),
                features = ?features,
                error = %e,
                "[Matchmaking] Clustering failed"
            );
            e
        })?;

        let own_cluster = result
            .players
            .iter()
            .find(|a| a.player_id == user_id)
            .map(|a| a.cluster)
            .ok_or_else(|| {
                tracing::error!(user_id, "[Matchmaking] Requester missing from clustering output");
                EngineError::compute("requester missing from clustering output")
            })?;

        let by_id: HashMap<&str, &PlayerProfile> =
            players.iter().map(|p| (p.id.as_str(), p)).collect();
        let suggested_opponents: Vec<SuggestedOpponent> = result
            .players
            .iter()
            .filter(|a| a.cluster == own_cluster && a.player_id != user_id)
            .filter_map(|a| {
                by_id.get(a.player_id.as_str()).map(|p| SuggestedOpponent {
                    player_id: a.player_id.clone(),
                    cluster: a.cluster,
                    username: p.username.clone(),
                    avatar_url: p.avatar_url.clone(),
                    exp: p.exp,
                })
            })
            .collect();

        tracing::info!(
            user_id,
            cluster = own_cluster,
            matches = suggested_opponents.len(),
            "[Matchmaking] Found potential matches"
        );

        Ok(MatchmakingOutcome {
            status: MatchStatus::Success,
            cluster: Some(own_cluster),
            cluster_count: Some(result.cluster_count),
            message: None,
            suggested_opponents,
        })
    }
}

/// Skill features from the store's proxies: experience for ability, battle win
/// rate for the outcome dimensions.
pub fn feature_vector(
    player: &PlayerProfile,
    stats: Option<&BattleStats>,
    cfg: &MatchmakingConfig,
) -> PlayerFeatureVector {
    let win_rate = stats
        .map(|s| s.win_rate(cfg.default_win_rate))
        .unwrap_or(cfg.default_win_rate);
    PlayerFeatureVector {
        id: player.id.clone(),
        adjusted_theta: (player.exp as f64 / cfg.exp_normalizer).min(1.0),
        probability: win_rate,
        success_rate: win_rate,
        fail_rate: 1.0 - win_rate,
    }
}
