use serde::{Deserialize, Serialize};

/// Ability estimator calibration. All tunables of the logistic struggle
/// model live here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrtConfig {
    /// Effort per execution error
    pub error_weight: f64,
    /// Effort per hint used
    pub hint_weight: f64,
    /// Effort per second spent beyond `expected_time_secs`
    pub time_weight: f64,
    pub expected_time_secs: f64,
    /// Divides effort into theta; larger values flatten the curve
    pub scale: f64,
    /// probability >= high_threshold -> NotStruggling
    pub high_threshold: f64,
    /// probability < mid_threshold -> SuperStruggling
    pub mid_threshold: f64,
}

impl Default for IrtConfig {
    fn default() -> Self {
        Self {
            error_weight: 1.0,
            hint_weight: 0.5,
            time_weight: 0.01,
            expected_time_secs: 60.0,
            scale: 3.0,
            high_threshold: 0.40,
            mid_threshold: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KMeansConfig {
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchmakingConfig {
    /// Upper bound on candidates fetched per request
    pub pool_cap: usize,
    pub default_k: usize,
    /// Below this many players every rank is grouped together (k = 1)
    pub low_population_threshold: usize,
    /// Experience at which adjusted_theta saturates at 1.0
    pub exp_normalizer: f64,
    /// Win rate assumed for players without completed battles
    pub default_win_rate: f64,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            pool_cap: 50,
            default_k: 3,
            low_population_threshold: 6,
            exp_normalizer: 50_000.0,
            default_win_rate: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendConfig {
    pub window: usize,
    pub min_samples: usize,
    pub struggle_score: f64,
    pub excel_score: f64,
    pub min_hits: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window: 5,
            min_samples: 3,
            struggle_score: 50.0,
            excel_score: 80.0,
            min_hits: 3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveConfig {
    pub irt: IrtConfig,
    #[serde(default)]
    pub kmeans: KMeansConfig,
    #[serde(default)]
    pub matchmaking: MatchmakingConfig,
    #[serde(default)]
    pub trend: TrendConfig,
}

impl AdaptiveConfig {
    pub fn from_env(env_config: &crate::config::AdaptiveEnvConfig) -> Self {
        let mut config = Self::default();
        config.irt.expected_time_secs = env_config.expected_time_secs;
        config.irt.high_threshold = env_config.high_threshold;
        config.irt.mid_threshold = env_config.mid_threshold;
        config.kmeans.seed = env_config.kmeans_seed;
        config.kmeans.max_iterations = env_config.kmeans_max_iterations;
        config.matchmaking.pool_cap = env_config.pool_cap;
        config.matchmaking.default_k = env_config.default_k;
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        let irt = &self.irt;
        if !(irt.error_weight.is_finite()
            && irt.hint_weight.is_finite()
            && irt.time_weight.is_finite())
        {
            return Err("irt weights must be finite".to_string());
        }
        if irt.time_weight <= 0.0 {
            return Err("irt.time_weight must be > 0".to_string());
        }
        if irt.hint_weight <= irt.time_weight {
            return Err("irt.hint_weight must be > irt.time_weight".to_string());
        }
        if irt.error_weight <= irt.hint_weight {
            return Err("irt.error_weight must be > irt.hint_weight".to_string());
        }
        if !irt.expected_time_secs.is_finite() || irt.expected_time_secs < 0.0 {
            return Err("irt.expected_time_secs must be >= 0".to_string());
        }
        if !irt.scale.is_finite() || irt.scale <= 0.0 {
            return Err("irt.scale must be > 0".to_string());
        }
        // 全零指标 (p = 0.5) 必须判定为 NotStruggling
        if !(irt.high_threshold > 0.0 && irt.high_threshold <= 0.5) {
            return Err("irt.high_threshold must be in (0, 0.5]".to_string());
        }
        if !(irt.mid_threshold > 0.0 && irt.mid_threshold < irt.high_threshold) {
            return Err("irt.mid_threshold must be in (0, irt.high_threshold)".to_string());
        }

        if self.kmeans.max_iterations == 0 {
            return Err("kmeans.max_iterations must be > 0".to_string());
        }

        let mm = &self.matchmaking;
        if mm.pool_cap < 2 {
            return Err("matchmaking.pool_cap must be >= 2".to_string());
        }
        if mm.default_k == 0 {
            return Err("matchmaking.default_k must be > 0".to_string());
        }
        if !mm.exp_normalizer.is_finite() || mm.exp_normalizer <= 0.0 {
            return Err("matchmaking.exp_normalizer must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&mm.default_win_rate) {
            return Err("matchmaking.default_win_rate must be in [0,1]".to_string());
        }

        let trend = &self.trend;
        if trend.window == 0 {
            return Err("trend.window must be > 0".to_string());
        }
        if trend.min_samples > trend.window || trend.min_hits > trend.window {
            return Err("trend.min_samples and trend.min_hits must be <= trend.window".to_string());
        }
        if trend.struggle_score >= trend.excel_score {
            return Err("trend.struggle_score must be < trend.excel_score".to_string());
        }

        Ok(())
    }
}
