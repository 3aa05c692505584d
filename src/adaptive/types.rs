use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One puzzle attempt's telemetry after normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptMetrics {
    pub time: f64,
    pub errors: u32,
    pub hints: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StruggleStatus {
    NotStruggling,
    MediumStruggling,
    SuperStruggling,
}

impl StruggleStatus {
    pub const ALL: [StruggleStatus; 3] = [
        StruggleStatus::NotStruggling,
        StruggleStatus::MediumStruggling,
        StruggleStatus::SuperStruggling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StruggleStatus::NotStruggling => "NotStruggling",
            StruggleStatus::MediumStruggling => "MediumStruggling",
            StruggleStatus::SuperStruggling => "SuperStruggling",
        }
    }
}

impl fmt::Display for StruggleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StruggleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "notstruggling" => Ok(StruggleStatus::NotStruggling),
            "mediumstruggling" => Ok(StruggleStatus::MediumStruggling),
            "superstruggling" => Ok(StruggleStatus::SuperStruggling),
            _ => Err(format!(
                "unknown struggle status '{s}', expected NotStruggling, MediumStruggling or SuperStruggling"
            )),
        }
    }
}

/// Puzzle difficulty tier, ordered `Easy < Medium < Hard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 3] = [
        DifficultyTier::Easy,
        DifficultyTier::Medium,
        DifficultyTier::Hard,
    ];

    pub fn index(&self) -> i8 {
        match self {
            DifficultyTier::Easy => 0,
            DifficultyTier::Medium => 1,
            DifficultyTier::Hard => 2,
        }
    }

    pub fn from_index(index: i8) -> Self {
        match index {
            i8::MIN..=0 => DifficultyTier::Easy,
            1 => DifficultyTier::Medium,
            _ => DifficultyTier::Hard,
        }
    }

    pub fn step_down(&self) -> Self {
        Self::from_index(self.index() - 1)
    }

    pub fn step_up(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::Easy => "Easy",
            DifficultyTier::Medium => "Medium",
            DifficultyTier::Hard => "Hard",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(DifficultyTier::Easy),
            "medium" => Ok(DifficultyTier::Medium),
            "hard" => Ok(DifficultyTier::Hard),
            _ => Err(format!(
                "unknown difficulty '{s}', expected Easy, Medium or Hard"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityResult {
    pub theta: f64,
    pub probability: f64,
    pub status: StruggleStatus,
}

/// Per-signal contributions to the composite effort score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffortBreakdown {
    pub errors: f64,
    pub hints: f64,
    pub overtime: f64,
    pub total: f64,
}

impl EffortBreakdown {
    /// Signal with the largest contribution, `None` when nothing contributed.
    pub fn dominant_signal(&self) -> Option<&'static str> {
        let signals = [
            ("errors", self.errors),
            ("hints", self.hints),
            ("time", self.overtime),
        ];
        signals
            .iter()
            .filter(|(_, v)| *v > 0.0)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| *name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptAnalysis {
    pub time_consumed: f64,
    pub error_count: u32,
    pub hints_used: u32,
    pub effort: EffortBreakdown,
    pub dominant_signal: Option<String>,
}

/// Ability estimate enriched with the attempt breakdown, as returned by `analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityReport {
    pub user_id: String,
    pub status: StruggleStatus,
    pub theta: f64,
    pub probability: f64,
    pub timestamp: DateTime<Utc>,
    pub analysis: AttemptAnalysis,
}

impl AbilityReport {
    pub fn ability(&self) -> AbilityResult {
        AbilityResult {
            theta: self.theta,
            probability: self.probability,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdaResult {
    pub new_difficulty: DifficultyTier,
    pub difficulty_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdaReport {
    pub previous_difficulty: DifficultyTier,
    pub new_difficulty: DifficultyTier,
    pub difficulty_changed: bool,
    pub irt_status: StruggleStatus,
    pub adjustment: i8,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTrend {
    Stable,
    Struggling,
    Excelling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub student_status: StruggleStatus,
    pub recent_trend: PerformanceTrend,
    pub previous_difficulty: DifficultyTier,
    pub new_difficulty: DifficultyTier,
    pub difficulty_changed: bool,
    /// True only when the write was confirmed. `false` after a timeout does
    /// not mean the write was lost: the store call may still commit.
    pub difficulty_persisted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullAnalysis {
    pub irt: AbilityReport,
    pub dda: DdaReport,
    pub summary: AnalysisSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerFeatureVector {
    pub id: String,
    pub adjusted_theta: f64,
    pub probability: f64,
    pub success_rate: f64,
    pub fail_rate: f64,
}

impl PlayerFeatureVector {
    pub fn as_point(&self) -> [f64; 4] {
        [
            self.adjusted_theta,
            self.probability,
            self.success_rate,
            self.fail_rate,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub player_id: String,
    pub cluster: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResult {
    pub players: Vec<ClusterAssignment>,
    pub cluster_count: usize,
    pub centroids: Vec<[f64; 4]>,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedOpponent {
    pub player_id: String,
    pub cluster: usize,
    pub username: String,
    pub avatar_url: Option<String>,
    pub exp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Success,
    NoMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingOutcome {
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub suggested_opponents: Vec<SuggestedOpponent>,
}

impl MatchmakingOutcome {
    pub fn no_match(message: &str) -> Self {
        Self {
            status: MatchStatus::NoMatch,
            cluster: None,
            cluster_count: None,
            message: Some(message.to_string()),
            suggested_opponents: Vec::new(),
        }
    }
}
