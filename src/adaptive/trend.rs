use crate::adaptive::config::TrendConfig;
use crate::adaptive::types::PerformanceTrend;

/// Classify the learner's recent puzzle scores (most recent first).
pub fn recent_trend(scores: &[f64], cfg: &TrendConfig) -> PerformanceTrend {
    let window = &scores[..scores.len().min(cfg.window)];
    if window.len() < cfg.min_samples {
        return PerformanceTrend::Stable;
    }

    let struggles = window.iter().filter(|s| **s < cfg.struggle_score).count();
    let excellences = window.iter().filter(|s| **s > cfg.excel_score).count();

    if struggles >= cfg.min_hits {
        PerformanceTrend::Struggling
    } else if excellences >= cfg.min_hits {
        PerformanceTrend::Excelling
    } else {
        PerformanceTrend::Stable
    }
}
