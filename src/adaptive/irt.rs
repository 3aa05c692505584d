//! Ability / struggle estimator.
//!
//! A single attempt is scored with a logistic response curve: the composite
//! effort `errors*w_e + hints*w_h + overtime*w_t` is mapped to an ability
//! estimate `theta = -effort / scale`, and `P(success) = 1 / (1 + e^-theta)`.
//! The probability is then bucketed into a struggle status.

use chrono::Utc;

use crate::adaptive::config::IrtConfig;
use crate::adaptive::types::{
    AbilityReport, AbilityResult, AttemptAnalysis, AttemptMetrics, EffortBreakdown,
    StruggleStatus,
};

pub fn effort(metrics: &AttemptMetrics, cfg: &IrtConfig) -> EffortBreakdown {
    let errors = metrics.errors as f64 * cfg.error_weight;
    let hints = metrics.hints as f64 * cfg.hint_weight;
    let overtime = (metrics.time - cfg.expected_time_secs).max(0.0) * cfg.time_weight;
    EffortBreakdown {
        errors,
        hints,
        overtime,
        total: errors + hints + overtime,
    }
}

fn logistic(theta: f64) -> f64 {
    1.0 / (1.0 + (-theta).exp())
}

pub fn classify(probability: f64, cfg: &IrtConfig) -> StruggleStatus {
    if probability >= cfg.high_threshold {
        StruggleStatus::NotStruggling
    } else if probability >= cfg.mid_threshold {
        StruggleStatus::MediumStruggling
    } else {
        StruggleStatus::SuperStruggling
    }
}

pub fn estimate(metrics: &AttemptMetrics, cfg: &IrtConfig) -> AbilityResult {
    let breakdown = effort(metrics, cfg);
    let theta = -breakdown.total / cfg.scale;
    let probability = logistic(theta).clamp(0.0, 1.0);
    AbilityResult {
        theta,
        probability,
        status: classify(probability, cfg),
    }
}

/// `estimate` plus the per-signal breakdown reported to clients.
pub fn analyze(user_id: &str, metrics: &AttemptMetrics, cfg: &IrtConfig) -> AbilityReport {
    let breakdown = effort(metrics, cfg);
    let result = estimate(metrics, cfg);

    tracing::debug!(
        user_id,
        effort = breakdown.total,
        theta = result.theta,
        probability = result.probability,
        status = %result.status,
        "Ability estimated"
    );

    AbilityReport {
        user_id: user_id.to_string(),
        status: result.status,
        theta: result.theta,
        probability: result.probability,
        timestamp: Utc::now(),
        analysis: AttemptAnalysis {
            time_consumed: metrics.time,
            error_count: metrics.errors,
            hints_used: metrics.hints,
            effort: breakdown,
            dominant_signal: breakdown.dominant_signal().map(str::to_string),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(time: f64, errors: u32, hints: u32) -> AttemptMetrics {
        AttemptMetrics { time, errors, hints }
    }

    #[test]
    fn zero_metrics_give_even_odds() {
        let cfg = IrtConfig::default();
        let result = estimate(&AttemptMetrics::default(), &cfg);
        assert_eq!(result.theta, 0.0);
        assert!((result.probability - 0.5).abs() < 1e-12);
        assert_eq!(result.status, StruggleStatus::NotStruggling);
    }

    #[test]
    fn fast_clean_attempt_is_not_struggling() {
        let cfg = IrtConfig::default();
        let result = estimate(&metrics(30.0, 0, 0), &cfg);
        assert_eq!(result.status, StruggleStatus::NotStruggling);
    }

    #[test]
    fn heavy_attempt_is_super_struggling() {
        let cfg = IrtConfig::default();
        let result = estimate(&metrics(120.0, 5, 3), &cfg);
        assert!(result.theta < 0.0);
        assert_eq!(result.status, StruggleStatus::SuperStruggling);
    }

    #[test]
    fn moderate_attempt_is_medium_struggling() {
        let cfg = IrtConfig::default();
        // effort = 2 + 0.5 + 0 = 2.5 -> p ~= 0.30
        let result = estimate(&metrics(45.0, 2, 1), &cfg);
        assert_eq!(result.status, StruggleStatus::MediumStruggling);
    }

    #[test]
    fn time_within_expectation_adds_no_effort() {
        let cfg = IrtConfig::default();
        let b = effort(&metrics(cfg.expected_time_secs, 0, 0), &cfg);
        assert_eq!(b.total, 0.0);
        let b = effort(&metrics(cfg.expected_time_secs + 100.0, 0, 0), &cfg);
        assert!((b.overtime - 1.0).abs() < 1e-9);
    }

    #[test]
    fn many_errors_drive_probability_to_zero() {
        let cfg = IrtConfig::default();
        let result = estimate(&metrics(0.0, 10_000, 0), &cfg);
        assert!(result.probability < 1e-9);
        assert_eq!(result.status, StruggleStatus::SuperStruggling);
    }

    #[test]
    fn report_names_dominant_signal() {
        let cfg = IrtConfig::default();
        let report = analyze("u1", &metrics(120.0, 5, 3), &cfg);
        assert_eq!(report.user_id, "u1");
        assert_eq!(report.analysis.dominant_signal.as_deref(), Some("errors"));
        assert_eq!(report.ability().status, StruggleStatus::SuperStruggling);
    }

    #[test]
    fn classify_boundaries_are_inclusive_below() {
        let cfg = IrtConfig::default();
        assert_eq!(classify(cfg.high_threshold, &cfg), StruggleStatus::NotStruggling);
        assert_eq!(classify(cfg.mid_threshold, &cfg), StruggleStatus::MediumStruggling);
        assert_eq!(
            classify(cfg.mid_threshold - 1e-9, &cfg),
            StruggleStatus::SuperStruggling
        );
    }
}
