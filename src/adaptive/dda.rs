//! Dynamic difficulty adjustment.
//!
//! One step per attempt: down on SuperStruggling, up on NotStruggling, hold on
//! MediumStruggling. Easy and Hard saturate.

use chrono::Utc;

use crate::adaptive::types::{DdaReport, DdaResult, DifficultyTier, StruggleStatus};

pub fn adjust(status: StruggleStatus, current: DifficultyTier) -> DdaResult {
    let new_difficulty = match status {
        StruggleStatus::SuperStruggling => current.step_down(),
        StruggleStatus::MediumStruggling => current,
        StruggleStatus::NotStruggling => current.step_up(),
    };
    DdaResult {
        new_difficulty,
        difficulty_changed: new_difficulty != current,
    }
}

fn reason(status: StruggleStatus, current: DifficultyTier, result: &DdaResult) -> String {
    match (status, result.difficulty_changed) {
        (StruggleStatus::SuperStruggling, true) => {
            "Student severely struggling - decreasing difficulty by 1 level".to_string()
        }
        (StruggleStatus::SuperStruggling, false) => {
            format!("Student severely struggling - already at {current}")
        }
        (StruggleStatus::MediumStruggling, _) => {
            "Student moderately struggling - holding current difficulty".to_string()
        }
        (StruggleStatus::NotStruggling, true) => {
            "Student performing well - increasing difficulty by 1 level".to_string()
        }
        (StruggleStatus::NotStruggling, false) => {
            format!("Student performing well - already at {current}")
        }
    }
}

pub fn adjust_with_report(status: StruggleStatus, current: DifficultyTier) -> DdaReport {
    let result = adjust(status, current);
    let report = DdaReport {
        previous_difficulty: current,
        new_difficulty: result.new_difficulty,
        difficulty_changed: result.difficulty_changed,
        irt_status: status,
        adjustment: result.new_difficulty.index() - current.index(),
        reason: reason(status, current, &result),
        timestamp: Utc::now(),
    };

    tracing::debug!(
        status = %status,
        previous = %current,
        new = %report.new_difficulty,
        "Difficulty adjusted"
    );

    report
}

/// Starting tier for a learner with no difficulty history.
pub fn recommended_difficulty(status: StruggleStatus) -> DifficultyTier {
    match status {
        StruggleStatus::SuperStruggling | StruggleStatus::MediumStruggling => DifficultyTier::Easy,
        StruggleStatus::NotStruggling => DifficultyTier::Medium,
    }
}
