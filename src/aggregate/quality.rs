// src/aggregate/quality.rs
//! Weighted composite quality score and its letter grade.

use crate::types::{Grade, ProjectMetrics, QualityScore};

const W_MAINTAINABILITY: f64 = 0.30;
const W_COMPLEXITY: f64 = 0.25;
const W_DOCUMENTATION: f64 = 0.20;
const W_TEST_COVERAGE: f64 = 0.15;
const W_DUPLICATION: f64 = 0.10;

/// Each point of average complexity costs this much of the complexity component.
const COMPLEXITY_PENALTY: f64 = 5.0;

/// The measurements the score is built from, each on a 0-100 scale except
/// `average_complexity`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualityInputs {
    pub maintainability: f64,
    pub average_complexity: f64,
    pub documentation: f64,
    pub test_coverage: f64,
    pub duplication: f64,
}

impl From<&ProjectMetrics> for QualityInputs {
    fn from(m: &ProjectMetrics) -> Self {
        Self {
            maintainability: m.maintainability_index,
            average_complexity: m.average_complexity,
            documentation: m.documentation_ratio,
            test_coverage: m.test_coverage,
            duplication: m.duplication_percentage,
        }
    }
}

/// Normalized complexity, `100 - avg * 5` clamped to 0..=100.
#[must_use]
pub fn complexity_score(average_complexity: f64) -> f64 {
    (100.0 - average_complexity * COMPLEXITY_PENALTY).clamp(0.0, 100.0)
}

#[must_use]
pub fn compute(inputs: QualityInputs) -> QualityScore {
    let score = inputs.maintainability * W_MAINTAINABILITY
        + (100.0 - complexity_score(inputs.average_complexity)) * W_COMPLEXITY
        + inputs.documentation * W_DOCUMENTATION
        + inputs.test_coverage * W_TEST_COVERAGE
        + (100.0 - inputs.duplication) * W_DUPLICATION;
    let score = score.clamp(0.0, 100.0);
    QualityScore {
        score,
        grade: grade_for(score),
    }
}

#[must_use]
pub fn grade_for(score: f64) -> Grade {
    match score {
        s if s >= 90.0 => Grade::A,
        s if s >= 80.0 => Grade::B,
        s if s >= 70.0 => Grade::C,
        s if s >= 60.0 => Grade::D,
        _ => Grade::F,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(grade_for(90.0), Grade::A);
        assert_eq!(grade_for(89.9), Grade::B);
        assert_eq!(grade_for(80.0), Grade::B);
        assert_eq!(grade_for(79.99), Grade::C);
        assert_eq!(grade_for(70.0), Grade::C);
        assert_eq!(grade_for(60.0), Grade::D);
        assert_eq!(grade_for(59.9), Grade::F);
        assert_eq!(grade_for(0.0), Grade::F);
    }

    #[test]
    fn test_complexity_term_uses_inverted_normalization() {
        let q = compute(QualityInputs {
            maintainability: 100.0,
            average_complexity: 1.0,
            documentation: 100.0,
            ..QualityInputs::default()
        });
        // 30 + (100 - 95) * 0.25 + 20 + 0 + 10
        assert!((q.score - 61.25).abs() < 1e-9);
        assert_eq!(q.grade, Grade::D);
    }

    #[test]
    fn test_all_inputs_at_best() {
        let q = compute(QualityInputs {
            maintainability: 100.0,
            average_complexity: 0.0,
            documentation: 100.0,
            test_coverage: 100.0,
            duplication: 0.0,
        });
        // The complexity term is 0 when the average is 0.
        assert!((q.score - 75.0).abs() < 1e-9);
        assert_eq!(q.grade, Grade::C);
    }

    #[test]
    fn test_high_average_fills_complexity_term() {
        let q = compute(QualityInputs {
            maintainability: 100.0,
            average_complexity: 20.0,
            documentation: 100.0,
            test_coverage: 100.0,
            duplication: 0.0,
        });
        assert!((q.score - 100.0).abs() < 1e-9);
        assert_eq!(q.grade, Grade::A);
    }

    #[test]
    fn test_complexity_score_clamps() {
        assert!((complexity_score(2.0) - 90.0).abs() < 1e-9);
        assert!(complexity_score(40.0).abs() < f64::EPSILON);
        assert!((complexity_score(0.0) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_metrics() {
        let metrics = ProjectMetrics {
            maintainability_index: 70.0,
            average_complexity: 4.0,
            documentation_ratio: 50.0,
            ..ProjectMetrics::default()
        };
        let q = compute(QualityInputs::from(&metrics));
        // 21 + (100 - 80) * 0.25 + 10 + 0 + 10
        assert!((q.score - 46.0).abs() < 1e-9);
        assert_eq!(q.grade, Grade::F);
    }
}
