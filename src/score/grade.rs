// src/score/grade.rs
// =============================================================================
// Sobriety scoring: three linear sub-scores and a letter grade.
//
// Each sub-score is worth 33.33 points at a value of 0 and falls linearly to
// 0 at its ceiling. The total therefore tops out at 99.99, never 100.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Points available per sub-score
pub const SUB_SCORE_MAX: f64 = 33.33;
/// DOM element count at which the DOM sub-score reaches 0
pub const MAX_DOM_ELEMENTS: f64 = 1500.0;
/// Page weight in MB at which the weight sub-score reaches 0
pub const MAX_WEIGHT_MB: f64 = 10.0;
/// Request count at which the request sub-score reaches 0
pub const MAX_REQUESTS: f64 = 200.0;

/// Letter grade, A (best) to G
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

/// Sub-scores and their sum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub dom: f64,
    pub weight: f64,
    pub requests: f64,
    pub total: f64,
}

impl Grade {
    /// Maps a total score to a grade; lower bounds are inclusive
    pub fn from_score(total: f64) -> Self {
        if total >= 90.0 {
            Grade::A
        } else if total >= 80.0 {
            Grade::B
        } else if total >= 70.0 {
            Grade::C
        } else if total >= 60.0 {
            Grade::D
        } else if total >= 50.0 {
            Grade::E
        } else if total >= 40.0 {
            Grade::F
        } else {
            Grade::G
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
            Grade::G => "G",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn linear(value: f64, ceiling: f64) -> f64 {
    SUB_SCORE_MAX * (1.0 - value.max(0.0).min(ceiling) / ceiling)
}

pub fn dom_score(dom_elements: usize) -> f64 {
    linear(dom_elements as f64, MAX_DOM_ELEMENTS)
}

pub fn weight_score(total_weight_mb: f64) -> f64 {
    linear(total_weight_mb, MAX_WEIGHT_MB)
}

pub fn request_score(total_requests: usize) -> f64 {
    linear(total_requests as f64, MAX_REQUESTS)
}

/// Computes all three sub-scores and their total
pub fn score(dom_elements: usize, total_weight_mb: f64, total_requests: usize) -> Score {
    let dom = dom_score(dom_elements);
    let weight = weight_score(total_weight_mb);
    let requests = request_score(total_requests);

    Score {
        dom,
        weight,
        requests,
        total: dom + weight + requests,
    }
}

/// Grade for the given page metrics
pub fn grade(dom_elements: usize, total_weight_mb: f64, total_requests: usize) -> Grade {
    Grade::from_score(score(dom_elements, total_weight_mb, total_requests).total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_page_is_a() {
        let s = score(0, 0.0, 0);
        assert!((s.total - 99.99).abs() < 1e-9);
        assert!(s.total < 100.0);
        assert_eq!(grade(0, 0.0, 0), Grade::A);
    }

    #[test]
    fn test_at_ceilings_is_g() {
        let s = score(1500, 10.0, 200);
        assert_eq!(s.total, 0.0);
        assert_eq!(grade(1500, 10.0, 200), Grade::G);
        // Beyond the ceilings nothing goes negative
        assert_eq!(score(90_000, 500.0, 4_000).total, 0.0);
    }

    #[test]
    fn test_half_way() {
        // 16.665 * 3 = 49.995, just under the E boundary
        assert_eq!(grade(750, 5.0, 100), Grade::F);
    }

    #[test]
    fn test_thresholds_inclusive() {
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.999), Grade::B);
        assert_eq!(Grade::from_score(80.0), Grade::B);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(50.0), Grade::E);
        assert_eq!(Grade::from_score(40.0), Grade::F);
        assert_eq!(Grade::from_score(39.99), Grade::G);
    }

    #[test]
    fn test_monotonic() {
        let mut previous = f64::INFINITY;
        for step in 0..=40 {
            let total = score(step * 50, 0.0, 0).total;
            assert!(total <= previous);
            previous = total;
        }

        let mut previous = f64::INFINITY;
        for step in 0..=30 {
            let total = score(100, step as f64 * 0.5, 20).total;
            assert!(total <= previous);
            previous = total;
        }

        let mut previous = f64::INFINITY;
        for step in 0..=30 {
            let total = score(100, 1.0, step * 10).total;
            assert!(total <= previous);
            previous = total;
        }
    }
}
