// src/score/mod.rs
// =============================================================================
// Turning measurements into judgments.
//
// Submodules:
// - category: which bucket each resource falls into, and the bucket totals
// - grade: sub-scores, total score and the A-G sobriety grade
// =============================================================================

mod category;
mod grade;

pub use category::{aggregate, classify, CategoryTotals, ResourceCategory};
pub use grade::{
    dom_score, grade, request_score, score, weight_score, Grade, Score, MAX_DOM_ELEMENTS,
    MAX_REQUESTS, MAX_WEIGHT_MB, SUB_SCORE_MAX,
};
