//! Computational units of a reconstruction run.
//!
//! - [`closure_sampling`] evaluates seeded predictor draws into scored candidates.
//! - [`crossing_detection`] finds non-adjacent backbone segments that pass too close to each other.

pub mod closure_sampling;
pub mod crossing_detection;
