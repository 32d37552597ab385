//! # Workflows Module
//!
//! Top-level entry points that run a complete reconstruction from a loaded structure.
//!
//! - **Insertion Workflow** ([`insert`]) - Rebuilds a residue range from predictor draws and
//!   returns the ranked, non-crossing candidates.

pub mod insert;
