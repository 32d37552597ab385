//! # loopgen Core Library
//!
//! Reconstruction of missing or variable protein backbone segments at Cα resolution, driven by
//! angle predictions from an external generative model.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Atom`), pure geometry
//!   (NeRF placement, segment distances), feature codecs, PDB I/O and the predictor boundary.
//!
//! - **[`engine`]: The Logic Core.** Configuration, error types, progress reporting,
//!   cancellation, seeded parallel sampling of predictor draws, self-crossing detection and the
//!   closure-error ranking of candidates.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into the complete
//!   segment insertion procedure.

pub mod core;
pub mod engine;
pub mod workflows;
