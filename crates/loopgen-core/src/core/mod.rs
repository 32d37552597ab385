//! # Core Module
//!
//! Stateless data models and pure algorithms used by the reconstruction engine.
//!
//! ## Architecture
//!
//! - **Trace Representation** ([`models`]) - Cα atoms and validated, immutable structures
//! - **File I/O** ([`io`]) - Fixed-width PDB reading and writing with secondary-structure records
//! - **Internal Coordinates** ([`backbone`]) - NeRF placement, fragment building and angle measurement
//! - **Feature Layouts** ([`codec`]) - Label encoding and raw angle-vector decoding
//! - **Predictor Boundary** ([`predictor`]) - The opaque predictor interface and a latent decoder
//! - **Utilities** ([`utils`]) - Vector math and residue code tables
//!
//! ## Conventions
//!
//! Angles are in degrees everywhere outside the trigonometric calls themselves. The planar
//! angle of an atom is measured at its predecessor; its dihedral is measured about the bond
//! before that predecessor, with 180° trans. [`backbone::fragment::measure_angles`] and
//! [`backbone::fragment::build_fragment`] are exact inverses under this convention.

pub mod backbone;
pub mod codec;
pub mod io;
pub mod models;
pub mod predictor;
pub mod utils;
