//! Cartesian reconstruction of Cα chains from internal coordinates.
//!
//! [`nerf`] places a single atom from three predecessors, a bond length, a planar angle and a
//! dihedral. [`fragment`] chains those placements into a segment and measures the inverse.

pub mod fragment;
pub mod nerf;
