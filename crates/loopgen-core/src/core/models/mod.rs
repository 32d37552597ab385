//! # Core Models Module
//!
//! Value types describing a protein Cα trace.
//!
//! - [`atom`] - A single Cα atom with its residue identity, chain, secondary-structure tag and position
//! - [`structure`] - An ordered, validated sequence of atoms with residue-id based queries
//!
//! Both types are immutable once built. Coordinate changes go through
//! [`atom::Atom::with_position`] and [`structure::Structure::with_segment`], which return new
//! values, so candidate structures can be shared freely across worker threads.

pub mod atom;
pub mod structure;
