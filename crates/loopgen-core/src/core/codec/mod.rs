//! Conversions between structural quantities and the flat vectors exchanged with a predictor.
//!
//! Two vector kinds cross the predictor boundary:
//!
//! - **Labels** ([`label`]) describe the segment to rebuild: the anchor displacement, the
//!   residue sequence and the secondary-structure string.
//! - **Raw output vectors** ([`angles`]) carry one planar angle and one dihedral (as a sine and
//!   cosine pair) per residue.
//!
//! [`Encoding`] selects the layout used for both directions so callers never hard-code a
//! particular network's feature arrangement.

pub mod angles;
pub mod label;

use serde::Deserialize;
use thiserror::Error;

pub use angles::{AnglePair, RawOutputVector};
pub use label::Label;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("Cannot decode an empty vector")]
    Empty,
    #[error("Vector of length {len} does not match the expected layout ({expected})")]
    InvalidLength { len: usize, expected: &'static str },
    #[error("Degenerate angle at index {index}: planar angle is non-finite or sine and cosine are both zero or non-finite")]
    DegenerateAngle { index: usize },
    #[error("Unknown symbol '{symbol}' at position {position}")]
    UnknownSymbol { symbol: char, position: usize },
    #[error(
        "Sequence has {sequence} residues but the secondary-structure string has {secondary_structure}"
    )]
    LengthMismatch {
        sequence: usize,
        secondary_structure: usize,
    },
    #[error("One-hot block at position {position} does not contain exactly one set entry")]
    InvalidOneHot { position: usize },
}

/// Feature layout shared by label encoding and angle decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    /// Displacement, one-hot sequence and one-hot secondary structure for labels;
    /// `n` scaled planar angles, then `n` sines, then `n` cosines for raw output vectors.
    #[default]
    Mlp,
}

impl Encoding {
    pub fn encode_label(&self, label: &Label) -> Result<Vec<f64>, CodecError> {
        match self {
            Encoding::Mlp => label::encode_label(label),
        }
    }

    pub fn decode_label(&self, vector: &[f64]) -> Result<Label, CodecError> {
        match self {
            Encoding::Mlp => label::decode_label(vector),
        }
    }

    pub fn encode_angles(&self, angles: &[AnglePair]) -> RawOutputVector {
        match self {
            Encoding::Mlp => angles::encode(angles),
        }
    }

    pub fn decode_angles(&self, raw: &[f64]) -> Result<Vec<AnglePair>, CodecError> {
        match self {
            Encoding::Mlp => angles::decode(raw),
        }
    }

    /// Length of the label vector for a segment of `residues` residues.
    pub fn label_len(&self, residues: usize) -> usize {
        match self {
            Encoding::Mlp => label::label_len(residues),
        }
    }
}
