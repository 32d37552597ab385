use super::cancel::CancellationToken;
use super::config::{ReconstructionConfig, ResidueRange};
use super::error::EngineError;
use super::progress::ProgressReporter;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::ops::RangeInclusive;

/// Where the rebuilt segment sits in the reference trace.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentLayout {
    /// Positions of residues `start - 3`, `start - 2` and `start - 1`.
    pub seed: [Point3<f64>; 3],
    /// Position of residue `end + 1`.
    pub downstream_anchor: Point3<f64>,
    /// Atom index of residue `start`.
    pub start_index: usize,
    /// Number of rebuilt residues.
    pub len: usize,
}

impl SegmentLayout {
    /// Locates the anchors and the segment of `range` in `reference`.
    ///
    /// All residue ids from `start - 3` to `end + 1` must be present, on one chain, at
    /// consecutive atom indices.
    pub fn resolve(reference: &Structure, range: &ResidueRange) -> Result<Self, EngineError> {
        let [first_id, _, _] = range.upstream_anchors();
        let span = contiguous_span(reference, first_id, range.downstream_anchor())?;
        let first_index = *span.start();

        let position = |index: usize| *reference.atoms()[index].position();
        Ok(Self {
            seed: [
                position(first_index),
                position(first_index + 1),
                position(first_index + 2),
            ],
            downstream_anchor: position(first_index + 3 + range.len()),
            start_index: first_index + 3,
            len: range.len(),
        })
    }

    /// Segment indices touching the rebuilt atoms, from the last upstream anchor to the
    /// downstream anchor.
    pub fn crossing_focus(&self) -> RangeInclusive<usize> {
        (self.start_index - 1)..=(self.start_index + self.len - 1)
    }
}

/// Atom indices of residues `first_id..=last_id`.
///
/// Every id in the range must be present, on the chain of `first_id`, at consecutive atom
/// indices. `last_id` must not precede `first_id`.
pub fn contiguous_span(
    reference: &Structure,
    first_id: isize,
    last_id: isize,
) -> Result<RangeInclusive<usize>, EngineError> {
    let first_index = reference.find_residue(first_id)?;
    let chain_id = reference.atoms()[first_index].chain_id();

    for (offset, residue_id) in (first_id..=last_id).enumerate() {
        let index = reference.find_residue(residue_id)?;
        if index != first_index + offset || reference.atoms()[index].chain_id() != chain_id {
            return Err(EngineError::ChainBreak {
                residue_id,
                reference_id: first_id,
            });
        }
    }
    Ok(first_index..=first_index + (last_id - first_id).max(0) as usize)
}

#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    pub reference: &'a Structure,
    pub config: &'a ReconstructionConfig,
    pub layout: &'a SegmentLayout,
    pub reporter: &'a ProgressReporter<'a>,
    pub cancel: &'a CancellationToken,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        reference: &'a Structure,
        config: &'a ReconstructionConfig,
        layout: &'a SegmentLayout,
        reporter: &'a ProgressReporter<'a>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            reference,
            config,
            layout,
            reporter,
            cancel,
        }
    }
}
