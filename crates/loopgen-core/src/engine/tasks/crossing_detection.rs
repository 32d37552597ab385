use crate::core::models::structure::Structure;
use crate::core::utils::geometry::distance_between_segments;
use std::ops::RangeInclusive;

/// Two non-adjacent backbone segments closer than the tolerance.
///
/// Segment `i` joins atom `i` to atom `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub first: usize,
    pub second: usize,
    pub distance: f64,
}

/// Indices of the segments of `structure`; consecutive atoms on different chains are not joined.
pub fn segment_indices(structure: &Structure) -> Vec<usize> {
    structure
        .atoms()
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].chain_id() == pair[1].chain_id())
        .map(|(i, _)| i)
        .collect()
}

fn segment_distance(structure: &Structure, a: usize, b: usize) -> f64 {
    let atoms = structure.atoms();
    distance_between_segments(
        atoms[a].position(),
        atoms[a + 1].position(),
        atoms[b].position(),
        atoms[b + 1].position(),
    )
}

/// Returns the first crossing that involves a segment in `focus`.
///
/// Every segment whose index lies in `focus` is compared with every other segment it shares no
/// atom with. Segments are visited in index order, so the reported crossing is deterministic.
pub fn find_crossing(
    structure: &Structure,
    focus: RangeInclusive<usize>,
    tolerance: f64,
) -> Option<Crossing> {
    let segments = segment_indices(structure);
    segments
        .iter()
        .filter(|&&j| focus.contains(&j))
        .flat_map(|&j| {
            segments
                .iter()
                .filter(move |&&k| k.abs_diff(j) >= 2)
                .map(move |&k| (j.min(k), j.max(k)))
        })
        .find_map(|(first, second)| {
            let distance = segment_distance(structure, first, second);
            (distance < tolerance).then_some(Crossing {
                first,
                second,
                distance,
            })
        })
}
