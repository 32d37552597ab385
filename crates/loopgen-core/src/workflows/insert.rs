use crate::core::codec::Label;
use crate::core::models::structure::Structure;
use crate::core::predictor::Predictor;
use crate::engine::cancel::CancellationToken;
use crate::engine::config::ReconstructionConfig;
use crate::engine::context::{SearchContext, SegmentLayout};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::selector;
use crate::engine::state::{RankedCandidate, SearchStatistics};
use crate::engine::tasks;
use crate::engine::utils::sampling::draw_seeds;
use rand::Rng;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct InsertionResult {
    /// Ranked candidates, best closure first.
    pub candidates: Vec<RankedCandidate>,
    pub statistics: SearchStatistics,
    /// Conditioning label every draw was made with.
    pub label: Label,
}

/// Rebuilds residues `config.range` of `reference` from predictor draws.
///
/// The segment is grown from the three residues before `start`, scored by how well its last
/// atom closes onto residue `end + 1`, and the best `repeats` non-crossing candidates are
/// returned. Draw seeds come from `rng`, so equal master seeds give equal results.
#[instrument(skip_all, name = "insertion_workflow", fields(start = config.range.start, end = config.range.end))]
pub fn run(
    reference: &Structure,
    config: &ReconstructionConfig,
    predictor: Arc<dyn Predictor>,
    rng: &mut impl Rng,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<InsertionResult, EngineError> {
    // === Phase 1: Locate anchors and build the label ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let layout = SegmentLayout::resolve(reference, &config.range)?;
    let label = build_label(reference, config)?;
    let encoded: Arc<[f64]> = Arc::from(config.encoding.encode_label(&label)?);
    info!(
        residues = layout.len,
        sequence = %label.sequence,
        secondary_structure = %label.secondary_structure,
        "Segment resolved."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Sample and score draws ===
    reporter.report(Progress::PhaseStart { name: "Sampling" });
    let seeds = draw_seeds(rng, config.sampling.population);
    let context = SearchContext::new(reference, config, &layout, reporter, cancel);
    let (candidates, statistics) =
        tasks::closure_sampling::run(&context, &predictor, &encoded, &seeds)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Rank ===
    reporter.report(Progress::PhaseStart { name: "Ranking" });
    let ranked = selector::select(reference, candidates, config.sampling.repeats, &statistics)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        "Workflow complete. Returning {} candidate(s) ({} rejected draw(s)).",
        ranked.len(),
        statistics.rejected()
    );
    Ok(InsertionResult {
        candidates: ranked,
        statistics,
        label,
    })
}

fn build_label(reference: &Structure, config: &ReconstructionConfig) -> Result<Label, EngineError> {
    let range = config.range;
    let sequence = match &config.label.sequence {
        Some(sequence) => sequence.clone(),
        None => reference.sequence(range.start, range.end)?,
    };
    let secondary_structure = match &config.label.secondary_structure {
        Some(ss) => ss.clone(),
        None => reference.secondary_structure(range.start, range.end)?,
    };
    let displacement = reference.displacement(range.start, range.end)?;
    Ok(Label::new(sequence, secondary_structure, displacement))
}
