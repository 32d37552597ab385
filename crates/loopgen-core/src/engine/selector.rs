use super::error::EngineError;
use super::state::{Candidate, RankedCandidate, SearchStatistics};
use crate::core::models::structure::Structure;
use tracing::{info, instrument, warn};

/// Ranks the valid candidates by closure error and keeps at most `repeats` of them.
///
/// Ties keep draw order. Fewer than `repeats` valid candidates is not an error; none at all is.
#[instrument(skip_all, name = "candidate_selection", fields(pool = candidates.len(), repeats))]
pub fn select(
    reference: &Structure,
    candidates: Vec<Candidate>,
    repeats: usize,
    statistics: &SearchStatistics,
) -> Result<Vec<RankedCandidate>, EngineError> {
    let mut valid: Vec<Candidate> = candidates.into_iter().filter(|c| c.is_valid()).collect();
    if valid.is_empty() {
        return Err(EngineError::ClosureSearchExhausted {
            population: statistics.population,
            statistics: statistics.clone(),
        });
    }

    valid.sort_by(|a, b| a.closure_error().total_cmp(&b.closure_error()));
    if valid.len() < repeats {
        warn!(
            requested = repeats,
            available = valid.len(),
            "Fewer valid candidates than requested."
        );
    }
    valid.truncate(repeats);

    let ranked = valid
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| {
            let rmsd = candidate.structure().rmsd(reference)?;
            Ok(RankedCandidate {
                rank: i + 1,
                candidate,
                rmsd,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    info!(
        selected = ranked.len(),
        best_closure_error = ranked.first().map(|r| r.candidate.closure_error()),
        "Candidates ranked."
    );
    Ok(ranked)
}
