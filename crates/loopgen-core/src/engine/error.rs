use thiserror::Error;

use super::config::ConfigError;
use super::state::SearchStatistics;
use crate::core::codec::CodecError;
use crate::core::models::structure::StructureError;
use crate::core::predictor::PredictorError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Structure query failed: {source}")]
    Structure {
        #[from]
        source: StructureError,
    },

    #[error("Label encoding failed: {source}")]
    Label {
        #[from]
        source: CodecError,
    },

    #[error("Predictor unavailable: {source}")]
    Predictor {
        #[from]
        source: PredictorError,
    },

    #[error("Residue {residue_id} does not continue the chain that starts at residue {reference_id}")]
    ChainBreak {
        residue_id: isize,
        reference_id: isize,
    },

    #[error(
        "No valid candidate among {population} draws ({} rejected: {statistics})",
        statistics.rejected()
    )]
    ClosureSearchExhausted {
        population: usize,
        statistics: SearchStatistics,
    },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}
