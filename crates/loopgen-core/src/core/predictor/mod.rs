//! The boundary between the reconstruction engine and an angle predictor.
//!
//! The engine only sees [`Predictor`]: a label vector goes in, a raw output vector comes out.
//! Any stochasticity must be drawn from the supplied RNG so that a seeded run is reproducible.
//! [`decoder::LatentDecoder`] is the bundled implementation: a dense decoder network evaluated
//! on a latent vector drawn from a stored pool.

pub mod decoder;

use crate::core::codec::RawOutputVector;
use rand::RngCore;
use thiserror::Error;

pub use decoder::LatentDecoder;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Latent pool is empty")]
    EmptyLatentPool,
    #[error("Prediction failed: {0}")]
    Failed(String),
}

/// Produces one raw angle vector per call for the given encoded label.
pub trait Predictor: Send + Sync {
    fn predict(
        &self,
        label: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<RawOutputVector, PredictorError>;
}

impl<F> Predictor for F
where
    F: Fn(&[f64], &mut dyn RngCore) -> Result<RawOutputVector, PredictorError> + Send + Sync,
{
    fn predict(
        &self,
        label: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<RawOutputVector, PredictorError> {
        self(label, rng)
    }
}
