use super::{Predictor, PredictorError};
use crate::core::codec::RawOutputVector;
use nalgebra::{DMatrix, DVector};
use rand::{Rng, RngCore};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Linear,
}

#[derive(Debug, Deserialize, Clone)]
struct LayerSpec {
    activation: Activation,
    /// One row per output unit.
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

#[derive(Debug, Deserialize, Clone)]
struct DecoderSpec {
    layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
    weights: DMatrix<f64>,
    biases: DVector<f64>,
    activation: Activation,
}

impl DenseLayer {
    pub fn new(
        weights: DMatrix<f64>,
        biases: DVector<f64>,
        activation: Activation,
    ) -> Result<Self, PredictorError> {
        if weights.nrows() != biases.len() {
            return Err(PredictorError::InvalidModel(format!(
                "layer has {} output rows but {} biases",
                weights.nrows(),
                biases.len()
            )));
        }
        Ok(Self {
            weights,
            biases,
            activation,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.weights.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.weights.nrows()
    }

    fn forward(&self, input: &DVector<f64>) -> DVector<f64> {
        let z = &self.weights * input + &self.biases;
        match self.activation {
            Activation::Relu => z.map(|v| v.max(0.0)),
            Activation::Linear => z,
        }
    }

    fn from_spec(index: usize, spec: LayerSpec) -> Result<Self, PredictorError> {
        let rows = spec.weights.len();
        let cols = spec.weights.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(PredictorError::InvalidModel(format!(
                "layer {index} has an empty weight matrix"
            )));
        }
        if let Some(row) = spec.weights.iter().position(|r| r.len() != cols) {
            return Err(PredictorError::InvalidModel(format!(
                "layer {index} row {row} has {} columns, expected {cols}",
                spec.weights[row].len()
            )));
        }
        let weights = DMatrix::from_row_iterator(rows, cols, spec.weights.into_iter().flatten());
        Self::new(weights, DVector::from_vec(spec.biases), spec.activation).map_err(|e| match e {
            PredictorError::InvalidModel(msg) => {
                PredictorError::InvalidModel(format!("layer {index}: {msg}"))
            }
            other => other,
        })
    }
}

/// A conditional decoder evaluated on latent vectors drawn from a stored pool.
///
/// Each prediction picks one latent row uniformly at random, appends the label and runs the
/// dense layers in order.
#[derive(Debug, Clone)]
pub struct LatentDecoder {
    layers: Vec<DenseLayer>,
    latent_pool: Vec<DVector<f64>>,
}

impl LatentDecoder {
    pub fn new(
        layers: Vec<DenseLayer>,
        latent_pool: Vec<DVector<f64>>,
    ) -> Result<Self, PredictorError> {
        let first = layers
            .first()
            .ok_or_else(|| PredictorError::InvalidModel("decoder has no layers".to_string()))?;
        let latent_dim = latent_pool
            .first()
            .map(DVector::len)
            .ok_or(PredictorError::EmptyLatentPool)?;

        if let Some(row) = latent_pool.iter().find(|z| z.len() != latent_dim) {
            return Err(PredictorError::DimensionMismatch {
                expected: latent_dim,
                found: row.len(),
            });
        }
        if first.input_dim() <= latent_dim {
            return Err(PredictorError::InvalidModel(format!(
                "first layer takes {} inputs, not enough for a {latent_dim}-dimensional latent vector and a label",
                first.input_dim()
            )));
        }
        for (index, pair) in layers.windows(2).enumerate() {
            if pair[0].output_dim() != pair[1].input_dim() {
                return Err(PredictorError::InvalidModel(format!(
                    "layer {} produces {} values but layer {} takes {}",
                    index,
                    pair[0].output_dim(),
                    index + 1,
                    pair[1].input_dim()
                )));
            }
        }

        Ok(Self {
            layers,
            latent_pool,
        })
    }

    /// Loads the network from a TOML file of `[[layers]]` tables and the latent pool from a
    /// header-less CSV file with one latent vector per row.
    pub fn load(decoder_path: &Path, latent_path: &Path) -> Result<Self, PredictorError> {
        let layers = Self::load_layers(decoder_path)?;
        let latent_pool = Self::load_latent_pool(latent_path)?;
        let decoder = Self::new(layers, latent_pool)?;
        debug!(
            layers = decoder.layers.len(),
            latent_dim = decoder.latent_dim(),
            pool = decoder.latent_pool.len(),
            "Loaded latent decoder"
        );
        Ok(decoder)
    }

    fn load_layers(path: &Path) -> Result<Vec<DenseLayer>, PredictorError> {
        let content = std::fs::read_to_string(path).map_err(|e| PredictorError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let spec: DecoderSpec = toml::from_str(&content).map_err(|e| PredictorError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        spec.layers
            .into_iter()
            .enumerate()
            .map(|(index, layer)| DenseLayer::from_spec(index, layer))
            .collect()
    }

    fn load_latent_pool(path: &Path) -> Result<Vec<DVector<f64>>, PredictorError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| PredictorError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        reader
            .deserialize::<Vec<f64>>()
            .map(|row| {
                row.map(DVector::from_vec).map_err(|e| PredictorError::Csv {
                    path: path.to_string_lossy().to_string(),
                    source: e,
                })
            })
            .collect()
    }

    pub fn latent_dim(&self) -> usize {
        self.latent_pool.first().map_or(0, DVector::len)
    }

    /// Number of label features the decoder expects.
    pub fn label_dim(&self) -> usize {
        self.layers
            .first()
            .map_or(0, |l| l.input_dim().saturating_sub(self.latent_dim()))
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_dim)
    }
}

impl Predictor for LatentDecoder {
    fn predict(
        &self,
        label: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<RawOutputVector, PredictorError> {
        if label.len() != self.label_dim() {
            return Err(PredictorError::DimensionMismatch {
                expected: self.label_dim(),
                found: label.len(),
            });
        }
        if self.latent_pool.is_empty() {
            return Err(PredictorError::EmptyLatentPool);
        }

        let z = &self.latent_pool[rng.gen_range(0..self.latent_pool.len())];
        let input = DVector::from_iterator(
            z.len() + label.len(),
            z.iter().copied().chain(label.iter().copied()),
        );
        let output = self
            .layers
            .iter()
            .fold(input, |activations, layer| layer.forward(&activations));
        Ok(output.iter().copied().collect())
    }
}
