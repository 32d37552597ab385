use crate::core::backbone::nerf::CollinearPolicy;
use crate::core::codec::Encoding;
use std::time::Duration;
use thiserror::Error;

/// Physical Cα–Cα pseudo-bond length in Ångström.
pub const DEFAULT_BOND_LENGTH: f64 = 3.8;
/// Minimum allowed distance between non-adjacent backbone segments in Ångström.
pub const DEFAULT_CROSSING_TOLERANCE: f64 = 1.0;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Inclusive range of residue ids to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResidueRange {
    pub start: isize,
    pub end: isize,
}

impl ResidueRange {
    pub fn new(start: isize, end: isize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        (self.end - self.start + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Residue ids of the three fixed atoms preceding the range.
    pub fn upstream_anchors(&self) -> [isize; 3] {
        [self.start - 3, self.start - 2, self.start - 1]
    }

    /// Residue id of the fixed atom following the range.
    pub fn downstream_anchor(&self) -> isize {
        self.end + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Number of independent predictor draws.
    pub population: usize,
    /// Maximum number of ranked candidates returned.
    pub repeats: usize,
    pub predictor_timeout: Option<Duration>,
    /// Size of a dedicated worker pool; the global rayon pool is used when `None`.
    pub max_workers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryConfig {
    pub bond_length: f64,
    pub crossing_tolerance: f64,
    pub collinear_policy: CollinearPolicy,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            bond_length: DEFAULT_BOND_LENGTH,
            crossing_tolerance: DEFAULT_CROSSING_TOLERANCE,
            collinear_policy: CollinearPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelOverrides {
    /// One-letter sequence used instead of the reference residues.
    pub sequence: Option<String>,
    /// `H`/`E`/`C` string used instead of the reference annotation.
    pub secondary_structure: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionConfig {
    pub range: ResidueRange,
    pub sampling: SamplingConfig,
    pub geometry: GeometryConfig,
    pub label: LabelOverrides,
    pub encoding: Encoding,
}

#[derive(Default)]
pub struct ReconstructionConfigBuilder {
    start: Option<isize>,
    end: Option<isize>,
    population: Option<usize>,
    repeats: Option<usize>,
    predictor_timeout: Option<Duration>,
    max_workers: Option<usize>,
    bond_length: Option<f64>,
    crossing_tolerance: Option<f64>,
    collinear_policy: Option<CollinearPolicy>,
    sequence: Option<String>,
    secondary_structure: Option<String>,
    encoding: Option<Encoding>,
}

impl ReconstructionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, residue_id: isize) -> Self {
        self.start = Some(residue_id);
        self
    }
    pub fn end(mut self, residue_id: isize) -> Self {
        self.end = Some(residue_id);
        self
    }
    pub fn population(mut self, n: usize) -> Self {
        self.population = Some(n);
        self
    }
    pub fn repeats(mut self, n: usize) -> Self {
        self.repeats = Some(n);
        self
    }
    pub fn predictor_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.predictor_timeout = timeout;
        self
    }
    pub fn max_workers(mut self, workers: Option<usize>) -> Self {
        self.max_workers = workers;
        self
    }
    pub fn bond_length(mut self, length: f64) -> Self {
        self.bond_length = Some(length);
        self
    }
    pub fn crossing_tolerance(mut self, tolerance: f64) -> Self {
        self.crossing_tolerance = Some(tolerance);
        self
    }
    pub fn collinear_policy(mut self, policy: CollinearPolicy) -> Self {
        self.collinear_policy = Some(policy);
        self
    }
    pub fn sequence(mut self, sequence: Option<String>) -> Self {
        self.sequence = sequence;
        self
    }
    pub fn secondary_structure(mut self, secondary_structure: Option<String>) -> Self {
        self.secondary_structure = secondary_structure;
        self
    }
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn build(self) -> Result<ReconstructionConfig, ConfigError> {
        let range = ResidueRange::new(
            self.start.ok_or(ConfigError::MissingParameter("start"))?,
            self.end.ok_or(ConfigError::MissingParameter("end"))?,
        );
        if range.is_empty() {
            return Err(invalid(
                "end",
                format!("end residue {} precedes start residue {}", range.end, range.start),
            ));
        }

        let sampling = SamplingConfig {
            population: self
                .population
                .ok_or(ConfigError::MissingParameter("population"))?,
            repeats: self
                .repeats
                .ok_or(ConfigError::MissingParameter("repeats"))?,
            predictor_timeout: self.predictor_timeout,
            max_workers: self.max_workers,
        };
        if sampling.population == 0 {
            return Err(invalid("population", "must be at least 1".to_string()));
        }
        if sampling.repeats == 0 {
            return Err(invalid("repeats", "must be at least 1".to_string()));
        }
        if sampling.max_workers == Some(0) {
            return Err(invalid("max_workers", "must be at least 1".to_string()));
        }
        if sampling.predictor_timeout == Some(Duration::ZERO) {
            return Err(invalid("predictor_timeout", "must be positive".to_string()));
        }

        let defaults = GeometryConfig::default();
        let geometry = GeometryConfig {
            bond_length: self.bond_length.unwrap_or(defaults.bond_length),
            crossing_tolerance: self.crossing_tolerance.unwrap_or(defaults.crossing_tolerance),
            collinear_policy: self.collinear_policy.unwrap_or(defaults.collinear_policy),
        };
        if !geometry.bond_length.is_finite() || geometry.bond_length <= 0.0 {
            return Err(invalid(
                "bond_length",
                format!("must be a positive number (got {})", geometry.bond_length),
            ));
        }
        if !geometry.crossing_tolerance.is_finite() || geometry.crossing_tolerance < 0.0 {
            return Err(invalid(
                "crossing_tolerance",
                format!("must be non-negative (got {})", geometry.crossing_tolerance),
            ));
        }

        let label = LabelOverrides {
            sequence: self.sequence,
            secondary_structure: self.secondary_structure,
        };
        for (name, value) in [
            ("sequence", &label.sequence),
            ("secondary_structure", &label.secondary_structure),
        ] {
            if let Some(value) = value {
                let found = value.chars().count();
                if found != range.len() {
                    return Err(invalid(
                        name,
                        format!("has {found} symbols for {} residues", range.len()),
                    ));
                }
            }
        }

        Ok(ReconstructionConfig {
            range,
            sampling,
            geometry,
            label,
            encoding: self.encoding.unwrap_or_default(),
        })
    }
}

fn invalid(name: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidParameter { name, reason }
}
