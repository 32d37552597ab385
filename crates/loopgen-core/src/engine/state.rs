use crate::core::backbone::fragment::FragmentError;
use crate::core::codec::CodecError;
use crate::core::models::structure::{Structure, StructureError};
use std::fmt;
use thiserror::Error;

/// A scored predictor draw.
#[derive(Debug, Clone)]
pub struct Candidate {
    draw: usize,
    structure: Structure,
    closure_error: f64,
    valid: bool,
}

impl Candidate {
    pub fn new(draw: usize, structure: Structure, closure_error: f64, valid: bool) -> Self {
        Self {
            draw,
            structure,
            closure_error,
            valid,
        }
    }

    /// Position of the draw in the sampling order.
    pub fn draw(&self) -> usize {
        self.draw
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// `|target bond length - distance(last rebuilt atom, downstream anchor)|`.
    pub fn closure_error(&self) -> f64 {
        self.closure_error
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// A selected candidate with its deviation from the reference.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub rank: usize,
    pub candidate: Candidate,
    pub rmsd: f64,
}

/// Why a single draw was excluded from the candidate pool.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RejectionReason {
    #[error("predictor failed: {0}")]
    PredictorFailed(String),
    #[error("predictor call timed out")]
    TimedOut,
    #[error("run cancelled before the draw was dispatched")]
    Cancelled,
    #[error("raw vector could not be decoded: {0}")]
    Decode(#[from] CodecError),
    #[error("fragment could not be built: {0}")]
    Placement(#[from] FragmentError),
    #[error("fragment could not be spliced: {0}")]
    Splice(#[from] StructureError),
    #[error("closure error is not a finite number ({0})")]
    NonFiniteClosure(f64),
    #[error("segments {first} and {second} cross ({distance:.3} Å apart)")]
    SelfCrossing {
        first: usize,
        second: usize,
        distance: f64,
    },
}

/// Per-run tally of draw outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStatistics {
    pub population: usize,
    pub accepted: usize,
    pub predictor_failures: usize,
    pub timeouts: usize,
    pub cancelled: usize,
    pub decode_failures: usize,
    pub placement_failures: usize,
    pub splice_failures: usize,
    pub crossings: usize,
}

impl SearchStatistics {
    pub fn new(population: usize) -> Self {
        Self {
            population,
            ..Self::default()
        }
    }

    pub fn record(&mut self, reason: &RejectionReason) {
        let counter = match reason {
            RejectionReason::PredictorFailed(_) => &mut self.predictor_failures,
            RejectionReason::TimedOut => &mut self.timeouts,
            RejectionReason::Cancelled => &mut self.cancelled,
            RejectionReason::Decode(_) => &mut self.decode_failures,
            RejectionReason::Placement(_) | RejectionReason::NonFiniteClosure(_) => {
                &mut self.placement_failures
            }
            RejectionReason::Splice(_) => &mut self.splice_failures,
            RejectionReason::SelfCrossing { .. } => &mut self.crossings,
        };
        *counter += 1;
    }

    pub fn record_accepted(&mut self) {
        self.accepted += 1;
    }

    pub fn rejected(&self) -> usize {
        self.predictor_failures
            + self.timeouts
            + self.cancelled
            + self.decode_failures
            + self.placement_failures
            + self.splice_failures
            + self.crossings
    }
}

impl fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            ("predictor failures", self.predictor_failures),
            ("timeouts", self.timeouts),
            ("cancelled", self.cancelled),
            ("decode failures", self.decode_failures),
            ("placement failures", self.placement_failures),
            ("splice failures", self.splice_failures),
            ("self-crossing", self.crossings),
        ];
        let mut written = false;
        for (label, count) in parts.into_iter().filter(|&(_, count)| count > 0) {
            if written {
                write!(f, ", ")?;
            }
            write!(f, "{count} {label}")?;
            written = true;
        }
        if !written {
            write!(f, "none")?;
        }
        Ok(())
    }
}
