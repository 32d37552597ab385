//! # Engine Module
//!
//! Closure search for a rebuilt backbone segment.
//!
//! A run resolves the anchors of the segment ([`context`]), draws a population of predictor
//! outputs and turns each into a scored candidate ([`tasks::closure_sampling`]), then ranks the
//! candidates that do not cross the rest of the chain ([`selector`]).
//!
//! - **Configuration** ([`config`]) - Residue range, sampling and geometry parameters
//! - **State** ([`state`]) - Candidates, rejection reasons and per-run statistics
//! - **Progress** ([`progress`]) - Optional event sink for phase and draw updates
//! - **Cancellation** ([`cancel`]) - Shared flag that stops further predictor calls
//! - **Errors** ([`error`]) - Fatal run failures

pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod selector;
pub mod state;
pub mod tasks;
pub(crate) mod utils;
