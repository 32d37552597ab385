use loopgen::engine::config::{DEFAULT_BOND_LENGTH, DEFAULT_CROSSING_TOLERANCE};
use std::path::PathBuf;

pub struct DefaultsConfig {
    pub population: usize,
    pub repeats: usize,
    pub model_dir: PathBuf,
    pub bond_length: f64,
    pub crossing_tolerance: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            population: 100,
            repeats: 1,
            model_dir: PathBuf::from("model"),
            bond_length: DEFAULT_BOND_LENGTH,
            crossing_tolerance: DEFAULT_CROSSING_TOLERANCE,
        }
    }
}
