mod defaults;

use crate::cli::InsertArgs;
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use loopgen::core::backbone::nerf::CollinearPolicy;
use loopgen::core::codec::Encoding;
use loopgen::engine::config as core_config;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
enum PartialCollinearPolicy {
    Reject,
    ReferenceAxis,
}

impl FromStr for PartialCollinearPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "reject" => Ok(Self::Reject),
            "reference-axis" => Ok(Self::ReferenceAxis),
            other => Err(format!(
                "unknown collinear policy '{}' (expected 'reject' or 'reference-axis')",
                other
            )),
        }
    }
}

impl From<PartialCollinearPolicy> for CollinearPolicy {
    fn from(p: PartialCollinearPolicy) -> Self {
        match p {
            PartialCollinearPolicy::Reject => CollinearPolicy::Reject,
            PartialCollinearPolicy::ReferenceAxis => CollinearPolicy::ReferenceAxis,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSegmentConfig {
    start: Option<isize>,
    end: Option<isize>,
    sequence: Option<String>,
    secondary_structure: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSamplingConfig {
    population: Option<usize>,
    repeats: Option<usize>,
    seed: Option<u64>,
    timeout_ms: Option<u64>,
    max_workers: Option<usize>,
    model_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialGeometryConfig {
    bond_length: Option<f64>,
    crossing_tolerance: Option<f64>,
    collinear_policy: Option<PartialCollinearPolicy>,
}

/// Contents of an `insert` configuration file. Every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialInsertConfig {
    segment: Option<PartialSegmentConfig>,
    sampling: Option<PartialSamplingConfig>,
    geometry: Option<PartialGeometryConfig>,
    encoding: Option<Encoding>,
}

/// Fully resolved settings of an `insert` run.
#[derive(Debug)]
pub struct InsertSettings {
    pub core_config: core_config::ReconstructionConfig,
    pub model_dir: PathBuf,
    pub seed: Option<u64>,
}

impl PartialInsertConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves every setting with precedence CLI argument > `--set` > file > default.
    pub fn merge_with_cli(mut self, args: &InsertArgs) -> Result<InsertSettings> {
        self.apply_set_values(&args.set_values)?;

        let defaults = DefaultsConfig::default();
        let segment = self.segment.take().unwrap_or_default();
        let sampling = self.sampling.take().unwrap_or_default();
        let geometry = self.geometry.take().unwrap_or_default();

        let start = args.start.or(segment.start).ok_or_else(|| {
            CliError::Config(
                "A start residue is required either in `segment.start` or via --start."
                    .to_string(),
            )
        })?;
        let end = args.end.or(segment.end).ok_or_else(|| {
            CliError::Config(
                "An end residue is required either in `segment.end` or via --end.".to_string(),
            )
        })?;

        let timeout = args
            .timeout_ms
            .or(sampling.timeout_ms)
            .map(Duration::from_millis);
        let collinear_policy = geometry
            .collinear_policy
            .map(CollinearPolicy::from)
            .unwrap_or_default();

        let core_config = core_config::ReconstructionConfigBuilder::new()
            .start(start)
            .end(end)
            .population(
                args.population
                    .or(sampling.population)
                    .unwrap_or(defaults.population),
            )
            .repeats(args.repeats.or(sampling.repeats).unwrap_or(defaults.repeats))
            .predictor_timeout(timeout)
            .max_workers(sampling.max_workers)
            .bond_length(geometry.bond_length.unwrap_or(defaults.bond_length))
            .crossing_tolerance(
                geometry
                    .crossing_tolerance
                    .unwrap_or(defaults.crossing_tolerance),
            )
            .collinear_policy(collinear_policy)
            .sequence(args.sequence.clone().or(segment.sequence))
            .secondary_structure(
                args.secondary_structure
                    .clone()
                    .or(segment.secondary_structure),
            )
            .encoding(self.encoding.unwrap_or_default())
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(InsertSettings {
            core_config,
            model_dir: args
                .model_dir
                .clone()
                .or(sampling.model_dir)
                .unwrap_or(defaults.model_dir),
            seed: args.seed.or(sampling.seed),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "segment.start" => {
                    self.segment.get_or_insert_with(Default::default).start = Some(parse_value(key, value)?)
                }
                "segment.end" => {
                    self.segment.get_or_insert_with(Default::default).end = Some(parse_value(key, value)?)
                }
                "segment.sequence" => {
                    self.segment.get_or_insert_with(Default::default).sequence = Some(value.to_string())
                }
                "segment.secondary-structure" => {
                    self.segment.get_or_insert_with(Default::default).secondary_structure =
                        Some(value.to_string())
                }
                "sampling.population" => {
                    self.sampling.get_or_insert_with(Default::default).population =
                        Some(parse_value(key, value)?)
                }
                "sampling.repeats" => {
                    self.sampling.get_or_insert_with(Default::default).repeats =
                        Some(parse_value(key, value)?)
                }
                "sampling.seed" => {
                    self.sampling.get_or_insert_with(Default::default).seed = Some(parse_value(key, value)?)
                }
                "sampling.timeout-ms" => {
                    self.sampling.get_or_insert_with(Default::default).timeout_ms =
                        Some(parse_value(key, value)?)
                }
                "sampling.max-workers" => {
                    self.sampling.get_or_insert_with(Default::default).max_workers =
                        Some(parse_value(key, value)?)
                }
                "sampling.model-dir" => {
                    self.sampling.get_or_insert_with(Default::default).model_dir =
                        Some(PathBuf::from(value))
                }
                "geometry.bond-length" => {
                    self.geometry.get_or_insert_with(Default::default).bond_length =
                        Some(parse_value(key, value)?)
                }
                "geometry.crossing-tolerance" => {
                    self.geometry.get_or_insert_with(Default::default).crossing_tolerance =
                        Some(parse_value(key, value)?)
                }
                "geometry.collinear-policy" => {
                    self.geometry.get_or_insert_with(Default::default).collinear_policy =
                        Some(value.parse().map_err(CliError::Config)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn write_config_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn insert_args(extra: &[&str]) -> InsertArgs {
        let mut argv = vec!["loopgen", "insert", "-i", "in.pdb", "-o", "out.pdb"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Insert(args) => args,
            _ => panic!("expected insert command"),
        }
    }

    #[test]
    fn file_values_fill_in_missing_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config_file(
            &dir,
            r#"
            encoding = "mlp"

            [segment]
            start = 10
            end = 14
            secondary-structure = "HHHCC"

            [sampling]
            population = 40
            repeats = 3
            seed = 9
            timeout-ms = 250
            model-dir = "models/mlp"

            [geometry]
            crossing-tolerance = 0.75
            collinear-policy = "reference-axis"
            "#,
        );

        let settings = PartialInsertConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&insert_args(&[]))
            .unwrap();
        let core = &settings.core_config;

        assert_eq!(core.range, core_config::ResidueRange::new(10, 14));
        assert_eq!(core.sampling.population, 40);
        assert_eq!(core.sampling.repeats, 3);
        assert_eq!(core.sampling.predictor_timeout, Some(Duration::from_millis(250)));
        assert_eq!(core.geometry.crossing_tolerance, 0.75);
        assert_eq!(core.geometry.bond_length, 3.8);
        assert_eq!(core.geometry.collinear_policy, CollinearPolicy::ReferenceAxis);
        assert_eq!(core.label.secondary_structure.as_deref(), Some("HHHCC"));
        assert_eq!(core.label.sequence, None);
        assert_eq!(settings.model_dir, PathBuf::from("models/mlp"));
        assert_eq!(settings.seed, Some(9));
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "[segment]\nstart = 10\nend = 14\n\n[sampling]\npopulation = 40\n",
        );
        let args = insert_args(&["-e", "12", "-p", "8", "--seed", "1", "-m", "other"]);

        let settings = PartialInsertConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(settings.core_config.range, core_config::ResidueRange::new(10, 12));
        assert_eq!(settings.core_config.sampling.population, 8);
        assert_eq!(settings.seed, Some(1));
        assert_eq!(settings.model_dir, PathBuf::from("other"));
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = PartialInsertConfig::default()
            .merge_with_cli(&insert_args(&["-s", "5", "-e", "6"]))
            .unwrap();

        assert_eq!(settings.core_config.sampling.population, 100);
        assert_eq!(settings.core_config.sampling.repeats, 1);
        assert_eq!(settings.core_config.sampling.predictor_timeout, None);
        assert_eq!(settings.model_dir, PathBuf::from("model"));
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn set_values_override_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config_file(&dir, "[sampling]\nrepeats = 2\n");
        let args = insert_args(&[
            "-s",
            "5",
            "-e",
            "6",
            "-S",
            "sampling.repeats=4",
            "geometry.collinear-policy=reference-axis",
        ]);

        let settings = PartialInsertConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();
        assert_eq!(settings.core_config.sampling.repeats, 4);
        assert_eq!(
            settings.core_config.geometry.collinear_policy,
            CollinearPolicy::ReferenceAxis
        );
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for set in ["sampling.repeats", "sampling.repeats=many", "nope.key=1"] {
            let args = insert_args(&["-s", "5", "-e", "6", "-S", set]);
            let result = PartialInsertConfig::default().merge_with_cli(&args);
            assert!(matches!(result, Err(CliError::Config(_))), "{set}");
        }
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config_file(&dir, "[sampling]\npopulaton = 40\n");
        assert!(matches!(
            PartialInsertConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_range_is_a_config_error() {
        let result = PartialInsertConfig::default().merge_with_cli(&insert_args(&["-s", "5"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("end")));
    }

    #[test]
    fn core_validation_errors_surface_as_config_errors() {
        let result = PartialInsertConfig::default()
            .merge_with_cli(&insert_args(&["-s", "5", "-e", "7", "--aa", "GG"]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
