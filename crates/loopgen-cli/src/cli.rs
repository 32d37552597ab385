use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "loopgen - rebuild missing or variable protein backbone segments at Cα resolution from generative-model angle predictions.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild a residue range of a Cα trace and write the best-closing candidates.
    Insert(InsertArgs),
    /// Print the planar and dihedral angles of a residue range.
    Angles(AnglesArgs),
}

/// Arguments for the `insert` subcommand.
#[derive(Args, Debug)]
pub struct InsertArgs {
    // --- Core Arguments ---
    /// Path to the input PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path template for the output PDB files. Candidate N is written to `<stem>_N.<ext>`.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Segment Overrides ---
    /// First residue id of the rebuilt segment.
    #[arg(short, long, value_name = "INT", allow_negative_numbers = true)]
    pub start: Option<isize>,

    /// Last residue id of the rebuilt segment.
    #[arg(short, long, value_name = "INT", allow_negative_numbers = true)]
    pub end: Option<isize>,

    /// One-letter amino-acid sequence used instead of the input residues.
    #[arg(long = "aa", value_name = "SEQ")]
    pub sequence: Option<String>,

    /// H/E/C secondary structure used instead of the input annotation.
    #[arg(long = "ss", value_name = "SS")]
    pub secondary_structure: Option<String>,

    // --- Sampling Overrides ---
    /// Number of predictor draws.
    #[arg(short, long, value_name = "INT")]
    pub population: Option<usize>,

    /// Maximum number of candidates written.
    #[arg(short, long, value_name = "INT")]
    pub repeats: Option<usize>,

    /// Directory holding `decoder.toml` and `latent.csv`.
    #[arg(short, long = "model", value_name = "DIR")]
    pub model_dir: Option<PathBuf>,

    /// Seed of the master random number generator. Drawn from entropy when omitted.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Abandon predictor calls that take longer than this many milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S geometry.crossing-tolerance=0.8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `angles` subcommand.
#[derive(Args, Debug)]
pub struct AnglesArgs {
    /// Path to the input PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// First residue id of the measured range.
    #[arg(short, long, required = true, value_name = "INT", allow_negative_numbers = true)]
    pub start: isize,

    /// Last residue id of the measured range.
    #[arg(short, long, required = true, value_name = "INT", allow_negative_numbers = true)]
    pub end: isize,

    /// Also print the encoded raw angle vector.
    #[arg(long)]
    pub raw: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_arguments_parse() {
        let cli = Cli::try_parse_from([
            "loopgen", "-vv", "insert", "-i", "in.pdb", "-o", "out.pdb", "-s", "10", "-e", "14",
            "--aa", "GSGSG", "-p", "50", "-S", "sampling.repeats=3",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Insert(args) = cli.command else {
            panic!("expected insert command");
        };
        assert_eq!(args.start, Some(10));
        assert_eq!(args.end, Some(14));
        assert_eq!(args.sequence.as_deref(), Some("GSGSG"));
        assert_eq!(args.population, Some(50));
        assert_eq!(args.set_values, vec!["sampling.repeats=3"]);
        assert!(args.config.is_none());
    }

    #[test]
    fn angles_requires_a_range() {
        assert!(Cli::try_parse_from(["loopgen", "angles", "-i", "in.pdb", "-s", "3"]).is_err());
        let cli = Cli::try_parse_from([
            "loopgen", "angles", "-i", "in.pdb", "-s", "3", "-e", "6", "--raw",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Angles(AnglesArgs { raw: true, .. })));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(
            Cli::try_parse_from(["loopgen", "-q", "-v", "angles", "-i", "a", "-s", "1", "-e", "2"])
                .is_err()
        );
    }
}
