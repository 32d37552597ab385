use crate::cli::InsertArgs;
use crate::config::PartialInsertConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use loopgen::{
    core::io::{
        pdb::{PdbFile, PdbMetadata},
        traits::StructureFile,
    },
    core::predictor::{Predictor, decoder::LatentDecoder},
    engine::{
        cancel::CancellationToken, error::EngineError, progress::ProgressReporter,
        state::RankedCandidate,
    },
    workflows,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const DECODER_FILE: &str = "decoder.toml";
const LATENT_FILE: &str = "latent.csv";

pub async fn run(args: InsertArgs, cancel: CancellationToken) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialInsertConfig::from_file(path)?,
        None => PartialInsertConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args)?;
    let config = &settings.core_config;

    info!("Loading input structure from {:?}", &args.input);
    let (structure, metadata) =
        PdbFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;

    info!("Loading decoder from {:?}", &settings.model_dir);
    let decoder = LatentDecoder::load(
        &settings.model_dir.join(DECODER_FILE),
        &settings.model_dir.join(LATENT_FILE),
    )?;
    let predictor: Arc<dyn Predictor> = Arc::new(decoder);

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Rebuilding residues {}-{} from {} draw(s)...",
        config.range.start, config.range.end, config.sampling.population
    );
    let result = tokio::task::block_in_place(|| {
        workflows::insert::run(&structure, config, predictor, &mut rng, &reporter, &cancel)
    })?;

    println!("Amino acids sequence   {}", result.label.sequence);
    println!("Secondary structure    {}", result.label.secondary_structure);
    if result.statistics.rejected() > 0 {
        println!(
            "Rejected {} of {} draw(s): {}",
            result.statistics.rejected(),
            result.statistics.population,
            result.statistics
        );
    }

    for ranked in &result.candidates {
        let output_path = generate_output_path(&args.output, ranked.rank);
        let closure_length = ranked
            .candidate
            .structure()
            .distance(config.range.end, config.range.downstream_anchor())
            .map_err(EngineError::from)?;
        let candidate_metadata = annotate(&metadata, ranked, closure_length);

        info!(
            "Writing candidate {} (closure error: {:.3}) to {:?}",
            ranked.rank,
            ranked.candidate.closure_error(),
            &output_path
        );
        PdbFile::write_to_path(ranked.candidate.structure(), &candidate_metadata, &output_path)
            .map_err(|e| CliError::FileParsing {
                path: output_path.clone(),
                source: e.into(),
            })?;

        println!(
            "{} Candidate {} (closure {:.3} Å, error {:.3} Å, RMSD {:.3} Å) written to: {}",
            if ranked.rank == 1 { "✓" } else { " " },
            ranked.rank,
            closure_length,
            ranked.candidate.closure_error(),
            ranked.rmsd,
            output_path.display()
        );
    }

    Ok(())
}

fn annotate(metadata: &PdbMetadata, ranked: &RankedCandidate, closure_length: f64) -> PdbMetadata {
    let mut annotated = metadata.clone();
    annotated
        .remarks
        .push(format!("CANDIDATE {}", ranked.rank));
    annotated
        .remarks
        .push(format!("CLOSURE BOND LENGTH {:.3}", closure_length));
    annotated
        .remarks
        .push(format!("CLOSURE ERROR {:.3}", ranked.candidate.closure_error()));
    annotated
        .remarks
        .push(format!("RMSD {:.3}", ranked.rmsd));
    annotated
}

/// `out.pdb` becomes `out_1.pdb`, `out_2.pdb`, ... by candidate rank.
fn generate_output_path(template: &Path, rank: usize) -> PathBuf {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let file_name = match template.extension() {
        Some(ext) => format!("{}_{}.{}", stem, rank, ext.to_string_lossy()),
        None => format!("{}_{}", stem, rank),
    };
    template.with_file_name(file_name)
}
