use crate::cli::AnglesArgs;
use crate::error::{CliError, Result};
use loopgen::{
    core::backbone::fragment::measure_angles,
    core::codec::{AnglePair, Encoding},
    core::io::{pdb::PdbFile, traits::StructureFile},
    core::models::{atom::Atom, structure::Structure},
    engine::context::contiguous_span,
};
use tracing::info;

pub async fn run(args: AnglesArgs) -> Result<()> {
    info!("Loading input structure from {:?}", &args.input);
    let (structure, _) =
        PdbFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;

    let rows = measure_range(&structure, args.start, args.end)?;

    println!("{:>6} {:>4} {:>2} {:>9} {:>9}", "RES", "NAME", "SS", "ALPHA", "THETA");
    for (atom, angles) in &rows {
        println!(
            "{:>6} {:>4} {:>2} {:>9.3} {:>9.3}",
            atom.residue_id(),
            atom.residue_name(),
            atom.secondary_structure().symbol(),
            angles.alpha,
            angles.theta
        );
    }

    if args.raw {
        let angles: Vec<AnglePair> = rows.iter().map(|(_, a)| *a).collect();
        let raw = Encoding::default().encode_angles(&angles);
        let line = raw
            .iter()
            .map(|v| format!("{:.6}", v))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", line);
    }
    Ok(())
}

/// Angles of residues `start..=end`, each measured from the three residues before it.
fn measure_range(
    structure: &Structure,
    start: isize,
    end: isize,
) -> Result<Vec<(&Atom, AnglePair)>> {
    if end < start {
        return Err(CliError::Argument(format!(
            "end residue {} precedes start residue {}",
            end, start
        )));
    }

    let span = contiguous_span(structure, start - 3, end)?;
    let (first, last) = (*span.start(), *span.end());
    let atoms = structure.atoms();
    let positions: Vec<_> = atoms[first..=last].iter().map(|a| *a.position()).collect();
    let angles = measure_angles(&positions).map_err(|e| {
        CliError::Argument(format!(
            "cannot measure angles for residues {}-{}: {}",
            start, end, e
        ))
    })?;

    Ok(atoms[first + 3..=last].iter().zip(angles).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopgen::core::backbone::fragment::build_fragment;
    use loopgen::engine::error::EngineError;
    use nalgebra::Point3;

    fn helix(chains: &[char; 8]) -> Structure {
        let bend = 89.0_f64.to_radians();
        let seed = [
            Point3::origin(),
            Point3::new(3.8, 0.0, 0.0),
            Point3::new(3.8 + 3.8 * bend.cos(), 3.8 * bend.sin(), 0.0),
        ];
        let rest = build_fragment(&seed, &[AnglePair::new(91.0, 50.0); 5], 3.8).unwrap();
        let atoms = seed
            .iter()
            .chain(&rest)
            .zip(chains)
            .enumerate()
            .map(|(i, (&p, &chain))| Atom::new(i + 1, "ALA", chain, i as isize + 1, p))
            .collect();
        Structure::new(atoms).unwrap()
    }

    #[test]
    fn measures_each_residue_of_the_range() {
        let structure = helix(&['A'; 8]);
        let rows = measure_range(&structure, 5, 7).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].0.residue_id(), 5);
        for (_, angles) in rows {
            assert!((angles.alpha - 91.0).abs() < 1e-6);
            assert!((angles.theta - 50.0).abs() < 1e-6);
        }
    }

    #[test]
    fn range_needs_three_preceding_residues() {
        let structure = helix(&['A'; 8]);
        assert!(matches!(
            measure_range(&structure, 3, 5),
            Err(CliError::LoopgenCore(EngineError::Structure { .. }))
        ));
        assert!(matches!(
            measure_range(&structure, 6, 5),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn chain_changes_are_chain_breaks() {
        let structure = helix(&['A', 'A', 'A', 'A', 'B', 'B', 'B', 'B']);
        assert!(matches!(
            measure_range(&structure, 5, 7),
            Err(CliError::LoopgenCore(EngineError::ChainBreak { .. }))
        ));
    }
}
