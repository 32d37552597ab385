use crate::core::io::traits::StructureFile;
use crate::core::models::atom::{Atom, SecondaryStructure};
use crate::core::models::structure::{Structure, StructureError};
use itertools::Itertools;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::debug;

const ATOM_MIN_LEN: usize = 54;
const CA_ATOM_NAME: &str = "CA";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// Free-text `REMARK` lines, without the record name.
    pub remarks: Vec<String>,
}

/// How a residue covered by both a `HELIX` and a `SHEET` range is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecondaryStructurePolicy {
    /// Fail with [`PdbError::SecondaryStructureConflict`].
    #[default]
    Reject,
    /// Tag the residue as helix.
    PreferHelix,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed record on line {line}: {kind}")]
    MalformedRecord { line: usize, kind: PdbParseErrorKind },
    #[error("Residue {residue_id} lies in both a HELIX and a SHEET range")]
    SecondaryStructureConflict { residue_id: isize },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Value '{value}' does not fit the {field} field ({width} columns)")]
    FieldOverflow {
        field: &'static str,
        value: String,
        width: usize,
    },
    #[error("Invalid structure: {0}")]
    Structure(#[from] StructureError),
}

#[derive(Debug, Error, PartialEq)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Line is too short for an ATOM record (must be at least {required} chars)")]
    LineTooShort { required: usize },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_int<T: std::str::FromStr>(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
) -> Result<T, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::MalformedRecord {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::MalformedRecord {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_range(
    line: &str,
    line_num: usize,
    start: (usize, usize),
    end: (usize, usize),
) -> Result<RangeInclusive<isize>, PdbError> {
    let first = parse_int(line, line_num, start.0, start.1)?;
    let last = parse_int(line, line_num, end.0, end.1)?;
    Ok(first..=last)
}

/// Fixed-width PDB text, restricted to Cα traces.
pub struct PdbFile;

impl PdbFile {
    /// Reads a trace, resolving HELIX/SHEET overlaps with `policy`.
    ///
    /// Only `ATOM` records named `CA` with a blank or `A` alternate location contribute atoms.
    /// Reading stops at the first `ENDMDL` or `END` record, so only the first model of a
    /// multi-model file is loaded. Ranges from `HELIX` and `SHEET` records include both end
    /// residues and are matched by residue id regardless of chain.
    pub fn read_with_policy(
        reader: &mut impl BufRead,
        policy: SecondaryStructurePolicy,
    ) -> Result<(Structure, PdbMetadata), PdbError> {
        let mut metadata = PdbMetadata::default();
        let mut atoms = Vec::new();
        let mut helices = Vec::new();
        let mut strands = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "END" | "ENDMDL" => break,
                "REMARK" => metadata
                    .remarks
                    .push(line.get(7..).unwrap_or("").trim_end().to_string()),
                "HELIX" => helices.push(parse_range(&line, line_num, (21, 25), (33, 37))?),
                "SHEET" => strands.push(parse_range(&line, line_num, (22, 26), (33, 37))?),
                "ATOM" => {
                    if slice_and_trim(&line, 12, 16) != CA_ATOM_NAME {
                        continue;
                    }
                    if !matches!(line.get(16..17), None | Some(" ") | Some("A")) {
                        continue;
                    }
                    if line.len() < ATOM_MIN_LEN {
                        return Err(PdbError::MalformedRecord {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort {
                                required: ATOM_MIN_LEN,
                            },
                        });
                    }

                    let serial: usize = parse_int(&line, line_num, 6, 11)?;
                    let residue_name = slice_and_trim(&line, 17, 20);
                    let chain_id = line.get(21..22).and_then(|s| s.chars().next()).unwrap_or(' ');
                    let residue_id: isize = parse_int(&line, line_num, 22, 26)?;
                    let x = parse_float(&line, line_num, 30, 38)?;
                    let y = parse_float(&line, line_num, 38, 47)?;
                    let z = parse_float(&line, line_num, 47, 54)?;

                    atoms.push(Atom::new(
                        serial,
                        residue_name,
                        chain_id,
                        residue_id,
                        Point3::new(x, y, z),
                    ));
                }
                _ => {}
            }
        }

        if atoms.is_empty() {
            return Err(PdbError::MissingRecord("ATOM (CA)".to_string()));
        }

        let atoms = atoms
            .into_iter()
            .map(|atom| {
                let id = atom.residue_id();
                let in_helix = helices.iter().any(|r| r.contains(&id));
                let in_strand = strands.iter().any(|r| r.contains(&id));
                let ss = match (in_helix, in_strand, policy) {
                    (true, true, SecondaryStructurePolicy::Reject) => {
                        return Err(PdbError::SecondaryStructureConflict { residue_id: id });
                    }
                    (true, _, _) => SecondaryStructure::Helix,
                    (false, true, _) => SecondaryStructure::Strand,
                    (false, false, _) => SecondaryStructure::Coil,
                };
                Ok(atom.with_secondary_structure(ss))
            })
            .collect::<Result<Vec<_>, PdbError>>()?;

        debug!(
            atoms = atoms.len(),
            helices = helices.len(),
            strands = strands.len(),
            "Parsed PDB trace"
        );

        Ok((Structure::new(atoms)?, metadata))
    }
}

impl StructureFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        Self::read_with_policy(reader, SecondaryStructurePolicy::default())
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for remark in &metadata.remarks {
            writeln!(writer, "REMARK {}", remark)?;
        }
        write_secondary_structure(structure, writer)?;
        for atom in structure.atoms() {
            writeln!(writer, "{}", format_atom(atom)?)?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }

    fn write_structure_to(
        structure: &Structure,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_to(structure, &PdbMetadata::default(), writer)
    }
}

fn fit(field: &'static str, value: String, width: usize) -> Result<String, PdbError> {
    if value.len() > width {
        return Err(PdbError::FieldOverflow {
            field,
            value,
            width,
        });
    }
    Ok(format!("{:>width$}", value))
}

fn fit_coordinate(field: &'static str, value: f64, width: usize) -> Result<String, PdbError> {
    let formatted = format!("{:.3}", value);
    if !value.is_finite() {
        return Err(PdbError::FieldOverflow {
            field,
            value: formatted,
            width,
        });
    }
    fit(field, formatted, width)
}

fn format_atom(atom: &Atom) -> Result<String, PdbError> {
    let serial = fit("serial", atom.serial().to_string(), 5)?;
    let residue_name = fit("residue name", atom.residue_name().to_string(), 3)?;
    let residue_id = fit("residue sequence", atom.residue_id().to_string(), 4)?;
    let p = atom.position();
    let x = fit_coordinate("x", p.x, 8)?;
    let y = fit_coordinate("y", p.y, 9)?;
    let z = fit_coordinate("z", p.z, 7)?;

    Ok(format!(
        "ATOM {:>6} {:>3}  {:>3} {}{:>4}    {}{}{}{:>6.2}{:>6.2}          {:>2}",
        serial,
        CA_ATOM_NAME,
        residue_name,
        atom.chain_id(),
        residue_id,
        x,
        y,
        z,
        1.0,
        0.0,
        "C"
    ))
}

fn write_secondary_structure(structure: &Structure, writer: &mut impl Write) -> Result<(), PdbError> {
    let runs = structure
        .atoms()
        .iter()
        .chunk_by(|atom| (atom.chain_id(), atom.secondary_structure()));

    let mut helix_serial = 0usize;
    let mut strand_serial = 0usize;
    for ((chain_id, ss), run) in &runs {
        let run: Vec<&Atom> = run.collect();
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            continue;
        };
        let init_name = fit("residue name", first.residue_name().to_string(), 3)?;
        let init_id = fit("residue sequence", first.residue_id().to_string(), 4)?;
        let end_name = fit("residue name", last.residue_name().to_string(), 3)?;
        let end_id = fit("residue sequence", last.residue_id().to_string(), 4)?;

        match ss {
            SecondaryStructure::Helix => {
                helix_serial += 1;
                let serial = fit("helix serial", helix_serial.to_string(), 3)?;
                writeln!(
                    writer,
                    "HELIX  {:>3} {:>3} {:>3} {} {:>4}  {:>3} {} {:>4}",
                    serial, serial, init_name, chain_id, init_id, end_name, chain_id, end_id
                )?;
            }
            SecondaryStructure::Strand => {
                strand_serial += 1;
                let serial = fit("strand serial", strand_serial.to_string(), 3)?;
                writeln!(
                    writer,
                    "SHEET  {:>3} {:>3}{:>2} {:>3} {}{:>4}  {:>3} {}{:>4}",
                    serial, serial, 1, init_name, chain_id, init_id, end_name, chain_id, end_id
                )?;
            }
            SecondaryStructure::Coil => {}
        }
    }
    Ok(())
}
