use super::atom::Atom;
use crate::core::utils::geometry::calculate_rmsd;
use crate::core::utils::identifiers::one_letter_code;
use itertools::Either;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Residue {residue_id} not found in structure")]
    ResidueNotFound { residue_id: isize },
    #[error("Structures have different atom counts ({left} vs {right})")]
    ShapeMismatch { left: usize, right: usize },
    #[error("Duplicate residue {residue_id} in chain '{chain_id}'")]
    DuplicateResidue { chain_id: char, residue_id: isize },
    #[error("Residue {residue_id} in chain '{chain_id}' follows residue {previous}")]
    OutOfOrder {
        chain_id: char,
        previous: isize,
        residue_id: isize,
    },
    #[error(
        "Segment of {len} atoms starting at index {start} exceeds structure of {atoms} atoms"
    )]
    SegmentOutOfBounds {
        start: usize,
        len: usize,
        atoms: usize,
    },
}

/// An ordered Cα trace.
///
/// Within each chain residue ids strictly increase, which [`Structure::new`] enforces. All
/// residue-id queries resolve to the first atom carrying that id.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    atoms: Vec<Atom>,
}

impl Structure {
    pub fn new(atoms: Vec<Atom>) -> Result<Self, StructureError> {
        let mut last_in_chain: HashMap<char, isize> = HashMap::new();
        for atom in &atoms {
            if let Some(&previous) = last_in_chain.get(&atom.chain_id()) {
                if atom.residue_id() == previous {
                    return Err(StructureError::DuplicateResidue {
                        chain_id: atom.chain_id(),
                        residue_id: atom.residue_id(),
                    });
                }
                if atom.residue_id() < previous {
                    return Err(StructureError::OutOfOrder {
                        chain_id: atom.chain_id(),
                        previous,
                        residue_id: atom.residue_id(),
                    });
                }
            }
            last_in_chain.insert(atom.chain_id(), atom.residue_id());
        }
        Ok(Self { atoms })
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn coordinates(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| *a.position()).collect()
    }

    /// Index of the first atom with residue id `residue_id`.
    pub fn find_residue(&self, residue_id: isize) -> Result<usize, StructureError> {
        self.atoms
            .iter()
            .position(|a| a.residue_id() == residue_id)
            .ok_or(StructureError::ResidueNotFound { residue_id })
    }

    pub fn residue(&self, residue_id: isize) -> Result<&Atom, StructureError> {
        self.find_residue(residue_id).map(|index| &self.atoms[index])
    }

    /// One-letter codes of the atoms between residues `i` and `j`, both included.
    ///
    /// When `i` comes after `j` in the trace the codes are returned in reverse order.
    pub fn sequence(&self, i: isize, j: isize) -> Result<String, StructureError> {
        Ok(self
            .span(i, j)?
            .map(|atom| one_letter_code(atom.residue_name()))
            .collect())
    }

    pub fn secondary_structure(&self, i: isize, j: isize) -> Result<String, StructureError> {
        Ok(self
            .span(i, j)?
            .map(|atom| atom.secondary_structure().symbol())
            .collect())
    }

    /// Vector from residue `i` to residue `j`.
    pub fn displacement(&self, i: isize, j: isize) -> Result<Vector3<f64>, StructureError> {
        Ok(self.residue(j)?.position() - self.residue(i)?.position())
    }

    pub fn distance(&self, i: isize, j: isize) -> Result<f64, StructureError> {
        self.displacement(i, j).map(|v| v.norm())
    }

    /// Returns a copy with the atoms from `start_index` onwards moved to `positions`.
    ///
    /// Every other attribute of the replaced atoms is kept.
    pub fn with_segment(
        &self,
        start_index: usize,
        positions: &[Point3<f64>],
    ) -> Result<Self, StructureError> {
        let end = start_index
            .checked_add(positions.len())
            .filter(|&end| end <= self.atoms.len())
            .ok_or(StructureError::SegmentOutOfBounds {
                start: start_index,
                len: positions.len(),
                atoms: self.atoms.len(),
            })?;

        let mut atoms = self.atoms.clone();
        for (atom, position) in atoms[start_index..end].iter_mut().zip(positions) {
            *atom = atom.with_position(*position);
        }
        Ok(Self { atoms })
    }

    /// Root-mean-square deviation over index-aligned atoms.
    pub fn rmsd(&self, other: &Structure) -> Result<f64, StructureError> {
        if self.len() != other.len() {
            return Err(StructureError::ShapeMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(calculate_rmsd(&self.coordinates(), &other.coordinates()).unwrap_or(0.0))
    }

    fn span(&self, i: isize, j: isize) -> Result<impl Iterator<Item = &Atom>, StructureError> {
        let from = self.find_residue(i)?;
        let to = self.find_residue(j)?;
        if from <= to {
            Ok(Either::Left(self.atoms[from..=to].iter()))
        } else {
            Ok(Either::Right(self.atoms[to..=from].iter().rev()))
        }
    }
}
