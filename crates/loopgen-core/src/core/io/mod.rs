//! Reading and writing Cα traces.
//!
//! [`traits::StructureFile`] is the format-independent interface; [`pdb::PdbFile`] implements it
//! for the fixed-width PDB text format, restricted to `ATOM` Cα records and the `HELIX`/`SHEET`
//! secondary-structure annotations.

pub mod pdb;
pub mod traits;
