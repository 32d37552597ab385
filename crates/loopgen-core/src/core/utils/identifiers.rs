use phf::{Map, phf_map};

/// Symbol used for residues without a standard one-letter code.
pub const UNKNOWN_RESIDUE: char = 'X';

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
    // Common protonation and modification variants.
    "HSD" => 'H', "HSE" => 'H', "HSP" => 'H', "HID" => 'H', "HIE" => 'H', "HIP" => 'H',
    "CYX" => 'C', "ASH" => 'D', "GLH" => 'E', "LYN" => 'K', "MSE" => 'M',
};

/// Maps a three-letter residue code to its one-letter symbol, `'X'` when unknown.
pub fn one_letter_code(residue_name: &str) -> char {
    let name = residue_name.trim().to_ascii_uppercase();
    THREE_TO_ONE
        .get(name.as_str())
        .copied()
        .unwrap_or(UNKNOWN_RESIDUE)
}
