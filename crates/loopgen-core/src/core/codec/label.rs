use super::CodecError;
use nalgebra::Vector3;

/// Residue alphabet of the one-hot sequence block, in encoding order.
pub const AMINO_ACID_ALPHABET: &str = "ARNDCQEGHILKMFPSTWYV";
/// Secondary-structure alphabet of the one-hot block, in encoding order.
pub const SECONDARY_STRUCTURE_ALPHABET: &str = "HEC";

const DISPLACEMENT_LEN: usize = 3;
const AA_LEN: usize = AMINO_ACID_ALPHABET.len();
const SS_LEN: usize = SECONDARY_STRUCTURE_ALPHABET.len();

/// Conditioning input for one predictor call.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// One-letter residue codes of the segment.
    pub sequence: String,
    /// One `H`/`E`/`C` symbol per residue.
    pub secondary_structure: String,
    /// Vector from the first to the last residue of the segment.
    pub displacement: Vector3<f64>,
}

impl Label {
    pub fn new(
        sequence: impl Into<String>,
        secondary_structure: impl Into<String>,
        displacement: Vector3<f64>,
    ) -> Self {
        Self {
            sequence: sequence.into(),
            secondary_structure: secondary_structure.into(),
            displacement,
        }
    }

    pub fn residue_count(&self) -> usize {
        self.sequence.chars().count()
    }
}

pub fn label_len(residues: usize) -> usize {
    DISPLACEMENT_LEN + residues * (AA_LEN + SS_LEN)
}

pub fn encode_label(label: &Label) -> Result<Vec<f64>, CodecError> {
    let sequence_len = label.sequence.chars().count();
    let ss_len = label.secondary_structure.chars().count();
    if sequence_len != ss_len {
        return Err(CodecError::LengthMismatch {
            sequence: sequence_len,
            secondary_structure: ss_len,
        });
    }
    if sequence_len == 0 {
        return Err(CodecError::Empty);
    }

    let mut vector = Vec::with_capacity(label_len(sequence_len));
    vector.extend_from_slice(label.displacement.as_slice());
    one_hot_into(&mut vector, &label.sequence, AMINO_ACID_ALPHABET)?;
    one_hot_into(&mut vector, &label.secondary_structure, SECONDARY_STRUCTURE_ALPHABET)?;
    Ok(vector)
}

pub fn decode_label(vector: &[f64]) -> Result<Label, CodecError> {
    if vector.is_empty() {
        return Err(CodecError::Empty);
    }
    let body = vector.len().saturating_sub(DISPLACEMENT_LEN);
    if vector.len() <= DISPLACEMENT_LEN || body % (AA_LEN + SS_LEN) != 0 {
        return Err(CodecError::InvalidLength {
            len: vector.len(),
            expected: "23n + 3",
        });
    }
    let n = body / (AA_LEN + SS_LEN);

    let (displacement, rest) = vector.split_at(DISPLACEMENT_LEN);
    let (aa_block, ss_block) = rest.split_at(n * AA_LEN);

    Ok(Label {
        sequence: from_one_hot(aa_block, AMINO_ACID_ALPHABET)?,
        secondary_structure: from_one_hot(ss_block, SECONDARY_STRUCTURE_ALPHABET)?,
        displacement: Vector3::new(displacement[0], displacement[1], displacement[2]),
    })
}

fn one_hot_into(out: &mut Vec<f64>, symbols: &str, alphabet: &str) -> Result<(), CodecError> {
    let width = alphabet.len();
    for (position, symbol) in symbols.chars().enumerate() {
        let index = alphabet
            .find(symbol.to_ascii_uppercase())
            .ok_or(CodecError::UnknownSymbol { symbol, position })?;
        out.extend((0..width).map(|i| if i == index { 1.0 } else { 0.0 }));
    }
    Ok(())
}

fn from_one_hot(block: &[f64], alphabet: &str) -> Result<String, CodecError> {
    let symbols: Vec<char> = alphabet.chars().collect();
    block
        .chunks_exact(symbols.len())
        .enumerate()
        .map(|(position, chunk)| {
            let mut set = chunk
                .iter()
                .enumerate()
                .filter(|&(_, &value)| value != 0.0);
            match (set.next(), set.next()) {
                (Some((index, &value)), None) if value == 1.0 => Ok(symbols[index]),
                _ => Err(CodecError::InvalidOneHot { position }),
            }
        })
        .collect()
}
