use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

/// Secondary-structure class of a residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecondaryStructure {
    /// Residue covered by a `HELIX` record.
    Helix,
    /// Residue covered by a `SHEET` record.
    Strand,
    /// Any residue not covered by a helix or strand.
    #[default]
    Coil,
}

impl SecondaryStructure {
    pub fn symbol(self) -> char {
        match self {
            SecondaryStructure::Helix => 'H',
            SecondaryStructure::Strand => 'E',
            SecondaryStructure::Coil => 'C',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'H' => Some(SecondaryStructure::Helix),
            'E' => Some(SecondaryStructure::Strand),
            'C' => Some(SecondaryStructure::Coil),
            _ => None,
        }
    }
}

impl fmt::Display for SecondaryStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSecondaryStructureError(pub String);

impl fmt::Display for ParseSecondaryStructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid secondary-structure symbol: '{}'", self.0)
    }
}

impl std::error::Error for ParseSecondaryStructureError {}

impl FromStr for SecondaryStructure {
    type Err = ParseSecondaryStructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                Self::from_symbol(c).ok_or_else(|| ParseSecondaryStructureError(s.to_string()))
            }
            _ => Err(ParseSecondaryStructureError(s.to_string())),
        }
    }
}

/// One Cα atom of a backbone trace.
///
/// Atoms are values: changing a coordinate produces a new atom through
/// [`Atom::with_position`], the original is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    serial: usize,
    residue_name: String,
    chain_id: char,
    residue_id: isize,
    secondary_structure: SecondaryStructure,
    position: Point3<f64>,
}

impl Atom {
    pub fn new(
        serial: usize,
        residue_name: &str,
        chain_id: char,
        residue_id: isize,
        position: Point3<f64>,
    ) -> Self {
        Self {
            serial,
            residue_name: residue_name.to_string(),
            chain_id,
            residue_id,
            secondary_structure: SecondaryStructure::default(),
            position,
        }
    }

    pub fn with_secondary_structure(mut self, secondary_structure: SecondaryStructure) -> Self {
        self.secondary_structure = secondary_structure;
        self
    }

    pub fn with_position(&self, position: Point3<f64>) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    pub fn serial(&self) -> usize {
        self.serial
    }

    pub fn residue_name(&self) -> &str {
        &self.residue_name
    }

    pub fn chain_id(&self) -> char {
        self.chain_id
    }

    pub fn residue_id(&self) -> isize {
        self.residue_id
    }

    pub fn secondary_structure(&self) -> SecondaryStructure {
        self.secondary_structure
    }

    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }
}
