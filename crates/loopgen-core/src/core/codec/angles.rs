use super::CodecError;

/// Flat predictor output: `n` scaled planar angles, then `n` sines, then `n` cosines.
pub type RawOutputVector = Vec<f64>;

/// Per-residue angles in degrees.
///
/// `alpha` is the planar angle at the previously placed atom; `theta` is the dihedral about the
/// preceding bond, in `(-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnglePair {
    pub alpha: f64,
    pub theta: f64,
}

impl AnglePair {
    pub fn new(alpha: f64, theta: f64) -> Self {
        Self { alpha, theta }
    }
}

pub fn decode(raw: &[f64]) -> Result<Vec<AnglePair>, CodecError> {
    if raw.is_empty() {
        return Err(CodecError::Empty);
    }
    if raw.len() % 3 != 0 {
        return Err(CodecError::InvalidLength {
            len: raw.len(),
            expected: "3n",
        });
    }

    let n = raw.len() / 3;
    let (alphas, rest) = raw.split_at(n);
    let (sines, cosines) = rest.split_at(n);

    alphas
        .iter()
        .zip(sines)
        .zip(cosines)
        .enumerate()
        .map(|(index, ((&alpha, &sin), &cos))| {
            let magnitude = sin.hypot(cos);
            if !alpha.is_finite() || !magnitude.is_finite() || magnitude <= 0.0 {
                return Err(CodecError::DegenerateAngle { index });
            }
            let theta = (sin / magnitude).atan2(cos / magnitude).to_degrees();
            Ok(AnglePair::new(alpha * 180.0, theta))
        })
        .collect()
}

pub fn encode(angles: &[AnglePair]) -> RawOutputVector {
    let alphas = angles.iter().map(|a| a.alpha / 180.0);
    let sines = angles.iter().map(|a| a.theta.to_radians().sin());
    let cosines = angles.iter().map(|a| a.theta.to_radians().cos());
    alphas.chain(sines).chain(cosines).collect()
}
