use nalgebra::{Point3, Vector3};
use thiserror::Error;

/// Squared-length and length threshold below which a reference vector is treated as zero.
pub const DEGENERACY_EPSILON: f64 = 1e-8;

/// Failures of local-frame construction; the "degenerate geometry" family of errors.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("Cannot normalize a zero-length vector (duplicate consecutive coordinates)")]
    ZeroLength,
    #[error("Reference vectors are collinear, the local frame is undefined")]
    Collinear,
    #[error("Bond length must be a positive finite number (got {0})")]
    NonPositiveBondLength(f64),
    #[error("Placement angles must be finite (alpha {alpha}, theta {theta})")]
    NonFiniteAngle { alpha: f64, theta: f64 },
}

#[inline]
pub fn subtract(a: &Point3<f64>, b: &Point3<f64>) -> Vector3<f64> {
    a - b
}

#[inline]
pub fn cross(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.cross(b)
}

#[inline]
pub fn length(v: &Vector3<f64>) -> f64 {
    v.norm()
}

/// Returns the unit vector along `v`.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroLength`] when `v` is shorter than [`DEGENERACY_EPSILON`]
/// or is not finite. A zero vector is never returned silently.
pub fn normalize(v: &Vector3<f64>) -> Result<Vector3<f64>, GeometryError> {
    let norm = v.norm();
    if !norm.is_finite() || norm < DEGENERACY_EPSILON {
        return Err(GeometryError::ZeroLength);
    }
    Ok(v / norm)
}

/// Computes the minimum distance between the finite segments `p1-p2` and `p3-p4`.
///
/// Closest-point parameters are clamped to each segment; a segment whose endpoints coincide is
/// treated as a point. Intersecting segments yield `0.0`.
pub fn distance_between_segments(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
) -> f64 {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let r = p1 - p3;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    if a <= DEGENERACY_EPSILON && e <= DEGENERACY_EPSILON {
        return r.norm();
    }

    let (s, t) = if a <= DEGENERACY_EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= DEGENERACY_EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            // Parallel segments: any s works, start from p1 and let t clamp.
            let s = if denom > DEGENERACY_EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    let closest_1 = p1 + d1 * s;
    let closest_2 = p3 + d2 * t;
    (closest_1 - closest_2).norm()
}

/// Angle at `b` between `a` and `c`, in degrees, in `[0, 180]`.
pub fn planar_angle(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Result<f64, GeometryError> {
    let ba = normalize(&subtract(a, b))?;
    let bc = normalize(&subtract(c, b))?;
    Ok(ba.dot(&bc).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Dihedral of `d` about the `b-c` axis, in degrees, in `(-180, 180]`.
///
/// Measured in the same local frame that NeRF placement builds, so it is the exact inverse of
/// the `theta` argument of [`crate::core::backbone::nerf::place`]: 0° is cis to `a`, 180° trans.
pub fn dihedral_angle(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Result<f64, GeometryError> {
    let bc = normalize(&subtract(c, b))?;
    let k = normalize(&cross(&subtract(b, a), &bc)).map_err(|_| GeometryError::Collinear)?;
    let l = cross(&k, &bc);
    let v = subtract(d, c);
    Ok(v.dot(&k).atan2(v.dot(&l)).to_degrees())
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}
