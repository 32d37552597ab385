use crate::core::utils::geometry::{GeometryError, cross, normalize, subtract};
use nalgebra::{Point3, Vector3};

/// Behaviour when the three reference atoms are collinear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollinearPolicy {
    /// Fail with [`GeometryError::Collinear`].
    #[default]
    Reject,
    /// Replace `c2 - c1` by the lab axis least aligned with `c3 - c2`, which fixes an arbitrary
    /// but deterministic frame orientation.
    ReferenceAxis,
}

/// Places the atom following `c3` by Natural Extension Reference Frame.
///
/// `alpha` is the planar angle at `c3` between `c2` and the new atom; `theta` is the dihedral
/// about the `c2-c3` bond, 180° being trans. Both are in degrees. The new atom is exactly
/// `bond_length` away from `c3`.
///
/// # Errors
///
/// - [`GeometryError::ZeroLength`] when `c2` and `c3` coincide.
/// - [`GeometryError::Collinear`] when `c1`, `c2` and `c3` are collinear.
/// - [`GeometryError::NonPositiveBondLength`] for a zero, negative or non-finite bond length.
/// - [`GeometryError::NonFiniteAngle`] when `alpha` or `theta` is NaN or infinite.
pub fn place(
    c1: &Point3<f64>,
    c2: &Point3<f64>,
    c3: &Point3<f64>,
    bond_length: f64,
    alpha: f64,
    theta: f64,
) -> Result<Point3<f64>, GeometryError> {
    place_with(c1, c2, c3, bond_length, alpha, theta, CollinearPolicy::Reject)
}

/// [`place`] with an explicit [`CollinearPolicy`].
pub fn place_with(
    c1: &Point3<f64>,
    c2: &Point3<f64>,
    c3: &Point3<f64>,
    bond_length: f64,
    alpha: f64,
    theta: f64,
    policy: CollinearPolicy,
) -> Result<Point3<f64>, GeometryError> {
    if !bond_length.is_finite() || bond_length <= 0.0 {
        return Err(GeometryError::NonPositiveBondLength(bond_length));
    }
    if !alpha.is_finite() || !theta.is_finite() {
        return Err(GeometryError::NonFiniteAngle { alpha, theta });
    }

    let bc = normalize(&subtract(c3, c2))?;
    let k = match normalize(&cross(&subtract(c2, c1), &bc)) {
        Ok(k) => k,
        Err(_) => match policy {
            CollinearPolicy::Reject => return Err(GeometryError::Collinear),
            CollinearPolicy::ReferenceAxis => {
                let axis = if bc.x.abs() < 0.9 {
                    Vector3::x()
                } else {
                    Vector3::y()
                };
                normalize(&cross(&axis, &bc)).map_err(|_| GeometryError::Collinear)?
            }
        },
    };
    let l = cross(&k, &bc);

    let (alpha, theta) = (alpha.to_radians(), theta.to_radians());
    let x = bond_length * alpha.cos();
    let y = bond_length * alpha.sin() * theta.cos();
    let z = bond_length * alpha.sin() * theta.sin();

    Ok(c3 - bc * x + l * y + k * z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::geometry::{dihedral_angle, planar_angle};

    #[test]
    fn collinear_seeds_are_rejected_by_default() {
        let result = place(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
            3.8,
            109.5,
            180.0,
        );
        assert_eq!(result, Err(GeometryError::Collinear));
    }

    #[test]
    fn collinear_seeds_with_reference_axis_give_deterministic_atom() {
        let (c1, c2, c3) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        let first =
            place_with(&c1, &c2, &c3, 3.8, 109.5, 180.0, CollinearPolicy::ReferenceAxis).unwrap();
        let second =
            place_with(&c1, &c2, &c3, 3.8, 109.5, 180.0, CollinearPolicy::ReferenceAxis).unwrap();

        assert_eq!(first, second);
        assert!(((first - c3).norm() - 3.8).abs() < 1e-6);
        assert!((first.x - 3.268466).abs() < 1e-4);
        assert!((first.y - 3.582037).abs() < 1e-4);
        assert!(first.z.abs() < 1e-9);
    }

    #[test]
    fn placed_atom_reproduces_requested_angles() {
        let c1 = Point3::new(0.3, -1.2, 0.7);
        let c2 = Point3::new(2.1, 0.4, -0.5);
        let c3 = Point3::new(3.0, 3.3, 1.1);

        for &(alpha, theta) in &[(91.0, 50.0), (120.0, -170.0), (60.0, 0.0), (150.0, 180.0)] {
            let d = place(&c1, &c2, &c3, 3.8, alpha, theta).unwrap();
            assert!(((d - c3).norm() - 3.8).abs() < 1e-6);
            assert!((planar_angle(&c2, &c3, &d).unwrap() - alpha).abs() < 1e-6);

            let measured = dihedral_angle(&c1, &c2, &c3, &d).unwrap();
            let diff = (measured - theta).rem_euclid(360.0);
            assert!(diff < 1e-6 || (360.0 - diff) < 1e-6, "theta {theta} vs {measured}");
        }
    }

    #[test]
    fn duplicate_coordinates_are_zero_length() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let result = place(&Point3::origin(), &p, &p, 3.8, 100.0, 60.0);
        assert_eq!(result, Err(GeometryError::ZeroLength));
    }

    #[test]
    fn non_positive_bond_length_is_rejected() {
        let (c1, c2, c3) = (
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        );
        assert_eq!(
            place(&c1, &c2, &c3, 0.0, 100.0, 60.0),
            Err(GeometryError::NonPositiveBondLength(0.0))
        );
        assert!(matches!(
            place(&c1, &c2, &c3, f64::NAN, 100.0, 60.0),
            Err(GeometryError::NonPositiveBondLength(_))
        ));
    }

    #[test]
    fn non_finite_angles_are_rejected() {
        let (c1, c2, c3) = (
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        );
        assert!(matches!(
            place(&c1, &c2, &c3, 3.8, f64::NAN, 60.0),
            Err(GeometryError::NonFiniteAngle { .. })
        ));
        assert!(matches!(
            place(&c1, &c2, &c3, 3.8, 100.0, f64::INFINITY),
            Err(GeometryError::NonFiniteAngle { .. })
        ));
    }
}
