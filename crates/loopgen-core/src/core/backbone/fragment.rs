use super::nerf::{CollinearPolicy, place_with};
use crate::core::codec::AnglePair;
use crate::core::utils::geometry::{GeometryError, dihedral_angle, planar_angle};
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum FragmentError {
    #[error("Failed to place fragment atom {position}: {source}")]
    Placement {
        position: usize,
        #[source]
        source: GeometryError,
    },
}

/// Builds `angles.len()` new atoms after the three `seed` atoms.
///
/// Each atom is placed from the previous three positions, so the seed is only read for the
/// first three placements. The seed itself is not part of the result. The first placement that
/// fails aborts the build; no partial fragment is returned.
pub fn build_fragment(
    seed: &[Point3<f64>; 3],
    angles: &[AnglePair],
    bond_length: f64,
) -> Result<Vec<Point3<f64>>, FragmentError> {
    build_fragment_with(seed, angles, bond_length, CollinearPolicy::Reject)
}

pub fn build_fragment_with(
    seed: &[Point3<f64>; 3],
    angles: &[AnglePair],
    bond_length: f64,
    policy: CollinearPolicy,
) -> Result<Vec<Point3<f64>>, FragmentError> {
    let mut window = *seed;
    let mut fragment = Vec::with_capacity(angles.len());

    for (position, angle) in angles.iter().enumerate() {
        let [c1, c2, c3] = window;
        let next = place_with(&c1, &c2, &c3, bond_length, angle.alpha, angle.theta, policy)
            .map_err(|source| FragmentError::Placement { position, source })?;
        fragment.push(next);
        window = [c2, c3, next];
    }

    Ok(fragment)
}

/// Measures the angles that rebuild `chain[3..]` from `chain[..3]`.
///
/// The inverse of [`build_fragment`]: the returned pairs have one entry per atom after the
/// first three.
pub fn measure_angles(chain: &[Point3<f64>]) -> Result<Vec<AnglePair>, GeometryError> {
    chain
        .windows(4)
        .map(|w| {
            Ok(AnglePair::new(
                planar_angle(&w[1], &w[2], &w[3])?,
                dihedral_angle(&w[0], &w[1], &w[2], &w[3])?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.8, 0.0, 0.0),
            Point3::new(3.8 + 3.8 * 89f64.to_radians().cos(), 3.8 * 89f64.to_radians().sin(), 0.0),
        ]
    }

    #[test]
    fn build_fragment_returns_one_atom_per_angle_at_bond_length() {
        let angles = vec![AnglePair::new(91.0, 50.0); 6];
        let fragment = build_fragment(&seed(), &angles, 3.8).unwrap();

        assert_eq!(fragment.len(), 6);
        assert!(((fragment[0] - seed()[2]).norm() - 3.8).abs() < 1e-9);
        for pair in fragment.windows(2) {
            assert!(((pair[1] - pair[0]).norm() - 3.8).abs() < 1e-9);
        }
    }

    #[test]
    fn build_fragment_with_no_angles_is_empty() {
        assert!(build_fragment(&seed(), &[], 3.8).unwrap().is_empty());
    }

    #[test]
    fn measured_angles_rebuild_the_same_chain() {
        let angles = vec![
            AnglePair::new(91.0, 50.0),
            AnglePair::new(118.0, -165.0),
            AnglePair::new(100.0, 75.0),
            AnglePair::new(125.0, -60.0),
        ];
        let fragment = build_fragment(&seed(), &angles, 3.8).unwrap();
        let chain: Vec<Point3<f64>> = seed().into_iter().chain(fragment.iter().copied()).collect();

        let measured = measure_angles(&chain).unwrap();
        assert_eq!(measured.len(), angles.len());
        for (expected, got) in angles.iter().zip(&measured) {
            assert!((expected.alpha - got.alpha).abs() < 1e-6);
            assert!((expected.theta - got.theta).abs() < 1e-6);
        }

        let rebuilt = build_fragment(&seed(), &measured, 3.8).unwrap();
        for (a, b) in fragment.iter().zip(&rebuilt) {
            assert!((a - b).norm() < 1e-6);
        }
    }

    #[test]
    fn measured_angles_rebuild_a_deposited_trace() {
        // First four Cα atoms of ubiquitin (PDB 1UBQ).
        let chain = [
            Point3::new(26.266, 25.413, 2.842),
            Point3::new(26.850, 29.021, 3.898),
            Point3::new(26.235, 30.058, 7.497),
            Point3::new(26.772, 33.436, 9.197),
        ];
        let bond_length: f64 = (chain[3] - chain[2]).norm();
        assert!((bond_length - 3.8).abs() > 1e-3);

        let measured = measure_angles(&chain).unwrap();
        assert_eq!(measured.len(), 1);

        let seed = [chain[0], chain[1], chain[2]];
        let rebuilt = build_fragment(&seed, &measured, bond_length).unwrap();
        assert_eq!(rebuilt.len(), 1);
        for axis in 0..3 {
            assert!((rebuilt[0][axis] - chain[3][axis]).abs() < 1e-6);
        }
    }

    #[test]
    fn non_finite_angle_aborts_with_its_position() {
        let angles = vec![AnglePair::new(91.0, 50.0), AnglePair::new(f64::NAN, 50.0)];
        assert!(matches!(
            build_fragment(&seed(), &angles, 3.8),
            Err(FragmentError::Placement {
                position: 1,
                source: GeometryError::NonFiniteAngle { .. }
            })
        ));
    }

    #[test]
    fn first_failing_placement_aborts_with_its_position() {
        // A straight angle makes the next frame collinear.
        let angles = vec![
            AnglePair::new(91.0, 50.0),
            AnglePair::new(180.0, 50.0),
            AnglePair::new(91.0, 50.0),
            AnglePair::new(91.0, 50.0),
        ];
        let result = build_fragment(&seed(), &angles, 3.8);
        assert_eq!(
            result,
            Err(FragmentError::Placement {
                position: 2,
                source: GeometryError::Collinear
            })
        );
    }
}
