//! Transformation of shell basis functions under point group operations.

use nalgebra::{DMatrix, Matrix3};

use crate::cartesian::{component_norms, ncartesian, CartesianIter, RedundantCartesianIter};
use crate::error::IntegralError;
use crate::factory::IntegralFactory;

/// A point group operation as its 3x3 orthogonal matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct SymmetryOperation {
    matrix: Matrix3<f64>,
}

impl SymmetryOperation {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn inversion() -> Self {
        Self {
            matrix: -Matrix3::identity(),
        }
    }

    /// Proper rotation about z by `2 pi / order`.
    pub fn proper_rotation_z(order: usize) -> Self {
        let angle = std::f64::consts::TAU / order as f64;
        let (sin, cos) = angle.sin_cos();
        Self {
            matrix: Matrix3::new(cos, -sin, 0.0, sin, cos, 0.0, 0.0, 0.0, 1.0),
        }
    }

    /// Reflection through the xy plane.
    pub fn reflection_xy() -> Self {
        Self {
            matrix: Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0),
        }
    }

    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    /// Matrix element `(row, column)`, axes numbered x = 0, y = 1, z = 2.
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.matrix[(row, column)]
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }
}

/// The matrix a symmetry operation induces on one shell's basis
/// functions, Cartesian or pure.
#[derive(Clone, Debug)]
pub struct ShellRotation {
    l: usize,
    pure: bool,
    matrix: DMatrix<f64>,
}

impl ShellRotation {
    /// Builds the representation matrix for angular momentum `am` under
    /// `operation`. Pure shells conjugate the Cartesian representation
    /// with the factory's transform tables, so `am` has to be within the
    /// factory's provisioned bound.
    pub fn new(
        am: usize,
        operation: &SymmetryOperation,
        factory: &IntegralFactory,
        pure: bool,
    ) -> Result<Self, IntegralError> {
        let ncart = ncartesian(am);
        let mut rotation = DMatrix::zeros(ncart, ncart);

        // Each monomial component transforms through every ordering of
        // its axes; the representative ordering of the column fans out
        // over all 3^l images.
        for column in CartesianIter::new(am) {
            let axes = column.axes();
            for ordering in RedundantCartesianIter::new(am) {
                let mut product = 1.0;
                for (k, &axis) in axes.iter().enumerate() {
                    product *= operation.get(ordering.axis(k), axis as usize);
                }
                rotation[(ordering.bfn(), column.index)] += product;
            }
        }

        // Move from the monomial basis to normalized components.
        let norms = component_norms(am);
        for row in 0..ncart {
            for col in 0..ncart {
                rotation[(row, col)] *= norms[col] / norms[row];
            }
        }

        let matrix = if pure {
            // The pure functions' coefficient vectors are the rows of the
            // forward table T, and the pure subspace is invariant, so the
            // induced matrix is the unique solution of T^T X = R T^T.
            let forward = factory.spherical_transform(am)?.matrix();
            let inverse = factory.inverse_spherical_transform(am)?.matrix();
            inverse.transpose() * rotation * forward.transpose()
        } else {
            rotation
        };

        Ok(Self { l: am, pure, matrix })
    }

    pub fn am(&self) -> usize {
        self.l
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }

    pub fn nfunction(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Character of the operation in this representation.
    pub fn trace(&self) -> f64 {
        self.matrix.trace()
    }

    /// Transforms a square integral block over this shell's functions:
    /// `R B R^T`.
    pub fn transform(&self, block: &DMatrix<f64>) -> DMatrix<f64> {
        &self.matrix * block * self.matrix.transpose()
    }

    /// Composes two rotations: the result applies `self` first, then
    /// `other`.
    pub fn operate(&self, other: &ShellRotation) -> ShellRotation {
        ShellRotation {
            l: self.l,
            pure: self.pure,
            matrix: &other.matrix * &self.matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use crate::basis::{BasisSet, Gaussian, Shell};

    use super::*;

    fn factory(max_l: usize) -> IntegralFactory {
        let shells = (0..=max_l)
            .map(|l| {
                Shell::new(
                    l,
                    true,
                    [Gaussian {
                        exponent: 1.0,
                        coefficient: 1.0,
                    }],
                    Vector3::zeros(),
                )
            })
            .collect();
        IntegralFactory::for_basis(Arc::new(BasisSet::new(shells))).unwrap()
    }

    #[test]
    fn identity_operation_gives_identity_matrix() {
        let factory = factory(3);
        let identity = SymmetryOperation::identity();
        for l in 0..=3 {
            for pure in [false, true] {
                let rotation = factory.shell_rotation(l, &identity, pure).unwrap();
                let n = rotation.nfunction();
                assert_eq!(n, if pure { 2 * l + 1 } else { ncartesian(l) });
                assert_relative_eq!(rotation.trace(), n as f64, epsilon = 1e-12);
                for (i, j) in itertools::iproduct!(0..n, 0..n) {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert_relative_eq!(rotation.matrix()[(i, j)], expected, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn inversion_scales_by_parity() {
        let factory = factory(3);
        let inversion = SymmetryOperation::inversion();
        for l in 0..=3 {
            for pure in [false, true] {
                let rotation = factory.shell_rotation(l, &inversion, pure).unwrap();
                let parity = if l % 2 == 0 { 1.0 } else { -1.0 };
                let n = rotation.nfunction();
                for (i, j) in itertools::iproduct!(0..n, 0..n) {
                    let expected = if i == j { parity } else { 0.0 };
                    assert_relative_eq!(rotation.matrix()[(i, j)], expected, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn cartesian_p_shell_rotates_like_the_operation() {
        let factory = factory(1);
        let operation = SymmetryOperation::proper_rotation_z(4);
        let rotation = factory.shell_rotation(1, &operation, false).unwrap();
        // p components are ordered x, y, z, matching the operation axes
        for (i, j) in itertools::iproduct!(0..3, 0..3) {
            assert_relative_eq!(rotation.matrix()[(i, j)], operation.get(i, j), epsilon = 1e-12);
        }
    }

    #[test]
    fn reflection_flips_z_in_a_p_shell() {
        let factory = factory(1);
        let reflection = SymmetryOperation::reflection_xy();
        let rotation = factory.shell_rotation(1, &reflection, false).unwrap();
        assert_relative_eq!(rotation.matrix()[(0, 0)], 1.0);
        assert_relative_eq!(rotation.matrix()[(1, 1)], 1.0);
        assert_relative_eq!(rotation.matrix()[(2, 2)], -1.0);
        assert_relative_eq!(rotation.trace(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pure_d_character_matches_the_rotation_formula() {
        // chi_l(theta) = sum_{m=-l..l} cos(m theta); for l = 2 and
        // theta = 2 pi / 3 this is -1
        let factory = factory(2);
        let operation = SymmetryOperation::proper_rotation_z(3);
        let rotation = factory.shell_rotation(2, &operation, true).unwrap();
        assert_relative_eq!(rotation.trace(), -1.0, epsilon = 1e-10);
    }

    #[test]
    fn pure_rotation_is_orthogonal() {
        let factory = factory(2);
        let operation = SymmetryOperation::proper_rotation_z(5);
        let rotation = factory.shell_rotation(2, &operation, true).unwrap();
        let product = rotation.matrix() * rotation.matrix().transpose();
        for (i, j) in itertools::iproduct!(0..5, 0..5) {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_relative_eq!(product[(i, j)], expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn quarter_turns_compose_to_a_half_turn() {
        let factory = factory(1);
        let quarter = factory
            .shell_rotation(1, &SymmetryOperation::proper_rotation_z(4), false)
            .unwrap();
        let half = factory
            .shell_rotation(1, &SymmetryOperation::proper_rotation_z(2), false)
            .unwrap();
        let composed = quarter.operate(&quarter);
        for (i, j) in itertools::iproduct!(0..3, 0..3) {
            assert_relative_eq!(
                composed.matrix()[(i, j)],
                half.matrix()[(i, j)],
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn transform_preserves_an_invariant_block() {
        // the unit overlap block is invariant under any orthogonal rotation
        let factory = factory(2);
        let operation = SymmetryOperation::proper_rotation_z(6);
        let rotation = factory.shell_rotation(2, &operation, true).unwrap();
        let block = DMatrix::identity(5, 5);
        let transformed = rotation.transform(&block);
        for (i, j) in itertools::iproduct!(0..5, 0..5) {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_relative_eq!(transformed[(i, j)], expected, epsilon = 1e-10);
        }
    }
}
