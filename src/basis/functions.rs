use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::tables::tables;

/// Primitive of the form `K * x^i * y^j * z^k * exp(-alpha * r^2)`. The
/// polynomial exponents live on the [`Shell`], not on the primitive.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    pub exponent: f64,
    /// Contraction coefficient, including the primitive normalization
    /// constant once the shell is constructed.
    pub coefficient: f64,
}

/// A group of basis functions sharing a center, an angular momentum and a
/// set of contracted Gaussian primitives. Immutable after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    l: usize,
    /// Spherical-harmonic (pure) representation if set, Cartesian otherwise.
    pure: bool,
    primitives: SmallVec<[Gaussian; 6]>,
    center: Vector3<f64>,
}

impl Shell {
    /// Builds a shell, folding the primitive normalization constant for the
    /// `(l, 0, 0)` Cartesian component into each contraction coefficient.
    /// Kernels apply the remaining per-component double factorial ratio.
    pub fn new(
        l: usize,
        pure: bool,
        primitives: impl IntoIterator<Item = Gaussian>,
        center: Vector3<f64>,
    ) -> Self {
        let primitives = primitives
            .into_iter()
            .map(|primitive| Gaussian {
                exponent: primitive.exponent,
                coefficient: primitive.coefficient * primitive_norm(primitive.exponent, l),
            })
            .collect();

        Self {
            l,
            pure,
            primitives,
            center,
        }
    }

    pub fn am(&self) -> usize {
        self.l
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }

    pub fn primitives(&self) -> &[Gaussian] {
        &self.primitives
    }

    pub fn nprimitive(&self) -> usize {
        self.primitives.len()
    }

    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    /// Number of Cartesian components, `(l + 1)(l + 2) / 2`.
    pub fn ncartesian(&self) -> usize {
        (self.l + 1) * (self.l + 2) / 2
    }

    /// Number of basis functions this shell contributes: `2l + 1` in the
    /// pure representation, the Cartesian count otherwise.
    pub fn nfunction(&self) -> usize {
        if self.pure {
            2 * self.l + 1
        } else {
            self.ncartesian()
        }
    }
}

/// Normalization constant of a primitive Gaussian with angular momentum
/// concentrated on one axis, `(l, 0, 0)`.
fn primitive_norm(exponent: f64, l: usize) -> f64 {
    let t = tables();
    (std::f64::consts::FRAC_2_PI * exponent).powi(3).sqrt().sqrt()
        * ((4.0 * exponent).powi(l as i32) / t.df[2 * l]).sqrt()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::*;

    #[test]
    fn s_primitive_normalization() {
        // int |N exp(-a r^2)|^2 = N^2 (pi / 2a)^(3/2)
        let shell = Shell::new(
            0,
            false,
            [Gaussian {
                exponent: 0.7,
                coefficient: 1.0,
            }],
            Vector3::zeros(),
        );
        let n = shell.primitives()[0].coefficient;
        let self_overlap = n * n * (std::f64::consts::PI / 1.4).powf(1.5);
        assert_relative_eq!(self_overlap, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn function_counts() {
        let gaussian = Gaussian {
            exponent: 1.0,
            coefficient: 1.0,
        };
        let cartesian_d = Shell::new(2, false, [gaussian], Vector3::zeros());
        let pure_d = Shell::new(2, true, [gaussian], Vector3::zeros());

        assert_eq!(cartesian_d.ncartesian(), 6);
        assert_eq!(cartesian_d.nfunction(), 6);
        assert_eq!(pure_d.nfunction(), 5);
    }
}
