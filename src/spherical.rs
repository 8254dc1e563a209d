//! Cartesian to spherical-harmonic (pure) transformation tables.
//!
//! For angular momentum `l` the forward table maps the `(l+1)(l+2)/2`
//! Cartesian components onto the `2l+1` pure components; the inverse table
//! is stored separately since downstream consumers need both directions.
//! Pure components are ordered `m = 0, +1, -1, ..., +l, -l`.

use nalgebra::DMatrix;

use crate::cartesian::{ncartesian, CartesianIter};
use crate::tables::tables;

/// One entry of a transformation table: `coef` connects the Cartesian
/// component `cartindex` with the pure component `pureindex`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SphericalTransformComponent {
    pub cartindex: usize,
    pub pureindex: usize,
    pub coef: f64,
}

/// Position of magnetic quantum number `m` in the pure component ordering.
#[inline]
fn pure_index(m: i32) -> usize {
    match m {
        0 => 0,
        m if m > 0 => 2 * m as usize - 1,
        m => 2 * m.unsigned_abs() as usize,
    }
}

/// Coefficient connecting the unit-normalized Cartesian component
/// `x^lx y^ly z^lz` with the real solid harmonic `S_{l,m}`. `S_{0,0} = 1`
/// and `S_{1,m} = x, y, z` with unit coefficients; integral kernels
/// normalize their Cartesian blocks per component before applying the
/// table.
///
/// Closed form after Schlegel and Frisch, evaluated with the global
/// factorial and binomial tables.
pub fn solid_harmonic_coefficient(l: usize, m: i32, lx: usize, ly: usize, lz: usize) -> f64 {
    debug_assert_eq!(lx + ly + lz, l);
    let t = tables();
    let ma = m.unsigned_abs() as usize;

    if lx + ly < ma {
        return 0.0;
    }
    let j2 = lx + ly - ma;
    if j2 % 2 != 0 {
        return 0.0;
    }
    let j = j2 / 2;

    let prefactor = ((t.fac[2 * lx] * t.fac[2 * ly] * t.fac[2 * lz] * t.fac[l] * t.fac[l - ma])
        / (t.fac[2 * l] * t.fac[lx] * t.fac[ly] * t.fac[lz] * t.fac[l + ma]))
        .sqrt()
        / (2f64.powi(l as i32) * t.fac[l]);

    let mut sum = 0.0;
    for i in j..=(l - ma) / 2 {
        let outer = t.bc[l][i] * t.bc[i][j] * parity(i) * t.fac[2 * l - 2 * i]
            / t.fac[l - ma - 2 * i];

        let mut inner = 0.0;
        for k in 0..=j {
            if 2 * k > lx {
                continue;
            }
            // ma - lx + 2k >= 0 here since bc[ma][lx - 2k] vanishes otherwise
            if lx - 2 * k > ma {
                continue;
            }
            let delta = ma + 2 * k - lx;
            let phase = if m >= 0 {
                // cosine part: even delta contributes
                if delta % 2 != 0 {
                    continue;
                }
                parity(delta / 2)
            } else {
                // sine part: odd delta contributes
                if delta % 2 != 1 {
                    continue;
                }
                parity((delta - 1) / 2)
            };
            inner += t.bc[j][k] * t.bc[ma][lx - 2 * k] * phase;
        }

        sum += outer * inner;
    }

    let coef = prefactor * sum;
    if ma > 0 {
        coef * std::f64::consts::SQRT_2
    } else {
        coef
    }
}

#[inline]
fn parity(n: usize) -> f64 {
    if n % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Forward transformation table for one angular momentum: Cartesian in,
/// pure out. Stores only the nonzero coefficients.
#[derive(Clone, Debug)]
pub struct SphericalTransform {
    l: usize,
    components: Vec<SphericalTransformComponent>,
}

impl SphericalTransform {
    pub fn new(l: usize) -> Self {
        let mut components = Vec::new();
        for m in magnetic_numbers(l) {
            let pureindex = pure_index(m);
            for cartesian in CartesianIter::new(l) {
                let coef =
                    solid_harmonic_coefficient(l, m, cartesian.a, cartesian.b, cartesian.c);
                if coef.abs() > 1e-14 {
                    components.push(SphericalTransformComponent {
                        cartindex: cartesian.index,
                        pureindex,
                        coef,
                    });
                }
            }
        }

        Self { l, components }
    }

    pub fn am(&self) -> usize {
        self.l
    }

    pub fn ncartesian(&self) -> usize {
        ncartesian(self.l)
    }

    pub fn npure(&self) -> usize {
        2 * self.l + 1
    }

    pub fn components(&self) -> &[SphericalTransformComponent] {
        &self.components
    }

    pub fn iter(&self) -> SphericalTransformIter<'_> {
        SphericalTransformIter::new(&self.components)
    }

    /// Dense `(2l+1) x ncartesian` matrix form.
    pub fn matrix(&self) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(self.npure(), self.ncartesian());
        for component in &self.components {
            matrix[(component.pureindex, component.cartindex)] = component.coef;
        }
        matrix
    }

    /// Transforms the bra dimension of a row-major `ncartesian x ncols`
    /// block into `npure x ncols`.
    pub fn apply_bra(&self, input: &[f64], output: &mut [f64], ncols: usize) {
        output[..self.npure() * ncols].fill(0.0);
        for component in &self.components {
            let src = component.cartindex * ncols;
            let dst = component.pureindex * ncols;
            for col in 0..ncols {
                output[dst + col] += component.coef * input[src + col];
            }
        }
    }

    /// Transforms the ket dimension of a row-major `nrows x ncartesian`
    /// block into `nrows x npure`.
    pub fn apply_ket(&self, input: &[f64], output: &mut [f64], nrows: usize) {
        let ncart = self.ncartesian();
        let npure = self.npure();
        output[..nrows * npure].fill(0.0);
        for component in &self.components {
            for row in 0..nrows {
                output[row * npure + component.pureindex] +=
                    component.coef * input[row * ncart + component.cartindex];
            }
        }
    }
}

/// Inverse transformation table: pure in, Cartesian out. Built as the
/// unique right inverse of the forward table whose columns lie in the
/// forward row space, so forward-after-inverse is the identity on pure
/// vectors for every `l`.
#[derive(Clone, Debug)]
pub struct InverseSphericalTransform {
    l: usize,
    components: Vec<SphericalTransformComponent>,
}

impl InverseSphericalTransform {
    pub fn new(forward: &SphericalTransform) -> Self {
        let l = forward.am();
        let t = forward.matrix();
        let gram = &t * t.transpose();
        // gram is symmetric positive definite for every l
        let inverse = gram
            .cholesky()
            .map(|cholesky| t.transpose() * cholesky.inverse())
            .unwrap_or_else(|| t.clone().pseudo_inverse(1e-12).unwrap_or_else(|_| t.transpose()));

        let mut components = Vec::new();
        for cartindex in 0..inverse.nrows() {
            for pureindex in 0..inverse.ncols() {
                let coef = inverse[(cartindex, pureindex)];
                if coef.abs() > 1e-12 {
                    components.push(SphericalTransformComponent {
                        cartindex,
                        pureindex,
                        coef,
                    });
                }
            }
        }

        Self { l, components }
    }

    pub fn am(&self) -> usize {
        self.l
    }

    pub fn ncartesian(&self) -> usize {
        ncartesian(self.l)
    }

    pub fn npure(&self) -> usize {
        2 * self.l + 1
    }

    pub fn components(&self) -> &[SphericalTransformComponent] {
        &self.components
    }

    pub fn iter(&self) -> SphericalTransformIter<'_> {
        SphericalTransformIter::new(&self.components)
    }

    /// Dense `ncartesian x (2l+1)` matrix form.
    pub fn matrix(&self) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(self.ncartesian(), self.npure());
        for component in &self.components {
            matrix[(component.cartindex, component.pureindex)] = component.coef;
        }
        matrix
    }
}

/// Iterator over the coefficients of one transformation table.
#[derive(Clone, Debug)]
pub struct SphericalTransformIter<'a> {
    components: std::slice::Iter<'a, SphericalTransformComponent>,
}

impl<'a> SphericalTransformIter<'a> {
    fn new(components: &'a [SphericalTransformComponent]) -> Self {
        Self {
            components: components.iter(),
        }
    }
}

impl<'a> Iterator for SphericalTransformIter<'a> {
    type Item = &'a SphericalTransformComponent;

    fn next(&mut self) -> Option<Self::Item> {
        self.components.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.components.size_hint()
    }
}

impl ExactSizeIterator for SphericalTransformIter<'_> {}

fn magnetic_numbers(l: usize) -> impl Iterator<Item = i32> {
    let l = l as i32;
    std::iter::once(0).chain((1..=l).flat_map(|m| [m, -m]))
}
