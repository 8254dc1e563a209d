//! Integral evaluator kernels and their shared plumbing.
//!
//! Evaluators are manufactured by [`crate::factory::IntegralFactory`] and
//! hold references into its spherical transform tables, so the factory has
//! to outlive them. Each evaluator owns its scratch space; distinct
//! evaluators can run on different threads.

pub mod electron_tensor;
pub(crate) mod mmd;
mod one_body;
mod two_body;

pub use electron_tensor::ElectronTensor;
pub use one_body::{
    DipoleInt, ElectricFieldInt, ElectrostaticInt, KineticInt, OverlapInt, PointCharge,
    PotentialInt, QuadrupoleInt, ThreeCenterOverlapInt,
};
pub use two_body::Eri;

use crate::basis::{BasisSet, Shell};
use crate::cartesian::CartesianComponent;
use crate::error::IntegralError;
use crate::spherical::SphericalTransform;

/// Uniform contract of the one-electron kernels: integrals for a shell
/// pair are written into a caller-supplied buffer, `nchunk` blocks of
/// `nfunction(i) * nfunction(j)` values each, row-major with the bra
/// index slow.
pub trait OneBodyInt {
    /// Derivative order this evaluator computes.
    fn deriv(&self) -> usize;

    /// Number of operator components per shell pair (3 for dipole, ...).
    fn nchunk(&self) -> usize {
        1
    }

    /// Computes the integrals for shells `i` (from the first basis set) and
    /// `j` (from the second) and returns the number of values written.
    fn compute_shell(&mut self, i: usize, j: usize, out: &mut [f64])
        -> Result<usize, IntegralError>;
}

/// Uniform contract of the two-electron kernels, one level up: a shell
/// quartet per call.
pub trait TwoBodyInt {
    fn deriv(&self) -> usize;

    /// Computes `(pq|rs)` for the given shell indices and returns the
    /// number of values written; zero means the quartet was screened out
    /// (the buffer is zeroed in that case).
    fn compute_shell(
        &mut self,
        p: usize,
        q: usize,
        r: usize,
        s: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError>;
}

#[inline]
pub(crate) fn angular(component: &CartesianComponent) -> [i32; 3] {
    [
        component.a as i32,
        component.b as i32,
        component.c as i32,
    ]
}

pub(crate) fn check_shell(basis: &BasisSet, index: usize) -> Result<(), IntegralError> {
    if index < basis.nshell() {
        Ok(())
    } else {
        Err(IntegralError::ShellOutOfRange {
            index,
            nshell: basis.nshell(),
        })
    }
}

pub(crate) fn check_buffer(needed: usize, out: &[f64]) -> Result<(), IntegralError> {
    if out.len() >= needed {
        Ok(())
    } else {
        Err(IntegralError::BufferTooSmall {
            needed,
            got: out.len(),
        })
    }
}

/// Applies the Cartesian to pure transformation to every pure shell of a
/// normalized Cartesian block. The block has an untransformed leading
/// dimension of size `nchunk`, then one dimension per shell (fastest
/// last). Returns the number of values the finished block holds, left in
/// `buffer`.
pub(crate) fn apply_pure_transforms(
    shells: &[&Shell],
    transforms: &[SphericalTransform],
    nchunk: usize,
    buffer: &mut Vec<f64>,
    scratch: &mut Vec<f64>,
) -> usize {
    let mut dims: Vec<usize> = std::iter::once(nchunk)
        .chain(shells.iter().map(|shell| shell.ncartesian()))
        .collect();

    for (k, shell) in shells.iter().enumerate() {
        if !shell.is_pure() {
            continue;
        }
        let dim = k + 1;
        let transform = &transforms[shell.am()];
        let npure = transform.npure();
        let ncart = dims[dim];
        let nslab: usize = dims[..dim].iter().product();
        let ncols: usize = dims[dim + 1..].iter().product();

        scratch.clear();
        scratch.resize(nslab * npure * ncols, 0.0);
        for slab in 0..nslab {
            let src = &buffer[slab * ncart * ncols..][..ncart * ncols];
            let dst = &mut scratch[slab * npure * ncols..][..npure * ncols];
            transform.apply_bra(src, dst, ncols);
        }

        dims[dim] = npure;
        std::mem::swap(buffer, scratch);
    }

    dims.iter().product()
}
