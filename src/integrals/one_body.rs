//! One-electron integral evaluators.

use std::sync::Arc;

use itertools::iproduct;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::basis::{BasisSet, Gaussian, Shell};
use crate::cartesian::{component_norms, CartesianIter};
use crate::error::IntegralError;
use crate::spherical::SphericalTransform;

use super::{angular, apply_pure_transforms, check_buffer, check_shell, mmd, OneBodyInt};

/// A classical point charge, for nuclear attraction integrals.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointCharge {
    pub charge: f64,
    pub position: Vector3<f64>,
}

/// State shared by every one-electron kernel: the factory's transform
/// tables, the two basis sets, and scratch space for Cartesian blocks.
struct OneBodyCore<'a> {
    transforms: &'a [SphericalTransform],
    bs1: Arc<BasisSet>,
    bs2: Arc<BasisSet>,
    deriv: usize,
    buffer: Vec<f64>,
    scratch: Vec<f64>,
}

impl<'a> OneBodyCore<'a> {
    fn new(
        transforms: &'a [SphericalTransform],
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
        deriv: usize,
    ) -> Result<Self, IntegralError> {
        if deriv > 0 {
            return Err(IntegralError::UnsupportedDerivative(deriv));
        }
        Ok(Self {
            transforms,
            bs1,
            bs2,
            deriv,
            buffer: Vec::new(),
            scratch: Vec::new(),
        })
    }

    fn shells(&self, i: usize, j: usize) -> Result<(Shell, Shell), IntegralError> {
        check_shell(&self.bs1, i)?;
        check_shell(&self.bs2, j)?;
        Ok((self.bs1.shell(i).clone(), self.bs2.shell(j).clone()))
    }

    /// Contracts `integrand` over all component and primitive pairs into
    /// the internal buffer, chunk-major, applying the per-component
    /// normalization.
    fn fill<F>(&mut self, s1: &Shell, s2: &Shell, nchunk: usize, mut integrand: F)
    where
        F: FnMut([i32; 3], [i32; 3], Gaussian, Gaussian, &mut [f64]),
    {
        let (nc1, nc2) = (s1.ncartesian(), s2.ncartesian());
        let norms1 = component_norms(s1.am());
        let norms2 = component_norms(s2.am());

        self.buffer.clear();
        self.buffer.resize(nchunk * nc1 * nc2, 0.0);
        let mut values = vec![0.0; nchunk];

        for (ca, cb) in iproduct!(CartesianIter::new(s1.am()), CartesianIter::new(s2.am())) {
            values.fill(0.0);
            for (&pa, &pb) in iproduct!(s1.primitives(), s2.primitives()) {
                integrand(angular(&ca), angular(&cb), pa, pb, &mut values);
            }

            let norm = norms1[ca.index] * norms2[cb.index];
            for (chunk, value) in values.iter().enumerate() {
                self.buffer[chunk * nc1 * nc2 + ca.index * nc2 + cb.index] = value * norm;
            }
        }
    }

    fn finish(
        &mut self,
        s1: &Shell,
        s2: &Shell,
        nchunk: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        let count = apply_pure_transforms(
            &[s1, s2],
            self.transforms,
            nchunk,
            &mut self.buffer,
            &mut self.scratch,
        );
        out[..count].copy_from_slice(&self.buffer[..count]);
        Ok(count)
    }
}

/// Overlap integrals `<a|b>`.
pub struct OverlapInt<'a> {
    core: OneBodyCore<'a>,
}

impl<'a> OverlapInt<'a> {
    pub(crate) fn new(
        transforms: &'a [SphericalTransform],
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
        deriv: usize,
    ) -> Result<Self, IntegralError> {
        Ok(Self {
            core: OneBodyCore::new(transforms, bs1, bs2, deriv)?,
        })
    }
}

impl OneBodyInt for OverlapInt<'_> {
    fn deriv(&self) -> usize {
        self.core.deriv
    }

    fn compute_shell(
        &mut self,
        i: usize,
        j: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        let (s1, s2) = self.core.shells(i, j)?;
        check_buffer(s1.nfunction() * s2.nfunction(), out)?;

        let ab = s1.center() - s2.center();
        self.core.fill(&s1, &s2, 1, |la, lb, pa, pb, values| {
            values[0] += pa.coefficient
                * pb.coefficient
                * mmd::primitive_overlap(la, lb, pa.exponent, pb.exponent, ab);
        });
        self.core.finish(&s1, &s2, 1, out)
    }
}

/// Kinetic energy integrals `<a| -nabla^2 / 2 |b>`.
pub struct KineticInt<'a> {
    core: OneBodyCore<'a>,
}

impl<'a> KineticInt<'a> {
    pub(crate) fn new(
        transforms: &'a [SphericalTransform],
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
        deriv: usize,
    ) -> Result<Self, IntegralError> {
        Ok(Self {
            core: OneBodyCore::new(transforms, bs1, bs2, deriv)?,
        })
    }
}

impl OneBodyInt for KineticInt<'_> {
    fn deriv(&self) -> usize {
        self.core.deriv
    }

    fn compute_shell(
        &mut self,
        i: usize,
        j: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        let (s1, s2) = self.core.shells(i, j)?;
        check_buffer(s1.nfunction() * s2.nfunction(), out)?;

        let ab = s1.center() - s2.center();
        self.core.fill(&s1, &s2, 1, |la, lb, pa, pb, values| {
            values[0] += pa.coefficient
                * pb.coefficient
                * mmd::primitive_kinetic(la, lb, pa.exponent, pb.exponent, ab);
        });
        self.core.finish(&s1, &s2, 1, out)
    }
}

/// Nuclear attraction integrals `<a| sum_C -Z_C / r_C |b>` against a
/// caller-supplied set of point charges.
pub struct PotentialInt<'a> {
    core: OneBodyCore<'a>,
    charges: Vec<PointCharge>,
}

impl<'a> PotentialInt<'a> {
    pub(crate) fn new(
        transforms: &'a [SphericalTransform],
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
        deriv: usize,
    ) -> Result<Self, IntegralError> {
        Ok(Self {
            core: OneBodyCore::new(transforms, bs1, bs2, deriv)?,
            charges: Vec::new(),
        })
    }

    /// Sets the charge field the integrals are evaluated against.
    pub fn set_charges(&mut self, charges: &[PointCharge]) {
        self.charges = charges.to_vec();
    }

    pub fn charges(&self) -> &[PointCharge] {
        &self.charges
    }
}

impl OneBodyInt for PotentialInt<'_> {
    fn deriv(&self) -> usize {
        self.core.deriv
    }

    fn compute_shell(
        &mut self,
        i: usize,
        j: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        let (s1, s2) = self.core.shells(i, j)?;
        check_buffer(s1.nfunction() * s2.nfunction(), out)?;

        let (pos_a, pos_b) = (s1.center(), s2.center());
        let ab = pos_a - pos_b;
        let charges = &self.charges;
        self.core.fill(&s1, &s2, 1, |la, lb, pa, pb, values| {
            let center = mmd::product_center(pos_a, pa.exponent, pos_b, pb.exponent);
            for charge in charges {
                values[0] += pa.coefficient
                    * pb.coefficient
                    * -charge.charge
                    * mmd::primitive_potential(
                        la,
                        lb,
                        pa.exponent,
                        pb.exponent,
                        ab,
                        center - charge.position,
                    );
            }
        });
        self.core.finish(&s1, &s2, 1, out)
    }
}

/// Potential of the charge distribution `a b` at a probe site:
/// `<a| 1/r_site |b>`.
pub struct ElectrostaticInt<'a> {
    core: OneBodyCore<'a>,
    site: Vector3<f64>,
}

impl<'a> ElectrostaticInt<'a> {
    pub(crate) fn new(
        transforms: &'a [SphericalTransform],
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
    ) -> Result<Self, IntegralError> {
        Ok(Self {
            core: OneBodyCore::new(transforms, bs1, bs2, 0)?,
            site: Vector3::zeros(),
        })
    }

    /// Moves the probe site. Defaults to the origin.
    pub fn set_site(&mut self, site: Vector3<f64>) {
        self.site = site;
    }

    pub fn site(&self) -> Vector3<f64> {
        self.site
    }
}

impl OneBodyInt for ElectrostaticInt<'_> {
    fn deriv(&self) -> usize {
        self.core.deriv
    }

    fn compute_shell(
        &mut self,
        i: usize,
        j: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        let (s1, s2) = self.core.shells(i, j)?;
        check_buffer(s1.nfunction() * s2.nfunction(), out)?;

        let (pos_a, pos_b) = (s1.center(), s2.center());
        let ab = pos_a - pos_b;
        let site = self.site;
        self.core.fill(&s1, &s2, 1, |la, lb, pa, pb, values| {
            let center = mmd::product_center(pos_a, pa.exponent, pos_b, pb.exponent);
            values[0] += pa.coefficient
                * pb.coefficient
                * mmd::primitive_potential(la, lb, pa.exponent, pb.exponent, ab, center - site);
        });
        self.core.finish(&s1, &s2, 1, out)
    }
}

const DIPOLE_ORDERS: [[i32; 3]; 3] = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];
const QUADRUPOLE_ORDERS: [[i32; 3]; 6] = [
    [2, 0, 0],
    [1, 1, 0],
    [1, 0, 1],
    [0, 2, 0],
    [0, 1, 1],
    [0, 0, 2],
];

/// Dipole moment integrals about a settable origin; chunks ordered x, y, z.
pub struct DipoleInt<'a> {
    core: OneBodyCore<'a>,
    origin: Vector3<f64>,
}

impl<'a> DipoleInt<'a> {
    pub(crate) fn new(
        transforms: &'a [SphericalTransform],
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
        deriv: usize,
    ) -> Result<Self, IntegralError> {
        Ok(Self {
            core: OneBodyCore::new(transforms, bs1, bs2, deriv)?,
            origin: Vector3::zeros(),
        })
    }

    pub fn set_origin(&mut self, origin: Vector3<f64>) {
        self.origin = origin;
    }
}

impl OneBodyInt for DipoleInt<'_> {
    fn deriv(&self) -> usize {
        self.core.deriv
    }

    fn nchunk(&self) -> usize {
        3
    }

    fn compute_shell(
        &mut self,
        i: usize,
        j: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        let (s1, s2) = self.core.shells(i, j)?;
        check_buffer(3 * s1.nfunction() * s2.nfunction(), out)?;

        let ab = s1.center() - s2.center();
        let b_to_origin = self.origin - s2.center();
        self.core.fill(&s1, &s2, 3, |la, lb, pa, pb, values| {
            let scale = pa.coefficient * pb.coefficient;
            for (chunk, order) in DIPOLE_ORDERS.iter().enumerate() {
                values[chunk] += scale
                    * mmd::primitive_multipole(
                        la,
                        lb,
                        *order,
                        pa.exponent,
                        pb.exponent,
                        ab,
                        b_to_origin,
                    );
            }
        });
        self.core.finish(&s1, &s2, 3, out)
    }
}

/// Second moment integrals about a settable origin; chunks ordered
/// xx, xy, xz, yy, yz, zz.
pub struct QuadrupoleInt<'a> {
    core: OneBodyCore<'a>,
    origin: Vector3<f64>,
}

impl<'a> QuadrupoleInt<'a> {
    pub(crate) fn new(
        transforms: &'a [SphericalTransform],
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
    ) -> Result<Self, IntegralError> {
        Ok(Self {
            core: OneBodyCore::new(transforms, bs1, bs2, 0)?,
            origin: Vector3::zeros(),
        })
    }

    pub fn set_origin(&mut self, origin: Vector3<f64>) {
        self.origin = origin;
    }
}

impl OneBodyInt for QuadrupoleInt<'_> {
    fn deriv(&self) -> usize {
        self.core.deriv
    }

    fn nchunk(&self) -> usize {
        6
    }

    fn compute_shell(
        &mut self,
        i: usize,
        j: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        let (s1, s2) = self.core.shells(i, j)?;
        check_buffer(6 * s1.nfunction() * s2.nfunction(), out)?;

        let ab = s1.center() - s2.center();
        let b_to_origin = self.origin - s2.center();
        self.core.fill(&s1, &s2, 6, |la, lb, pa, pb, values| {
            let scale = pa.coefficient * pb.coefficient;
            for (chunk, order) in QUADRUPOLE_ORDERS.iter().enumerate() {
                values[chunk] += scale
                    * mmd::primitive_multipole(
                        la,
                        lb,
                        *order,
                        pa.exponent,
                        pb.exponent,
                        ab,
                        b_to_origin,
                    );
            }
        });
        self.core.finish(&s1, &s2, 6, out)
    }
}

/// Gradient of the electrostatic potential at a settable site; chunks
/// ordered x, y, z.
pub struct ElectricFieldInt<'a> {
    core: OneBodyCore<'a>,
    site: Vector3<f64>,
}

impl<'a> ElectricFieldInt<'a> {
    pub(crate) fn new(
        transforms: &'a [SphericalTransform],
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
    ) -> Result<Self, IntegralError> {
        Ok(Self {
            core: OneBodyCore::new(transforms, bs1, bs2, 0)?,
            site: Vector3::zeros(),
        })
    }

    pub fn set_site(&mut self, site: Vector3<f64>) {
        self.site = site;
    }
}

impl OneBodyInt for ElectricFieldInt<'_> {
    fn deriv(&self) -> usize {
        self.core.deriv
    }

    fn nchunk(&self) -> usize {
        3
    }

    fn compute_shell(
        &mut self,
        i: usize,
        j: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        let (s1, s2) = self.core.shells(i, j)?;
        check_buffer(3 * s1.nfunction() * s2.nfunction(), out)?;

        let (pos_a, pos_b) = (s1.center(), s2.center());
        let ab = pos_a - pos_b;
        let site = self.site;
        self.core.fill(&s1, &s2, 3, |la, lb, pa, pb, values| {
            let center = mmd::product_center(pos_a, pa.exponent, pos_b, pb.exponent);
            let gradient = mmd::primitive_potential_gradient(
                la,
                lb,
                pa.exponent,
                pb.exponent,
                ab,
                center - site,
            );
            let scale = pa.coefficient * pb.coefficient;
            values[0] += scale * gradient.x;
            values[1] += scale * gradient.y;
            values[2] += scale * gradient.z;
        });
        self.core.finish(&s1, &s2, 3, out)
    }
}

/// Three-center overlap integrals `<a|b|c>` over the factory's first three
/// basis sets.
pub struct ThreeCenterOverlapInt<'a> {
    transforms: &'a [SphericalTransform],
    bs1: Arc<BasisSet>,
    bs2: Arc<BasisSet>,
    bs3: Arc<BasisSet>,
    buffer: Vec<f64>,
    scratch: Vec<f64>,
}

impl<'a> ThreeCenterOverlapInt<'a> {
    pub(crate) fn new(
        transforms: &'a [SphericalTransform],
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
        bs3: Arc<BasisSet>,
    ) -> Self {
        Self {
            transforms,
            bs1,
            bs2,
            bs3,
            buffer: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Computes the overlap block for shells `i`, `j`, `k` (one per basis
    /// set), row-major with the first index slowest, and returns the
    /// number of values written.
    pub fn compute_shell(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        check_shell(&self.bs1, i)?;
        check_shell(&self.bs2, j)?;
        check_shell(&self.bs3, k)?;
        let s1 = self.bs1.shell(i).clone();
        let s2 = self.bs2.shell(j).clone();
        let s3 = self.bs3.shell(k).clone();
        check_buffer(s1.nfunction() * s2.nfunction() * s3.nfunction(), out)?;

        let (nc2, nc3) = (s2.ncartesian(), s3.ncartesian());
        let norms1 = component_norms(s1.am());
        let norms2 = component_norms(s2.am());
        let norms3 = component_norms(s3.am());

        self.buffer.clear();
        self.buffer.resize(s1.ncartesian() * nc2 * nc3, 0.0);

        for (ca, cb, cc) in iproduct!(
            CartesianIter::new(s1.am()),
            CartesianIter::new(s2.am()),
            CartesianIter::new(s3.am())
        ) {
            let mut value = 0.0;
            for (&pa, &pb, &pc) in
                iproduct!(s1.primitives(), s2.primitives(), s3.primitives())
            {
                value += pa.coefficient
                    * pb.coefficient
                    * pc.coefficient
                    * mmd::primitive_three_center_overlap(
                        angular(&ca),
                        angular(&cb),
                        angular(&cc),
                        pa.exponent,
                        pb.exponent,
                        pc.exponent,
                        s1.center(),
                        s2.center(),
                        s3.center(),
                    );
            }
            self.buffer[(ca.index * nc2 + cb.index) * nc3 + cc.index] =
                value * norms1[ca.index] * norms2[cb.index] * norms3[cc.index];
        }

        let count = apply_pure_transforms(
            &[&s1, &s2, &s3],
            self.transforms,
            1,
            &mut self.buffer,
            &mut self.scratch,
        );
        out[..count].copy_from_slice(&self.buffer[..count]);
        Ok(count)
    }
}
