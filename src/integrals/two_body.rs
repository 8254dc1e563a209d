//! Two-electron repulsion integrals.

use std::sync::Arc;

use itertools::iproduct;

use crate::basis::{BasisSet, Shell};
use crate::cartesian::{component_norms, CartesianIter};
use crate::error::IntegralError;
use crate::spherical::SphericalTransform;

use super::{angular, apply_pure_transforms, check_buffer, check_shell, mmd, TwoBodyInt};

/// Electron repulsion integral evaluator over four basis sets, with
/// optional Schwarz screening of shell quartets.
pub struct Eri<'a> {
    transforms: &'a [SphericalTransform],
    bs: [Arc<BasisSet>; 4],
    deriv: usize,
    threshold: f64,
    bra_bounds: Vec<f64>,
    ket_bounds: Vec<f64>,
    buffer: Vec<f64>,
    scratch: Vec<f64>,
}

impl<'a> Eri<'a> {
    /// A non-zero `threshold` enables Schwarz screening: quartets whose
    /// `sqrt((pq|pq)) * sqrt((rs|rs))` bound falls below it are skipped.
    /// The pair bounds are precomputed here, so construction is quadratic
    /// in the number of shells.
    pub(crate) fn new(
        transforms: &'a [SphericalTransform],
        bs: [Arc<BasisSet>; 4],
        deriv: usize,
        threshold: f64,
    ) -> Result<Self, IntegralError> {
        if deriv > 0 {
            return Err(IntegralError::UnsupportedDerivative(deriv));
        }

        let mut eri = Self {
            transforms,
            bs,
            deriv,
            threshold,
            bra_bounds: Vec::new(),
            ket_bounds: Vec::new(),
            buffer: Vec::new(),
            scratch: Vec::new(),
        };
        if threshold > 0.0 {
            eri.bra_bounds = eri.pair_bounds(0, 1);
            eri.ket_bounds =
                if Arc::ptr_eq(&eri.bs[0], &eri.bs[2]) && Arc::ptr_eq(&eri.bs[1], &eri.bs[3]) {
                    eri.bra_bounds.clone()
                } else {
                    eri.pair_bounds(2, 3)
                };
        }
        Ok(eri)
    }

    pub fn screening_threshold(&self) -> f64 {
        self.threshold
    }

    fn pair_bounds(&mut self, slot1: usize, slot2: usize) -> Vec<f64> {
        let (bs1, bs2) = (self.bs[slot1].clone(), self.bs[slot2].clone());
        let mut bounds = Vec::with_capacity(bs1.nshell() * bs2.nshell());
        for (p, q) in iproduct!(0..bs1.nshell(), 0..bs2.nshell()) {
            let (s1, s2) = (bs1.shell(p), bs2.shell(q));
            let count = compute_quartet(
                self.transforms,
                [s1, s2, s1, s2],
                &mut self.buffer,
                &mut self.scratch,
            );
            let max = self.buffer[..count].iter().fold(0.0, |m: f64, &v| m.max(v.abs()));
            bounds.push(max.sqrt());
        }
        bounds
    }
}

impl TwoBodyInt for Eri<'_> {
    fn deriv(&self) -> usize {
        self.deriv
    }

    fn compute_shell(
        &mut self,
        p: usize,
        q: usize,
        r: usize,
        s: usize,
        out: &mut [f64],
    ) -> Result<usize, IntegralError> {
        check_shell(&self.bs[0], p)?;
        check_shell(&self.bs[1], q)?;
        check_shell(&self.bs[2], r)?;
        check_shell(&self.bs[3], s)?;

        let shells = [
            self.bs[0].shell(p).clone(),
            self.bs[1].shell(q).clone(),
            self.bs[2].shell(r).clone(),
            self.bs[3].shell(s).clone(),
        ];
        let needed: usize = shells.iter().map(Shell::nfunction).product();
        check_buffer(needed, out)?;

        if self.threshold > 0.0 {
            let bound = self.bra_bounds[p * self.bs[1].nshell() + q]
                * self.ket_bounds[r * self.bs[3].nshell() + s];
            if bound < self.threshold {
                out[..needed].fill(0.0);
                return Ok(0);
            }
        }

        let count = compute_quartet(
            self.transforms,
            [&shells[0], &shells[1], &shells[2], &shells[3]],
            &mut self.buffer,
            &mut self.scratch,
        );
        out[..count].copy_from_slice(&self.buffer[..count]);
        Ok(count)
    }
}

/// Contracts `(pq|rs)` over all component and primitive quadruples into
/// `buffer`, normalized and pure-transformed, returning the value count.
fn compute_quartet(
    transforms: &[SphericalTransform],
    shells: [&Shell; 4],
    buffer: &mut Vec<f64>,
    scratch: &mut Vec<f64>,
) -> usize {
    let [s1, s2, s3, s4] = shells;
    let dims = [
        s1.ncartesian(),
        s2.ncartesian(),
        s3.ncartesian(),
        s4.ncartesian(),
    ];
    let norms = [
        component_norms(s1.am()),
        component_norms(s2.am()),
        component_norms(s3.am()),
        component_norms(s4.am()),
    ];

    let ab = s1.center() - s2.center();
    let cd = s3.center() - s4.center();

    buffer.clear();
    buffer.resize(dims.iter().product(), 0.0);

    for (ca, cb, cc, cd_comp) in iproduct!(
        CartesianIter::new(s1.am()),
        CartesianIter::new(s2.am()),
        CartesianIter::new(s3.am()),
        CartesianIter::new(s4.am())
    ) {
        let mut value = 0.0;
        for (&pa, &pb, &pc, &pd) in iproduct!(
            s1.primitives(),
            s2.primitives(),
            s3.primitives(),
            s4.primitives()
        ) {
            let bra_center = mmd::product_center(s1.center(), pa.exponent, s2.center(), pb.exponent);
            let ket_center = mmd::product_center(s3.center(), pc.exponent, s4.center(), pd.exponent);
            value += pa.coefficient
                * pb.coefficient
                * pc.coefficient
                * pd.coefficient
                * mmd::primitive_electron(
                    angular(&ca),
                    angular(&cb),
                    angular(&cc),
                    angular(&cd_comp),
                    [pa.exponent, pb.exponent, pc.exponent, pd.exponent],
                    ab,
                    cd,
                    bra_center - ket_center,
                );
        }

        let index = ((ca.index * dims[1] + cb.index) * dims[2] + cc.index) * dims[3]
            + cd_comp.index;
        buffer[index] = value
            * norms[0][ca.index]
            * norms[1][cb.index]
            * norms[2][cc.index]
            * norms[3][cd_comp.index];
    }

    apply_pure_transforms(&shells, transforms, 1, buffer, scratch)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use crate::basis::Gaussian;

    use super::*;

    fn shell(l: usize, pure: bool, exponent: f64, center: Vector3<f64>) -> Shell {
        Shell::new(
            l,
            pure,
            [Gaussian {
                exponent,
                coefficient: 1.0,
            }],
            center,
        )
    }

    fn basis(shells: Vec<Shell>) -> Arc<BasisSet> {
        Arc::new(BasisSet::new(shells))
    }

    fn transforms(max_am: usize) -> Vec<SphericalTransform> {
        (0..=max_am).map(SphericalTransform::new).collect()
    }

    #[test]
    fn s_self_repulsion_matches_closed_form() {
        // (ss|ss) over one normalized s primitive of exponent a: 2 sqrt(a / pi)
        let a = 1.45;
        let bs = basis(vec![shell(0, false, a, Vector3::zeros())]);
        let t = transforms(0);
        let mut eri = Eri::new(&t, [bs.clone(), bs.clone(), bs.clone(), bs], 0, 0.0).unwrap();

        let mut out = [0.0];
        assert_eq!(eri.compute_shell(0, 0, 0, 0, &mut out).unwrap(), 1);
        assert_relative_eq!(
            out[0],
            2.0 * (a / std::f64::consts::PI).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn quartet_respects_eightfold_symmetry() {
        let bs = basis(vec![
            shell(0, false, 1.0, Vector3::zeros()),
            shell(1, false, 0.6, Vector3::new(0.0, 0.0, 1.0)),
        ]);
        let t = transforms(1);
        let mut eri = Eri::new(&t, [bs.clone(), bs.clone(), bs.clone(), bs], 0, 0.0).unwrap();

        // (01|01) against its bra-ket swap (10|10); both are 1x3x1x3 blocks
        let mut pqrs = [0.0; 9];
        let mut qpsr = [0.0; 9];
        eri.compute_shell(0, 1, 0, 1, &mut pqrs).unwrap();
        eri.compute_shell(1, 0, 1, 0, &mut qpsr).unwrap();
        for (i, j) in iproduct!(0..3, 0..3) {
            assert_relative_eq!(pqrs[i * 3 + j], qpsr[j * 3 + i], epsilon = 1e-12);
        }
    }

    #[test]
    fn pure_d_quartet_has_spherical_dimensions() {
        let bs = basis(vec![
            shell(2, true, 0.9, Vector3::zeros()),
            shell(0, false, 1.2, Vector3::new(0.7, 0.0, 0.0)),
        ]);
        let t = transforms(2);
        let mut eri = Eri::new(&t, [bs.clone(), bs.clone(), bs.clone(), bs], 0, 0.0).unwrap();

        let mut out = [0.0; 25];
        assert_eq!(eri.compute_shell(0, 1, 0, 1, &mut out).unwrap(), 5 * 5);
    }

    #[test]
    fn schwarz_screening_skips_distant_quartets() {
        let bs = basis(vec![
            shell(0, false, 2.0, Vector3::zeros()),
            shell(0, false, 2.0, Vector3::new(0.0, 0.0, 50.0)),
        ]);
        let t = transforms(0);
        let mut eri =
            Eri::new(&t, [bs.clone(), bs.clone(), bs.clone(), bs], 0, 1e-12).unwrap();

        // the cross pair overlap decays as exp(-a/2 * 2500); its quartet is screened
        let mut out = [1.0];
        assert_eq!(eri.compute_shell(0, 1, 0, 1, &mut out).unwrap(), 0);
        assert_relative_eq!(out[0], 0.0);

        // diagonal quartets survive
        assert_eq!(eri.compute_shell(0, 0, 0, 0, &mut out).unwrap(), 1);
        assert!(out[0] > 0.1);
    }

    #[test]
    fn derivative_request_is_rejected() {
        let bs = basis(vec![shell(0, false, 1.0, Vector3::zeros())]);
        let t = transforms(0);
        assert_eq!(
            Eri::new(&t, [bs.clone(), bs.clone(), bs.clone(), bs], 1, 0.0).err(),
            Some(IntegralError::UnsupportedDerivative(1))
        );
    }
}
