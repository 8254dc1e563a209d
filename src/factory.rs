//! Central dispatch for integral evaluators, iterators, and transform
//! tables.

use std::sync::Arc;

use crate::basis::BasisSet;
use crate::cartesian::{CartesianIter, RedundantCartesianIter, RedundantCartesianSubIter};
use crate::error::IntegralError;
use crate::integrals::{
    check_shell, DipoleInt, ElectricFieldInt, ElectrostaticInt, Eri, KineticInt, OverlapInt,
    PotentialInt, QuadrupoleInt, ThreeCenterOverlapInt,
};
use crate::iterators::{
    IntegralsIterator, ShellCombinationsIterator, ShellPairsIterator, ShellSlot,
};
use crate::rotation::{ShellRotation, SymmetryOperation};
use crate::spherical::{InverseSphericalTransform, SphericalTransform, SphericalTransformIter};
use crate::tables::initialize_singletons;

/// Hands out integral evaluators and iterators over four basis sets
/// (bra pair, ket pair). The factory owns the spherical transform tables
/// its evaluators share; every evaluator borrows them, so the factory has
/// to outlive whatever it hands out, and reconfiguring it through
/// [`IntegralFactory::set_basis`] requires all of them to be dropped
/// first.
pub struct IntegralFactory {
    bs: [Arc<BasisSet>; 4],
    max_am: usize,
    transforms: Vec<SphericalTransform>,
    inverse_transforms: Vec<InverseSphericalTransform>,
}

fn check_sets(bs: &[Arc<BasisSet>; 4]) -> Result<(), IntegralError> {
    for (slot, set) in bs.iter().enumerate() {
        if set.nshell() == 0 {
            return Err(IntegralError::EmptyBasisSet { slot: slot + 1 });
        }
    }
    Ok(())
}

impl IntegralFactory {
    pub fn new(
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
        bs3: Arc<BasisSet>,
        bs4: Arc<BasisSet>,
    ) -> Result<Self, IntegralError> {
        initialize_singletons();

        let bs = [bs1, bs2, bs3, bs4];
        check_sets(&bs)?;
        let mut factory = Self {
            bs,
            max_am: 0,
            transforms: Vec::new(),
            inverse_transforms: Vec::new(),
        };
        factory.rebuild();
        Ok(factory)
    }

    /// One basis set in all four slots. The evaluators and iterators then
    /// exploit the full permutational symmetry.
    pub fn for_basis(bs: Arc<BasisSet>) -> Result<Self, IntegralError> {
        Self::new(bs.clone(), bs.clone(), bs.clone(), bs)
    }

    /// Two basis sets, assigned bra and ket alike: `(b1 b2 | b1 b2)`.
    pub fn for_pair(bs1: Arc<BasisSet>, bs2: Arc<BasisSet>) -> Result<Self, IntegralError> {
        Self::new(bs1.clone(), bs2.clone(), bs1, bs2)
    }

    /// Replaces all four basis sets and rebuilds the transform tables.
    /// On error the factory is left unchanged.
    pub fn set_basis(
        &mut self,
        bs1: Arc<BasisSet>,
        bs2: Arc<BasisSet>,
        bs3: Arc<BasisSet>,
        bs4: Arc<BasisSet>,
    ) -> Result<(), IntegralError> {
        let bs = [bs1, bs2, bs3, bs4];
        check_sets(&bs)?;
        self.bs = bs;
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        let max_bra = self.bs[0].max_am().max(self.bs[1].max_am());
        let max_ket = self.bs[2].max_am().max(self.bs[3].max_am());
        self.init_spherical_harmonics(max_bra.max(max_ket));
    }

    fn init_spherical_harmonics(&mut self, max_am: usize) {
        self.max_am = max_am;
        self.transforms = (0..=max_am).map(SphericalTransform::new).collect();
        self.inverse_transforms = self
            .transforms
            .iter()
            .map(InverseSphericalTransform::new)
            .collect();
        log::debug!("spherical transform tables built up to l = {max_am}");
    }

    /// Highest angular momentum the transform tables are provisioned for.
    pub fn max_am(&self) -> usize {
        self.max_am
    }

    pub fn basis1(&self) -> &Arc<BasisSet> {
        &self.bs[0]
    }

    pub fn basis2(&self) -> &Arc<BasisSet> {
        &self.bs[1]
    }

    pub fn basis3(&self) -> &Arc<BasisSet> {
        &self.bs[2]
    }

    pub fn basis4(&self) -> &Arc<BasisSet> {
        &self.bs[3]
    }

    pub fn basis_sets(&self) -> [&Arc<BasisSet>; 4] {
        [&self.bs[0], &self.bs[1], &self.bs[2], &self.bs[3]]
    }

    fn check_am(&self, requested: usize) -> Result<(), IntegralError> {
        if requested <= self.max_am {
            Ok(())
        } else {
            Err(IntegralError::MaxAngularMomentumExceeded {
                requested,
                provisioned: self.max_am,
            })
        }
    }

    pub fn spherical_transform(&self, l: usize) -> Result<&SphericalTransform, IntegralError> {
        self.check_am(l)?;
        Ok(&self.transforms[l])
    }

    pub fn inverse_spherical_transform(
        &self,
        l: usize,
    ) -> Result<&InverseSphericalTransform, IntegralError> {
        self.check_am(l)?;
        Ok(&self.inverse_transforms[l])
    }

    /// Component iterator over the forward (`inv = false`) or inverse
    /// transform for `am`. `subl` selects a sub-level and is not
    /// supported; pass `None`.
    pub fn spherical_transform_iter(
        &self,
        am: usize,
        inv: bool,
        subl: Option<usize>,
    ) -> Result<SphericalTransformIter<'_>, IntegralError> {
        if subl.is_some() {
            return Err(IntegralError::NotImplemented(
                "spherical transform sub-levels",
            ));
        }
        if inv {
            Ok(self.inverse_spherical_transform(am)?.iter())
        } else {
            Ok(self.spherical_transform(am)?.iter())
        }
    }

    pub fn overlap(&self, deriv: usize) -> Result<OverlapInt<'_>, IntegralError> {
        OverlapInt::new(
            &self.transforms,
            self.bs[0].clone(),
            self.bs[1].clone(),
            deriv,
        )
    }

    pub fn kinetic(&self, deriv: usize) -> Result<KineticInt<'_>, IntegralError> {
        KineticInt::new(
            &self.transforms,
            self.bs[0].clone(),
            self.bs[1].clone(),
            deriv,
        )
    }

    pub fn potential(&self, deriv: usize) -> Result<PotentialInt<'_>, IntegralError> {
        PotentialInt::new(
            &self.transforms,
            self.bs[0].clone(),
            self.bs[1].clone(),
            deriv,
        )
    }

    pub fn electrostatic(&self) -> Result<ElectrostaticInt<'_>, IntegralError> {
        ElectrostaticInt::new(&self.transforms, self.bs[0].clone(), self.bs[1].clone())
    }

    pub fn dipole(&self, deriv: usize) -> Result<DipoleInt<'_>, IntegralError> {
        DipoleInt::new(
            &self.transforms,
            self.bs[0].clone(),
            self.bs[1].clone(),
            deriv,
        )
    }

    pub fn quadrupole(&self) -> Result<QuadrupoleInt<'_>, IntegralError> {
        QuadrupoleInt::new(&self.transforms, self.bs[0].clone(), self.bs[1].clone())
    }

    pub fn electric_field(&self) -> Result<ElectricFieldInt<'_>, IntegralError> {
        ElectricFieldInt::new(&self.transforms, self.bs[0].clone(), self.bs[1].clone())
    }

    /// Three-center overlap over the first three basis sets.
    pub fn overlap_3c(&self) -> Result<ThreeCenterOverlapInt<'_>, IntegralError> {
        Ok(ThreeCenterOverlapInt::new(
            &self.transforms,
            self.bs[0].clone(),
            self.bs[1].clone(),
            self.bs[2].clone(),
        ))
    }

    /// Electron repulsion evaluator. A non-zero `schwarz` threshold
    /// enables quartet screening.
    pub fn eri(&self, deriv: usize, schwarz: f64) -> Result<Eri<'_>, IntegralError> {
        Eri::new(&self.transforms, self.bs.clone(), deriv, schwarz)
    }

    /// Canonical shell quartets over all four basis sets.
    pub fn shells_iterator(&self) -> ShellCombinationsIterator {
        ShellCombinationsIterator::new(&self.bs[0], &self.bs[1], &self.bs[2], &self.bs[3])
    }

    /// Canonical shell pairs over the first two basis sets.
    pub fn pairs_iterator(&self) -> ShellPairsIterator {
        ShellPairsIterator::new(&self.bs[0], &self.bs[1])
    }

    /// Canonical basis function quadruples within one shell quartet.
    pub fn integrals_iterator(
        &self,
        p: usize,
        q: usize,
        r: usize,
        s: usize,
    ) -> Result<IntegralsIterator, IntegralError> {
        check_shell(&self.bs[0], p)?;
        check_shell(&self.bs[1], q)?;
        check_shell(&self.bs[2], r)?;
        check_shell(&self.bs[3], s)?;
        Ok(IntegralsIterator::new([
            ShellSlot {
                basis: &self.bs[0],
                shell_index: p,
            },
            ShellSlot {
                basis: &self.bs[1],
                shell_index: q,
            },
            ShellSlot {
                basis: &self.bs[2],
                shell_index: r,
            },
            ShellSlot {
                basis: &self.bs[3],
                shell_index: s,
            },
        ]))
    }

    pub fn cartesian_iter(&self, l: usize) -> CartesianIter {
        CartesianIter::new(l)
    }

    pub fn redundant_cartesian_iter(&self, l: usize) -> RedundantCartesianIter {
        RedundantCartesianIter::new(l)
    }

    pub fn redundant_cartesian_sub_iter(
        &self,
        l: usize,
        a: usize,
        b: usize,
        c: usize,
    ) -> RedundantCartesianSubIter {
        RedundantCartesianSubIter::new(l, a, b, c)
    }

    /// Transformation matrix of one shell's basis functions under a point
    /// group operation.
    pub fn shell_rotation(
        &self,
        am: usize,
        operation: &SymmetryOperation,
        pure: bool,
    ) -> Result<ShellRotation, IntegralError> {
        ShellRotation::new(am, operation, self, pure)
    }
}
