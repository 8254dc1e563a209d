//! Dense two-electron integral tensor.

use std::ops::Index;
use std::sync::Arc;

use crate::error::IntegralError;
use crate::factory::IntegralFactory;
use crate::iterators::ShellQuartet;

use super::TwoBodyInt;

/// The full `(ij|kl)` electron repulsion tensor over the factory's basis
/// sets, stored dense. Only canonical shell quartets are evaluated; the
/// permutational symmetries the basis set assignment admits fill in the
/// rest.
pub struct ElectronTensor {
    data: Vec<f64>,
    dims: [usize; 4],
    use_bra: bool,
    use_ket: bool,
    use_pairs: bool,
}

impl ElectronTensor {
    /// Computes every integral the factory's quartet iterator yields.
    /// With the `rayon` feature enabled, quartets are evaluated in
    /// parallel chunks, one evaluator per chunk.
    pub fn from_factory(factory: &IntegralFactory) -> Result<Self, IntegralError> {
        let [bs1, bs2, bs3, bs4] = factory.basis_sets();
        let dims = [bs1.nbf(), bs2.nbf(), bs3.nbf(), bs4.nbf()];

        let mut tensor = Self {
            data: vec![0.0; dims.iter().product()],
            dims,
            use_bra: Arc::ptr_eq(bs1, bs2),
            use_ket: Arc::ptr_eq(bs3, bs4),
            use_pairs: Arc::ptr_eq(bs1, bs3) && Arc::ptr_eq(bs2, bs4),
        };

        let quartets: Vec<ShellQuartet> = factory.shells_iterator().collect();

        #[cfg(feature = "rayon")]
        {
            use rayon::iter::{ParallelBridge, ParallelIterator};

            let blocks = quartets
                .chunks(64)
                .par_bridge()
                .map(|chunk| -> Result<Vec<(ShellQuartet, Vec<f64>)>, IntegralError> {
                    let mut eri = factory.eri(0, 0.0)?;
                    let mut blocks = Vec::with_capacity(chunk.len());
                    for &quartet in chunk {
                        blocks.push((quartet, compute_block(&mut eri, factory, quartet)?));
                    }
                    Ok(blocks)
                })
                .collect::<Result<Vec<_>, IntegralError>>()?;

            for (quartet, block) in blocks.into_iter().flatten() {
                tensor.scatter(factory, quartet, &block);
            }
        }

        #[cfg(not(feature = "rayon"))]
        {
            let mut eri = factory.eri(0, 0.0)?;
            for quartet in quartets {
                let block = compute_block(&mut eri, factory, quartet)?;
                tensor.scatter(factory, quartet, &block);
            }
        }

        Ok(tensor)
    }

    pub fn dims(&self) -> [usize; 4] {
        self.dims
    }

    fn linear(&self, (i, j, k, l): (usize, usize, usize, usize)) -> usize {
        ((i * self.dims[1] + j) * self.dims[2] + k) * self.dims[3] + l
    }

    fn set(&mut self, index: (usize, usize, usize, usize), value: f64) {
        let linear = self.linear(index);
        self.data[linear] = value;
    }

    /// Writes a quartet block and every symmetry image the basis set
    /// assignment admits. A screened block writes zeros, which the tensor
    /// already holds.
    fn scatter(&mut self, factory: &IntegralFactory, quartet: ShellQuartet, block: &[f64]) {
        if block.is_empty() {
            return;
        }

        let [bs1, bs2, bs3, bs4] = factory.basis_sets();
        let (fi, fj) = (
            bs1.shell_to_function(quartet.p),
            bs2.shell_to_function(quartet.q),
        );
        let (fk, fl) = (
            bs3.shell_to_function(quartet.r),
            bs4.shell_to_function(quartet.s),
        );
        let (nj, nk, nl) = (
            bs2.shell(quartet.q).nfunction(),
            bs3.shell(quartet.r).nfunction(),
            bs4.shell(quartet.s).nfunction(),
        );

        for (offset, &value) in block.iter().enumerate() {
            let l = fl + offset % nl;
            let k = fk + offset / nl % nk;
            let j = fj + offset / (nl * nk) % nj;
            let i = fi + offset / (nl * nk * nj);

            self.set((i, j, k, l), value);
            if self.use_bra {
                self.set((j, i, k, l), value);
            }
            if self.use_ket {
                self.set((i, j, l, k), value);
            }
            if self.use_bra && self.use_ket {
                self.set((j, i, l, k), value);
            }
            if self.use_pairs {
                self.set((k, l, i, j), value);
                if self.use_bra {
                    self.set((k, l, j, i), value);
                }
                if self.use_ket {
                    self.set((l, k, i, j), value);
                }
                if self.use_bra && self.use_ket {
                    self.set((l, k, j, i), value);
                }
            }
        }
    }
}

fn compute_block(
    eri: &mut dyn TwoBodyInt,
    factory: &IntegralFactory,
    quartet: ShellQuartet,
) -> Result<Vec<f64>, IntegralError> {
    let [bs1, bs2, bs3, bs4] = factory.basis_sets();
    let size = bs1.shell(quartet.p).nfunction()
        * bs2.shell(quartet.q).nfunction()
        * bs3.shell(quartet.r).nfunction()
        * bs4.shell(quartet.s).nfunction();

    let mut block = vec![0.0; size];
    let count = eri.compute_shell(quartet.p, quartet.q, quartet.r, quartet.s, &mut block)?;
    log::trace!(
        "ERI block ({} {}|{} {}): {count} values",
        quartet.p,
        quartet.q,
        quartet.r,
        quartet.s
    );
    if count == 0 {
        block.clear();
    }
    Ok(block)
}

impl Index<(usize, usize, usize, usize)> for ElectronTensor {
    type Output = f64;

    fn index(&self, index: (usize, usize, usize, usize)) -> &Self::Output {
        &self.data[self.linear(index)]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use crate::basis::{BasisSet, Gaussian, Shell};

    use super::*;

    fn h2_like_basis() -> Arc<BasisSet> {
        let primitive = |center| {
            Shell::new(
                0,
                false,
                [Gaussian {
                    exponent: 1.24,
                    coefficient: 1.0,
                }],
                center,
            )
        };
        Arc::new(BasisSet::new(vec![
            primitive(Vector3::zeros()),
            primitive(Vector3::new(0.0, 0.0, 1.4)),
        ]))
    }

    #[test]
    fn tensor_is_eightfold_symmetric() {
        let bs = h2_like_basis();
        let factory = IntegralFactory::for_basis(bs).unwrap();
        let tensor = ElectronTensor::from_factory(&factory).unwrap();

        assert_eq!(tensor.dims(), [2; 4]);
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    for l in 0..2 {
                        let value = tensor[(i, j, k, l)];
                        assert_relative_eq!(value, tensor[(j, i, k, l)]);
                        assert_relative_eq!(value, tensor[(i, j, l, k)]);
                        assert_relative_eq!(value, tensor[(k, l, i, j)]);
                    }
                }
            }
        }
    }

    #[test]
    fn tensor_matches_direct_evaluation() {
        let bs = h2_like_basis();
        let factory = IntegralFactory::for_basis(bs).unwrap();
        let tensor = ElectronTensor::from_factory(&factory).unwrap();

        let mut eri = factory.eri(0, 0.0).unwrap();
        let mut out = [0.0];
        for (i, j, k, l) in itertools::iproduct!(0..2, 0..2, 0..2, 0..2) {
            eri.compute_shell(i, j, k, l, &mut out).unwrap();
            assert_relative_eq!(tensor[(i, j, k, l)], out[0], epsilon = 1e-12);
        }
    }

    #[test]
    fn diagonal_elements_are_positive() {
        let bs = h2_like_basis();
        let factory = IntegralFactory::for_basis(bs).unwrap();
        let tensor = ElectronTensor::from_factory(&factory).unwrap();

        for i in 0..2 {
            for j in 0..2 {
                assert!(tensor[(i, j, i, j)] > 0.0);
            }
        }
    }
}
