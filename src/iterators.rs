//! Iteration over shell and basis-function combinations.
//!
//! Two-electron integrals are invariant under swapping the indices within
//! the bra pair, within the ket pair, and swapping the two pairs. The
//! iterators here skip combinations related by those permutations to one
//! already yielded, but only where the basis sets (or shells) in the
//! affected positions actually coincide; distinct sets get the full
//! product.

use std::sync::Arc;

use crate::basis::{BasisSet, Shell};

/// Canonical counter over index quadruples `(p, q, r, s)` with optional
/// triangular restrictions: `q <= p` when the bra slots coincide,
/// `s <= r` when the ket slots do, and pair-level ordering (`r <= p`,
/// plus `s <= q` at `r == p`) when bra and ket ranges coincide.
#[derive(Debug)]
struct QuartetCounter {
    n: [usize; 4],
    use_bra: bool,
    use_ket: bool,
    use_pairs: bool,
    p: usize,
    q: usize,
    r: usize,
    s: usize,
    exhausted: bool,
}

impl QuartetCounter {
    fn new(n: [usize; 4], use_bra: bool, use_ket: bool, use_pairs: bool) -> Self {
        Self {
            n,
            use_bra,
            use_ket,
            use_pairs,
            p: 0,
            q: 0,
            r: 0,
            s: 0,
            exhausted: n.iter().any(|&count| count == 0),
        }
    }

    fn q_limit(&self) -> usize {
        if self.use_bra {
            self.p
        } else {
            self.n[1] - 1
        }
    }

    fn r_limit(&self) -> usize {
        if self.use_pairs {
            self.p
        } else {
            self.n[2] - 1
        }
    }

    fn s_limit(&self) -> usize {
        let mut limit = if self.use_ket { self.r } else { self.n[3] - 1 };
        if self.use_pairs && self.r == self.p {
            limit = limit.min(self.q);
        }
        limit
    }

    fn next(&mut self) -> Option<(usize, usize, usize, usize)> {
        if self.exhausted {
            return None;
        }
        let current = (self.p, self.q, self.r, self.s);

        if self.s < self.s_limit() {
            self.s += 1;
        } else if self.r < self.r_limit() {
            self.r += 1;
            self.s = 0;
        } else if self.q < self.q_limit() {
            self.q += 1;
            self.r = 0;
            self.s = 0;
        } else if self.p + 1 < self.n[0] {
            self.p += 1;
            self.q = 0;
            self.r = 0;
            self.s = 0;
        } else {
            self.exhausted = true;
        }

        Some(current)
    }
}

/// A canonical quartet of shell indices, one per basis set slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShellQuartet {
    pub p: usize,
    pub q: usize,
    pub r: usize,
    pub s: usize,
}

/// Enumerates canonical shell quartets across up to four basis sets.
/// Transient; re-create per pass.
#[derive(Debug)]
pub struct ShellCombinationsIterator {
    counter: QuartetCounter,
}

impl ShellCombinationsIterator {
    pub fn new(
        bs1: &Arc<BasisSet>,
        bs2: &Arc<BasisSet>,
        bs3: &Arc<BasisSet>,
        bs4: &Arc<BasisSet>,
    ) -> Self {
        let use_bra = Arc::ptr_eq(bs1, bs2);
        let use_ket = Arc::ptr_eq(bs3, bs4);
        let use_pairs = Arc::ptr_eq(bs1, bs3) && Arc::ptr_eq(bs2, bs4);

        Self {
            counter: QuartetCounter::new(
                [bs1.nshell(), bs2.nshell(), bs3.nshell(), bs4.nshell()],
                use_bra,
                use_ket,
                use_pairs,
            ),
        }
    }
}

impl Iterator for ShellCombinationsIterator {
    type Item = ShellQuartet;

    fn next(&mut self) -> Option<Self::Item> {
        self.counter.next().map(|(p, q, r, s)| ShellQuartet { p, q, r, s })
    }
}

/// A canonical pair of shell indices for one-body loops.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShellPair {
    pub p: usize,
    pub q: usize,
}

/// Enumerates canonical shell pairs across two basis sets: `q <= p` when
/// both slots hold the same set, the full product otherwise.
#[derive(Debug)]
pub struct ShellPairsIterator {
    n1: usize,
    n2: usize,
    triangular: bool,
    p: usize,
    q: usize,
}

impl ShellPairsIterator {
    pub fn new(bs1: &Arc<BasisSet>, bs2: &Arc<BasisSet>) -> Self {
        Self {
            n1: bs1.nshell(),
            n2: bs2.nshell(),
            triangular: Arc::ptr_eq(bs1, bs2),
            p: 0,
            q: 0,
        }
    }
}

impl Iterator for ShellPairsIterator {
    type Item = ShellPair;

    fn next(&mut self) -> Option<Self::Item> {
        if self.p >= self.n1 || self.n2 == 0 {
            return None;
        }
        let pair = ShellPair {
            p: self.p,
            q: self.q,
        };

        let q_limit = if self.triangular { self.p } else { self.n2 - 1 };
        if self.q < q_limit {
            self.q += 1;
        } else {
            self.q = 0;
            self.p += 1;
        }

        Some(pair)
    }
}

/// A quadruple of absolute basis-function indices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FunctionQuartet {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
}

/// One slot of an [`IntegralsIterator`]: a shell plus its identity (which
/// basis set it came from and at which position).
#[derive(Clone)]
pub struct ShellSlot<'a> {
    pub basis: &'a Arc<BasisSet>,
    pub shell_index: usize,
}

impl ShellSlot<'_> {
    fn shell(&self) -> &Shell {
        self.basis.shell(self.shell_index)
    }

    fn first_function(&self) -> usize {
        self.basis.shell_to_function(self.shell_index)
    }

    fn same_shell(&self, other: &Self) -> bool {
        Arc::ptr_eq(self.basis, other.basis) && self.shell_index == other.shell_index
    }
}

/// Enumerates the canonical basis-function quadruples within one shell
/// quartet, i.e. the per-function refinement of
/// [`ShellCombinationsIterator`].
#[derive(Debug)]
pub struct IntegralsIterator {
    counter: QuartetCounter,
    offsets: [usize; 4],
}

impl IntegralsIterator {
    pub fn new(slots: [ShellSlot<'_>; 4]) -> Self {
        let use_bra = slots[0].same_shell(&slots[1]);
        let use_ket = slots[2].same_shell(&slots[3]);
        let use_pairs = slots[0].same_shell(&slots[2]) && slots[1].same_shell(&slots[3]);

        let n = [
            slots[0].shell().nfunction(),
            slots[1].shell().nfunction(),
            slots[2].shell().nfunction(),
            slots[3].shell().nfunction(),
        ];
        let offsets = [
            slots[0].first_function(),
            slots[1].first_function(),
            slots[2].first_function(),
            slots[3].first_function(),
        ];

        Self {
            counter: QuartetCounter::new(n, use_bra, use_ket, use_pairs),
            offsets,
        }
    }
}

impl Iterator for IntegralsIterator {
    type Item = FunctionQuartet;

    fn next(&mut self) -> Option<Self::Item> {
        self.counter.next().map(|(p, q, r, s)| FunctionQuartet {
            i: self.offsets[0] + p,
            j: self.offsets[1] + q,
            k: self.offsets[2] + r,
            l: self.offsets[3] + s,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nalgebra::Vector3;

    use crate::basis::{Gaussian, Shell};

    use super::*;

    fn basis(nshell: usize) -> Arc<BasisSet> {
        let gaussian = Gaussian {
            exponent: 1.0,
            coefficient: 1.0,
        };
        Arc::new(BasisSet::new(
            (0..nshell)
                .map(|i| Shell::new(i % 2, false, [gaussian], Vector3::zeros()))
                .collect(),
        ))
    }

    /// Canonical representative of a quartet under the two-electron
    /// permutation symmetry.
    fn canonical((p, q, r, s): (usize, usize, usize, usize)) -> (usize, usize, usize, usize) {
        let (p, q) = if p >= q { (p, q) } else { (q, p) };
        let (r, s) = if r >= s { (r, s) } else { (s, r) };
        if (p, q) >= (r, s) {
            (p, q, r, s)
        } else {
            (r, s, p, q)
        }
    }

    #[test]
    fn identical_sets_reduce_to_canonical_quartets() {
        let bs = basis(2);
        let quartets: Vec<_> = ShellCombinationsIterator::new(&bs, &bs, &bs, &bs).collect();

        assert_eq!(quartets.len(), 6);
        assert!(quartets.len() < 2usize.pow(4));

        // every omitted combination is a permutation image of a yielded one
        let yielded: HashSet<_> = quartets
            .iter()
            .map(|quartet| (quartet.p, quartet.q, quartet.r, quartet.s))
            .collect();
        for p in 0..2 {
            for q in 0..2 {
                for r in 0..2 {
                    for s in 0..2 {
                        assert!(
                            yielded.contains(&canonical((p, q, r, s))),
                            "({p}{q}|{r}{s}) has no canonical representative"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn identical_sets_larger_count() {
        let bs = basis(4);
        let npair = 4 * 5 / 2;
        let expected = npair * (npair + 1) / 2;
        assert_eq!(
            ShellCombinationsIterator::new(&bs, &bs, &bs, &bs).count(),
            expected
        );
    }

    #[test]
    fn distinct_sets_get_full_product() {
        // equal contents, distinct objects: no reduction applies
        let bs_a = basis(2);
        let bs_b = basis(2);
        let bs_c = basis(3);
        let bs_d = basis(2);
        assert_eq!(
            ShellCombinationsIterator::new(&bs_a, &bs_b, &bs_c, &bs_d).count(),
            2 * 2 * 3 * 2
        );
    }

    #[test]
    fn mixed_reduction() {
        // same set in the bra, distinct in the ket
        let bs_a = basis(3);
        let bs_b = basis(2);
        let bs_c = basis(2);
        assert_eq!(
            ShellCombinationsIterator::new(&bs_a, &bs_a, &bs_b, &bs_c).count(),
            (3 * 4 / 2) * 2 * 2
        );
    }

    #[test]
    fn pairs_iterator_triangular() {
        let bs = basis(2);
        let pairs: Vec<_> = ShellPairsIterator::new(&bs, &bs).collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(
            pairs,
            [
                ShellPair { p: 0, q: 0 },
                ShellPair { p: 1, q: 0 },
                ShellPair { p: 1, q: 1 }
            ]
        );

        let other = basis(2);
        assert_eq!(ShellPairsIterator::new(&bs, &other).count(), 4);
    }

    #[test]
    fn integrals_iterator_within_one_shell() {
        // a single p shell in all four slots: 3 functions, canonical
        // quadruples = pair-of-pairs count over 6 function pairs
        let gaussian = Gaussian {
            exponent: 1.0,
            coefficient: 1.0,
        };
        let bs = Arc::new(BasisSet::new(vec![Shell::new(
            1,
            false,
            [gaussian],
            Vector3::zeros(),
        )]));

        let slot = ShellSlot {
            basis: &bs,
            shell_index: 0,
        };
        let quadruples: Vec<_> =
            IntegralsIterator::new([slot.clone(), slot.clone(), slot.clone(), slot]).collect();

        let npair = 3 * 4 / 2;
        assert_eq!(quadruples.len(), npair * (npair + 1) / 2);

        let distinct: HashSet<_> = quadruples
            .iter()
            .map(|quartet| (quartet.i, quartet.j, quartet.k, quartet.l))
            .collect();
        assert_eq!(distinct.len(), quadruples.len());
    }

    #[test]
    fn integrals_iterator_distinct_shells() {
        let bs = basis(2);
        let slots = [
            ShellSlot {
                basis: &bs,
                shell_index: 0,
            },
            ShellSlot {
                basis: &bs,
                shell_index: 1,
            },
            ShellSlot {
                basis: &bs,
                shell_index: 0,
            },
            ShellSlot {
                basis: &bs,
                shell_index: 1,
            },
        ];
        // shells (s, p, s, p): bra and ket ranges coincide pairwise, so the
        // pair-of-pairs reduction applies but no in-pair reduction does
        let count = IntegralsIterator::new(slots).count();
        let npair = 3; // 1 s function times 3 p functions
        assert_eq!(count, npair * (npair + 1) / 2);

        // absolute indices must be offset by the shell's first function
        let slots = [
            ShellSlot {
                basis: &bs,
                shell_index: 1,
            },
            ShellSlot {
                basis: &bs,
                shell_index: 1,
            },
            ShellSlot {
                basis: &bs,
                shell_index: 1,
            },
            ShellSlot {
                basis: &bs,
                shell_index: 1,
            },
        ];
        for quartet in IntegralsIterator::new(slots) {
            for index in [quartet.i, quartet.j, quartet.k, quartet.l] {
                assert!((1..4).contains(&index));
            }
        }
    }
}
