//! Enumeration of Cartesian angular momentum components.
//!
//! The canonical ordering for angular momentum `l` runs lexicographically by
//! decreasing x exponent: `(l, 0, 0), (l-1, 1, 0), (l-1, 0, 1), ...,
//! (0, 0, l)`. Other components index integral blocks by position in this
//! sequence, so the ordering is a contract.

use smallvec::SmallVec;

/// Number of Cartesian components of angular momentum `l`.
#[inline]
pub fn ncartesian(l: usize) -> usize {
    (l + 1) * (l + 2) / 2
}

/// Position of the exponent triple `(a, b, c)` (with `a + b + c = l`) in
/// the canonical ordering.
#[inline]
pub fn cartesian_index(l: usize, a: usize, c: usize) -> usize {
    let i = l - a;
    i * (i + 1) / 2 + c
}

/// Normalization ratio of each canonical component relative to the
/// `(l, 0, 0)` component: `sqrt((2l-1)!! / ((2a-1)!!(2b-1)!!(2c-1)!!))`.
/// Shells fold the `(l, 0, 0)` constant into their coefficients, so
/// multiplying by this ratio normalizes every component individually.
pub(crate) fn component_norms(l: usize) -> Vec<f64> {
    let t = crate::tables::tables();
    CartesianIter::new(l)
        .map(|component| (t.df[2 * l] / (t.df[2 * component.a] * t.df[2 * component.b] * t.df[2 * component.c])).sqrt())
        .collect()
}

/// One Cartesian component: exponents of x, y and z plus the position in
/// the canonical ordering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CartesianComponent {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub index: usize,
}

impl CartesianComponent {
    pub fn exponents(&self) -> [usize; 3] {
        [self.a, self.b, self.c]
    }

    /// A representative axis string: `a` copies of x, then `b` of y, then
    /// `c` of z. Axes are numbered x = 0, y = 1, z = 2.
    pub fn axes(&self) -> SmallVec<[u8; 12]> {
        let mut axes = SmallVec::new();
        for (axis, &count) in [self.a, self.b, self.c].iter().enumerate() {
            for _ in 0..count {
                axes.push(axis as u8);
            }
        }
        axes
    }
}

/// Enumerates the `(l + 1)(l + 2) / 2` canonical components of a single
/// angular momentum.
#[derive(Clone, Debug)]
pub struct CartesianIter {
    l: usize,
    i: usize,
    j: usize,
    index: usize,
}

impl CartesianIter {
    pub fn new(l: usize) -> Self {
        Self {
            l,
            i: 0,
            j: 0,
            index: 0,
        }
    }

    pub fn n(&self) -> usize {
        ncartesian(self.l)
    }
}

impl Iterator for CartesianIter {
    type Item = CartesianComponent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.i > self.l {
            return None;
        }

        let component = CartesianComponent {
            a: self.l - self.i,
            b: self.i - self.j,
            c: self.j,
            index: self.index,
        };

        self.index += 1;
        if self.j < self.i {
            self.j += 1;
        } else {
            self.j = 0;
            self.i += 1;
        }

        Some(component)
    }
}

/// An explicit ordering of `l` axes, as yielded by the redundant iterators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisOrdering {
    axes: SmallVec<[u8; 12]>,
}

impl AxisOrdering {
    /// Axis at position `k` (x = 0, y = 1, z = 2).
    pub fn axis(&self, k: usize) -> usize {
        self.axes[k] as usize
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Exponent counts `(a, b, c)` of this ordering.
    pub fn exponents(&self) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for &axis in &self.axes {
            counts[axis as usize] += 1;
        }
        counts
    }

    /// Canonical index of the component this ordering belongs to.
    pub fn bfn(&self) -> usize {
        let [a, _, c] = self.exponents();
        cartesian_index(self.axes.len(), a, c)
    }
}

/// Enumerates every ordering of `l` axes, `3^l` in total. Needed where the
/// per-axis history matters, e.g. rotations and derivative bookkeeping.
#[derive(Debug)]
pub struct RedundantCartesianIter {
    axes: SmallVec<[u8; 12]>,
    done: bool,
}

impl RedundantCartesianIter {
    pub fn new(l: usize) -> Self {
        Self {
            axes: SmallVec::from_elem(0, l),
            done: false,
        }
    }
}

impl Iterator for RedundantCartesianIter {
    type Item = AxisOrdering;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = AxisOrdering {
            axes: self.axes.clone(),
        };

        // base-3 counter, last axis fastest
        self.done = true;
        for digit in self.axes.iter_mut().rev() {
            if *digit < 2 {
                *digit += 1;
                self.done = false;
                break;
            }
            *digit = 0;
        }

        Some(item)
    }
}

/// Enumerates the `l! / (a! b! c!)` orderings of a fixed exponent triple.
#[derive(Debug)]
pub struct RedundantCartesianSubIter {
    inner: RedundantCartesianIter,
    exponents: [usize; 3],
}

impl RedundantCartesianSubIter {
    pub fn new(l: usize, a: usize, b: usize, c: usize) -> Self {
        debug_assert_eq!(a + b + c, l);
        Self {
            inner: RedundantCartesianIter::new(l),
            exponents: [a, b, c],
        }
    }
}

impl Iterator for RedundantCartesianSubIter {
    type Item = AxisOrdering;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find(|ordering| ordering.exponents() == self.exponents)
    }
}
