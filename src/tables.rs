//! Process-wide numeric tables shared by every integral kernel.
//!
//! The tables are computed once on first access and read-only afterwards,
//! so they can be shared across threads without locking.

use std::sync::OnceLock;

/// Number of entries in the triangular index table.
pub const MAX_IOFF: usize = 4096;
/// Number of entries in the double factorial table.
pub const MAX_DF: usize = 64;
/// Side length of the binomial coefficient table.
pub const MAX_BC: usize = 32;
/// Number of entries in the factorial table.
pub const MAX_FAC: usize = 32;

/// Precomputed factorial, double factorial, binomial and triangular index
/// tables. Indexing past the `MAX_*` bounds panics; callers are expected to
/// stay within them.
pub struct Tables {
    /// `ioff[i] = i * (i + 1) / 2`
    pub ioff: Vec<usize>,
    /// `df[i] = (i - 1)!!` with `df[0] = df[1] = df[2] = 1`
    pub df: Vec<f64>,
    /// `bc[i][j] = C(i, j)` for `j <= i`, zero above the diagonal
    pub bc: Vec<[f64; MAX_BC]>,
    /// `fac[i] = i!`
    pub fac: Vec<f64>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Returns the shared numeric tables, computing them on first call.
pub fn tables() -> &'static Tables {
    TABLES.get_or_init(Tables::compute)
}

/// Forces initialization of the shared tables. Idempotent; subsequent calls
/// are no-ops.
pub fn initialize_singletons() {
    let _ = tables();
}

impl Tables {
    fn compute() -> Self {
        let mut ioff = vec![0usize; MAX_IOFF];
        for i in 1..MAX_IOFF {
            ioff[i] = ioff[i - 1] + i;
        }

        let mut df = vec![1.0f64; MAX_DF];
        for i in 3..MAX_DF {
            df[i] = (i - 1) as f64 * df[i - 2];
        }

        let mut bc = vec![[0.0f64; MAX_BC]; MAX_BC];
        for (i, row) in bc.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate().take(i + 1) {
                *entry = combinations(i, j);
            }
        }

        let mut fac = vec![1.0f64; MAX_FAC];
        for i in 1..MAX_FAC {
            fac[i] = i as f64 * fac[i - 1];
        }

        Self { ioff, df, bc, fac }
    }

    /// Composite index of the pair `(i, j)` with `i >= j` in a lower
    /// triangular packing.
    #[inline]
    pub fn pair_index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i >= j);
        self.ioff[i] + j
    }
}

/// `n` choose `k`, evaluated as a running product to stay exact for the
/// table range.
pub fn combinations(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result.round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangular_index_is_cumulative_sum() {
        let t = tables();
        assert_eq!(t.ioff[0], 0);
        for i in 1..64 {
            assert_eq!(t.ioff[i], t.ioff[i - 1] + i);
            assert_eq!(t.ioff[i], i * (i + 1) / 2);
        }
    }

    #[test]
    fn double_factorial_matches_closed_form() {
        let t = tables();
        // df[i] = (i - 1)!!
        assert_eq!(t.df[0], 1.0);
        assert_eq!(t.df[1], 1.0);
        assert_eq!(t.df[2], 1.0);
        assert_eq!(t.df[3], 2.0);
        assert_eq!(t.df[4], 3.0);
        assert_eq!(t.df[5], 8.0);
        assert_eq!(t.df[6], 15.0);
        assert_eq!(t.df[7], 48.0);
        assert_eq!(t.df[8], 105.0);

        for k in 2..16 {
            // odd arguments: df[2k + 1] = (2k)!!
            let even: f64 = (1..=k).map(|m| (2 * m) as f64).product();
            assert_eq!(t.df[2 * k + 1], even);
            // even arguments: df[2k] = (2k - 1)!!
            let odd: f64 = (1..=k).map(|m| (2 * m - 1) as f64).product();
            assert_eq!(t.df[2 * k], odd);
        }
    }

    #[test]
    fn binomial_table_is_symmetric() {
        let t = tables();
        for i in 0..MAX_BC {
            assert_eq!(t.bc[i][0], 1.0);
            assert_eq!(t.bc[i][i], 1.0);
            for j in 0..=i {
                assert_eq!(t.bc[i][j], t.bc[i][i - j], "C({i},{j})");
            }
        }
        // Pascal's rule on interior entries
        for i in 2..MAX_BC {
            for j in 1..i {
                assert_eq!(t.bc[i][j], t.bc[i - 1][j - 1] + t.bc[i - 1][j]);
            }
        }
    }

    #[test]
    fn factorial_table() {
        let t = tables();
        assert_eq!(t.fac[0], 1.0);
        assert_eq!(t.fac[5], 120.0);
        assert_eq!(t.fac[10], 3628800.0);
    }

    #[test]
    fn initialize_is_idempotent() {
        initialize_singletons();
        initialize_singletons();
        assert_eq!(tables().ioff[3], 6);
    }
}
