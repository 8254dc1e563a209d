use serde::{Deserialize, Serialize};

use super::Shell;

/// An ordered sequence of [`Shell`]s. Basis sets are shared between
/// factories and evaluators through `Arc<BasisSet>`; the same set may
/// occupy several factory slots at once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasisSet {
    shells: Vec<Shell>,
    /// First basis function index of each shell.
    function_offsets: Vec<usize>,
    nbf: usize,
    max_am: usize,
}

impl BasisSet {
    pub fn new(shells: Vec<Shell>) -> Self {
        let mut function_offsets = Vec::with_capacity(shells.len());
        let mut nbf = 0;
        let mut max_am = 0;
        for shell in &shells {
            function_offsets.push(nbf);
            nbf += shell.nfunction();
            max_am = max_am.max(shell.am());
        }

        Self {
            shells,
            function_offsets,
            nbf,
            max_am,
        }
    }

    pub fn nshell(&self) -> usize {
        self.shells.len()
    }

    /// Total number of basis functions across all shells.
    pub fn nbf(&self) -> usize {
        self.nbf
    }

    /// Maximum angular momentum over the shells.
    pub fn max_am(&self) -> usize {
        self.max_am
    }

    pub fn shell(&self, index: usize) -> &Shell {
        &self.shells[index]
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    /// Index of the first basis function of shell `index`.
    pub fn shell_to_function(&self, index: usize) -> usize {
        self.function_offsets[index]
    }
}
