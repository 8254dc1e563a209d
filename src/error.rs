use thiserror::Error;

/// Errors reported by the integral engine. All computation here is
/// deterministic, so every variant indicates a caller-side problem that has
/// to be fixed before re-invoking.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegralError {
    /// A requested feature exists in the interface but has no
    /// implementation in this crate.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A transform or rotation was requested for an angular momentum above
    /// what the factory provisioned at construction.
    #[error("angular momentum {requested} exceeds provisioned maximum {provisioned}")]
    MaxAngularMomentumExceeded { requested: usize, provisioned: usize },

    /// A shell index outside the basis set was passed to an evaluator or
    /// iterator factory method.
    #[error("shell index {index} out of range for basis set with {nshell} shells")]
    ShellOutOfRange { index: usize, nshell: usize },

    /// The caller-supplied output buffer cannot hold the integral block.
    #[error("output buffer holds {got} values but {needed} are required")]
    BufferTooSmall { needed: usize, got: usize },

    /// A derivative order this core does not provide recursions for.
    #[error("derivative order {0} is not supported")]
    UnsupportedDerivative(usize),

    /// A basis set slot was assigned a basis set without any shells.
    #[error("basis set in slot {slot} contains no shells")]
    EmptyBasisSet { slot: usize },
}
