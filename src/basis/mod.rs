mod functions;
mod set;

pub use functions::{Gaussian, Shell};
pub use set::BasisSet;
