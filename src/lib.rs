//! Gaussian integral engine: basis shells, Cartesian and spherical
//! component machinery, and one- and two-electron integral evaluators,
//! dispatched through an [`IntegralFactory`].

pub mod basis;
pub mod cartesian;
pub mod error;
pub mod factory;
pub mod integrals;
pub mod iterators;
pub mod rotation;
pub mod spherical;
pub mod tables;

pub use error::IntegralError;
pub use factory::IntegralFactory;

pub mod testing {
    use std::{error::Error, fs::File, path::Path};

    use serde::{Deserialize, Serialize};

    use crate::basis::BasisSet;

    /// A named basis set snapshot, serialized to JSON so integral test
    /// cases can be pinned to disk and reloaded.
    #[derive(Serialize, Deserialize)]
    pub struct TestInstance {
        pub name: String,
        basis_set: BasisSet,
    }

    impl TestInstance {
        pub fn new(name: String, basis_set: BasisSet) -> Self {
            Self { name, basis_set }
        }

        pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
            Ok(serde_json::to_writer(
                File::options()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(path)?,
                self,
            )?)
        }

        pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
            Ok(serde_json::from_reader(File::open(path)?)?)
        }

        pub fn basis_set(&self) -> &BasisSet {
            &self.basis_set
        }
    }
}
