pub mod assembly;
pub mod composition;
pub mod graph;
pub mod units;

pub use crate::domain::model::{DeploymentOutputs, ProvisioningUnit, UnitId};
pub use crate::domain::ports::{Provisioner, Storage};
pub use crate::utils::error::Result;
