pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "s3")]
pub use config::s3::S3Storage;

pub use adapters::{HttpProvisioner, SimulatedProvisioner};
pub use config::env::{DeployConfig, EndpointMode};
pub use config::storage::LocalStorage;
pub use config::toml_config::TomlConfig;
pub use core::assembly::CloudAssembly;
pub use core::composition::{Composition, CompositionRoot, DeploymentIdentity};
pub use core::graph::CompositionGraph;
pub use utils::error::{DeployError, Result};
