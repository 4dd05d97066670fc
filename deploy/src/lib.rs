pub mod builder;
pub mod config;
pub mod deploy;
pub mod snapshot;
pub mod types;

pub use builder::DeployBuilder;
pub use config::DeployConfig;
pub use deploy::{deploy, deploy_with_clock, derive_distributor_address, Deployment};
pub use snapshot::{ChainSnapshot, SNAPSHOT_KEY};
pub use types::*;
