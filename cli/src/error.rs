use got_deploy::DeployError;
use got_distributor::DistributorError;
use got_merkle::MerkleError;
use got_storage::StorageError;
use got_token::{Address, TokenError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("key file address {stored} does not match its secret key ({derived})")]
    KeyMismatch { stored: Address, derived: Address },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Distributor(#[from] DistributorError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("merkle error: {0}")]
    Merkle(#[from] MerkleError),
}
