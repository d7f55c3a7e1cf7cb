pub mod persister;
pub mod provider;
pub mod session;
pub mod types;

use donations_sdk::Network;
use thiserror::Error;

pub use persister::{load_or_generate_dev_accounts, PersistedSession, SessionPersister};
pub use provider::{LocalWalletProvider, WalletProvider};
pub use session::WalletSession;
pub use types::{WalletAccount, WalletId, WalletStatus};

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Failed to connect to {0}. Please try again.")]
    ConnectFailed(WalletId),

    #[error("Failed to change address. Please try again.")]
    AccountChange,

    #[error("Failed to disconnect wallet.")]
    Disconnect,

    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("{0} is not available on {1}")]
    Unsupported(WalletId, Network),

    #[error("Wallet provider error: {0}")]
    Provider(String),

    #[error("Session persistence error: {0}")]
    Persist(#[from] persister::SessionPersistError),
}
