use super::types::{WalletAccount, WalletId};
use super::WalletError;

/// One wallet backend behind the common connect/disconnect interface.
pub trait WalletProvider: Send {
    fn id(&self) -> WalletId;

    /// Connect and return the accounts the wallet exposes.
    fn connect(&mut self) -> Result<Vec<WalletAccount>, WalletError>;

    fn disconnect(&mut self) -> Result<(), WalletError>;

    /// Accounts of the current connection (empty when disconnected).
    fn accounts(&self) -> Vec<WalletAccount>;

    fn is_connected(&self) -> bool {
        !self.accounts().is_empty()
    }
}

/// In-process provider for localnet development wallets.
pub struct LocalWalletProvider {
    id: WalletId,
    accounts: Vec<WalletAccount>,
    connected: bool,
}

impl LocalWalletProvider {
    pub fn new(id: WalletId, accounts: Vec<WalletAccount>) -> Self {
        Self {
            id,
            accounts,
            connected: false,
        }
    }
}

impl WalletProvider for LocalWalletProvider {
    fn id(&self) -> WalletId {
        self.id
    }

    fn connect(&mut self) -> Result<Vec<WalletAccount>, WalletError> {
        if self.accounts.is_empty() {
            return Err(WalletError::Provider(format!(
                "{} has no accounts",
                self.id.display_name()
            )));
        }
        self.connected = true;
        Ok(self.accounts.clone())
    }

    fn disconnect(&mut self) -> Result<(), WalletError> {
        self.connected = false;
        Ok(())
    }

    fn accounts(&self) -> Vec<WalletAccount> {
        if self.connected {
            self.accounts.clone()
        } else {
            Vec::new()
        }
    }
}
