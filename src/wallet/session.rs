use donations_sdk::Network;

use super::persister::{PersistedSession, SessionPersister};
use super::provider::WalletProvider;
use super::types::{
    supported_wallets, AvailableWallet, SessionSnapshot, WalletAccount, WalletId, WalletStatus,
};
use super::WalletError;

/// The connected-wallet context passed explicitly to views and commands.
pub struct WalletSession {
    network: Network,
    providers: Vec<Box<dyn WalletProvider>>,
    active_wallet: Option<WalletId>,
    accounts: Vec<WalletAccount>,
    active_address: Option<String>,
    persister: Option<SessionPersister>,
}

impl WalletSession {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            providers: Vec::new(),
            active_wallet: None,
            accounts: Vec::new(),
            active_address: None,
            persister: None,
        }
    }

    pub fn with_persister(mut self, persister: SessionPersister) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Register a provider. Replaces an existing provider with the same id.
    pub fn register(&mut self, provider: Box<dyn WalletProvider>) {
        let id = provider.id();
        self.providers.retain(|p| p.id() != id);
        self.providers.push(provider);
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn active_address(&self) -> Option<&str> {
        self.active_address.as_deref()
    }

    pub fn accounts(&self) -> &[WalletAccount] {
        &self.accounts
    }

    pub fn is_connected(&self) -> bool {
        self.active_address.is_some()
    }

    pub fn status(&self) -> WalletStatus {
        if self.is_connected() {
            WalletStatus::Connected
        } else {
            WalletStatus::Disconnected
        }
    }

    pub fn available_wallets(&self) -> Vec<AvailableWallet> {
        supported_wallets(self.network)
            .into_iter()
            .map(|id| AvailableWallet {
                id,
                name: id.display_name().to_string(),
                installed: self.providers.iter().any(|p| p.id() == id),
            })
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status(),
            active_wallet: self.active_wallet,
            active_address: self.active_address.clone(),
            accounts: self.accounts.clone(),
            available_wallets: self.available_wallets(),
        }
    }

    fn provider_mut(&mut self, id: WalletId) -> Option<&mut Box<dyn WalletProvider>> {
        self.providers.iter_mut().find(|p| p.id() == id)
    }

    /// Connect through `id` and make its first account active.
    pub fn connect(&mut self, id: WalletId) -> Result<&str, WalletError> {
        if !supported_wallets(self.network).contains(&id) {
            return Err(WalletError::Unsupported(id, self.network));
        }
        let provider = self
            .provider_mut(id)
            .ok_or(WalletError::ConnectFailed(id))?;

        let accounts = provider.connect().map_err(|e| {
            log::error!("wallet connection error ({}): {e}", id.as_str());
            WalletError::ConnectFailed(id)
        })?;
        let first = accounts
            .first()
            .map(|a| a.address.clone())
            .ok_or(WalletError::ConnectFailed(id))?;

        if let Some(previous) = self.active_wallet.filter(|p| *p != id) {
            if let Some(p) = self.provider_mut(previous) {
                let _ = p.disconnect();
            }
        }

        self.active_wallet = Some(id);
        self.accounts = accounts;
        self.active_address = Some(first);
        self.persist();
        log::info!("connected {} ({} accounts)", id.as_str(), self.accounts.len());

        Ok(self.active_address.as_deref().unwrap_or_default())
    }

    /// Switch the active address to another account of the connected wallet.
    pub fn set_active_account(&mut self, address: &str) -> Result<(), WalletError> {
        if self.active_wallet.is_none() {
            return Err(WalletError::NotConnected);
        }
        if !self.accounts.iter().any(|a| a.address == address) {
            log::error!("address change error: {address} is not a connected account");
            return Err(WalletError::AccountChange);
        }
        self.active_address = Some(address.to_string());
        self.persist();
        Ok(())
    }

    /// Disconnect the active wallet and forget the persisted session.
    pub fn disconnect(&mut self) -> Result<(), WalletError> {
        if let Some(id) = self.active_wallet {
            if let Some(p) = self.provider_mut(id) {
                p.disconnect().map_err(|e| {
                    log::error!("disconnect error: {e}");
                    WalletError::Disconnect
                })?;
            }
        }
        self.active_wallet = None;
        self.accounts.clear();
        self.active_address = None;
        if let Some(persister) = &self.persister {
            persister.clear()?;
        }
        Ok(())
    }

    /// Reconnect the wallet recorded in the persisted session, if any.
    ///
    /// A stale session (unknown wallet, vanished account) is cleared rather
    /// than reported.
    pub fn restore(&mut self) -> Result<bool, WalletError> {
        let saved = match &self.persister {
            Some(p) => p.load()?,
            None => None,
        };
        let Some(saved) = saved else {
            return Ok(false);
        };

        if self.connect(saved.wallet_id).is_err()
            || self.set_active_account(&saved.active_address).is_err()
        {
            log::warn!(
                "dropping stale wallet session for {}",
                saved.wallet_id.as_str()
            );
            self.disconnect()?;
            return Ok(false);
        }
        Ok(true)
    }

    fn persist(&self) {
        let (Some(persister), Some(wallet_id), Some(address)) =
            (&self.persister, self.active_wallet, &self.active_address)
        else {
            return;
        };
        let session = PersistedSession {
            wallet_id,
            active_address: address.clone(),
            connected_at: chrono::Utc::now().to_rfc3339(),
        };
        if let Err(e) = persister.save(&session) {
            log::warn!("failed to persist wallet session: {e}");
        }
    }
}
