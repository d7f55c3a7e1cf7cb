use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use donations_sdk::LocalContract;
use serde::Serialize;

use crate::config::AppConfig;
use crate::notifications::{Notification, Notifier};
use crate::wallet::types::SessionSnapshot;
use crate::wallet::{
    load_or_generate_dev_accounts, LocalWalletProvider, SessionPersister, WalletId, WalletSession,
};
use crate::Network;

const CONFIG_FILE: &str = "network_config.json";
const LEDGER_FILE: &str = "ledger.json";
const NOTIFICATIONS_FILE: &str = "notifications.json";
const DEV_ACCOUNT_COUNT: usize = 3;

// ============================================================================
// Network status & app state (sent to views and the CLI)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub network: String,
    pub is_mainnet: bool,
    pub node_url: String,
    pub contract_available: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub revision: u64,
    pub network_status: NetworkStatus,
    pub wallet: SessionSnapshot,
    pub notifications: Vec<Notification>,
}

// ============================================================================
// App state manager
// ============================================================================

pub struct AppStateManager {
    app_data_dir: PathBuf,
    node_url_override: Option<String>,
    network: Option<Network>,
    session: Option<WalletSession>,
    contract: Option<Arc<LocalContract>>,
    notifier: Notifier,
    revision: u64,
}

impl AppStateManager {
    /// Create a manager over `app_data_dir`, picking up the saved
    /// notification queue.
    pub fn new(app_data_dir: PathBuf) -> Self {
        let notifier = Notifier::load(&app_data_dir.join(NOTIFICATIONS_FILE)).unwrap_or_else(|e| {
            log::warn!("discarding saved notifications: {e}");
            Notifier::new()
        });
        Self {
            app_data_dir,
            node_url_override: None,
            network: None,
            session: None,
            contract: None,
            notifier,
            revision: 0,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut manager = Self::new(config.data_dir.clone());
        manager.node_url_override = config.node_url.clone();
        manager.initialize(config.network);
        manager
    }

    /// Select the network (explicit choice, then saved config, then
    /// localnet) and build the session and contract client for it.
    ///
    /// An explicit choice is not persisted; only [`set_network`](Self::set_network) is.
    pub fn initialize(&mut self, explicit: Option<Network>) {
        let network = explicit
            .or_else(|| self.load_network_config())
            .unwrap_or(Network::LocalNet);
        if explicit.is_none() && self.is_first_launch() {
            log::info!("no saved network choice, starting on {network}");
        }
        self.init_with_network(network);
    }

    pub fn is_first_launch(&self) -> bool {
        !self.app_data_dir.join(CONFIG_FILE).exists()
    }

    pub fn is_initialized(&self) -> bool {
        self.network.is_some()
    }

    pub fn network(&self) -> Option<Network> {
        self.network
    }

    pub fn set_network(&mut self, network: Network) -> AppState {
        self.save_network_config(network);
        if let Some(session) = self.session.as_mut() {
            if session.network() != network {
                let _ = session.disconnect();
            }
        }
        self.init_with_network(network);
        self.bump_revision();
        self.snapshot()
    }

    fn init_with_network(&mut self, network: Network) {
        self.network = Some(network);
        self.contract = self.open_contract(network);

        let mut session = WalletSession::new(network)
            .with_persister(SessionPersister::new(&self.app_data_dir, network.as_str()));
        if network.is_localnet() {
            match load_or_generate_dev_accounts(
                &self.app_data_dir,
                network.as_str(),
                DEV_ACCOUNT_COUNT,
            ) {
                Ok(accounts) => {
                    session.register(Box::new(LocalWalletProvider::new(WalletId::Kmd, accounts)))
                }
                Err(e) => log::warn!("failed to load localnet dev accounts: {e}"),
            }
        }
        match session.restore() {
            Ok(true) => log::info!("restored wallet session on {network}"),
            Ok(false) => {}
            Err(e) => log::warn!("failed to restore wallet session: {e}"),
        }
        self.session = Some(session);
    }

    fn open_contract(&self, network: Network) -> Option<Arc<LocalContract>> {
        if !network.is_localnet() {
            log::warn!(
                "no contract client for {network} ({}); only localnet is served in-process",
                self.node_url(network)
            );
            return None;
        }
        let path = self.app_data_dir.join(network.as_str()).join(LEDGER_FILE);
        match LocalContract::open(&path) {
            Ok(contract) => Some(Arc::new(contract)),
            Err(e) => {
                log::warn!("failed to open ledger at {}: {e}", path.display());
                None
            }
        }
    }

    fn node_url(&self, network: Network) -> String {
        self.node_url_override
            .clone()
            .unwrap_or_else(|| network.default_node_url().to_string())
    }

    pub fn session_mut(&mut self) -> Option<&mut WalletSession> {
        self.session.as_mut()
    }

    pub fn active_address(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.active_address())
            .map(str::to_string)
    }

    /// The deployed contract, regardless of wallet state.
    pub fn contract(&self) -> Option<Arc<LocalContract>> {
        self.contract.clone()
    }

    /// The contract client bound to the connected wallet. `None` until a
    /// wallet is connected.
    pub fn client(&self) -> Option<Arc<LocalContract>> {
        self.active_address().and(self.contract.clone())
    }

    /// Apply `change` to the notification queue and save the result.
    pub fn update_notifications<T>(&mut self, change: impl FnOnce(&mut Notifier) -> T) -> T {
        let out = change(&mut self.notifier);
        if let Err(e) = self.notifier.save(&self.app_data_dir.join(NOTIFICATIONS_FILE)) {
            log::warn!("failed to save notifications: {e}");
        }
        out
    }

    pub fn network_status(&self) -> NetworkStatus {
        let network = self.network;
        NetworkStatus {
            network: network
                .map(|n| n.as_str().to_string())
                .unwrap_or_else(|| "unknown".into()),
            is_mainnet: network.map(|n| n.is_mainnet()).unwrap_or(false),
            node_url: network.map(|n| self.node_url(n)).unwrap_or_default(),
            contract_available: self.contract.is_some(),
        }
    }

    pub fn snapshot(&self) -> AppState {
        let wallet = match &self.session {
            Some(session) => session.snapshot(),
            None => WalletSession::new(self.network.unwrap_or(Network::LocalNet)).snapshot(),
        };
        AppState {
            revision: self.revision,
            network_status: self.network_status(),
            wallet,
            notifications: self.notifier.visible(),
        }
    }

    pub fn bump_revision(&mut self) {
        self.revision += 1;
    }

    // --- Persistence helpers ---

    fn load_network_config(&self) -> Option<Network> {
        let path = self.app_data_dir.join(CONFIG_FILE);
        let contents = fs::read_to_string(path).ok()?;
        let config: serde_json::Value = serde_json::from_str(&contents).ok()?;
        let network_str = config.get("network")?.as_str()?;
        network_str.parse().ok()
    }

    fn save_network_config(&self, network: Network) {
        let path = self.app_data_dir.join(CONFIG_FILE);
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let config = serde_json::json!({ "network": network.as_str() });
        match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    log::warn!("failed to save network config: {e}");
                }
            }
            Err(e) => log::warn!("failed to encode network config: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_localnet_with_dev_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = AppStateManager::new(dir.path().to_path_buf());
        mgr.initialize(None);

        assert!(mgr.is_first_launch());
        assert_eq!(mgr.network(), Some(Network::LocalNet));
        assert!(mgr.contract().is_some());
        assert!(mgr.client().is_none());

        let state = mgr.snapshot();
        assert!(state.network_status.contract_available);
        let kmd = state
            .wallet
            .available_wallets
            .iter()
            .find(|w| w.id == WalletId::Kmd)
            .unwrap();
        assert!(kmd.installed);
    }

    #[test]
    fn set_network_persists_choice() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = AppStateManager::new(dir.path().to_path_buf());
        mgr.initialize(None);
        let state = mgr.set_network(Network::TestNet);
        assert_eq!(state.revision, 1);
        assert_eq!(state.network_status.network, "testnet");
        assert!(!state.network_status.contract_available);

        let mut reopened = AppStateManager::new(dir.path().to_path_buf());
        reopened.initialize(None);
        assert_eq!(reopened.network(), Some(Network::TestNet));

        reopened.initialize(Some(Network::LocalNet));
        assert_eq!(reopened.network(), Some(Network::LocalNet));
    }

    #[test]
    fn client_follows_wallet_connection() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = AppStateManager::new(dir.path().to_path_buf());
        mgr.initialize(None);
        mgr.session_mut().unwrap().connect(WalletId::Kmd).unwrap();
        assert!(mgr.client().is_some());

        let mut reopened = AppStateManager::new(dir.path().to_path_buf());
        reopened.initialize(None);
        assert_eq!(reopened.active_address(), mgr.active_address());
    }

    #[test]
    fn notifications_outlive_the_manager() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = AppStateManager::new(dir.path().to_path_buf());
        mgr.initialize(None);
        let first = mgr.update_notifications(|n| n.error("Failed to create donation: x"));
        let second = mgr.update_notifications(|n| n.warning("Please fill in all fields"));

        let mut reopened = AppStateManager::new(dir.path().to_path_buf());
        reopened.initialize(None);
        let ids: Vec<_> = reopened.snapshot().notifications.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![first, second]);

        assert!(reopened.update_notifications(|n| n.dismiss(first)));
        let again = AppStateManager::new(dir.path().to_path_buf());
        let left = again.snapshot().notifications;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, second);
    }
}
