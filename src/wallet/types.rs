use donations_sdk::Network;
use serde::{Deserialize, Serialize};

/// Wallet backends the app can connect through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletId {
    Defly,
    Pera,
    Exodus,
    Lute,
    Kmd,
}

impl WalletId {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletId::Defly => "defly",
            WalletId::Pera => "pera",
            WalletId::Exodus => "exodus",
            WalletId::Lute => "lute",
            WalletId::Kmd => "kmd",
        }
    }

    /// Human-facing name used in prompts and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            WalletId::Defly => "Defly Wallet",
            WalletId::Pera => "Pera Wallet",
            WalletId::Exodus => "Exodus",
            WalletId::Lute => "Lute",
            WalletId::Kmd => "LocalNet Wallet",
        }
    }
}

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for WalletId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "defly" => Ok(WalletId::Defly),
            "pera" => Ok(WalletId::Pera),
            "exodus" => Ok(WalletId::Exodus),
            "lute" => Ok(WalletId::Lute),
            "kmd" | "localnet" => Ok(WalletId::Kmd),
            _ => Err(format!("Unknown wallet: {}", s)),
        }
    }
}

/// Wallets offered for a network: development wallets on localnet,
/// consumer wallets everywhere else.
pub fn supported_wallets(network: Network) -> Vec<WalletId> {
    if network.is_localnet() {
        vec![WalletId::Lute, WalletId::Kmd]
    } else {
        vec![WalletId::Defly, WalletId::Pera, WalletId::Exodus]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    Disconnected,
    Connected,
}

/// Serializable view of the session, sent to views and the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: WalletStatus,
    pub active_wallet: Option<WalletId>,
    pub active_address: Option<String>,
    pub accounts: Vec<WalletAccount>,
    pub available_wallets: Vec<AvailableWallet>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableWallet {
    pub id: WalletId,
    pub name: String,
    /// A provider for this wallet is registered with the session.
    pub installed: bool,
}
