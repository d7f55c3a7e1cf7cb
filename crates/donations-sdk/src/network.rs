use serde::{Deserialize, Serialize};

/// Network the donation contract is deployed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    LocalNet,
    TestNet,
    MainNet,
}

impl Network {
    pub fn is_localnet(self) -> bool {
        matches!(self, Network::LocalNet)
    }

    pub fn is_mainnet(self) -> bool {
        matches!(self, Network::MainNet)
    }

    pub fn default_node_url(self) -> &'static str {
        match self {
            Network::LocalNet => "http://localhost:4001",
            Network::TestNet => "https://testnet-api.algonode.cloud",
            Network::MainNet => "https://mainnet-api.algonode.cloud",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::LocalNet => "localnet",
            Network::TestNet => "testnet",
            Network::MainNet => "mainnet",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "localnet" | "local" | "devnet" => Ok(Network::LocalNet),
            "testnet" | "test" => Ok(Network::TestNet),
            "mainnet" | "main" => Ok(Network::MainNet),
            _ => Err(format!("invalid network: {}", s)),
        }
    }
}
