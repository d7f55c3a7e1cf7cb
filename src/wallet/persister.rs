use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{WalletAccount, WalletId};

const SESSION_FILE: &str = "wallet_session.json";
const DEV_ACCOUNTS_FILE: &str = "dev_accounts.json";

#[derive(Error, Debug)]
pub enum SessionPersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The session key: which wallet was active and which of its accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub wallet_id: WalletId,
    pub active_address: String,
    pub connected_at: String,
}

/// Stores the wallet session under `<data_dir>/<network>/`.
pub struct SessionPersister {
    file_path: PathBuf,
}

impl SessionPersister {
    pub fn new(app_data_dir: &Path, network: &str) -> Self {
        Self {
            file_path: app_data_dir.join(network).join(SESSION_FILE),
        }
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    pub fn save(&self, session: &PersistedSession) -> Result<(), SessionPersistError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.file_path, json)?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<PersistedSession>, SessionPersistError> {
        if !self.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.file_path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn clear(&self) -> Result<(), SessionPersistError> {
        if self.exists() {
            fs::remove_file(&self.file_path)?;
        }
        Ok(())
    }
}

/// Load the localnet development accounts, generating them on first use.
///
/// Persists to `<data_dir>/<network>/dev_accounts.json` so the same
/// addresses come back on every launch.
pub fn load_or_generate_dev_accounts(
    app_data_dir: &Path,
    network: &str,
    count: usize,
) -> Result<Vec<WalletAccount>, SessionPersistError> {
    let path = app_data_dir.join(network).join(DEV_ACCOUNTS_FILE);

    if path.exists() {
        let contents = fs::read_to_string(&path)?;
        return Ok(serde_json::from_str(&contents)?);
    }

    let accounts: Vec<WalletAccount> = (0..count)
        .map(|i| WalletAccount {
            name: format!("dev-account-{}", i + 1),
            address: generate_dev_address(),
        })
        .collect();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(&accounts)?)?;
    log::info!("generated {} localnet dev accounts", accounts.len());
    Ok(accounts)
}

/// 58 uppercase hex characters, the length of a chain address.
fn generate_dev_address() -> String {
    let bytes: [u8; 29] = rand::random();
    hex::encode_upper(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let persister = SessionPersister::new(dir.path(), "localnet");
        assert!(persister.load().unwrap().is_none());

        let session = PersistedSession {
            wallet_id: WalletId::Kmd,
            active_address: "ADDR".into(),
            connected_at: "2026-01-01T00:00:00Z".into(),
        };
        persister.save(&session).unwrap();
        assert_eq!(persister.load().unwrap(), Some(session));

        persister.clear().unwrap();
        assert!(!persister.exists());
    }

    #[test]
    fn dev_accounts_are_stable() {
        let dir = tempfile::tempdir().unwrap();
        let first = load_or_generate_dev_accounts(dir.path(), "localnet", 3).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].address.len(), 58);
        let second = load_or_generate_dev_accounts(dir.path(), "localnet", 3).unwrap();
        assert_eq!(first, second);
    }
}
