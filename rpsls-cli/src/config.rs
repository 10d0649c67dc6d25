use rpsls_core::{Address, GameError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub account: Option<Address>,
    pub verbose: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rpsls"),
            account: None,
            verbose: false,
        }
    }
}

impl CliConfig {
    /// Local session records.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("rpsls.db")
    }

    /// Sandbox chain shared by every account using this data directory.
    pub fn sandbox_path(&self) -> PathBuf {
        self.data_dir.join("sandbox.json")
    }

    pub fn require_account(&self) -> Result<Address> {
        self.account
            .ok_or_else(|| GameError::config("No account given; pass --account 0x..."))
    }
}
