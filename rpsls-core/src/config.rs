use crate::error::{GameError, Result};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Account this client signs for.
    pub account: Address,
    /// How often the background refresh polls the ledger.
    pub refresh_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            account: Address::ZERO,
            refresh_interval: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            ..Self::default()
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.account == Address::ZERO {
            return Err(GameError::config("Account address cannot be the zero address"));
        }

        if self.refresh_interval.is_zero() {
            return Err(GameError::config("Refresh interval must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_err());

        let account = Address::from_bytes([1u8; 20]);
        let config = ClientConfig::new(account);
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh_interval, Duration::from_secs(5));

        let stalled = config.with_refresh_interval(Duration::ZERO);
        assert!(matches!(stalled.validate(), Err(GameError::Config(_))));
    }
}
