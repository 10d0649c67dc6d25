pub mod game;
pub mod sandbox;

pub use game::{
    claim_timeout, create_game, list_games, play_game, reveal_move, show_current, show_status,
};
pub use sandbox::{advance_clock, show_payouts, SandboxState};

use crate::config::CliConfig;
use rpsls_core::{
    Clock, ClientConfig, GameClient, OffsetClock, Result, SandboxLedger, SqliteSessionStore,
};
use std::sync::Arc;

pub type Client = GameClient<SandboxLedger, SqliteSessionStore>;

/// Client for the configured account over the loaded sandbox chain.
pub fn open_client(config: &CliConfig, sandbox: &SandboxState) -> Result<Client> {
    let account = config.require_account()?;
    let clock: Arc<dyn Clock> = Arc::new(OffsetClock::new(sandbox.clock_offset));
    let ledger = SandboxLedger::with_book(sandbox.book.clone(), account, clock.clone());
    let store = SqliteSessionStore::open(&config.db_path())?;
    GameClient::with_clock(ClientConfig::new(account), ledger, store, clock)
}
