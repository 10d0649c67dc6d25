pub mod sandbox;

pub use sandbox::{SandboxBook, SandboxLedger};

use crate::commitment::{Commitment, Salt};
use crate::error::GameError;
use crate::moves::Move;
use crate::types::{Address, GameId, Receipt, Wei};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The contract refused the call; the reason is passed through untouched.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("no contract at {0}")]
    NotFound(GameId),
}

impl From<LedgerError> for GameError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(reason) => GameError::LedgerRejected(reason),
            LedgerError::Unavailable(reason) => GameError::LedgerUnavailable(reason),
            LedgerError::NotFound(game) => GameError::GameNotFound(game),
        }
    }
}

/// Snapshot of a game contract's storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractState {
    pub player1: Address,
    pub player2: Address,
    pub commitment: Commitment,
    /// `Move::None` until Player 2 plays.
    pub player2_move: Move,
    /// Zero once the game paid out.
    pub stake: Wei,
    /// Seconds either party may stall before forfeiting.
    pub timeout: u64,
    /// Unix seconds of the last state-changing call.
    pub last_action: u64,
}

impl ContractState {
    pub fn player2_has_moved(&self) -> bool {
        !self.player2_move.is_none()
    }

    pub fn is_settled(&self) -> bool {
        self.stake.is_zero()
    }
}

/// The game contract as seen from one signing account.
///
/// Submissions are one-shot; callers decide whether to retry. Only
/// [`Ledger::read_state`] is safe to repeat.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Deploy a game holding `commitment`, with `stake` attached.
    async fn submit_commitment(
        &self,
        commitment: Commitment,
        opponent: Address,
        stake: Wei,
    ) -> LedgerResult<GameId>;

    async fn submit_play(&self, game: &GameId, mv: Move, stake: Wei) -> LedgerResult<Receipt>;

    async fn submit_reveal(&self, game: &GameId, mv: Move, salt: &Salt) -> LedgerResult<Receipt>;

    /// Player 1 reclaims the stake because Player 2 never played.
    async fn submit_player2_timeout_claim(&self, game: &GameId) -> LedgerResult<Receipt>;

    /// Player 2 takes the pot because Player 1 never revealed.
    async fn submit_player1_timeout_claim(&self, game: &GameId) -> LedgerResult<Receipt>;

    async fn read_state(&self, game: &GameId) -> LedgerResult<ContractState>;
}
