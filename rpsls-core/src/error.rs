use crate::types::{Address, GameId, Wei};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Self-play not allowed: opponent {0} is the creating account")]
    SelfPlay(Address),

    #[error("No move selected")]
    NoMoveSelected,

    #[error("Stake must be greater than zero")]
    ZeroStake,

    #[error("Stake mismatch: game requires {expected}, offered {offered}")]
    StakeMismatch { expected: Wei, offered: Wei },

    #[error("Timeout not yet elapsed: {remaining_secs}s remaining")]
    TimeoutNotElapsed { remaining_secs: u64 },

    #[error("Missing local secret for game {0}: move or salt not found in the local record")]
    MissingSecret(GameId),

    #[error("Local secret for game {0} does not match the commitment on the ledger")]
    CommitmentMismatch(GameId),

    #[error("Account {account} is not {role} of game {game}")]
    WrongRole {
        account: Address,
        role: &'static str,
        game: GameId,
    },

    #[error("Invalid game phase: {0}")]
    InvalidPhase(String),

    #[error("Another transition is in flight for game {0}")]
    TransitionInFlight(GameId),

    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Ledger rejected the transaction: {0}")]
    LedgerRejected(String),

    #[error("Ledger unreachable: {0}")]
    LedgerUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported session record version {found}, expected {expected}")]
    UnsupportedRecordVersion { found: u32, expected: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn invalid_phase(msg: impl Into<String>) -> Self {
        Self::InvalidPhase(msg.into())
    }

    /// Errors raised locally before anything reaches the ledger.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SelfPlay(_)
                | Self::NoMoveSelected
                | Self::ZeroStake
                | Self::StakeMismatch { .. }
                | Self::TimeoutNotElapsed { .. }
                | Self::MissingSecret(_)
                | Self::CommitmentMismatch(_)
                | Self::WrongRole { .. }
                | Self::InvalidPhase(_)
                | Self::TransitionInFlight(_)
                | Self::GameNotFound(_)
                | Self::InvalidAddress(_)
                | Self::InvalidAmount(_)
                | Self::InvalidMove(_)
        )
    }

    /// Only reads may be retried on these; submissions never are.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LedgerUnavailable(_))
    }
}
