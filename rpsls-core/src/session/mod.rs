pub mod client;
pub mod phase;
pub mod registry;

pub use client::{GameClient, RefreshOutcome};
pub use phase::{reconcile, Phase};
pub use registry::{SessionRegistry, TransitionGuard};

use crate::commitment::Salt;
use crate::ledger::ContractState;
use crate::moves::Move;
use crate::outcome::Resolution;
use crate::timeout::{has_timed_out_at, time_remaining_at, TimeRemaining};
use crate::types::{Address, GameId, Wei};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Local record of one game.
///
/// For Player 1 this also holds the move and salt behind the published
/// commitment; no other party's record ever does.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameSession {
    pub game_id: GameId,
    pub player1: Address,
    pub player2: Address,
    pub stake: Wei,
    #[serde(deserialize_with = "Option::deserialize")]
    pub player1_move: Option<Move>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub salt: Option<Salt>,
    pub player2_move: Move,
    pub phase: Phase,
    pub last_action: u64,
    #[serde(deserialize_with = "Option::deserialize")]
    pub resolution: Option<Resolution>,
}

impl GameSession {
    /// Player 1's record right after the commitment landed.
    pub fn committed(
        game_id: GameId,
        player1: Address,
        player2: Address,
        stake: Wei,
        mv: Move,
        salt: Salt,
        submitted_at: u64,
    ) -> Self {
        Self {
            game_id,
            player1,
            player2,
            stake,
            player1_move: Some(mv),
            salt: Some(salt),
            player2_move: Move::None,
            phase: Phase::Created,
            last_action: submitted_at,
            resolution: None,
        }
    }

    /// Record built from ledger state alone, as Player 2 or a spectator
    /// sees a game. Never carries a secret.
    pub fn observed(game_id: GameId, state: &ContractState) -> Self {
        let mut session = Self {
            game_id,
            player1: state.player1,
            player2: state.player2,
            stake: state.stake,
            player1_move: None,
            salt: None,
            player2_move: Move::None,
            phase: Phase::Created,
            last_action: state.last_action,
            resolution: None,
        };
        session.apply_ledger(state);
        session
    }

    /// Fold in ledger truth; the secret is left alone.
    pub fn apply_ledger(&mut self, state: &ContractState) {
        self.player1 = state.player1;
        self.player2 = state.player2;
        if !state.stake.is_zero() {
            self.stake = state.stake;
        }
        if state.player2_has_moved() {
            self.player2_move = state.player2_move;
        }
        self.last_action = state.last_action;
        self.phase = phase::reconcile(self.phase, state);
    }

    pub fn secret(&self) -> Option<(Move, &Salt)> {
        match (self.player1_move, self.salt.as_ref()) {
            (Some(mv), Some(salt)) if !mv.is_none() => Some((mv, salt)),
            _ => None,
        }
    }

    pub fn has_secret(&self) -> bool {
        self.secret().is_some()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn role_of(&self, account: &Address) -> Role {
        if *account == self.player1 {
            Role::Player1
        } else if *account == self.player2 {
            Role::Player2
        } else {
            Role::Spectator
        }
    }
}

// Keeps the move and salt out of logs.
impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("game_id", &self.game_id)
            .field("player1", &self.player1)
            .field("player2", &self.player2)
            .field("stake", &self.stake)
            .field("has_secret", &self.has_secret())
            .field("player2_move", &self.player2_move)
            .field("phase", &self.phase)
            .field("last_action", &self.last_action)
            .field("resolution", &self.resolution)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Player1,
    Player2,
    Spectator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Player1 => f.write_str("player 1"),
            Role::Player2 => f.write_str("player 2"),
            Role::Spectator => f.write_str("spectator"),
        }
    }
}

/// Which stalled party a forfeiture claim is against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutClaim {
    /// Claimed by Player 1 when Player 2 never played.
    Player2Inactive,
    /// Claimed by Player 2 when Player 1 never revealed.
    Player1Inactive,
}

impl TimeoutClaim {
    pub fn claimant(self) -> Role {
        match self {
            TimeoutClaim::Player2Inactive => Role::Player1,
            TimeoutClaim::Player1Inactive => Role::Player2,
        }
    }

    /// Phase the game must be in for the claim.
    pub fn from_phase(self) -> Phase {
        match self {
            TimeoutClaim::Player2Inactive => Phase::Created,
            TimeoutClaim::Player1Inactive => Phase::Player2Moved,
        }
    }

    pub fn terminal_phase(self) -> Phase {
        match self {
            TimeoutClaim::Player2Inactive => Phase::TimeoutPlayer2Inactive,
            TimeoutClaim::Player1Inactive => Phase::TimeoutPlayer1Inactive,
        }
    }

    /// The claim `role` could make in `phase`, if any.
    pub fn available_to(role: Role, phase: Phase) -> Option<Self> {
        match (role, phase) {
            (Role::Player1, Phase::Created) => Some(TimeoutClaim::Player2Inactive),
            (Role::Player2, Phase::Player2Moved) => Some(TimeoutClaim::Player1Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Play,
    Reveal,
    ClaimTimeout(TimeoutClaim),
}

/// Everything a front end needs to draw one game.
#[derive(Debug, Clone)]
pub struct GameStatus {
    pub session: GameSession,
    pub contract: ContractState,
    pub role: Role,
    pub time_remaining: TimeRemaining,
    pub actions: Vec<Action>,
}

impl GameStatus {
    pub fn new(session: GameSession, contract: ContractState, account: &Address, now: u64) -> Self {
        let role = session.role_of(account);
        let time_remaining = time_remaining_at(now, contract.last_action, contract.timeout);
        let timed_out = has_timed_out_at(now, contract.last_action, contract.timeout);

        let mut actions = Vec::new();
        match (role, session.phase) {
            (Role::Player2, Phase::Created) => actions.push(Action::Play),
            (Role::Player1, Phase::Player2Moved) if session.has_secret() => {
                actions.push(Action::Reveal)
            }
            _ => {}
        }
        if timed_out {
            if let Some(claim) = TimeoutClaim::available_to(role, session.phase) {
                actions.push(Action::ClaimTimeout(claim));
            }
        }

        Self {
            session,
            contract,
            role,
            time_remaining,
            actions,
        }
    }
}
