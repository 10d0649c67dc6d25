use crate::ledger::ContractState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one game as this client understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Player 1 committed, waiting for Player 2.
    Created,
    /// Player 2 played and matched the stake, waiting for the reveal.
    Player2Moved,
    /// Player 1 revealed and the ledger paid out.
    Resolved,
    /// Player 1 reclaimed the stake after Player 2 never played.
    TimeoutPlayer2Inactive,
    /// Player 2 took the pot after Player 1 never revealed.
    TimeoutPlayer1Inactive,
    /// Paid out after Player 2 moved, by a reveal or a Player 1 timeout
    /// this client did not see. The contract keeps no record of which.
    Settled,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Phase::Created | Phase::Player2Moved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Created => "CREATED",
            Phase::Player2Moved => "PLAYER2_MOVED",
            Phase::Resolved => "RESOLVED",
            Phase::TimeoutPlayer2Inactive => "TIMEOUT_PLAYER2_INACTIVE",
            Phase::TimeoutPlayer1Inactive => "TIMEOUT_PLAYER1_INACTIVE",
            Phase::Settled => "SETTLED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase implied by the ledger, using `local` only where the ledger cannot
/// tell settled outcomes apart.
pub fn reconcile(local: Phase, state: &ContractState) -> Phase {
    match (state.is_settled(), state.player2_has_moved()) {
        (false, false) => Phase::Created,
        (false, true) => Phase::Player2Moved,
        (true, false) => Phase::TimeoutPlayer2Inactive,
        (true, true) => match local {
            Phase::Resolved | Phase::TimeoutPlayer1Inactive | Phase::Settled => local,
            _ => Phase::Settled,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::Commitment;
    use crate::moves::Move;
    use crate::types::{Address, Wei};

    fn state(player2_move: Move, stake: &str) -> ContractState {
        ContractState {
            player1: Address::from_bytes([1u8; 20]),
            player2: Address::from_bytes([2u8; 20]),
            commitment: Commitment::from_bytes([9u8; 32]),
            player2_move,
            stake: Wei::from_ether(stake).unwrap(),
            timeout: 300,
            last_action: 1_000,
        }
    }

    #[test]
    fn test_open_game_follows_ledger() {
        // A stale local tag never wins over what the ledger shows.
        for local in [Phase::Created, Phase::Player2Moved, Phase::Resolved] {
            assert_eq!(reconcile(local, &state(Move::None, "1")), Phase::Created);
            assert_eq!(
                reconcile(local, &state(Move::Rock, "1")),
                Phase::Player2Moved
            );
        }
    }

    #[test]
    fn test_settled_before_player2_is_creator_timeout() {
        assert_eq!(
            reconcile(Phase::Created, &state(Move::None, "0")),
            Phase::TimeoutPlayer2Inactive
        );
    }

    #[test]
    fn test_settled_after_player2_keeps_known_outcome() {
        let paid = state(Move::Paper, "0");
        assert_eq!(reconcile(Phase::Resolved, &paid), Phase::Resolved);
        assert_eq!(
            reconcile(Phase::TimeoutPlayer1Inactive, &paid),
            Phase::TimeoutPlayer1Inactive
        );
        assert_eq!(reconcile(Phase::Player2Moved, &paid), Phase::Settled);
        assert_eq!(reconcile(Phase::Created, &paid), Phase::Settled);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(
            serde_json::to_string(&Phase::Player2Moved).unwrap(),
            "\"PLAYER2_MOVED\""
        );
        assert_eq!(
            serde_json::to_string(&Phase::TimeoutPlayer2Inactive).unwrap(),
            "\"TIMEOUT_PLAYER2_INACTIVE\""
        );
        assert!(Phase::Settled.is_terminal());
        assert!(!Phase::Player2Moved.is_terminal());
    }
}
