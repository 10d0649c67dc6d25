//! Winner determination for two revealed moves.

use crate::error::{GameError, Result};
use crate::moves::Move;
use crate::types::Wei;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Player1,
    Player2,
    Tie,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Player1 => f.write_str("Player 1"),
            Winner::Player2 => f.write_str("Player 2"),
            Winner::Tie => f.write_str("Tie"),
        }
    }
}

/// Winner of `move1` (Player 1) against `move2` (Player 2).
///
/// Same parity: the lower ordinal wins. Different parity: the higher one
/// wins. With Rock=1 .. Lizard=5 this is exactly the five-move beats graph
/// the contract settles with.
pub fn resolve(move1: Move, move2: Move) -> Winner {
    if move1 == move2 || move1.is_none() || move2.is_none() {
        return Winner::Tie;
    }

    let (a, b) = (move1.ordinal(), move2.ordinal());
    let player1_wins = if a % 2 == b % 2 { a < b } else { a > b };

    if player1_wins {
        Winner::Player1
    } else {
        Winner::Player2
    }
}

/// What the ledger pays out once both moves are known. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub winner: Winner,
    /// Twice the stake to the winner; `None` only on a tie, where each
    /// stake is refunded by the ledger.
    pub payout: Option<Wei>,
}

impl Resolution {
    /// Fails if the pot does not fit, which no ledger could have accepted.
    pub fn new(move1: Move, move2: Move, stake: Wei) -> Result<Self> {
        let winner = resolve(move1, move2);
        let payout = match winner {
            Winner::Tie => None,
            _ => Some(stake.checked_mul(2).ok_or_else(|| {
                GameError::InvalidAmount(format!("pot for stake {} overflows", stake))
            })?),
        };
        Ok(Self { winner, payout })
    }
}
