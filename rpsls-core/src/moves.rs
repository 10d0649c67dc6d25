use crate::error::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A hand in Rock-Paper-Scissors-Lizard-Spock.
///
/// The discriminants are the contract's encoding and feed both the
/// commitment hash and the outcome arithmetic, so they must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Move {
    /// No move chosen, or not yet revealed.
    None = 0,
    Rock = 1,
    Paper = 2,
    Scissors = 3,
    Spock = 4,
    Lizard = 5,
}

impl Move {
    /// Every playable move, in ordinal order.
    pub const PLAYABLE: [Move; 5] = [
        Move::Rock,
        Move::Paper,
        Move::Scissors,
        Move::Spock,
        Move::Lizard,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn is_none(self) -> bool {
        self == Move::None
    }

    pub fn name(self) -> &'static str {
        match self {
            Move::None => "None",
            Move::Rock => "Rock",
            Move::Paper => "Paper",
            Move::Scissors => "Scissors",
            Move::Spock => "Spock",
            Move::Lizard => "Lizard",
        }
    }

    /// Rejects the sentinel.
    pub fn require_playable(self) -> Result<Self> {
        if self.is_none() {
            return Err(GameError::NoMoveSelected);
        }
        Ok(self)
    }
}

impl TryFrom<u8> for Move {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Move::None),
            1 => Ok(Move::Rock),
            2 => Ok(Move::Paper),
            3 => Ok(Move::Scissors),
            4 => Ok(Move::Spock),
            5 => Ok(Move::Lizard),
            other => Err(GameError::InvalidMove(format!("ordinal {} out of range", other))),
        }
    }
}

impl From<Move> for u8 {
    fn from(mv: Move) -> Self {
        mv.ordinal()
    }
}

impl FromStr for Move {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(ordinal) = s.parse::<u8>() {
            return Move::try_from(ordinal);
        }
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Move::None),
            "rock" => Ok(Move::Rock),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            "spock" => Ok(Move::Spock),
            "lizard" => Ok(Move::Lizard),
            _ => Err(GameError::InvalidMove(s.to_string())),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
