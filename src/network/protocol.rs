// LanPong wire protocol
// One message per datagram, plain ASCII, no framing

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::game::{Direction, Side};

/// Largest round limit a host may offer. Two scores that wrap at 100 still add up
/// to the true number of points below this.
pub const MAX_ROUNDS: u32 = 99;

/// Largest datagram either side ever sends ("Start medium 99").
pub const MAX_DATAGRAM: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Time between ball steps.
    pub fn tick_interval(self) -> Duration {
        match self {
            Difficulty::Easy => Duration::from_millis(80),
            Difficulty::Medium => Duration::from_millis(40),
            Difficulty::Hard => Duration::from_millis(20),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty {0:?} (expected easy, medium or hard)")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoundsError {
    #[error("round limit must be a whole number, got {0:?}")]
    NotANumber(String),
    #[error("round limit must be between 1 and {max}, got {0}", max = MAX_ROUNDS)]
    OutOfRange(u32),
}

/// Parse and validate a round limit.
pub fn parse_rounds(s: &str) -> Result<u32, RoundsError> {
    let rounds: u32 = s
        .trim()
        .parse()
        .map_err(|_| RoundsError::NotANumber(s.to_string()))?;
    if (1..=MAX_ROUNDS).contains(&rounds) {
        Ok(rounds)
    } else {
        Err(RoundsError::OutOfRange(rounds))
    }
}

/// Single-row paddle move, named by the paddle it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    RightUp,
    RightDown,
    LeftUp,
    LeftDown,
}

impl Opcode {
    pub const ALL: [Opcode; 4] = [
        Opcode::RightUp,
        Opcode::RightDown,
        Opcode::LeftUp,
        Opcode::LeftDown,
    ];

    pub fn for_move(side: Side, direction: Direction) -> Self {
        match (side, direction) {
            (Side::Right, Direction::Up) => Opcode::RightUp,
            (Side::Right, Direction::Down) => Opcode::RightDown,
            (Side::Left, Direction::Up) => Opcode::LeftUp,
            (Side::Left, Direction::Down) => Opcode::LeftDown,
        }
    }

    pub fn side(self) -> Side {
        match self {
            Opcode::RightUp | Opcode::RightDown => Side::Right,
            Opcode::LeftUp | Opcode::LeftDown => Side::Left,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Opcode::RightUp | Opcode::LeftUp => Direction::Up,
            Opcode::RightDown | Opcode::LeftDown => Direction::Down,
        }
    }

    /// `R`/`L` picks the paddle, `W`/`S` the direction (keyboard up/down).
    pub fn token(self) -> &'static [u8; 2] {
        match self {
            Opcode::RightUp => b"RW",
            Opcode::RightDown => b"RS",
            Opcode::LeftUp => b"LW",
            Opcode::LeftDown => b"LS",
        }
    }

    pub fn from_token(bytes: &[u8]) -> Option<Self> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.token().as_slice() == bytes)
    }
}

/// Messages exchanged between peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Challenger asks the host for a match
    Join,

    /// Host accepts and fixes the match parameters
    Start {
        difficulty: Difficulty,
        max_rounds: u32,
    },

    /// One paddle moved one row
    Move(Opcode),
}

impl Message {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Join => b"Join".to_vec(),
            Message::Start {
                difficulty,
                max_rounds,
            } => format!("Start {} {}", difficulty, max_rounds).into_bytes(),
            Message::Move(op) => op.token().to_vec(),
        }
    }

    /// Exact-match decoding. `None` means the datagram is noise and must be dropped.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if let Some(op) = Opcode::from_token(bytes) {
            return Some(Message::Move(op));
        }
        if bytes == b"Join" {
            return Some(Message::Join);
        }

        let text = std::str::from_utf8(bytes).ok()?;
        let mut fields = text.split(' ');
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some("Start"), Some(difficulty), Some(rounds), None) => {
                // The lenient user-input parsers trim; on the wire only bare words count
                if !difficulty.bytes().all(|b| b.is_ascii_alphabetic())
                    || rounds.is_empty()
                    || !rounds.bytes().all(|b| b.is_ascii_digit())
                {
                    return None;
                }
                Some(Message::Start {
                    difficulty: difficulty.parse().ok()?,
                    max_rounds: parse_rounds(rounds).ok()?,
                })
            }
            _ => None,
        }
    }
}
