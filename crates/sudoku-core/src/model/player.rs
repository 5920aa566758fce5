use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    First = 0,
    Second = 1,
}

impl Player {
    pub const LOOP: [Player; 2] = [Player::First, Player::Second];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Player::First),
            1 => Some(Player::Second),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// 1-based label used by hosts.
    pub const fn number(self) -> usize {
        self.index() + 1
    }

    pub const fn other(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    /// Mover after `history_len` recorded turns (forbidden turns included).
    pub const fn to_move(history_len: usize) -> Player {
        if history_len % 2 == 0 {
            Player::First
        } else {
            Player::Second
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.number())
    }
}
