use core::fmt;
use serde::{Deserialize, Serialize};

/// Fill `value` into the cell at (`row`, `col`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub value: u8,
}

impl Move {
    pub const fn new(row: usize, col: usize, value: u8) -> Self {
        Self { row, col, value }
    }

    pub const fn cell(self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub const fn same_cell(self, other: Move) -> bool {
        self.row == other.row && self.col == other.col
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})={}", self.row, self.col, self.value)
    }
}

/// One entry of the game history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "move", rename_all = "snake_case")]
pub enum MoveRecord {
    Played(Move),
    Forbidden(Move),
}

impl MoveRecord {
    pub const fn mv(self) -> Move {
        match self {
            MoveRecord::Played(mv) | MoveRecord::Forbidden(mv) => mv,
        }
    }

    pub const fn is_forbidden(self) -> bool {
        matches!(self, MoveRecord::Forbidden(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{Move, MoveRecord};

    #[test]
    fn display_uses_cell_and_value() {
        assert_eq!(Move::new(2, 7, 5).to_string(), "(2,7)=5");
    }

    #[test]
    fn records_serialize_with_kind_tag() {
        let json = serde_json::to_string(&MoveRecord::Forbidden(Move::new(0, 1, 3))).unwrap();
        assert_eq!(json, r#"{"kind":"forbidden","move":{"row":0,"col":1,"value":3}}"#);
    }
}
