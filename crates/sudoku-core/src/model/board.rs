use core::fmt;
use core::str::FromStr;

use super::moves::Move;
use super::region::{Region, RegionCells};
use super::values::ValueSet;

/// Marker stored in empty cells.
pub const EMPTY: u8 = 0;

/// Largest supported side length; values must fit a [`ValueSet`].
pub const MAX_SIZE: usize = 63;

/// N×N grid made of `block_rows`×`block_cols` blocks, N = block_rows·block_cols.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    block_rows: usize,
    block_cols: usize,
    cells: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    InvalidGeometry { block_rows: usize, block_cols: usize },
    OutOfRange { row: usize, col: usize, size: usize },
    InvalidValue { value: u32, size: usize },
    CellCount { expected: usize, found: usize },
    Unsolvable,
    Parse(String),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidGeometry {
                block_rows,
                block_cols,
            } => write!(
                f,
                "unsupported block geometry {block_rows}x{block_cols} (side must be 1..={MAX_SIZE})"
            ),
            BoardError::OutOfRange { row, col, size } => {
                write!(f, "cell ({row},{col}) is outside a {size}x{size} board")
            }
            BoardError::InvalidValue { value, size } => {
                write!(f, "value {value} is not in 1..={size}")
            }
            BoardError::CellCount { expected, found } => {
                write!(f, "expected {expected} cells, found {found}")
            }
            BoardError::Unsolvable => write!(f, "board has no valid completion"),
            BoardError::Parse(message) => write!(f, "malformed board text: {message}"),
        }
    }
}

impl std::error::Error for BoardError {}

impl Board {
    pub fn empty(block_rows: usize, block_cols: usize) -> Result<Self, BoardError> {
        let size = checked_size(block_rows, block_cols)?;
        Ok(Self {
            block_rows,
            block_cols,
            cells: vec![EMPTY; size * size],
        })
    }

    pub fn from_cells(
        block_rows: usize,
        block_cols: usize,
        cells: Vec<u8>,
    ) -> Result<Self, BoardError> {
        let size = checked_size(block_rows, block_cols)?;
        if cells.len() != size * size {
            return Err(BoardError::CellCount {
                expected: size * size,
                found: cells.len(),
            });
        }
        if let Some(&value) = cells.iter().find(|&&v| v as usize > size) {
            return Err(BoardError::InvalidValue {
                value: value as u32,
                size,
            });
        }
        Ok(Self {
            block_rows,
            block_cols,
            cells,
        })
    }

    pub const fn block_rows(&self) -> usize {
        self.block_rows
    }

    pub const fn block_cols(&self) -> usize {
        self.block_cols
    }

    pub const fn size(&self) -> usize {
        self.block_rows * self.block_cols
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn index(&self, row: usize, col: usize) -> usize {
        let size = self.size();
        assert!(
            row < size && col < size,
            "cell ({row},{col}) is outside a {size}x{size} board"
        );
        row * size + col
    }

    /// # Panics
    /// When `row` or `col` is outside the board.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[self.index(row, col)]
    }

    pub fn is_empty_cell(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == EMPTY
    }

    /// Writes `value` (or [`EMPTY`]) into this copy.
    ///
    /// # Panics
    /// When the cell is outside the board or the value exceeds the side length.
    pub fn put(&mut self, row: usize, col: usize, value: u8) {
        let size = self.size();
        assert!(
            value as usize <= size,
            "value {value} is not valid on a {size}x{size} board"
        );
        let idx = self.index(row, col);
        self.cells[idx] = value;
    }

    pub fn try_put(&mut self, row: usize, col: usize, value: u8) -> Result<(), BoardError> {
        let size = self.size();
        if row >= size || col >= size {
            return Err(BoardError::OutOfRange { row, col, size });
        }
        if value as usize > size {
            return Err(BoardError::InvalidValue {
                value: value as u32,
                size,
            });
        }
        self.cells[row * size + col] = value;
        Ok(())
    }

    pub fn with_value(&self, row: usize, col: usize, value: u8) -> Board {
        let mut next = self.clone();
        next.put(row, col, value);
        next
    }

    pub fn with_move(&self, mv: Move) -> Board {
        self.with_value(mv.row, mv.col, mv.value)
    }

    pub fn empty_cell_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == EMPTY).count()
    }

    pub fn is_full(&self) -> bool {
        !self.cells.contains(&EMPTY)
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let size = self.size();
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == EMPTY)
            .map(move |(idx, _)| (idx / size, idx % size))
    }

    pub fn block_of(&self, row: usize, col: usize) -> usize {
        (row / self.block_rows) * self.block_rows + col / self.block_cols
    }

    pub fn regions_of(&self, row: usize, col: usize) -> [Region; 3] {
        [
            Region::Row(row),
            Region::Column(col),
            Region::Block(self.block_of(row, col)),
        ]
    }

    pub fn region_cells(&self, region: Region) -> RegionCells {
        RegionCells::new(region, self.block_rows, self.block_cols)
    }

    pub fn values_in_region(&self, region: Region) -> ValueSet {
        self.region_cells(region)
            .map(|(row, col)| self.get(row, col))
            .collect()
    }

    pub fn empty_cells_in_region(
        &self,
        region: Region,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.region_cells(region)
            .filter(|&(row, col)| self.is_empty_cell(row, col))
    }

    pub fn empty_count_in_region(&self, region: Region) -> usize {
        self.empty_cells_in_region(region).count()
    }

    /// Values not yet present in any region containing the cell.
    pub fn candidate_values(&self, row: usize, col: usize) -> ValueSet {
        let used = self
            .regions_of(row, col)
            .into_iter()
            .fold(ValueSet::new(), |acc, region| {
                acc.union(self.values_in_region(region))
            });
        ValueSet::full(self.size()).difference(used)
    }

    /// Number of the cell's regions that a fill of this (empty) cell would complete.
    pub fn regions_completed_by(&self, row: usize, col: usize) -> usize {
        self.regions_of(row, col)
            .into_iter()
            .filter(|&region| self.empty_count_in_region(region) == 1)
            .count()
    }

    /// Raw cell values, row-major; the occupancy signature of the position.
    pub fn occupancy(&self) -> &[u8] {
        &self.cells
    }
}

fn checked_size(block_rows: usize, block_cols: usize) -> Result<usize, BoardError> {
    let size = block_rows.checked_mul(block_cols).unwrap_or(usize::MAX);
    if block_rows == 0 || block_cols == 0 || size > MAX_SIZE {
        return Err(BoardError::InvalidGeometry {
            block_rows,
            block_cols,
        });
    }
    Ok(size)
}

impl FromStr for Board {
    type Err = BoardError;

    /// Parses `m n` followed by N² cell tokens; `.` and `0` mark empty cells.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut tokens = text.split_whitespace();
        let mut header = |label: &str| -> Result<usize, BoardError> {
            tokens
                .next()
                .ok_or_else(|| BoardError::Parse(format!("missing {label}")))?
                .parse::<usize>()
                .map_err(|err| BoardError::Parse(format!("{label}: {err}")))
        };
        let block_rows = header("block rows")?;
        let block_cols = header("block columns")?;
        let size = checked_size(block_rows, block_cols)?;

        let mut cells = Vec::with_capacity(size * size);
        for token in tokens {
            let value = match token {
                "." | "0" => EMPTY,
                other => {
                    let parsed = other
                        .parse::<u32>()
                        .map_err(|err| BoardError::Parse(format!("cell '{other}': {err}")))?;
                    if parsed == 0 || parsed as usize > size {
                        return Err(BoardError::InvalidValue {
                            value: parsed,
                            size,
                        });
                    }
                    parsed as u8
                }
            };
            cells.push(value);
        }

        Board::from_cells(block_rows, block_cols, cells)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.size();
        writeln!(f, "{} {}", self.block_rows, self.block_cols)?;
        for row in self.cells.chunks(size) {
            let line = row
                .iter()
                .map(|&v| {
                    if v == EMPTY {
                        ".".to_string()
                    } else {
                        v.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
