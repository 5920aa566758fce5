use core::fmt;

/// A row, column or block. Every cell belongs to exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Row(usize),
    Column(usize),
    Block(usize),
}

impl Region {
    pub const fn index(self) -> usize {
        match self {
            Region::Row(i) | Region::Column(i) | Region::Block(i) => i,
        }
    }

    pub const fn kind(self) -> &'static str {
        match self {
            Region::Row(_) => "row",
            Region::Column(_) => "column",
            Region::Block(_) => "block",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.index())
    }
}

/// Iterator over the `(row, col)` coordinates of one region.
#[derive(Debug, Clone)]
pub struct RegionCells {
    region: Region,
    block_rows: usize,
    block_cols: usize,
    next: usize,
}

impl RegionCells {
    pub(crate) fn new(region: Region, block_rows: usize, block_cols: usize) -> Self {
        Self {
            region,
            block_rows,
            block_cols,
            next: 0,
        }
    }

    fn size(&self) -> usize {
        self.block_rows * self.block_cols
    }
}

impl Iterator for RegionCells {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.size() {
            return None;
        }
        let k = self.next;
        self.next += 1;
        let cell = match self.region {
            Region::Row(row) => (row, k),
            Region::Column(col) => (k, col),
            Region::Block(block) => {
                // blocks across one band == block_rows
                let top = (block / self.block_rows) * self.block_rows;
                let left = (block % self.block_rows) * self.block_cols;
                (top + k / self.block_cols, left + k % self.block_cols)
            }
        };
        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.size().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RegionCells {}

#[cfg(test)]
mod tests {
    use super::{Region, RegionCells};

    #[test]
    fn block_cells_follow_rectangular_geometry() {
        // 2x3 blocks on a 6x6 board: block 3 is the right half of the second band.
        let cells: Vec<_> = RegionCells::new(Region::Block(3), 2, 3).collect();
        assert_eq!(cells, vec![(2, 3), (2, 4), (2, 5), (3, 3), (3, 4), (3, 5)]);
    }

    #[test]
    fn row_and_column_cover_the_full_line() {
        assert_eq!(RegionCells::new(Region::Row(1), 2, 2).count(), 4);
        let column: Vec<_> = RegionCells::new(Region::Column(2), 2, 2).collect();
        assert_eq!(column, vec![(0, 2), (1, 2), (2, 2), (3, 2)]);
    }
}
