//! Rectangular park grid shared by the generator, the registry and the
//! simulation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AttractionId, CellCoord};

/// Kinds of terrain a grid cell may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Impassable border or obstacle.
    Wall,
    /// Unused ground.
    Empty,
    /// Park gate where visitors enter and leave.
    Entrance,
    /// Ride occupying a single cell.
    Attraction,
    /// Queue line leading to a ride.
    Queue,
    /// Walkway.
    Road,
}

impl CellKind {
    /// Reports whether visitors may walk across cells of this kind.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Road | Self::Entrance | Self::Queue)
    }

    /// Character used for this kind in ASCII maps.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Wall => 'X',
            Self::Empty => ' ',
            Self::Entrance => 'E',
            Self::Attraction => 'A',
            Self::Queue => '#',
            Self::Road => '.',
        }
    }

    /// Parses a character of an ASCII map.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'X' => Some(Self::Wall),
            ' ' => Some(Self::Empty),
            'E' => Some(Self::Entrance),
            'A' => Some(Self::Attraction),
            '#' => Some(Self::Queue),
            '.' => Some(Self::Road),
            _ => None,
        }
    }
}

/// Single grid cell with its optional owning attraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Terrain of the cell.
    pub kind: CellKind,
    /// Attraction owning the cell; only set on attraction and queue cells.
    pub owner: Option<AttractionId>,
}

impl Cell {
    const EMPTY: Cell = Cell {
        kind: CellKind::Empty,
        owner: None,
    };
}

/// Errors raised while reading an ASCII park map.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridParseError {
    /// The map contained no rows.
    #[error("map is empty")]
    Empty,
    /// A row's width differed from the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A character did not map to any cell kind.
    #[error("unknown cell {symbol:?} at column {column}, row {row}")]
    UnknownCell {
        /// Column of the offending character.
        column: u32,
        /// Row of the offending character.
        row: u32,
        /// The offending character.
        symbol: char,
    },
}

/// Fixed-size two-dimensional park grid stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid filled with empty cells.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; count],
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Row-major index of the cell, or `None` outside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.row() as usize * self.width as usize + cell.column() as usize)
        } else {
            None
        }
    }

    /// Coordinate of a row-major index.
    #[must_use]
    pub fn coord(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cells.len() {
            return None;
        }
        let width = self.width as usize;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell stored at the coordinate.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<Cell> {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .copied()
    }

    /// Kind of the cell at the coordinate.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> Option<CellKind> {
        self.cell(cell).map(|cell| cell.kind)
    }

    /// Reports whether the cell exists and has the provided kind.
    #[must_use]
    pub fn is_kind(&self, cell: CellCoord, kind: CellKind) -> bool {
        self.kind(cell) == Some(kind)
    }

    /// Reports whether visitors may stand on the cell.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.kind(cell).is_some_and(CellKind::is_walkable)
    }

    /// Attraction owning the cell, if any.
    #[must_use]
    pub fn owner(&self, cell: CellCoord) -> Option<AttractionId> {
        self.cell(cell).and_then(|cell| cell.owner)
    }

    /// Overwrites the kind of a cell and clears its owner.
    ///
    /// Returns `false` when the coordinate lies outside the grid.
    pub fn set(&mut self, cell: CellCoord, kind: CellKind) -> bool {
        self.store(cell, Cell { kind, owner: None })
    }

    /// Overwrites the kind and owner of a cell.
    pub fn set_owned(&mut self, cell: CellCoord, kind: CellKind, owner: AttractionId) -> bool {
        self.store(
            cell,
            Cell {
                kind,
                owner: Some(owner),
            },
        )
    }

    /// Replaces the owner of a cell, keeping its kind.
    pub fn set_owner(&mut self, cell: CellCoord, owner: Option<AttractionId>) -> bool {
        match self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            Some(slot) => {
                slot.owner = owner;
                true
            }
            None => false,
        }
    }

    fn store(&mut self, cell: CellCoord, value: Cell) -> bool {
        match self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Orthogonal neighbours of a cell that lie inside the grid.
    #[must_use]
    pub fn neighbors(&self, cell: CellCoord) -> NeighborIter {
        let mut neighbors = NeighborIter::default();

        if cell.row() > 0 {
            neighbors.push(CellCoord::new(cell.column(), cell.row() - 1));
        }
        if cell.column() > 0 {
            neighbors.push(CellCoord::new(cell.column() - 1, cell.row()));
        }
        if cell.column() + 1 < self.width {
            neighbors.push(CellCoord::new(cell.column() + 1, cell.row()));
        }
        if cell.row() + 1 < self.height {
            neighbors.push(CellCoord::new(cell.column(), cell.row() + 1));
        }

        neighbors
    }

    /// Reports whether any orthogonal neighbour has the provided kind.
    #[must_use]
    pub fn touches(&self, cell: CellCoord, kind: CellKind) -> bool {
        self.neighbors(cell)
            .any(|neighbor| self.is_kind(neighbor, kind))
    }

    /// Iterates every cell in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, Cell)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let index = index as u32;
            (CellCoord::new(index % width, index / width), *cell)
        })
    }

    /// Coordinates of every cell of the provided kind, in raster order.
    #[must_use]
    pub fn cells_of_kind(&self, kind: CellKind) -> Vec<CellCoord> {
        self.iter()
            .filter(|(_, cell)| cell.kind == kind)
            .map(|(coord, _)| coord)
            .collect()
    }

    /// Renders the grid as one line of symbols per row.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut rendered = String::with_capacity(self.cells.len() + self.height as usize);
        for row in self.cells.chunks(self.width.max(1) as usize) {
            rendered.extend(row.iter().map(|cell| cell.kind.symbol()));
            rendered.push('\n');
        }
        rendered
    }

    /// Reads a grid from the format produced by [`Grid::to_ascii`].
    ///
    /// Owners are left unset; the registry links queues to attractions.
    pub fn parse_ascii(source: &str) -> Result<Self, GridParseError> {
        let rows: Vec<&str> = source.lines().collect();
        let expected = rows.first().ok_or(GridParseError::Empty)?.chars().count();
        if expected == 0 {
            return Err(GridParseError::Empty);
        }

        let mut cells = Vec::with_capacity(expected * rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            let row_number = row_index as u32;
            let found = row.chars().count();
            if found != expected {
                return Err(GridParseError::RaggedRow {
                    row: row_number,
                    expected: expected as u32,
                    found: found as u32,
                });
            }
            for (column, symbol) in row.chars().enumerate() {
                let kind = CellKind::from_symbol(symbol).ok_or(GridParseError::UnknownCell {
                    column: column as u32,
                    row: row_number,
                    symbol,
                })?;
                cells.push(Cell { kind, owner: None });
            }
        }

        Ok(Self {
            width: expected as u32,
            height: rows.len() as u32,
            cells,
        })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii())
    }
}

/// Iterator over the up to four orthogonal neighbours of a cell.
#[derive(Clone, Debug, Default)]
pub struct NeighborIter {
    buffer: [Option<CellCoord>; 4],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    fn push(&mut self, cell: CellCoord) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for NeighborIter {
    type Item = CellCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_has_two_neighbors() {
        let grid = Grid::new(4, 3);
        let neighbors: Vec<_> = grid.neighbors(CellCoord::new(0, 0)).collect();
        assert_eq!(neighbors, vec![CellCoord::new(1, 0), CellCoord::new(0, 1)]);
    }

    #[test]
    fn interior_has_four_neighbors() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.neighbors(CellCoord::new(1, 1)).count(), 4);
    }

    #[test]
    fn set_outside_grid_is_refused() {
        let mut grid = Grid::new(2, 2);
        assert!(!grid.set(CellCoord::new(2, 0), CellKind::Road));
        assert!(grid.set(CellCoord::new(1, 1), CellKind::Road));
        assert_eq!(grid.kind(CellCoord::new(1, 1)), Some(CellKind::Road));
    }

    #[test]
    fn walkable_kinds() {
        assert!(CellKind::Road.is_walkable());
        assert!(CellKind::Entrance.is_walkable());
        assert!(CellKind::Queue.is_walkable());
        assert!(!CellKind::Attraction.is_walkable());
        assert!(!CellKind::Wall.is_walkable());
        assert!(!CellKind::Empty.is_walkable());
    }

    #[test]
    fn ascii_map_survives_rendering() {
        let source = "XXXXX\nXE..X\nX #AX\nXXXXX\n";
        let grid = Grid::parse_ascii(source).expect("valid map");
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.kind(CellCoord::new(3, 2)), Some(CellKind::Attraction));
        assert_eq!(grid.to_ascii(), source);
    }

    #[test]
    fn ragged_map_is_rejected() {
        let error = Grid::parse_ascii("XXX\nXX\n").expect_err("ragged");
        assert_eq!(
            error,
            GridParseError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let error = Grid::parse_ascii("X?X\n").expect_err("unknown");
        assert_eq!(
            error,
            GridParseError::UnknownCell {
                column: 1,
                row: 0,
                symbol: '?'
            }
        );
    }

    #[test]
    fn cells_of_kind_are_in_raster_order() {
        let grid = Grid::parse_ascii("A.A\n.A.\n").expect("valid map");
        assert_eq!(
            grid.cells_of_kind(CellKind::Attraction),
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(2, 0),
                CellCoord::new(1, 1)
            ]
        );
    }
}
