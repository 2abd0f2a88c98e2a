use crate::players::Mark;
use itertools::Itertools;
use ndarray::prelude::*;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Deref, DerefMut},
    str::FromStr,
};

pub const CELLS: usize = 9;
pub const SIDE: usize = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Cell {
    Empty,
    Marked(Mark),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won(Mark),
    Drawn,
}

/// The 3x3 grid. Cells are addressed either by `(row, col)` or by the flat
/// row-major index `row * 3 + col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub state: Array<Cell, Dim<[usize; 2]>>,
}

/// Exact board contents used as a value-table key. No symmetry reduction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct StateKey(pub [Cell; CELLS]);

impl Cell {
    pub fn as_char(self) -> char {
        match self {
            Cell::Empty => '-',
            Cell::Marked(mark) => mark.as_char(),
        }
    }
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Cell::Empty),
            _ => Mark::from_char(c).map(Cell::Marked),
        }
    }
}

impl Deref for Board {
    type Target = Array<Cell, Dim<[usize; 2]>>;
    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl DerefMut for Board {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.iter().map(|c| c.as_char()).collect::<String>())
    }
}

impl Board {
    pub fn new() -> Self {
        Board {
            state: Array::from_elem((SIDE, SIDE), Cell::Empty),
        }
    }

    /// Builds a board from nine cells in row-major order.
    pub fn from_cells(cells: [Cell; CELLS]) -> Self {
        let state = Array::from_shape_vec((SIDE, SIDE), cells.to_vec())
            .expect("nine cells always fill a 3x3 grid");
        Board { state }
    }

    pub fn position(index: usize) -> (usize, usize) {
        (index / SIDE, index % SIDE)
    }

    pub fn cell(&self, index: usize) -> Cell {
        self.state[Self::position(index)]
    }

    pub fn set(&mut self, index: usize, mark: Mark) {
        self.state[Self::position(index)] = Cell::Marked(mark);
    }

    /// Returns a copy of the board with `mark` placed on `index`.
    pub fn with_move(&self, index: usize, mark: Mark) -> Board {
        let mut next = self.clone();
        next.set(index, mark);
        next
    }

    pub fn cells(&self) -> [Cell; CELLS] {
        let mut cells = [Cell::Empty; CELLS];
        for (slot, cell) in cells.iter_mut().zip(self.iter()) {
            *slot = *cell;
        }
        cells
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.iter().filter(|&&c| c == Cell::Marked(mark)).count()
    }

    /// Ascending indices of the cells holding `mark`.
    pub fn positions(&self, mark: Mark) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, &c)| c == Cell::Marked(mark))
            .map(|(index, _)| index)
            .collect()
    }

    /// The mark whose turn it is, assuming alternate play with X first.
    pub fn next_mark(&self) -> Mark {
        if self.count(Mark::Cross) > self.count(Mark::Nought) {
            Mark::Nought
        } else {
            Mark::Cross
        }
    }

    pub fn to_state_key(&self) -> StateKey {
        StateKey(self.cells())
    }

    pub fn draw(&self) -> String {
        self.to_string()
            .chars()
            .tuples::<(_, _, _)>()
            .map(|a| format!(" {} {} {}", a.0, a.1, a.2))
            .join("\n")
    }
}

impl From<&StateKey> for Board {
    fn from(key: &StateKey) -> Self {
        Board::from_cells(key.0)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.iter().map(|c| c.as_char()).collect::<String>())
    }
}

impl FromStr for StateKey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s
            .chars()
            .map(|c| Cell::from_char(c).ok_or_else(|| format!("unknown cell '{c}' in '{s}'")))
            .collect::<Result<Vec<Cell>, String>>()?;
        let cells: [Cell; CELLS] = parsed
            .try_into()
            .map_err(|v: Vec<Cell>| format!("expected {CELLS} cells, got {} in '{s}'", v.len()))?;
        Ok(StateKey(cells))
    }
}

impl Serialize for StateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
