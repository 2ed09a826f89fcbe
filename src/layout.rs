//! Perimeter layout for square boards.
//!
//! A board of `L` spaces is drawn around the edge of an `S x S` grid where
//! `S = L / 4 + 1`. Each of the four legs holds `S - 1` spaces and starts on
//! a corner, so every perimeter cell is addressed exactly once and the
//! interior is left free for the center region.

/// 1-indexed grid coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn is_on_perimeter(&self, side: usize) -> bool {
        let in_bounds =
            (1..=side).contains(&self.row) && (1..=side).contains(&self.col);
        in_bounds
            && (self.row == 1 || self.row == side || self.col == 1 || self.col == side)
    }
}

/// A rectangular block of grid cells, `rows x cols` starting at `top_left`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpan {
    pub top_left: GridPos,
    pub rows: usize,
    pub cols: usize,
}

/// How a grid row or column is sized when drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Track {
    /// First and last track; holds a corner cell and keeps a fixed size.
    Corner,
    /// Everything between the corners; shares the remaining space.
    Stretch,
}

/// Side length of the grid for a board of `board_len` spaces, or `None` if
/// the board cannot be laid out as a closed square perimeter.
pub fn side_length(board_len: usize) -> Option<usize> {
    if board_len == 0 || board_len % 4 != 0 {
        return None;
    }
    Some(board_len / 4 + 1)
}

/// Grid coordinate of the space at `index` on a board with the given side
/// length.
///
/// Index 0 is the bottom-left corner. The walk runs right along the bottom,
/// up the right side, left along the top and down the left side. Indices
/// past the end of the board, and side lengths below 2, have no coordinate.
pub fn position(index: usize, side: usize) -> Option<GridPos> {
    if side < 2 {
        return None;
    }
    let leg_len = side - 1;
    if index >= 4 * leg_len {
        return None;
    }
    let offset = index % leg_len;
    let pos = match index / leg_len {
        0 => GridPos::new(side, 1 + offset),
        1 => GridPos::new(side - offset, side),
        2 => GridPos::new(1, side - offset),
        _ => GridPos::new(1 + offset, 1),
    };
    Some(pos)
}

/// Row (and column) sizing for a grid of the given side length.
pub fn tracks(side: usize) -> Vec<Track> {
    (1..=side)
        .map(|i| {
            if i == 1 || i == side {
                Track::Corner
            } else {
                Track::Stretch
            }
        })
        .collect()
}

/// The interior of the grid, if it has one.
pub fn interior(side: usize) -> Option<GridSpan> {
    if side < 3 {
        return None;
    }
    Some(GridSpan {
        top_left: GridPos::new(2, 2),
        rows: side - 2,
        cols: side - 2,
    })
}
