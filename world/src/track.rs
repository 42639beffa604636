//! Immutable race track grid and its checkpoint metadata.

use std::collections::BTreeMap;

use thiserror::Error;
use vector_race_core::{CellKind, Position};

use crate::raster;

/// Metadata attached to a single checkpoint cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckpointInfo {
    sequence: u32,
    priority: u32,
    reached: bool,
}

impl CheckpointInfo {
    /// Sequence number of the group the checkpoint belongs to.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Tie-break rank among equally distant cells of the same group. Lower wins.
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// Reports whether any competitor has crossed the checkpoint.
    #[must_use]
    pub const fn reached(&self) -> bool {
        self.reached
    }
}

/// Reasons a track could not be constructed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    /// The grid has no cells.
    #[error("track grid is empty")]
    Empty,
    /// A row's length differs from the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// The number of cells does not match `width * height`.
    #[error("track of {width}x{height} needs {expected} cells, found {found}")]
    CellCount {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Cells required by the declared dimensions.
        expected: usize,
        /// Cells supplied.
        found: usize,
    },
    /// The grid does not fit signed cell coordinates.
    #[error("track dimensions {width}x{height} exceed the coordinate range")]
    TooLarge {
        /// Declared width.
        width: usize,
        /// Declared height.
        height: usize,
    },
    /// Checkpoint sequence numbers start at one.
    #[error("checkpoint at ({x}, {y}) uses sequence number zero")]
    ZeroSequence {
        /// Column of the checkpoint.
        x: i32,
        /// Row of the checkpoint.
        y: i32,
    },
    /// A priority was supplied for a cell that is not a checkpoint.
    #[error("cell ({x}, {y}) is not a checkpoint")]
    NotACheckpoint {
        /// Column of the cell.
        x: i32,
        /// Row of the cell.
        y: i32,
    },
}

/// Fixed-size grid of cell kinds. Out-of-bounds coordinates resolve to walls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    width: u32,
    height: u32,
    cells: Vec<CellKind>,
    checkpoints: BTreeMap<Position, CheckpointInfo>,
    groups: BTreeMap<u32, Vec<Position>>,
}

impl Track {
    /// Creates a track from row-major cells.
    pub fn new(width: u32, height: u32, cells: Vec<CellKind>) -> Result<Self, TrackError> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(usize::MAX);
        if expected == 0 {
            return Err(TrackError::Empty);
        }
        if cells.len() != expected {
            return Err(TrackError::CellCount {
                width,
                height,
                expected,
                found: cells.len(),
            });
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(TrackError::TooLarge {
                width: width as usize,
                height: height as usize,
            });
        }

        let mut checkpoints = BTreeMap::new();
        let mut groups: BTreeMap<u32, Vec<Position>> = BTreeMap::new();
        for (index, kind) in cells.iter().enumerate() {
            let CellKind::Checkpoint(sequence) = *kind else {
                continue;
            };
            let position = position_of(index, width);
            if sequence == 0 {
                return Err(TrackError::ZeroSequence {
                    x: position.x(),
                    y: position.y(),
                });
            }
            let _ = checkpoints.insert(
                position,
                CheckpointInfo {
                    sequence,
                    priority: 0,
                    reached: false,
                },
            );
            groups.entry(sequence).or_default().push(position);
        }
        for group in groups.values_mut() {
            group.sort();
        }

        Ok(Self {
            width,
            height,
            cells,
            checkpoints,
            groups,
        })
    }

    /// Creates a track from a list of rows, top row first.
    pub fn from_rows(rows: Vec<Vec<CellKind>>) -> Result<Self, TrackError> {
        let Some(first) = rows.first() else {
            return Err(TrackError::Empty);
        };
        let expected = first.len();
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(TrackError::RaggedRow {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }

        let height = rows.len();
        let (Ok(width_u32), Ok(height_u32)) = (u32::try_from(expected), u32::try_from(height))
        else {
            return Err(TrackError::TooLarge {
                width: expected,
                height,
            });
        };
        Self::new(width_u32, height_u32, rows.into_iter().flatten().collect())
    }

    /// Assigns tie-break priorities to checkpoint cells.
    pub fn with_priorities<I>(mut self, priorities: I) -> Result<Self, TrackError>
    where
        I: IntoIterator<Item = (Position, u32)>,
    {
        for (position, priority) in priorities {
            let Some(info) = self.checkpoints.get_mut(&position) else {
                return Err(TrackError::NotACheckpoint {
                    x: position.x(),
                    y: position.y(),
                });
            };
            info.priority = priority;
        }
        Ok(self)
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

    /// Reports whether the position lies on the grid.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    /// Kind of the cell at the provided position; walls outside the grid.
    #[must_use]
    pub fn cell(&self, position: Position) -> CellKind {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(CellKind::Wall)
    }

    /// Reports whether the position is impassable.
    #[must_use]
    pub fn is_wall(&self, position: Position) -> bool {
        !self.cell(position).is_drivable()
    }

    /// Start cells in row-major order.
    #[must_use]
    pub fn start_positions(&self) -> Vec<Position> {
        self.positions_of(CellKind::Start)
    }

    /// Finish cells in row-major order.
    #[must_use]
    pub fn finish_positions(&self) -> Vec<Position> {
        self.positions_of(CellKind::Finish)
    }

    /// First finish cell in row-major order, if the track has one.
    #[must_use]
    pub fn finish(&self) -> Option<Position> {
        self.cells
            .iter()
            .position(|kind| *kind == CellKind::Finish)
            .map(|index| position_of(index, self.width))
    }

    /// Checkpoint metadata for the provided cell.
    #[must_use]
    pub fn checkpoint(&self, position: Position) -> Option<CheckpointInfo> {
        self.checkpoints.get(&position).copied()
    }

    /// Cells of the checkpoint group with the given sequence number, sorted.
    #[must_use]
    pub fn checkpoint_group(&self, sequence: u32) -> &[Position] {
        self.groups.get(&sequence).map_or(&[], Vec::as_slice)
    }

    /// Highest checkpoint sequence number on the track, zero when there are none.
    #[must_use]
    pub fn max_checkpoint(&self) -> u32 {
        self.groups.keys().next_back().copied().unwrap_or(0)
    }

    /// Wall-only validation of a straight move, used for hypothetical states.
    #[must_use]
    pub fn path_is_clear(&self, start: Position, end: Position) -> bool {
        raster::segment(start, end).all(|cell| !self.is_wall(cell))
    }

    pub(crate) fn mark_reached(&mut self, position: Position) -> bool {
        match self.checkpoints.get_mut(&position) {
            Some(info) if !info.reached => {
                info.reached = true;
                true
            }
            _ => false,
        }
    }

    fn positions_of(&self, wanted: CellKind) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, kind)| **kind == wanted)
            .map(|(index, _)| position_of(index, self.width))
            .collect()
    }

    fn index(&self, position: Position) -> Option<usize> {
        let x = u32::try_from(position.x()).ok()?;
        let y = u32::try_from(position.y()).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn position_of(index: usize, width: u32) -> Position {
    let width = width as usize;
    Position::new((index % width) as i32, (index / width) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(size: u32) -> Track {
        let mut cells = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let edge = x == 0 || y == 0 || x == size - 1 || y == size - 1;
                cells.push(if edge { CellKind::Wall } else { CellKind::Road });
            }
        }
        Track::new(size, size, cells).expect("valid track")
    }

    #[test]
    fn out_of_bounds_cells_are_walls() {
        let track = ring(4);
        assert_eq!(track.cell(Position::new(-1, 1)), CellKind::Wall);
        assert_eq!(track.cell(Position::new(1, 4)), CellKind::Wall);
        assert_eq!(track.cell(Position::new(1, 1)), CellKind::Road);
        assert!(!track.contains(Position::new(4, 0)));
    }

    #[test]
    fn checkpoints_are_grouped_by_sequence() {
        use CellKind::{Checkpoint, Road};
        let track = Track::from_rows(vec![
            vec![Checkpoint(2), Road, Checkpoint(1)],
            vec![Checkpoint(1), Road, Checkpoint(2)],
        ])
        .expect("valid track");

        assert_eq!(track.max_checkpoint(), 2);
        assert_eq!(
            track.checkpoint_group(1),
            &[Position::new(0, 1), Position::new(2, 0)]
        );
        assert!(track.checkpoint_group(3).is_empty());
        assert_eq!(
            track.checkpoint(Position::new(2, 1)).map(|info| info.sequence()),
            Some(2)
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = Track::from_rows(vec![vec![CellKind::Road; 3], vec![CellKind::Road; 2]]);
        assert_eq!(
            result,
            Err(TrackError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn zero_sequence_is_rejected() {
        let result = Track::from_rows(vec![vec![CellKind::Checkpoint(0)]]);
        assert_eq!(result, Err(TrackError::ZeroSequence { x: 0, y: 0 }));
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert_eq!(Track::from_rows(Vec::new()), Err(TrackError::Empty));
        assert_eq!(Track::new(0, 3, Vec::new()), Err(TrackError::Empty));
    }

    #[test]
    fn priorities_require_checkpoint_cells() {
        let track = Track::from_rows(vec![vec![CellKind::Road, CellKind::Checkpoint(1)]])
            .expect("valid track");
        let track = track
            .with_priorities([(Position::new(1, 0), 4)])
            .expect("checkpoint accepts priority");
        assert_eq!(
            track.checkpoint(Position::new(1, 0)).map(|info| info.priority()),
            Some(4)
        );
        assert_eq!(
            track.with_priorities([(Position::new(0, 0), 1)]),
            Err(TrackError::NotACheckpoint { x: 0, y: 0 })
        );
    }

    #[test]
    fn path_is_clear_rejects_walls_on_the_way() {
        let mut track = ring(5);
        assert!(track.path_is_clear(Position::new(1, 1), Position::new(3, 3)));
        track.cells[2 * 5 + 2] = CellKind::Wall;
        assert!(!track.path_is_clear(Position::new(1, 1), Position::new(3, 3)));
        assert!(track.path_is_clear(Position::new(1, 1), Position::new(1, 1)));
        assert!(!track.path_is_clear(Position::new(1, 1), Position::new(1, 0)));
    }

    #[test]
    fn reached_flag_is_set_once() {
        let mut track =
            Track::from_rows(vec![vec![CellKind::Checkpoint(1)]]).expect("valid track");
        assert!(track.mark_reached(Position::new(0, 0)));
        assert!(!track.mark_reached(Position::new(0, 0)));
        assert!(track
            .checkpoint(Position::new(0, 0))
            .is_some_and(|info| info.reached()));
    }
}
