//! Move legality checks against walls and parked competitors.

use vector_race_core::Position;

use crate::{raster, track::Track};

/// Decides whether travelling from `start` to `end` is legal.
///
/// Every cell of the rasterized segment must be drivable and must not be
/// held by a parked competitor, as reported by `is_parked`. Staying on the
/// same cell is always legal.
pub(crate) fn is_legal<F>(track: &Track, start: Position, end: Position, mut is_parked: F) -> bool
where
    F: FnMut(Position) -> bool,
{
    if start == end {
        return true;
    }

    for cell in raster::segment(start, end) {
        if track.is_wall(cell) || is_parked(cell) {
            return false;
        }
    }

    true
}
