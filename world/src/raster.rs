//! Integer line rasterization shared by collision and checkpoint detection.

use vector_race_core::Position;

/// Enumerates the cells a straight segment passes through.
///
/// The start cell is skipped and the end cell is always the final item, so a
/// zero-length segment yields nothing. Cells are produced in travel order
/// using Bresenham's algorithm for every octant.
#[must_use]
pub fn segment(start: Position, end: Position) -> Segment {
    let dx = (end.x() - start.x()).abs();
    let dy = -(end.y() - start.y()).abs();
    Segment {
        x: start.x(),
        y: start.y(),
        end,
        dx,
        dy,
        step_x: (end.x() - start.x()).signum(),
        step_y: (end.y() - start.y()).signum(),
        error: dx + dy,
    }
}

/// Iterator over the cells of a rasterized segment. See [`segment`].
#[derive(Clone, Debug)]
pub struct Segment {
    x: i32,
    y: i32,
    end: Position,
    dx: i32,
    dy: i32,
    step_x: i32,
    step_y: i32,
    error: i32,
}

impl Iterator for Segment {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        if self.x == self.end.x() && self.y == self.end.y() {
            return None;
        }

        let doubled = 2 * self.error;
        if doubled >= self.dy {
            self.error += self.dy;
            self.x += self.step_x;
        }
        if doubled <= self.dx {
            self.error += self.dx;
            self.y += self.step_y;
        }

        Some(Position::new(self.x, self.y))
    }
}
