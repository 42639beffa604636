//! Checkpoint progression and target selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use vector_race_core::{CellKind, Position, Vector};

use crate::{raster, track::Track};

/// Per-competitor record of the checkpoints crossed so far.
///
/// `next` starts at one and only ever grows. Each checkpoint cell is counted
/// at most once, so replaying the same crossing is a no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckpointProgress {
    next: u32,
    passed: BTreeSet<Position>,
}

impl CheckpointProgress {
    /// Creates progress for a competitor that has not crossed anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: 1,
            passed: BTreeSet::new(),
        }
    }

    /// Sequence number of the group that must be crossed next.
    #[must_use]
    pub const fn next(&self) -> u32 {
        self.next
    }

    /// Checkpoint cells crossed so far.
    pub fn passed(&self) -> impl Iterator<Item = Position> + '_ {
        self.passed.iter().copied()
    }

    /// Reports whether the provided checkpoint cell was already counted.
    #[must_use]
    pub fn has_passed(&self, position: Position) -> bool {
        self.passed.contains(&position)
    }

    /// Records a crossing of the checkpoint at `position` belonging to `sequence`.
    ///
    /// Only the currently expected group advances progress. Returns `true`
    /// when the crossing was counted.
    pub fn mark_passed(&mut self, position: Position, sequence: u32) -> bool {
        if sequence != self.next || self.passed.contains(&position) {
            return false;
        }
        let _ = self.passed.insert(position);
        self.next += 1;
        true
    }

    /// Reports whether every checkpoint group of the track has been crossed.
    #[must_use]
    pub fn completed(&self, track: &Track) -> bool {
        self.next > track.max_checkpoint()
    }
}

impl Default for CheckpointProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks the cells of a committed move and counts every expected checkpoint.
///
/// Progress advances cell by cell, so a fast move may clear several
/// consecutive groups at once.
pub(crate) fn record_crossings(
    track: &Track,
    progress: &mut CheckpointProgress,
    start: Position,
    end: Position,
) -> Vec<(u32, Position)> {
    let mut crossed = Vec::new();
    for cell in raster::segment(start, end) {
        if let CellKind::Checkpoint(sequence) = track.cell(cell) {
            if progress.mark_passed(cell, sequence) {
                crossed.push((sequence, cell));
            }
        }
    }
    crossed
}

/// Weights applied on top of the squared distance when ranking candidate targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetWeights {
    /// Added when the candidate lies against the current direction of travel.
    pub reversal_penalty: u64,
    /// Added when a straight line to the candidate crosses a wall.
    pub occlusion_penalty: u64,
}

impl TargetWeights {
    /// Plain nearest-candidate ranking.
    pub const NEAREST: TargetWeights = TargetWeights {
        reversal_penalty: 0,
        occlusion_penalty: 0,
    };
}

impl Default for TargetWeights {
    fn default() -> Self {
        Self {
            reversal_penalty: 25,
            occlusion_penalty: 100,
        }
    }
}

/// Chooses the cell a competitor should aim for.
///
/// Candidates come from the group `next_checkpoint`, or the finish cells once
/// that group is empty. Cells for which `is_reserved` holds are skipped unless
/// every candidate is reserved. Ties fall back to checkpoint priority and then
/// to the lowest coordinate.
pub fn select_target<F>(
    track: &Track,
    position: Position,
    velocity: Vector,
    next_checkpoint: u32,
    weights: TargetWeights,
    is_reserved: F,
) -> Option<Position>
where
    F: Fn(Position) -> bool,
{
    let group = track.checkpoint_group(next_checkpoint);
    let finishes;
    let candidates: &[Position] = if group.is_empty() || next_checkpoint > track.max_checkpoint() {
        finishes = track.finish_positions();
        &finishes
    } else {
        group
    };

    let any_free = candidates.iter().any(|candidate| !is_reserved(*candidate));
    candidates
        .iter()
        .copied()
        .filter(|candidate| !any_free || !is_reserved(*candidate))
        .min_by_key(|candidate| {
            let mut score = position.distance_squared(*candidate);
            if velocity.dot(position.offset_to(*candidate)) < 0 {
                score = score.saturating_add(weights.reversal_penalty);
            }
            if !track.path_is_clear(position, *candidate) {
                score = score.saturating_add(weights.occlusion_penalty);
            }
            let priority = track.checkpoint(*candidate).map_or(0, |info| info.priority());
            (score, priority, *candidate)
        })
}
