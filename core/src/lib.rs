#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the vector race engine.
//!
//! This crate defines the value types and the message surface that connect
//! adapters, the authoritative world, and pure systems. Adapters and systems
//! submit [`Command`] values describing desired mutations, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values that systems and presentation layers react to deterministically.

use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer displacement on the race grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vector {
    dx: i32,
    dy: i32,
}

impl Vector {
    /// The zero vector, used for idle turns and momentum resets.
    pub const ZERO: Vector = Vector::new(0, 0);

    /// Creates a new vector from its components.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Vertical component.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Reports whether both components are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Largest component magnitude, the "speed" of a velocity.
    #[must_use]
    pub const fn speed(&self) -> i32 {
        let x = self.dx.abs();
        let y = self.dy.abs();
        if x > y {
            x
        } else {
            y
        }
    }

    /// Dot product with another vector.
    #[must_use]
    pub const fn dot(&self, other: Vector) -> i64 {
        self.dx as i64 * other.dx as i64 + self.dy as i64 * other.dy as i64
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.dx - rhs.dx, self.dy - rhs.dy)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.dx, -self.dy)
    }
}

/// Per-turn change of velocity with each component in `{-1, 0, 1}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vector", into = "Vector")]
pub struct Acceleration(Vector);

impl Acceleration {
    /// Acceleration that keeps the current velocity.
    pub const ZERO: Acceleration = Acceleration(Vector::ZERO);

    /// Every admissible acceleration in a fixed, row-major order.
    pub const ALL: [Acceleration; 9] = [
        Acceleration(Vector::new(-1, -1)),
        Acceleration(Vector::new(0, -1)),
        Acceleration(Vector::new(1, -1)),
        Acceleration(Vector::new(-1, 0)),
        Acceleration(Vector::new(0, 0)),
        Acceleration(Vector::new(1, 0)),
        Acceleration(Vector::new(-1, 1)),
        Acceleration(Vector::new(0, 1)),
        Acceleration(Vector::new(1, 1)),
    ];

    /// Validates the components and wraps them as an acceleration.
    pub fn new(dx: i32, dy: i32) -> Result<Self, AccelerationError> {
        if (-1..=1).contains(&dx) && (-1..=1).contains(&dy) {
            Ok(Self(Vector::new(dx, dy)))
        } else {
            Err(AccelerationError::OutOfRange { dx, dy })
        }
    }

    /// Underlying displacement applied to the velocity.
    #[must_use]
    pub const fn vector(&self) -> Vector {
        self.0
    }
}

impl TryFrom<Vector> for Acceleration {
    type Error = AccelerationError;

    fn try_from(value: Vector) -> Result<Self, Self::Error> {
        Self::new(value.dx(), value.dy())
    }
}

impl From<Acceleration> for Vector {
    fn from(value: Acceleration) -> Self {
        value.0
    }
}

/// Reasons an acceleration could not be constructed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AccelerationError {
    /// A component was outside of `{-1, 0, 1}`.
    #[error("acceleration ({dx}, {dy}) has a component outside of -1..=1")]
    OutOfRange {
        /// Requested horizontal component.
        dx: i32,
        /// Requested vertical component.
        dy: i32,
    },
}

/// Location of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the position.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Position reached after travelling with the provided velocity for one turn.
    #[must_use]
    pub const fn translated(self, velocity: Vector) -> Position {
        Position::new(self.x + velocity.dx(), self.y + velocity.dy())
    }

    /// Displacement leading from `self` to `other`.
    #[must_use]
    pub const fn offset_to(self, other: Position) -> Vector {
        Vector::new(other.x - self.x, other.y - self.y)
    }

    /// Chebyshev (king-move) distance between two positions.
    #[must_use]
    pub const fn chebyshev_distance(self, other: Position) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy {
            dx
        } else {
            dy
        }
    }

    /// Squared Euclidean distance between two positions.
    #[must_use]
    pub const fn distance_squared(self, other: Position) -> u64 {
        let dx = self.x.abs_diff(other.x) as u64;
        let dy = self.y.abs_diff(other.y) as u64;
        dx * dx + dy * dy
    }
}

/// Kind of terrain stored in a track cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Impassable cell.
    Wall,
    /// Ordinary drivable cell.
    Road,
    /// Drivable cell on which competitors may begin the race.
    Start,
    /// Drivable cell that ends the race for the first competitor to land on it.
    Finish,
    /// Drivable cell belonging to the checkpoint group with the given sequence number.
    Checkpoint(u32),
}

impl CellKind {
    /// Reports whether competitors may travel through the cell.
    #[must_use]
    pub const fn is_drivable(&self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// Unique identifier assigned to a competitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompetitorId(u32);

impl CompetitorId {
    /// Creates a new competitor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Visual appearance applied to a competitor. Opaque to the race rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompetitorColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl CompetitorColor {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Search algorithm a bot uses to choose its accelerations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Uninformed breadth-first search over (position, velocity) states.
    BreadthFirst,
    /// Heuristic A* search over (position, velocity) states.
    AStar,
}

/// Who decides a competitor's accelerations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    /// Accelerations are supplied externally, one selection per turn.
    Human,
    /// Accelerations are computed by the given strategy.
    Bot(StrategyKind),
}

/// Phases of the turn state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for the current competitor's acceleration.
    AwaitingMove,
    /// Validating and applying the submitted move.
    Resolving,
    /// Rotating to the next competitor.
    Advancing,
    /// The race has a winner; no further turns are resolved.
    Finished,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Queues a human competitor's acceleration for its next turn.
    SelectAcceleration {
        /// Competitor making the selection.
        competitor: CompetitorId,
        /// Chosen acceleration.
        acceleration: Acceleration,
    },
    /// Resolves the current competitor's turn with the provided acceleration.
    ResolveTurn {
        /// Competitor whose turn is being resolved.
        competitor: CompetitorId,
        /// Acceleration applied to the competitor's velocity.
        acceleration: Acceleration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces whose turn is being resolved.
    TurnStarted {
        /// Competitor owning the turn.
        competitor: CompetitorId,
        /// One-based number of the turn across the whole race.
        turn: u64,
    },
    /// Confirms that a competitor travelled along a legal segment.
    CompetitorMoved {
        /// Competitor that moved.
        competitor: CompetitorId,
        /// Cell occupied before the move.
        from: Position,
        /// Cell occupied after the move.
        to: Position,
        /// Velocity after the move.
        velocity: Vector,
    },
    /// Reports that a move crossed a wall or a parked competitor.
    CompetitorCollided {
        /// Competitor whose move was refused.
        competitor: CompetitorId,
        /// Cell the competitor remains on.
        at: Position,
        /// Destination the competitor attempted to reach.
        attempted: Position,
    },
    /// Reports that a move ended on a cell held by another competitor.
    CompetitorBlocked {
        /// Competitor whose move was refused.
        competitor: CompetitorId,
        /// Cell the competitor remains on.
        at: Position,
        /// Destination the competitor attempted to reach.
        attempted: Position,
        /// Competitor holding the destination cell.
        occupant: CompetitorId,
    },
    /// Confirms that a competitor crossed its next expected checkpoint.
    CheckpointPassed {
        /// Competitor that passed the checkpoint.
        competitor: CompetitorId,
        /// Sequence number of the checkpoint group.
        sequence: u32,
        /// Cell of the checkpoint that was crossed.
        position: Position,
    },
    /// Announces the winner. Emitted once per race.
    RaceWon {
        /// Competitor that reached the finish.
        competitor: CompetitorId,
    },
    /// Reports that a command could not be executed.
    TurnRejected {
        /// Competitor named by the rejected command.
        competitor: CompetitorId,
        /// Specific reason the command was refused.
        reason: TurnRejection,
    },
}

/// Reasons a command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnRejection {
    /// The race already has a winner.
    RaceFinished,
    /// The named competitor does not own the current turn.
    NotCurrentCompetitor,
    /// No competitor with the provided identifier exists.
    UnknownCompetitor,
    /// Only human competitors accept queued selections.
    NotHuman,
}

/// Immutable representation of a single competitor's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorSnapshot {
    /// Unique identifier assigned to the competitor.
    pub id: CompetitorId,
    /// Display name of the competitor.
    pub name: String,
    /// Appearance assigned to the competitor.
    pub color: CompetitorColor,
    /// Who decides the competitor's accelerations.
    pub controller: Controller,
    /// Grid cell currently occupied by the competitor.
    pub position: Position,
    /// Current velocity.
    pub velocity: Vector,
    /// Sequence number of the checkpoint group the competitor must cross next.
    pub next_checkpoint: u32,
    /// Selection queued for a human competitor's next turn.
    pub pending_acceleration: Option<Acceleration>,
}

/// Read-only snapshot describing all competitors in turn order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorView {
    snapshots: Vec<CompetitorSnapshot>,
}

impl CompetitorView {
    /// Creates a new view from snapshots already listed in turn order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<CompetitorSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in turn order.
    pub fn iter(&self) -> impl Iterator<Item = &CompetitorSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the competitor with the provided identifier.
    #[must_use]
    pub fn get(&self, id: CompetitorId) -> Option<&CompetitorSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Competitor standing on the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, position: Position) -> Option<&CompetitorSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.position == position)
    }

    /// Number of competitors in the race.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no competitors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CompetitorSnapshot> {
        self.snapshots
    }
}

/// Point-in-time description of the whole race handed to presentation layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    /// Competitors in turn order.
    pub competitors: CompetitorView,
    /// Index of the competitor owning the current turn.
    pub current_turn_index: usize,
    /// Number of turns resolved so far.
    pub turns_resolved: u64,
    /// Current phase of the turn state machine.
    pub phase: TurnPhase,
    /// Winner of the race once finished.
    pub winner: Option<CompetitorId>,
}
