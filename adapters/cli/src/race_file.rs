//! TOML description of a race: track, rules, pilot tuning and competitors.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use vector_race_core::{CompetitorColor, Controller, Position, StrategyKind};
use vector_race_system_pilot::PilotConfig;
use vector_race_world::{CompetitorSetup, RaceConfig, Track};

const DEFAULT_TURN_LIMIT: u64 = 1_000;

/// Parsed race file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RaceFile {
    /// Track path, relative to the race file.
    pub(crate) track: PathBuf,
    /// Turns after which the race is abandoned.
    #[serde(default = "default_turn_limit")]
    pub(crate) turn_limit: u64,
    #[serde(default)]
    pub(crate) race: RaceConfig,
    #[serde(default)]
    pub(crate) pilot: PilotConfig,
    #[serde(default)]
    pub(crate) priorities: Vec<PriorityEntry>,
    pub(crate) competitors: Vec<CompetitorEntry>,
}

/// Tie-break rank for a single checkpoint cell.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct PriorityEntry {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) priority: u32,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum CompetitorKind {
    Human,
    Bot,
}

/// One `[[competitors]]` table.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct CompetitorEntry {
    pub(crate) name: String,
    pub(crate) color: String,
    pub(crate) kind: CompetitorKind,
    #[serde(default)]
    pub(crate) strategy: Option<StrategyKind>,
    /// Index into the track's start cells in row-major order.
    #[serde(default)]
    pub(crate) start: Option<usize>,
}

fn default_turn_limit() -> u64 {
    DEFAULT_TURN_LIMIT
}

impl RaceFile {
    /// Reads and parses the race file stored at the provided path.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read race file at {}", path.display()))?;
        let mut race = Self::parse(&contents)
            .with_context(|| format!("invalid race file {}", path.display()))?;
        if race.track.is_relative() {
            if let Some(base) = path.parent() {
                race.track = base.join(&race.track);
            }
        }
        Ok(race)
    }

    /// Parses a race file from its TOML contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let race: Self = toml::from_str(contents).context("failed to parse race toml contents")?;
        ensure!(!race.competitors.is_empty(), "race file lists no competitors");
        Ok(race)
    }

    /// Applies checkpoint priorities to the track.
    pub(crate) fn prepare_track(&self, track: Track) -> Result<Track> {
        let priorities = self
            .priorities
            .iter()
            .map(|entry| (Position::new(entry.x, entry.y), entry.priority));
        Ok(track.with_priorities(priorities)?)
    }

    /// Resolves competitor entries into setups placed on the track's start cells.
    ///
    /// Competitors without an explicit start take the first unused start cell.
    pub(crate) fn setups(&self, track: &Track) -> Result<Vec<CompetitorSetup>> {
        let starts = track.start_positions();
        let mut taken = BTreeSet::new();
        for entry in &self.competitors {
            if let Some(index) = entry.start {
                ensure!(
                    index < starts.len(),
                    "{} requests start {index} but the track has {} start cells",
                    entry.name,
                    starts.len()
                );
                ensure!(
                    taken.insert(index),
                    "start {index} is requested more than once"
                );
            }
        }

        let mut free = (0..starts.len()).filter(|index| !taken.contains(index));
        let mut setups = Vec::with_capacity(self.competitors.len());
        for entry in &self.competitors {
            let index = match entry.start {
                Some(index) => index,
                None => free
                    .next()
                    .with_context(|| format!("no start cell left for {}", entry.name))?,
            };
            setups.push(CompetitorSetup {
                name: entry.name.clone(),
                color: parse_color(&entry.color)
                    .with_context(|| format!("invalid color for {}", entry.name))?,
                controller: entry.controller()?,
                start: starts[index],
            });
        }
        Ok(setups)
    }
}

impl CompetitorEntry {
    fn controller(&self) -> Result<Controller> {
        match (self.kind, self.strategy) {
            (CompetitorKind::Human, None) => Ok(Controller::Human),
            (CompetitorKind::Human, Some(_)) => {
                bail!("{} is human and cannot have a strategy", self.name)
            }
            (CompetitorKind::Bot, strategy) => {
                Ok(Controller::Bot(strategy.unwrap_or(StrategyKind::AStar)))
            }
        }
    }
}

/// Parses a `#rrggbb` color.
pub(crate) fn parse_color(value: &str) -> Result<CompetitorColor> {
    let Some(hex) = value.strip_prefix('#') else {
        bail!("color `{value}` must start with `#`");
    };
    ensure!(
        hex.len() == 6 && hex.is_ascii(),
        "color `{value}` must have six hex digits"
    );
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .with_context(|| format!("color `{value}` is not hexadecimal"))
    };
    Ok(CompetitorColor::from_rgb(
        channel(0..2)?,
        channel(2..4)?,
        channel(4..6)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_race_core::CellKind;

    const RACE: &str = r##"
        track = "oval.track"
        turn_limit = 50

        [race]
        finish_requires_all_checkpoints = true

        [pilot]
        stuck_threshold = 4

        [pilot.limits]
        max_speed = 3

        [[competitors]]
        name = "Ada"
        color = "#ff8000"
        kind = "human"

        [[competitors]]
        name = "Bot"
        color = "#0080FF"
        kind = "bot"
        strategy = "breadth_first"
        start = 0
    "##;

    fn starts_track() -> Track {
        Track::from_rows(vec![vec![
            CellKind::Start,
            CellKind::Start,
            CellKind::Checkpoint(1),
            CellKind::Finish,
        ]])
        .expect("valid track")
    }

    #[test]
    fn parses_sections_with_defaults() {
        let race = RaceFile::parse(RACE).expect("valid race file");

        assert_eq!(race.track, PathBuf::from("oval.track"));
        assert_eq!(race.turn_limit, 50);
        assert!(race.race.finish_requires_all_checkpoints);
        assert_eq!(race.pilot.stuck_threshold, 4);
        assert_eq!(race.pilot.limits.max_speed, 3);
        assert_eq!(race.pilot.limits.max_expansions, 100_000);
        assert_eq!(race.competitors[1].strategy, Some(StrategyKind::BreadthFirst));
    }

    #[test]
    fn explicit_starts_are_honoured_and_others_fill_in() {
        let race = RaceFile::parse(RACE).expect("valid race file");
        let setups = race.setups(&starts_track()).expect("valid setups");

        assert_eq!(setups[0].start, Position::new(1, 0));
        assert_eq!(setups[0].controller, Controller::Human);
        assert_eq!(setups[1].start, Position::new(0, 0));
        assert_eq!(
            setups[1].controller,
            Controller::Bot(StrategyKind::BreadthFirst)
        );
        assert_eq!(setups[1].color, CompetitorColor::from_rgb(0, 0x80, 0xff));
    }

    #[test]
    fn running_out_of_starts_is_an_error() {
        let race = RaceFile::parse(
            r##"
            track = "t"
            [[competitors]]
            name = "a"
            color = "#000000"
            kind = "bot"
            [[competitors]]
            name = "b"
            color = "#000000"
            kind = "bot"
            [[competitors]]
            name = "c"
            color = "#000000"
            kind = "bot"
            "##,
        )
        .expect("valid race file");

        let error = race.setups(&starts_track()).expect_err("only two starts");
        assert!(error.to_string().contains("no start cell left for c"));
    }

    #[test]
    fn humans_cannot_pick_a_strategy() {
        let entry = CompetitorEntry {
            name: "h".to_owned(),
            color: "#000000".to_owned(),
            kind: CompetitorKind::Human,
            strategy: Some(StrategyKind::AStar),
            start: None,
        };
        assert!(entry.controller().is_err());
    }

    #[test]
    fn colors_must_be_hex_triplets() {
        assert_eq!(
            parse_color("#102030").expect("valid color"),
            CompetitorColor::from_rgb(0x10, 0x20, 0x30)
        );
        assert!(parse_color("102030").is_err());
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#zz0000").is_err());
    }

    #[test]
    fn priorities_must_target_checkpoints() {
        let mut race = RaceFile::parse(RACE).expect("valid race file");
        race.priorities = vec![PriorityEntry {
            x: 2,
            y: 0,
            priority: 3,
        }];
        let track = race
            .prepare_track(starts_track())
            .expect("checkpoint cell");
        assert_eq!(
            track.checkpoint(Position::new(2, 0)).map(|info| info.priority()),
            Some(3)
        );

        race.priorities[0].x = 3;
        assert!(race.prepare_track(starts_track()).is_err());
    }
}
