//! Plain-text track format.
//!
//! One character per cell: `#` wall, `.` or space road, `S` start, `F`
//! finish and `1`-`9` checkpoints. Short rows are padded with walls.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use vector_race_core::{CellKind, Position};
use vector_race_world::Track;

/// Reads and parses the track stored at the provided path.
pub(crate) fn load(path: &Path) -> Result<Track> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read track at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid track in {}", path.display()))
}

/// Parses a track from its text form.
pub(crate) fn parse(contents: &str) -> Result<Track> {
    let lines: Vec<&str> = contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .collect();
    let last = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |index| index + 1);
    let lines = &lines[..last];
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let mut rows = Vec::with_capacity(lines.len());
    for (y, line) in lines.iter().enumerate() {
        let mut row = Vec::with_capacity(width);
        for (x, symbol) in line.chars().enumerate() {
            row.push(cell_kind(symbol).with_context(|| {
                format!("unexpected `{symbol}` at column {} of line {}", x + 1, y + 1)
            })?);
        }
        row.resize(width, CellKind::Wall);
        rows.push(row);
    }

    Ok(Track::from_rows(rows)?)
}

/// Renders the track back to text, drawing `marker` over the cells it returns a symbol for.
pub(crate) fn render(track: &Track, marker: impl Fn(Position) -> Option<char>) -> String {
    let mut out = String::new();
    for y in 0..track.height() as i32 {
        for x in 0..track.width() as i32 {
            let position = Position::new(x, y);
            out.push(marker(position).unwrap_or_else(|| symbol(track.cell(position))));
        }
        out.push('\n');
    }
    out
}

fn cell_kind(symbol: char) -> Result<CellKind> {
    Ok(match symbol {
        '#' => CellKind::Wall,
        '.' | ' ' => CellKind::Road,
        'S' => CellKind::Start,
        'F' => CellKind::Finish,
        '1'..='9' => CellKind::Checkpoint(u32::from(symbol) - u32::from('0')),
        _ => bail!("unknown track symbol"),
    })
}

fn symbol(kind: CellKind) -> char {
    match kind {
        CellKind::Wall => '#',
        CellKind::Road => '.',
        CellKind::Start => 'S',
        CellKind::Finish => 'F',
        CellKind::Checkpoint(sequence) => char::from_digit(sequence % 10, 10).unwrap_or('?'),
    }
}
