//! Reads human accelerations, one `dx dy` pair per line.

use std::io::{BufRead, Write};

use anyhow::{ensure, Context, Result};
use log::warn;
use vector_race_core::{Acceleration, CompetitorSnapshot};

/// Prompts for and reads the next acceleration of a human competitor.
///
/// A blank line or the end of input selects the zero acceleration. Malformed
/// lines are reported and asked for again.
pub(crate) fn read_acceleration<R, W>(
    input: &mut R,
    output: &mut W,
    competitor: &CompetitorSnapshot,
) -> Result<Acceleration>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(
            output,
            "{} at ({}, {}) moving ({}, {}), acceleration [dx dy]: ",
            competitor.name,
            competitor.position.x(),
            competitor.position.y(),
            competitor.velocity.dx(),
            competitor.velocity.dy()
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).context("failed to read acceleration")? == 0 {
            return Ok(Acceleration::ZERO);
        }
        match parse_acceleration(&line) {
            Ok(acceleration) => return Ok(acceleration),
            Err(error) => warn!("{error:#}"),
        }
    }
}

fn parse_acceleration(line: &str) -> Result<Acceleration> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(Acceleration::ZERO);
    }
    ensure!(parts.len() == 2, "expected two numbers, got `{}`", line.trim());
    let dx = parts[0]
        .parse()
        .with_context(|| format!("`{}` is not a number", parts[0]))?;
    let dy = parts[1]
        .parse()
        .with_context(|| format!("`{}` is not a number", parts[1]))?;
    Ok(Acceleration::new(dx, dy)?)
}
