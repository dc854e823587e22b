//! Fixed-column best track archives.
//!
//! Each storm is a header line, one line per day and a trailer line:
//!
//! ```text
//! 00005 06/25/1851 M= 4  1 SNBR=   1 NOT NAMED   XING=1
//! 00010 06/25*280 948  80    0*280 954  80    0*280 960  80    0*281 965  80    0
//! ...
//! 00030 HR
//! ```
//!
//! Latitudes and longitudes carry one implied decimal; longitudes are
//! degrees west. An observation with both coordinates zero is an empty slot.

use std::ops::Range;

use chrono::NaiveDate;
use tracing::debug;

use crate::basin::Basin;
use crate::cyclone::{ArchiveDecode, CycloneObservation, CycloneTrack, StormPhase, TrackCategory};
use crate::error::{ArchiveError, ArchiveResult};

// Header line
const HEADER_YEAR: Range<usize> = 12..16;
const HEADER_DAYS: Range<usize> = 19..21;

// Daily line
const DAY_MONTH: Range<usize> = 6..8;
const DAY_DAY: Range<usize> = 9..11;
const DAY_OBSERVATIONS: usize = 11;
const OBSERVATION_STRIDE: usize = 17;
const OBSERVATIONS_PER_DAY: usize = 4;
const HOURS_BETWEEN_OBSERVATIONS: u32 = 6;

// Observation, relative to its first column
const OBS_PHASE: usize = 0;
const OBS_LAT: Range<usize> = 1..4;
const OBS_LON: Range<usize> = 4..8;
const OBS_WIND: Range<usize> = 9..12;
const OBS_PRESSURE: Range<usize> = 13..17;

// Trailer line
const TRAILER_CLASS: Range<usize> = 6..8;

/// Decode a whole archive. `south` flips latitudes for southern
/// hemisphere files.
pub fn decode_best_track(text: &str, basin: Basin, south: bool) -> ArchiveDecode {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
    let mut decode = ArchiveDecode::default();

    while let Some((number, header)) = lines.next() {
        if header.trim().is_empty() {
            continue;
        }
        match read_track(number, header, &mut lines, basin, south) {
            Ok(track) if track.observations.is_empty() => {
                debug!(line = number, "Skipping track without observations");
            }
            Ok(track) => decode.tracks.push(track),
            Err(e) => {
                decode.failure = Some(e);
                break;
            }
        }
    }

    debug!(
        basin = %basin,
        tracks = decode.tracks.len(),
        complete = decode.is_complete(),
        "Decoded best track archive"
    );
    decode
}

fn read_track<'a>(
    header_line: usize,
    header: &str,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    basin: Basin,
    south: bool,
) -> ArchiveResult<CycloneTrack> {
    let year: i32 = parse_required(header, header_line, HEADER_YEAR, "year")?;
    let days: usize = parse_required(header, header_line, HEADER_DAYS, "day count")?;

    let mut track = CycloneTrack::new(basin, TrackCategory::Unknown);
    let mut last_line = header_line;

    for _ in 0..days {
        let (number, line) = lines
            .next()
            .ok_or_else(|| ArchiveError::truncated(last_line + 1, "archive ended inside a track"))?;
        last_line = number;
        read_day(number, line, year, south, &mut track.observations)?;
    }

    let (_, trailer) = lines
        .next()
        .ok_or_else(|| ArchiveError::truncated(last_line + 1, "archive ended before the trailer"))?;
    track.category = TrackCategory::from_code(clipped(trailer, TRAILER_CLASS));

    Ok(track)
}

fn read_day(
    number: usize,
    line: &str,
    year: i32,
    south: bool,
    out: &mut Vec<CycloneObservation>,
) -> ArchiveResult<()> {
    if line.len() < DAY_OBSERVATIONS {
        return Err(ArchiveError::truncated(
            number,
            format!("daily line has {} columns, expected at least {}", line.len(), DAY_OBSERVATIONS),
        ));
    }

    let month = clipped(line, DAY_MONTH).trim().parse::<u32>();
    let day = clipped(line, DAY_DAY).trim().parse::<u32>();
    let date = match (month, day) {
        (Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(year, m, d),
        _ => None,
    };
    let Some(date) = date else {
        debug!(line = number, "Skipping daily line with an invalid date");
        return Ok(());
    };

    for slot in 0..OBSERVATIONS_PER_DAY {
        let start = DAY_OBSERVATIONS + slot * OBSERVATION_STRIDE;
        let end = start + OBSERVATION_STRIDE;
        // slots wholly past the end are empty, a slot cut short is not
        if start < line.len() && end > line.len() {
            return Err(ArchiveError::truncated(
                number,
                format!(
                    "observation {} needs columns {}..{}, daily line has {}",
                    slot + 1,
                    start,
                    end,
                    line.len()
                ),
            ));
        }
        let obs = clipped(line, start..end);

        let mut lat = parse_tenths(clipped(obs, OBS_LAT));
        let lon = -parse_tenths(clipped(obs, OBS_LON));
        if south {
            lat = -lat;
        }
        if lat == 0.0 && lon == 0.0 {
            continue;
        }

        let hour = slot as u32 * HOURS_BETWEEN_OBSERVATIONS;
        let Some(time) = date.and_hms_opt(hour, 0, 0) else {
            continue;
        };

        out.push(CycloneObservation {
            time,
            lat,
            lon,
            wind_knots: parse_or_zero(clipped(obs, OBS_WIND)),
            pressure: parse_or_zero(clipped(obs, OBS_PRESSURE)),
            phase: StormPhase::from_code(obs.chars().nth(OBS_PHASE).unwrap_or(' ')),
        });
    }
    Ok(())
}

/// The part of `line` inside `range`, empty where the line is shorter.
fn clipped(line: &str, range: Range<usize>) -> &str {
    let end = range.end.min(line.len());
    let start = range.start.min(end);
    line.get(start..end).unwrap_or("")
}

fn parse_required<T: std::str::FromStr>(
    line: &str,
    number: usize,
    range: Range<usize>,
    what: &str,
) -> ArchiveResult<T> {
    let field = line.get(range.clone()).ok_or_else(|| {
        ArchiveError::truncated(
            number,
            format!("header has {} columns, {} needs {:?}", line.len(), what, range),
        )
    })?;
    field
        .trim()
        .parse()
        .map_err(|_| ArchiveError::malformed(number, format!("invalid {} '{}'", what, field)))
}

/// Digits with one implied decimal: `"280"` is 28.0.
fn parse_tenths(field: &str) -> f64 {
    parse_or_zero(field) / 10.0
}

fn parse_or_zero(field: &str) -> f64 {
    field.trim().parse().unwrap_or(0.0)
}
