//! Whitespace-separated storm log archives.
//!
//! ```text
//! Date: 01-31 DEC 1997
//! Tropical Cyclone ALAN
//! ADV  LAT    LON      TIME     WIND  PR  STAT
//!   1  -14.00   170.00 11/20/00Z    35   995  TROPICAL STORM
//! ```
//!
//! A `Date` line opens a track and names its starting year; the two lines
//! after it are the storm name and the column header. Observation dates
//! carry no year, so the year advances whenever the month goes backwards
//! within a track.

use chrono::NaiveDate;
use tracing::debug;

use crate::basin::Basin;
use crate::cyclone::{ArchiveDecode, CycloneObservation, CycloneTrack, StormPhase, TrackCategory};
use crate::error::{ArchiveError, ArchiveResult};

const TRACK_MARKER: &str = "Date";
const YEAR_TOKEN: usize = 3;
const LINES_AFTER_MARKER: usize = 2;
const DEPRESSION_STATUS: &str = "TROPICAL DEPRESSION";

struct OpenTrack {
    track: CycloneTrack,
    year: i32,
    last_month: u32,
}

impl OpenTrack {
    fn finish(self, out: &mut Vec<CycloneTrack>) {
        if self.track.observations.is_empty() {
            debug!("Skipping storm log track without observations");
        } else {
            out.push(self.track);
        }
    }
}

/// Decode a whole storm log.
///
/// On a short or malformed observation line the track being read is
/// dropped; tracks completed before it are kept.
pub fn decode_storm_log(text: &str, basin: Basin) -> ArchiveDecode {
    let mut decode = ArchiveDecode::default();
    let mut open: Option<OpenTrack> = None;
    let mut skip = 0;

    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        if skip > 0 {
            skip -= 1;
            continue;
        }

        if line.starts_with(TRACK_MARKER) {
            if let Some(done) = open.take() {
                done.finish(&mut decode.tracks);
            }
            match parse_track_year(line, number) {
                Ok(year) => {
                    open = Some(OpenTrack {
                        track: CycloneTrack::new(basin, TrackCategory::Unknown),
                        year,
                        last_month: 0,
                    });
                    skip = LINES_AFTER_MARKER;
                }
                Err(e) => {
                    decode.failure = Some(e);
                    break;
                }
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }
        // lines before the first track marker carry nothing
        let Some(current) = open.as_mut() else {
            continue;
        };

        match parse_observation(line, number, current) {
            Ok(Some(obs)) => current.track.observations.push(obs),
            Ok(None) => {}
            Err(e) => {
                open = None;
                decode.failure = Some(e);
                break;
            }
        }
    }

    if let Some(done) = open {
        done.finish(&mut decode.tracks);
    }

    debug!(
        basin = %basin,
        tracks = decode.tracks.len(),
        complete = decode.is_complete(),
        "Decoded storm log archive"
    );
    decode
}

/// Year from the track marker: the fourth token, else the last numeric one.
fn parse_track_year(line: &str, number: usize) -> ArchiveResult<i32> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens
        .get(YEAR_TOKEN)
        .and_then(|t| t.parse().ok())
        .or_else(|| tokens.iter().rev().find_map(|t| t.parse().ok()))
        .ok_or_else(|| ArchiveError::malformed(number, format!("no year in '{}'", line.trim())))
}

fn parse_observation(
    line: &str,
    number: usize,
    current: &mut OpenTrack,
) -> ArchiveResult<Option<CycloneObservation>> {
    let short = || ArchiveError::truncated(number, format!("observation line too short: '{}'", line.trim()));

    let (_advisory, rest) = next_token(line).ok_or_else(short)?;
    let (lat, rest) = next_token(rest).ok_or_else(short)?;
    let (lon, rest) = next_token(rest).ok_or_else(short)?;
    let (date, mut rest) = next_token(rest).ok_or_else(short)?;

    let mut parts = date.split('/');
    let month = parts.next().unwrap_or("");
    let day = parts.next().ok_or_else(short)?;
    let hour = match parts.next() {
        Some(hour) => hour,
        None => {
            let (hour, after) = next_token(rest).ok_or_else(short)?;
            rest = after;
            hour
        }
    };

    let (wind, rest) = next_token(rest).ok_or_else(short)?;
    let (pressure, status) = next_token(rest).ok_or_else(short)?;
    let status = status.trim();

    let lat: f64 = parse_field(lat, "latitude", number)?;
    let lon: f64 = parse_field(lon, "longitude", number)?;
    let month: u32 = parse_field(month, "month", number)?;
    let day: u32 = parse_field(day, "day", number)?;
    let hour: u32 = parse_field(hour.trim_end_matches(|c: char| c == 'Z' || c == 'z'), "hour", number)?;

    if month < current.last_month {
        current.year += 1;
    }
    current.last_month = month;

    let Some(time) = NaiveDate::from_ymd_opt(current.year, month, day).and_then(|d| d.and_hms_opt(hour, 0, 0))
    else {
        debug!(line = number, "Skipping observation with an invalid date");
        return Ok(None);
    };

    let phase = if status.starts_with(DEPRESSION_STATUS) {
        StormPhase::Remnant
    } else {
        StormPhase::Tropical
    };

    Ok(Some(CycloneObservation {
        time,
        lat,
        lon,
        wind_knots: wind.parse().unwrap_or(0.0),
        pressure: pressure.parse().unwrap_or(0.0),
        phase,
    }))
}

/// Split off the first whitespace-delimited token.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

fn parse_field<T: std::str::FromStr>(field: &str, what: &str, number: usize) -> ArchiveResult<T> {
    field
        .trim()
        .parse()
        .map_err(|_| ArchiveError::malformed(number, format!("invalid {} '{}'", what, field)))
}
