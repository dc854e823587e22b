//! El Niño / La Niña index table.
//!
//! A header line followed by one line per year: the year, then twelve
//! monthly index values. Missing or unreadable values mean "no
//! classification" for that month.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::basin::read_archive_text;
use crate::error::ArchiveResult;

pub const ELNINO_FILE: &str = "elnino_years.txt";

const EL_NINO_THRESHOLD: f64 = 1.0;
const LA_NINA_THRESHOLD: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElNinoPhase {
    ElNino,
    LaNina,
    Neutral,
    NotAvailable,
}

impl ElNinoPhase {
    /// Phase of one index value.
    pub fn classify(value: f64) -> Self {
        if value.is_nan() {
            ElNinoPhase::NotAvailable
        } else if value >= EL_NINO_THRESHOLD {
            ElNinoPhase::ElNino
        } else if value <= LA_NINA_THRESHOLD {
            ElNinoPhase::LaNina
        } else {
            ElNinoPhase::Neutral
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElNinoPhase::ElNino => "El Niño",
            ElNinoPhase::LaNina => "La Niña",
            ElNinoPhase::Neutral => "Neutral",
            ElNinoPhase::NotAvailable => "Not Available",
        }
    }
}

/// Monthly index values by year.
#[derive(Debug, Clone, Default)]
pub struct ElNinoIndex {
    years: BTreeMap<i32, [f64; 12]>,
}

impl ElNinoIndex {
    pub fn parse(text: &str) -> Self {
        let mut years = BTreeMap::new();
        for (index, line) in text.lines().enumerate().skip(1) {
            let mut tokens = line.split_whitespace();
            let Some(year) = tokens.next().and_then(|t| t.parse::<i32>().ok()) else {
                debug!(line = index + 1, "Skipping El Niño line without a year");
                continue;
            };
            let mut months = [f64::NAN; 12];
            for value in months.iter_mut() {
                *value = tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(f64::NAN);
            }
            // later lines replace earlier ones
            years.insert(year, months);
        }
        Self { years }
    }

    pub fn load(path: &Path) -> ArchiveResult<Self> {
        let index = Self::parse(&read_archive_text(path)?);
        info!(path = %path.display(), years = index.len(), "Loaded El Niño index");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Index value for a calendar month `1..=12`, NaN when unknown.
    pub fn value(&self, year: i32, month: u32) -> f64 {
        if !(1..=12).contains(&month) {
            return f64::NAN;
        }
        self.years
            .get(&year)
            .map(|months| months[month as usize - 1])
            .unwrap_or(f64::NAN)
    }

    pub fn classify(&self, year: i32, month: u32) -> ElNinoPhase {
        ElNinoPhase::classify(self.value(year, month))
    }

    pub fn years(&self) -> impl Iterator<Item = (i32, &[f64; 12])> + '_ {
        self.years.iter().map(|(&y, m)| (y, m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        assert_eq!(ElNinoPhase::classify(1.0), ElNinoPhase::ElNino);
        assert_eq!(ElNinoPhase::classify(2.4), ElNinoPhase::ElNino);
        assert_eq!(ElNinoPhase::classify(0.99), ElNinoPhase::Neutral);
        assert_eq!(ElNinoPhase::classify(0.0), ElNinoPhase::Neutral);
        assert_eq!(ElNinoPhase::classify(-0.99), ElNinoPhase::Neutral);
        assert_eq!(ElNinoPhase::classify(-1.0), ElNinoPhase::LaNina);
        assert_eq!(ElNinoPhase::classify(f64::NAN), ElNinoPhase::NotAvailable);
    }

    #[test]
    fn test_parse_skips_header_and_bad_years() {
        let text = "YEAR JAN FEB\n1990 1.5 -1.5 0 0 0 0 0 0 0 0 0 0\nxx 1 1 1\n1991 abc\n";
        let index = ElNinoIndex::parse(text);
        assert_eq!(index.len(), 2);
        assert_eq!(index.classify(1990, 1), ElNinoPhase::ElNino);
        assert_eq!(index.classify(1990, 2), ElNinoPhase::LaNina);
        assert_eq!(index.classify(1990, 3), ElNinoPhase::Neutral);
        assert_eq!(index.classify(1991, 1), ElNinoPhase::NotAvailable);
        assert_eq!(index.classify(1992, 1), ElNinoPhase::NotAvailable);
        assert_eq!(index.classify(1990, 13), ElNinoPhase::NotAvailable);
    }

    #[test]
    fn test_duplicate_year_overwrites() {
        let text = "header\n2000 1 1 1 1 1 1 1 1 1 1 1 1\n2000 -1 -1 -1 -1 -1 -1 -1 -1 -1 -1 -1 -1\n";
        let index = ElNinoIndex::parse(text);
        assert_eq!(index.len(), 1);
        assert_eq!(index.classify(2000, 6), ElNinoPhase::LaNina);
    }
}
