//! Value domains and month slots.

use serde::{Deserialize, Serialize};

/// Number of month slots held by every monthly dataset: twelve calendar
/// months followed by the annual climatology.
pub const MONTH_SLOTS: usize = 13;

/// A scalar domain the overlay can sample, colorize and contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Wind,
    Current,
    Pressure,
    SeaTemperature,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Wind,
        Domain::Current,
        Domain::Pressure,
        Domain::SeaTemperature,
    ];

    /// Lower bound used when generating isoline levels.
    pub fn min_value(self) -> f64 {
        match self {
            Domain::Wind => 0.0,
            Domain::Current => 0.0,
            Domain::Pressure => 920.0,
            Domain::SeaTemperature => 0.0,
        }
    }

    /// Upper bound used when generating isoline levels.
    pub fn max_value(self) -> f64 {
        match self {
            Domain::Wind => 100.0,
            Domain::Current => 10.0,
            Domain::Pressure => 1080.0,
            Domain::SeaTemperature => 35.0,
        }
    }

    pub fn units(self) -> &'static str {
        match self {
            Domain::Wind => "m/s",
            Domain::Current => "kn",
            Domain::Pressure => "hPa",
            Domain::SeaTemperature => "°C",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Domain::Wind => "wind",
            Domain::Current => "current",
            Domain::Pressure => "pressure",
            Domain::SeaTemperature => "sea_temperature",
        }
    }

    /// Parse a domain name as printed by [`Domain::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A month slot: `0..=11` for January..December, `12` for the annual
/// climatology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl Month {
    pub const ANNUAL: Month = Month(12);

    pub fn new(index: usize) -> Option<Self> {
        (index < MONTH_SLOTS).then_some(Month(index as u8))
    }

    /// From a calendar month number `1..=12`.
    pub fn from_calendar(month: u32) -> Option<Self> {
        (1..=12).contains(&month).then(|| Month(month as u8 - 1))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Calendar month number `1..=12`, or `None` for the annual slot.
    pub fn calendar(self) -> Option<u32> {
        (self.0 < 12).then_some(self.0 as u32 + 1)
    }

    pub fn is_annual(self) -> bool {
        self == Self::ANNUAL
    }

    pub fn all() -> impl Iterator<Item = Month> {
        (0..MONTH_SLOTS as u8).map(Month)
    }
}

impl TryFrom<u8> for Month {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Month::new(value as usize).ok_or_else(|| format!("month slot {} out of range", value))
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> u8 {
        month.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_slots() {
        assert_eq!(Month::all().count(), MONTH_SLOTS);
        assert!(Month::new(13).is_none());
        assert_eq!(Month::from_calendar(1).unwrap().index(), 0);
        assert_eq!(Month::from_calendar(12).unwrap().calendar(), Some(12));
        assert_eq!(Month::ANNUAL.calendar(), None);
        assert!(Month::from_calendar(0).is_none());
    }

    #[test]
    fn test_domain_names() {
        for domain in Domain::ALL {
            assert_eq!(Domain::from_name(domain.name()), Some(domain));
            assert!(domain.min_value() < domain.max_value());
        }
        assert_eq!(Domain::from_name("PRESSURE"), Some(Domain::Pressure));
        assert_eq!(Domain::from_name("salinity"), None);
    }
}
