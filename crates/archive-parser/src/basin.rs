//! Ocean basins, their archive files and the loaded track store.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::best_track::decode_best_track;
use crate::cyclone::{ArchiveDecode, CycloneTrack};
use crate::error::{ArchiveError, ArchiveResult};
use crate::storm_log::decode_storm_log;

/// Track archive layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Fixed-column best track; `south` flips latitudes.
    BestTrack { south: bool },
    /// Whitespace-separated storm log.
    StormLog,
}

/// Loading groups, one progress stage each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasinGroup {
    Pacific,
    Atlantic,
    Indian,
}

impl BasinGroup {
    pub const ALL: [BasinGroup; 3] = [BasinGroup::Pacific, BasinGroup::Atlantic, BasinGroup::Indian];

    pub fn basins(self) -> &'static [Basin] {
        match self {
            BasinGroup::Pacific => &[Basin::EastPacific, Basin::WestPacific, Basin::SouthPacific],
            BasinGroup::Atlantic => &[Basin::Atlantic],
            BasinGroup::Indian => &[Basin::NorthIndian, Basin::SouthIndian],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BasinGroup::Pacific => "pacific",
            BasinGroup::Atlantic => "atlantic",
            BasinGroup::Indian => "indian",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Basin {
    EastPacific,
    WestPacific,
    SouthPacific,
    Atlantic,
    NorthIndian,
    SouthIndian,
}

impl Basin {
    pub const ALL: [Basin; 6] = [
        Basin::EastPacific,
        Basin::WestPacific,
        Basin::SouthPacific,
        Basin::Atlantic,
        Basin::NorthIndian,
        Basin::SouthIndian,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Basin::EastPacific => "tracks.epa",
            Basin::WestPacific => "tracks.bwp",
            Basin::SouthPacific => "tracks.spa.dat",
            Basin::Atlantic => "tracks.atl",
            Basin::NorthIndian => "tracks.nio",
            Basin::SouthIndian => "tracks.she",
        }
    }

    pub fn format(self) -> ArchiveFormat {
        match self {
            Basin::SouthPacific => ArchiveFormat::StormLog,
            Basin::SouthIndian => ArchiveFormat::BestTrack { south: true },
            _ => ArchiveFormat::BestTrack { south: false },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Basin::EastPacific => "east_pacific",
            Basin::WestPacific => "west_pacific",
            Basin::SouthPacific => "south_pacific",
            Basin::Atlantic => "atlantic",
            Basin::NorthIndian => "north_indian",
            Basin::SouthIndian => "south_indian",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
    }

    /// Decode archive text in this basin's format.
    pub fn decode(self, text: &str) -> ArchiveDecode {
        match self.format() {
            ArchiveFormat::BestTrack { south } => decode_best_track(text, self, south),
            ArchiveFormat::StormLog => decode_storm_log(text, self),
        }
    }
}

impl std::fmt::Display for Basin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Read an archive file, tolerating non-UTF-8 bytes.
pub fn read_archive_text(path: &Path) -> ArchiveResult<String> {
    let bytes = std::fs::read(path).map_err(|e| ArchiveError::open(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Loaded tracks per basin.
#[derive(Debug, Default)]
pub struct CycloneArchiveStore {
    tracks: BTreeMap<Basin, Vec<CycloneTrack>>,
}

impl CycloneArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one basin from `dir`.
    ///
    /// A truncated archive keeps its completed tracks and still returns the
    /// error; an unreadable file leaves the basin absent.
    pub fn load_basin(&mut self, dir: &Path, basin: Basin) -> ArchiveResult<usize> {
        let path = dir.join(basin.file_name());
        let text = match read_archive_text(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(basin = %basin, path = %path.display(), error = %e, "Cyclone archive unavailable");
                self.tracks.remove(&basin);
                return Err(e);
            }
        };

        let ArchiveDecode { tracks, failure } = basin.decode(&text);
        let count = tracks.len();
        info!(basin = %basin, tracks = count, "Loaded cyclone tracks");
        self.tracks.insert(basin, tracks);

        match failure {
            Some(e) => {
                warn!(basin = %basin, error = %e, kept = count, "Cyclone archive ended early");
                Err(e)
            }
            None => Ok(count),
        }
    }

    /// Load every basin of a group, continuing past failures.
    pub fn load_group(&mut self, dir: &Path, group: BasinGroup) -> usize {
        group
            .basins()
            .iter()
            .filter_map(|&basin| self.load_basin(dir, basin).ok())
            .sum()
    }

    pub fn insert(&mut self, basin: Basin, tracks: Vec<CycloneTrack>) {
        self.tracks.insert(basin, tracks);
    }

    /// Tracks of a basin; empty when the basin is not loaded.
    pub fn tracks(&self, basin: Basin) -> &[CycloneTrack] {
        self.tracks.get(&basin).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_loaded(&self, basin: Basin) -> bool {
        self.tracks.contains_key(&basin)
    }

    pub fn loaded_basins(&self) -> impl Iterator<Item = Basin> + '_ {
        self.tracks.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
