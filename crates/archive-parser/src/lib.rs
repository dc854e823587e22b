//! Parsers for the tropical cyclone track archives and the El Niño index.
//!
//! Two archive layouts are decoded into one track model:
//!
//! - the fixed-column best track format ([`best_track`]), used by five of
//!   the six basins
//! - the whitespace-separated storm log format ([`storm_log`]), used by the
//!   South Pacific archive
//!
//! Decoders never panic on bad input. A structural error ends the decode,
//! and the tracks completed before it are returned with the error.

pub mod basin;
pub mod best_track;
pub mod cyclone;
pub mod elnino;
pub mod error;
pub mod storm_log;

pub use basin::{ArchiveFormat, Basin, BasinGroup, CycloneArchiveStore};
pub use best_track::decode_best_track;
pub use cyclone::{ArchiveDecode, CycloneObservation, CycloneTrack, StormPhase, TrackCategory};
pub use elnino::{ElNinoIndex, ElNinoPhase, ELNINO_FILE};
pub use error::{ArchiveError, ArchiveResult};
pub use storm_log::decode_storm_log;
