//! Climatology overlay engine.
//!
//! [`Overlay`] owns every loaded dataset (wind roses, pressure and sea
//! temperature grids, cyclone tracks, the El Niño index) and answers the
//! host's queries for the active month: point values, colors, isolines,
//! cyclone segments, wind-rose summaries and value label grids.
//!
//! ```no_run
//! use climatology::{Overlay, OverlayConfig};
//! use clim_common::{Domain, NoProgress};
//!
//! let config = OverlayConfig::from_env()?;
//! let mut overlay = Overlay::open(config, &mut NoProgress)?;
//! let slp = overlay.value(Domain::Pressure, 45.0, -30.0);
//! let isobars = overlay.configured_isolines(Domain::Pressure, &mut NoProgress)?;
//! # Ok::<(), clim_common::ClimError>(())
//! ```

pub mod config;
pub mod cyclones;
pub mod numbers;
pub mod overlay;
pub mod wind_atlas;

pub use config::{IsoLineConfig, OverlayConfig};
pub use cyclones::{CycloneFilter, ElNinoToggles, PhaseToggles, TrackSegment};
pub use numbers::NumberLabel;
pub use overlay::{Availability, Overlay};
pub use wind_atlas::{RoseLabel, WindPetal, WindRose};
