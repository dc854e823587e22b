//! Decoders and in-memory stores for the gridded climatology datasets.
//!
//! Two kinds of grids are handled:
//!
//! - **Scalar grids** (sea level pressure, sea surface temperature): NetCDF
//!   files holding 16-bit samples for 13 month slots.
//! - **Wind fields**: one gzip-compressed binary file per month slot holding
//!   a wind-rose summary for each grid cell.
//!
//! Every dataset is addressed by latitude/longitude and sampled with cyclic
//! bilinear interpolation (see [`interpolation`]).

pub mod error;
pub mod interpolation;
pub mod native;
pub mod scalar;
pub mod store;
pub mod wind;

pub use error::{GridResult, GridStoreError};
pub use interpolation::{bilinear_cyclic, interp_value, CyclicGrid};
pub use native::read_scalar_grid;
pub use scalar::{ScalarGrid, ScalarKind, NO_DATA};
pub use store::{wind_file_name, ScalarGridStore, WindFieldStore};
pub use wind::{WindCell, WindField};
