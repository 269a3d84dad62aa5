//! ukca_emiss: UKCA emissions ancillary converter
//!
//! Converts a gridded emissions NetCDF file into the NetCDF4-classic layout
//! read by the UKCA chemistry scheme: fixed variable naming and units, a
//! mid-month time axis on the 360-day calendar, forecast coordinates,
//! float64 coordinates, a float32 payload with a `1e20` fill value, and the
//! attribute set UKCA expects split between the variable and the file.
//!
//! ## Module Organization
//!
//! - [`config`]: conversion settings and their defaults
//! - [`calendar`]: 360-day calendar arithmetic
//! - [`cube`]: in-memory data model
//! - [`loader`]: reading the source file
//! - [`pipeline`]: the conversion steps
//! - [`netcdf_io`]: writing the output file
//! - [`metadata`]: inspecting a written file
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ukca_emiss::prelude::*;
//!
//! let mut config = EmissionConfig::default();
//! config.emissions_file = "MACCity_aircraft_NO_1975-1989_n96l85.nc".into();
//!
//! // Writes ./ukca_emiss_NO_aircrft.nc
//! let written = ukca_emiss::pipeline::run(&config).unwrap();
//! println!("{}", written.display());
//! ```

pub mod calendar;
pub mod config;
pub mod cube;
pub mod errors;
pub mod loader;
pub mod metadata;
pub mod netcdf_io;
pub mod pipeline;

pub use errors::{EmissError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::calendar::{Calendar360, Date360};
    pub use crate::config::{EmissionConfig, TimeAxisConfig};
    pub use crate::cube::{AxisKind, Coord, DType, EmissionsCube, Values};
    pub use crate::errors::{EmissError, Result};
    pub use crate::loader::{load_cube, CubeConstraint};
    pub use crate::netcdf_io::{NetCDFWriter, WriterOptions};
    pub use crate::pipeline::{convert, run};
}
