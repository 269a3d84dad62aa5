//! The conversion pipeline
//!
//! A single forward pass over one cube:
//!
//! 1. [`attributes`]: names, units and UKCA attributes
//! 2. [`time_axis`]: mid-month 360-day time axis
//! 3. [`vertical`]: optional `model_level_number` axis
//! 4. horizontal bounds
//! 5. [`precision`]: float64 coordinates
//! 6. [`aux_coords`]: forecast reference time and period
//! 7. `time: mean` cell method
//! 8. [`precision`]: float32 payload, fill and missing values
//!
//! [`run`] wraps this between loading and saving.

pub mod attributes;
pub mod aux_coords;
pub mod precision;
pub mod time_axis;
pub mod vertical;

pub use attributes::{apply_metadata, ukca_attributes};
pub use aux_coords::{attach_forecast_coords, FORECAST_PERIOD_BOUNDS, FORECAST_PERIOD_HOURS};
pub use precision::{normalize_fill, promote_coordinates, set_missing_value};
pub use time_axis::{mid_month_points, rebuild_time_axis};
pub use vertical::add_model_level;

use crate::config::EmissionConfig;
use crate::cube::{AxisKind, CellMethod, EmissionsCube};
use crate::errors::Result;
use crate::loader::{load_cube, CubeConstraint};
use crate::netcdf_io::{NetCDFWriter, WriterOptions};
use log::{debug, info};
use std::path::PathBuf;

/// Apply every in-memory step to a loaded cube
pub fn convert(mut cube: EmissionsCube, config: &EmissionConfig) -> Result<EmissionsCube> {
    apply_metadata(&mut cube, config);
    rebuild_time_axis(&mut cube, &config.time)?;

    if config.add_model_level {
        add_model_level(&mut cube)?;
    }

    for axis in [AxisKind::X, AxisKind::Y] {
        let coord = cube.require_axis_mut(axis)?;
        if coord.has_bounds() {
            debug!("Keeping bounds of '{}' from the source file", coord.var_name);
        } else {
            coord.guess_bounds()?;
        }
    }

    promote_coordinates(&mut cube);
    attach_forecast_coords(&mut cube)?;

    let time_name = cube
        .coord_by_axis(AxisKind::T)
        .map_or_else(|| "time".to_string(), |c| c.var_name.clone());
    cube.cell_methods = vec![CellMethod::new("mean", time_name)];

    normalize_fill(&mut cube, config.fill_value);
    set_missing_value(&mut cube, config.fill_value);

    Ok(cube)
}

/// Load, convert and save; returns the path written
pub fn run(config: &EmissionConfig) -> Result<PathBuf> {
    config.validate()?;

    let constraint = CubeConstraint {
        var_name: config.variable.clone(),
        stash: Some(config.stash.clone()),
    };
    let cube = load_cube(&config.emissions_file, &constraint)?;
    let cube = convert(cube, config)?;

    let output_path = config.output_path();
    NetCDFWriter::new(&output_path, WriterOptions::default()).write_cube(&cube)?;

    info!("Wrote {}", output_path.display());
    Ok(output_path)
}
