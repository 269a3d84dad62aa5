//! Forecast coordinates describing each time slice
//!
//! Every slice is a mean centred on its reference month, encoded as a
//! `forecast_reference_time` following the time axis and a scalar
//! `forecast_period` of -360 hours spanning the 720 hours before it.

use crate::cube::{AxisKind, Coord, EmissionsCube, Values};
use crate::errors::{EmissError, Result};
use log::info;
use ndarray::arr2;

/// Forecast period of every slice, in hours
pub const FORECAST_PERIOD_HOURS: f64 = -360.0;

/// Bounds of the forecast period, in hours
pub const FORECAST_PERIOD_BOUNDS: [f64; 2] = [-720.0, 0.0];

/// Attach `forecast_reference_time` and `forecast_period`, replacing any
/// coordinates of the same names
pub fn attach_forecast_coords(cube: &mut EmissionsCube) -> Result<()> {
    let time_dim = cube
        .axis_dim(AxisKind::T)
        .ok_or_else(|| EmissError::AxisNotFound {
            axis: AxisKind::T.as_str().to_string(),
        })?;
    cube.aux_coords.retain(|aux| {
        !matches!(
            aux.coord.name(),
            "forecast_reference_time" | "forecast_period"
        )
    });

    let frt = forecast_reference_time(&cube.dim_coords[time_dim])?;
    cube.add_aux_coord(frt, Some(time_dim))?;
    cube.add_aux_coord(forecast_period()?, None)?;

    info!(
        "Attached forecast_reference_time and forecast_period ({} h)",
        FORECAST_PERIOD_HOURS
    );
    Ok(())
}

/// Reference times copied from the time coordinate, in double precision
pub fn forecast_reference_time(time: &Coord) -> Result<Coord> {
    let mut frt = Coord::new("forecast_reference_time", Values::Double(time.points.to_f64()))
        .with_standard_name("forecast_reference_time");
    frt.units = time.units.clone();
    frt.calendar = time.calendar.clone();
    if frt.len() > 1 {
        frt.guess_bounds()?;
    }
    Ok(frt)
}

/// Scalar forecast period with fixed bounds
pub fn forecast_period() -> Result<Coord> {
    let mut period = Coord::new("forecast_period", Values::double_1d(vec![FORECAST_PERIOD_HOURS]))
        .with_standard_name("forecast_period")
        .with_units("hours");
    period.set_bounds(Values::Double(arr2(&[FORECAST_PERIOD_BOUNDS]).into_dyn()))?;
    Ok(period)
}
