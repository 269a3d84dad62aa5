//! Mid-month time axis on the 360-day calendar
//!
//! The source file's time values are replaced by one stamp per month at day
//! 16. The generated series must be exactly as long as the time dimension.

use crate::calendar::CALENDAR_NAME;
use crate::config::TimeAxisConfig;
use crate::cube::{AxisKind, EmissionsCube, Values};
use crate::errors::{EmissError, Result};
use log::info;

/// Day offsets of the configured mid-month series
pub fn mid_month_points(time: &TimeAxisConfig) -> Result<Vec<i32>> {
    let calendar = time.calendar()?;
    calendar
        .mid_month_series(time.first_year, time.first_month, time.count)?
        .into_iter()
        .map(|days| {
            i32::try_from(days).map_err(|_| EmissError::InvalidConfig {
                message: format!("time point {} days does not fit in 32 bits", days),
            })
        })
        .collect()
}

/// Replace the time coordinate with the configured mid-month series
///
/// Fails with `TimeLengthMismatch` before touching the cube when the series
/// length differs from the time dimension.
pub fn rebuild_time_axis(cube: &mut EmissionsCube, time: &TimeAxisConfig) -> Result<()> {
    let found = cube.require_axis_mut(AxisKind::T)?.len();
    if found != time.count {
        return Err(EmissError::TimeLengthMismatch {
            expected: time.count,
            found,
        });
    }

    let points = mid_month_points(time)?;
    let calendar = time.calendar()?;
    let coord = cube.require_axis_mut(AxisKind::T)?;

    let first = points.first().copied();
    coord.var_name = "time".to_string();
    coord.standard_name = Some("time".to_string());
    coord.units = Some(calendar.units());
    coord.calendar = Some(CALENDAR_NAME.to_string());
    coord.points = Values::int_1d(points);
    coord.bounds = None;
    if coord.len() > 1 {
        coord.guess_bounds()?;
    }

    if let Some(first) = first {
        info!(
            "Rebuilt time axis: {} mid-month points from {} ({})",
            coord.len(),
            calendar.date_from_days(i64::from(first)),
            calendar.units()
        );
    }
    Ok(())
}
