//! Optional single model level
//!
//! Surface and column fields can be given an explicit `model_level_number`
//! axis of length one, placed straight after time.

use crate::cube::{AxisKind, Coord, EmissionsCube, Values};
use crate::errors::Result;
use log::info;
use netcdf::AttributeValue;

/// Insert a length-one `model_level_number` dimension after the time axis
pub fn add_model_level(cube: &mut EmissionsCube) -> Result<()> {
    if cube.coord_by_axis(AxisKind::Z).is_some() {
        info!("Cube already has a vertical axis, not adding model_level_number");
        return Ok(());
    }

    let mut level = Coord::new("model_level_number", Values::int_1d(vec![0]))
        .with_standard_name("model_level_number")
        .with_units("1")
        .with_axis(AxisKind::Z);
    level
        .attributes
        .insert("positive".to_string(), AttributeValue::Str("up".to_string()));

    let position = cube.axis_dim(AxisKind::T).map_or(0, |t| t + 1);
    cube.insert_axis(position, level)?;
    info!("Added model_level_number as dimension {}", position);
    Ok(())
}
