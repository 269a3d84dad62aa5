//! Storage precision and missing data
//!
//! UKCA reads coordinates in double precision and the emissions payload in
//! single precision with a `1e20` fill value.

use crate::cube::{AxisKind, DType, EmissionsCube, Values};
use log::{debug, info};
use netcdf::AttributeValue;

/// Cast coordinate points of every spatial and time axis to float64, and
/// latitude bounds to float64.
///
/// Longitude bounds are left in whatever precision they were guessed in.
pub fn promote_coordinates(cube: &mut EmissionsCube) {
    for axis in [AxisKind::X, AxisKind::Y, AxisKind::Z, AxisKind::T] {
        if let Some(coord) = cube.coord_by_axis_mut(axis) {
            if coord.points.dtype() != DType::Float64 {
                debug!(
                    "Casting '{}' points from {} to float64",
                    coord.var_name,
                    coord.points.dtype()
                );
                coord.points = coord.points.astype(DType::Float64);
            }
        }
    }

    if let Some(lat) = cube.coord_by_axis_mut(AxisKind::Y) {
        lat.bounds = lat.bounds.take().map(|b| b.astype(DType::Float64));
    }
}

/// Store the payload as float32 and mask everything that is not finite
/// afterwards, then record `fill_value` as the fill value
pub fn normalize_fill(cube: &mut EmissionsCube, fill_value: f64) {
    let data = cube.data.to_f32();

    let non_finite = data.mapv(|v| !v.is_finite());
    let mask = match cube.mask.take() {
        Some(mut mask) => {
            ndarray::Zip::from(&mut mask)
                .and(&non_finite)
                .for_each(|m, &bad| *m = *m || bad);
            mask
        }
        None => non_finite,
    };

    cube.data = Values::Float(data);
    cube.mask = Some(mask);
    cube.fill_value = Some(fill_value);

    info!(
        "Payload stored as float32 with fill value {:e} ({} masked points)",
        fill_value,
        cube.masked_count()
    );
}

/// Record the fill value under `missing_value` too, for readers that only
/// know the older convention
pub fn set_missing_value(cube: &mut EmissionsCube, fill_value: f64) {
    cube.attributes.insert(
        "missing_value".to_string(),
        AttributeValue::Float(fill_value as f32),
    );
}
