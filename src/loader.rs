//! Loading an emissions cube from a NetCDF file
//!
//! The loader picks the emissions variable, reads one coordinate variable per
//! dimension (with bounds when the file provides them), works out which CF
//! axis each coordinate describes, and masks missing data. CF-packed
//! variables (`scale_factor`, `add_offset`) are unpacked to floating point.

use crate::cube::{AxisKind, CellMethod, Coord, DType, EmissionsCube, Values};
use crate::errors::{EmissError, Result};
use log::{debug, info, warn};
use ndarray::{ArrayD, IxDyn};
use netcdf::{AttributeValue, File, Variable};
use std::collections::HashSet;
use std::path::Path;

/// Attributes consumed by the loader instead of being copied to the cube
const STRUCTURAL_ATTRIBUTES: [&str; 15] = [
    "_FillValue",
    "missing_value",
    "standard_name",
    "long_name",
    "units",
    "calendar",
    "axis",
    "bounds",
    "coordinates",
    "scale_factor",
    "add_offset",
    "valid_min",
    "valid_max",
    "valid_range",
    "formula_terms",
];

/// Attributes whose values name other, non-data variables
const REFERENCE_ATTRIBUTES: [&str; 5] = [
    "bounds",
    "coordinates",
    "formula_terms",
    "cell_measures",
    "ancillary_variables",
];

/// Which variable of the file holds the emissions
#[derive(Debug, Clone, Default)]
pub struct CubeConstraint {
    /// Exact variable name
    pub var_name: Option<String>,
    /// Value of the variable's `um_stash_source` attribute, used to break ties
    pub stash: Option<String>,
}

/// Load the emissions cube from `path`
pub fn load_cube(path: &Path, constraint: &CubeConstraint) -> Result<EmissionsCube> {
    let file = netcdf::open(path)?;
    info!("Opened emissions file {}", path.display());

    let var = select_data_variable(&file, constraint)?;
    let var_name = var.name();
    debug!("Using '{}' as the emissions variable", var_name);

    let mut dim_coords = Vec::new();
    for dim in var.dimensions() {
        let dim_name = dim.name();
        let coord_var = file
            .variable(&dim_name)
            .filter(|v| v.dimensions().len() == 1)
            .ok_or_else(|| EmissError::CoordinateNotFound {
                var: var_name.clone(),
                dim: dim_name.clone(),
            })?;
        dim_coords.push(read_coord(&file, &coord_var)?);
    }

    let dtype = variable_dtype(&var)?;
    let stored = read_values(&var, dtype)?;

    // Missing and valid values are given in stored units
    let missing: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|key| attribute_value(&var, key))
        .filter_map(|value| attr_as_f64(&value))
        .collect();
    let mask = build_mask(&stored, &missing, valid_range(&var));

    let packing = Packing::of(&var);
    let data = match &packing {
        Some(packing) => {
            debug!(
                "Unpacking '{}' with scale_factor {} and add_offset {}",
                var_name, packing.scale_factor, packing.add_offset
            );
            packing.unpack(&stored)
        }
        None => stored,
    };

    let mut cube = EmissionsCube::new(var_name.clone(), data, dim_coords)?;
    if packing.is_none() {
        cube.fill_value = missing.first().copied();
    }
    cube.mask = Some(mask);
    if cube.masked_count() > 0 {
        debug!("Masked {} missing points", cube.masked_count());
    }

    cube.standard_name = string_attribute(&var, "standard_name");
    cube.long_name = string_attribute(&var, "long_name");
    cube.units = string_attribute(&var, "units");

    // File attributes first so variable attributes win on clashes
    for attr in file.attributes() {
        match attr.value() {
            Ok(value) => {
                cube.attributes.insert(attr.name().to_string(), value);
            }
            Err(e) => warn!("Skipped global attribute '{}': {}", attr.name(), e),
        }
    }
    for attr in var.attributes() {
        let name = attr.name().to_string();
        if name == "cell_methods" {
            if let Ok(AttributeValue::Str(text)) = attr.value() {
                cube.cell_methods = CellMethod::parse_all(&text);
            }
            continue;
        }
        if STRUCTURAL_ATTRIBUTES.contains(&name.as_str()) {
            continue;
        }
        match attr.value() {
            Ok(value) => {
                cube.attributes.insert(name, value);
            }
            Err(e) => warn!("Skipped attribute '{}' of '{}': {}", name, var_name, e),
        }
    }

    info!(
        "Loaded '{}' with shape {:?} ({})",
        cube.var_name,
        cube.shape(),
        cube.data.dtype()
    );
    Ok(cube)
}

/// Choose the variable holding the emissions field
fn select_data_variable<'f>(file: &'f File, constraint: &CubeConstraint) -> Result<Variable<'f>> {
    if let Some(name) = &constraint.var_name {
        return file
            .variable(name)
            .ok_or_else(|| EmissError::VariableNotFound { var: name.clone() });
    }

    let dimension_names: HashSet<String> = file.dimensions().map(|d| d.name()).collect();
    let mut auxiliary: HashSet<String> = HashSet::new();
    for var in file.variables() {
        for key in REFERENCE_ATTRIBUTES {
            if let Some(text) = string_attribute(&var, key) {
                auxiliary.extend(referenced_variables(&text));
            }
        }
    }

    let mut candidates: Vec<Variable<'f>> = file
        .variables()
        .filter(|v| v.dimensions().len() >= 2)
        .filter(|v| !dimension_names.contains(&v.name()))
        .filter(|v| !auxiliary.contains(&v.name()))
        .collect();

    if candidates.len() > 1 {
        if let Some(stash) = &constraint.stash {
            let keyed: Vec<usize> = candidates
                .iter()
                .enumerate()
                .filter(|(_, v)| string_attribute(v, "um_stash_source").as_deref() == Some(stash))
                .map(|(i, _)| i)
                .collect();
            if let [index] = keyed.as_slice() {
                return Ok(candidates.swap_remove(*index));
            }
        }
        return Err(EmissError::AmbiguousVariable {
            candidates: candidates.iter().map(|v| v.name()).collect(),
        });
    }

    candidates.pop().ok_or_else(|| EmissError::VariableNotFound {
        var: "<emissions field>".to_string(),
    })
}

/// Variable names listed in a reference attribute
///
/// Handles plain lists (`lat lon`) and the `key: name` form used by
/// `formula_terms` and `cell_measures`.
fn referenced_variables(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .filter(|token| !token.ends_with(':'))
        .map(str::to_string)
}

/// Read a 1-D coordinate variable and its bounds
fn read_coord(file: &File, var: &Variable) -> Result<Coord> {
    let mut coord = Coord::new(var.name(), read_unpacked(var)?);
    coord.standard_name = string_attribute(var, "standard_name");
    coord.long_name = string_attribute(var, "long_name");
    coord.units = string_attribute(var, "units");
    coord.calendar = string_attribute(var, "calendar");

    for attr in var.attributes() {
        if STRUCTURAL_ATTRIBUTES.contains(&attr.name()) {
            continue;
        }
        if let Ok(value) = attr.value() {
            coord.attributes.insert(attr.name().to_string(), value);
        }
    }

    coord.axis = string_attribute(var, "axis")
        .and_then(|a| AxisKind::parse(&a))
        .or_else(|| guess_axis(&coord));

    if let Some(bounds_name) = string_attribute(var, "bounds") {
        match file.variable(&bounds_name) {
            Some(bounds_var) => coord.set_bounds(read_unpacked(&bounds_var)?)?,
            None => warn!(
                "Bounds variable '{}' of '{}' is missing",
                bounds_name,
                coord.var_name
            ),
        }
    }

    debug!(
        "Coordinate '{}': {} points, axis {:?}, {}",
        coord.var_name,
        coord.len(),
        coord.axis,
        coord.points.dtype()
    );
    Ok(coord)
}

/// Work out the CF axis of a coordinate from its names and units
pub fn guess_axis(coord: &Coord) -> Option<AxisKind> {
    if let Some(standard_name) = coord.standard_name.as_deref() {
        match standard_name {
            "longitude" | "grid_longitude" | "projection_x_coordinate" => {
                return Some(AxisKind::X)
            }
            "latitude" | "grid_latitude" | "projection_y_coordinate" => {
                return Some(AxisKind::Y)
            }
            "time" | "forecast_reference_time" => return Some(AxisKind::T),
            "model_level_number" | "air_pressure" | "altitude" | "height" | "depth"
            | "atmosphere_hybrid_height_coordinate" => return Some(AxisKind::Z),
            _ => {}
        }
    }

    if let Some(units) = coord.units.as_deref() {
        let units = units.trim();
        match units {
            "degrees_east" | "degree_east" | "degree_E" | "degrees_E" => return Some(AxisKind::X),
            "degrees_north" | "degree_north" | "degree_N" | "degrees_N" => {
                return Some(AxisKind::Y)
            }
            "Pa" | "hPa" | "mbar" | "millibar" => return Some(AxisKind::Z),
            _ if units.contains(" since ") => return Some(AxisKind::T),
            _ => {}
        }
    }

    if coord.attributes.contains_key("positive") {
        return Some(AxisKind::Z);
    }

    match coord.var_name.to_lowercase().as_str() {
        "lon" | "longitude" | "x" => Some(AxisKind::X),
        "lat" | "latitude" | "y" => Some(AxisKind::Y),
        "time" | "t" => Some(AxisKind::T),
        "lev" | "level" | "z" | "height" | "alt" => Some(AxisKind::Z),
        _ => None,
    }
}

fn variable_dtype(var: &Variable) -> Result<DType> {
    let vartype = var.vartype();
    DType::from_netcdf_type(&vartype).ok_or_else(|| {
        EmissError::Generic(format!(
            "Variable '{}' has unsupported type {:?}",
            var.name(),
            vartype
        ))
    })
}

/// Read a variable, applying its CF packing if it has one
fn read_unpacked(var: &Variable) -> Result<Values> {
    let stored = read_values(var, variable_dtype(var)?)?;
    Ok(match Packing::of(var) {
        Some(packing) => packing.unpack(&stored),
        None => stored,
    })
}

fn read_values(var: &Variable, dtype: DType) -> Result<Values> {
    let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
    let shape = IxDyn(&shape);
    Ok(match dtype {
        DType::Int32 => Values::Int(ArrayD::from_shape_vec(shape, var.get_values::<i32, _>(..)?)?),
        DType::Float32 => {
            Values::Float(ArrayD::from_shape_vec(shape, var.get_values::<f32, _>(..)?)?)
        }
        DType::Float64 => {
            Values::Double(ArrayD::from_shape_vec(shape, var.get_values::<f64, _>(..)?)?)
        }
    })
}

/// CF packing of a variable: `unpacked = stored * scale_factor + add_offset`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Packing {
    scale_factor: f64,
    add_offset: f64,
    /// Precision of the packing attributes, which is the unpacked precision
    unpacked: DType,
}

impl Packing {
    fn of(var: &Variable) -> Option<Self> {
        let scale_factor = attribute_value(var, "scale_factor");
        let add_offset = attribute_value(var, "add_offset");
        if scale_factor.is_none() && add_offset.is_none() {
            return None;
        }

        let is_double = |value: &Option<AttributeValue>| {
            matches!(
                value,
                Some(AttributeValue::Double(_) | AttributeValue::Doubles(_))
            )
        };
        let unpacked = if is_double(&scale_factor) || is_double(&add_offset) {
            DType::Float64
        } else {
            DType::Float32
        };

        Some(Self {
            scale_factor: scale_factor.as_ref().and_then(attr_as_f64).unwrap_or(1.0),
            add_offset: add_offset.as_ref().and_then(attr_as_f64).unwrap_or(0.0),
            unpacked,
        })
    }

    fn unpack(&self, stored: &Values) -> Values {
        let unpacked = stored
            .to_f64()
            .mapv(|v| v * self.scale_factor + self.add_offset);
        Values::Double(unpacked).astype(self.unpacked)
    }
}

/// Valid interval in stored units, from `valid_range` or `valid_min`/`valid_max`
fn valid_range(var: &Variable) -> (Option<f64>, Option<f64>) {
    if let Some(range) = attribute_value(var, "valid_range") {
        if let [min, max, ..] = attr_as_f64s(&range)[..] {
            return (Some(min), Some(max));
        }
    }
    let limit = |key: &str| attribute_value(var, key).as_ref().and_then(attr_as_f64);
    (limit("valid_min"), limit("valid_max"))
}

fn build_mask(data: &Values, missing: &[f64], valid: (Option<f64>, Option<f64>)) -> ArrayD<bool> {
    let (min, max) = valid;
    let dtype = data.dtype();
    data.to_f64().mapv(|v| {
        !v.is_finite()
            || missing.iter().any(|&m| is_missing(v, m, dtype))
            || min.is_some_and(|min| v < min)
            || max.is_some_and(|max| v > max)
    })
}

/// Compare in the precision the data was stored in
fn is_missing(value: f64, missing: f64, dtype: DType) -> bool {
    match dtype {
        DType::Float32 => value as f32 == missing as f32,
        _ => value == missing,
    }
}

fn attribute_value(var: &Variable, key: &str) -> Option<AttributeValue> {
    var.attribute(key).and_then(|attr| attr.value().ok())
}

fn string_attribute(var: &Variable, key: &str) -> Option<String> {
    match attribute_value(var, key)? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Numeric attribute as a double, taking the first element of arrays
pub fn attr_as_f64(value: &AttributeValue) -> Option<f64> {
    attr_as_f64s(value).first().copied()
}

/// Every element of a numeric attribute as a double; empty for text
pub fn attr_as_f64s(value: &AttributeValue) -> Vec<f64> {
    fn widen<T: Copy + Into<f64>>(values: &[T]) -> Vec<f64> {
        values.iter().map(|&v| v.into()).collect()
    }
    match value {
        AttributeValue::Uchar(v) => vec![f64::from(*v)],
        AttributeValue::Schar(v) => vec![f64::from(*v)],
        AttributeValue::Ushort(v) => vec![f64::from(*v)],
        AttributeValue::Short(v) => vec![f64::from(*v)],
        AttributeValue::Uint(v) => vec![f64::from(*v)],
        AttributeValue::Int(v) => vec![f64::from(*v)],
        AttributeValue::Float(v) => vec![f64::from(*v)],
        AttributeValue::Double(v) => vec![*v],
        AttributeValue::Uchars(v) => widen(v),
        AttributeValue::Schars(v) => widen(v),
        AttributeValue::Ushorts(v) => widen(v),
        AttributeValue::Shorts(v) => widen(v),
        AttributeValue::Uints(v) => widen(v),
        AttributeValue::Ints(v) => widen(v),
        AttributeValue::Floats(v) => widen(v),
        AttributeValue::Doubles(v) => v.clone(),
        _ => Vec::new(),
    }
}
