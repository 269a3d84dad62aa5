//! Writing a finished cube to NetCDF4-classic
//!
//! The classic data model only allows definitions while the file is in
//! define mode, so the writer defines every dimension, variable and
//! attribute first and writes array data afterwards.

use crate::config::{CF_CONVENTIONS_VERSION, DEFAULT_FILL_VALUE, LOCAL_KEYS};
use crate::cube::{Coord, DType, EmissionsCube, Values};
use crate::errors::{EmissError, Result};
use log::{debug, info};
use ndarray::ArrayD;
use netcdf::{FileMut, Options, VariableMut};
use std::{fs, path::Path};

/// Name of the dimension indexing the two ends of a cell
pub const BOUNDS_DIM: &str = "bnds";

/// How a cube is laid out in the file
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Cube attributes written on the data variable; the rest go global
    pub local_keys: Vec<String>,
    /// Value of the global `Conventions` attribute
    pub conventions: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            local_keys: LOCAL_KEYS.iter().map(|k| k.to_string()).collect(),
            conventions: CF_CONVENTIONS_VERSION.to_string(),
        }
    }
}

/// NetCDF4-classic writer for emissions cubes
pub struct NetCDFWriter<'a> {
    output_path: &'a Path,
    options: WriterOptions,
}

/// A variable waiting for its data once definitions are complete
struct PendingWrite<'c> {
    name: String,
    values: &'c Values,
}

impl<'a> NetCDFWriter<'a> {
    /// Create a new NetCDF writer
    pub fn new(output_path: &'a Path, options: WriterOptions) -> Self {
        Self {
            output_path,
            options,
        }
    }

    fn is_local(&self, key: &str) -> bool {
        self.options.local_keys.iter().any(|k| k == key)
    }

    /// Write `cube`, replacing any existing file at the output path
    pub fn write_cube(&self, cube: &EmissionsCube) -> Result<()> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        let mut file = netcdf::create_with(self.output_path, Options::NETCDF4 | Options::CLASSIC)?;

        // Dimensions, named after their coordinates
        let dim_names: Vec<String> = cube.dim_coords.iter().map(|c| c.var_name.clone()).collect();
        for (name, &len) in dim_names.iter().zip(cube.shape()) {
            file.add_dimension(name, len)?;
        }
        let any_bounds = cube
            .dim_coords
            .iter()
            .chain(cube.aux_coords.iter().map(|a| &a.coord))
            .any(Coord::has_bounds);
        if any_bounds {
            file.add_dimension(BOUNDS_DIM, 2)?;
        }

        let mut pending = Vec::new();

        for (coord, dim_name) in cube.dim_coords.iter().zip(&dim_names) {
            define_coord(&mut file, coord, &[dim_name.as_str()], &mut pending)?;
        }

        let mut aux_names = Vec::new();
        for aux in &cube.aux_coords {
            let dims: Vec<&str> = aux.dim.map(|d| dim_names[d].as_str()).into_iter().collect();
            define_coord(&mut file, &aux.coord, &dims, &mut pending)?;
            aux_names.push(aux.coord.var_name.clone());
        }
        aux_names.sort();

        let fill = cube.fill_value.unwrap_or(DEFAULT_FILL_VALUE) as f32;
        {
            let dim_refs: Vec<&str> = dim_names.iter().map(String::as_str).collect();
            let mut var = file.add_variable::<f32>(&cube.var_name, &dim_refs)?;
            var.put_attribute("_FillValue", fill)?;
            put_optional(&mut var, "standard_name", cube.standard_name.as_deref())?;
            put_optional(&mut var, "long_name", cube.long_name.as_deref())?;
            put_optional(&mut var, "units", cube.units.as_deref())?;

            for (key, value) in cube.attributes.iter().filter(|(k, _)| self.is_local(k)) {
                var.put_attribute(key, value.clone())?;
            }

            if !cube.cell_methods.is_empty() {
                let methods: Vec<String> = cube.cell_methods.iter().map(|m| m.to_string()).collect();
                var.put_attribute("cell_methods", methods.join(" "))?;
            }
            if !aux_names.is_empty() {
                var.put_attribute("coordinates", aux_names.join(" "))?;
            }
        }

        file.add_attribute("Conventions", self.options.conventions.as_str())?;
        for (key, value) in cube.attributes.iter().filter(|(k, _)| !self.is_local(k)) {
            file.add_attribute(key, value.clone())?;
        }
        debug!("Defined {} coordinate variables", pending.len());

        // Data
        for write in &pending {
            put_values(&mut file, &write.name, write.values)?;
        }

        let data = cube.filled_f32(fill);
        let mut var = file
            .variable_mut(&cube.var_name)
            .ok_or_else(|| EmissError::VariableNotFound {
                var: cube.var_name.clone(),
            })?;
        var.put_values(&c_order(&data), ..)?;

        info!(
            "Saved '{}' {:?} to {} (NetCDF4-classic)",
            cube.var_name,
            cube.shape(),
            self.output_path.display()
        );
        Ok(())
    }
}

/// Define a coordinate variable and its bounds; data is queued in `pending`
fn define_coord<'c>(
    file: &mut FileMut,
    coord: &'c Coord,
    dims: &[&str],
    pending: &mut Vec<PendingWrite<'c>>,
) -> Result<()> {
    let bounds_name = format!("{}_bnds", coord.var_name);

    {
        let mut var = add_typed_variable(file, &coord.var_name, dims, coord.points.dtype())?;
        if let Some(axis) = coord.axis {
            var.put_attribute("axis", axis.as_str())?;
        }
        put_optional(&mut var, "units", coord.units.as_deref())?;
        put_optional(&mut var, "standard_name", coord.standard_name.as_deref())?;
        put_optional(&mut var, "long_name", coord.long_name.as_deref())?;
        put_optional(&mut var, "calendar", coord.calendar.as_deref())?;
        if coord.has_bounds() {
            var.put_attribute("bounds", bounds_name.as_str())?;
        }
        for (key, value) in &coord.attributes {
            var.put_attribute(key, value.clone())?;
        }
    }
    pending.push(PendingWrite {
        name: coord.var_name.clone(),
        values: &coord.points,
    });

    if let Some(bounds) = &coord.bounds {
        let mut bounds_dims = dims.to_vec();
        bounds_dims.push(BOUNDS_DIM);
        add_typed_variable(file, &bounds_name, &bounds_dims, bounds.dtype())?;
        pending.push(PendingWrite {
            name: bounds_name,
            values: bounds,
        });
    }
    Ok(())
}

fn add_typed_variable<'f>(
    file: &'f mut FileMut,
    name: &str,
    dims: &[&str],
    dtype: DType,
) -> Result<VariableMut<'f>> {
    Ok(match dtype {
        DType::Int32 => file.add_variable::<i32>(name, dims)?,
        DType::Float32 => file.add_variable::<f32>(name, dims)?,
        DType::Float64 => file.add_variable::<f64>(name, dims)?,
    })
}

/// Write the whole of a variable; scalars take their single value
fn put_values(file: &mut FileMut, name: &str, values: &Values) -> Result<()> {
    let mut var = file
        .variable_mut(name)
        .ok_or_else(|| EmissError::VariableNotFound {
            var: name.to_string(),
        })?;
    match values {
        Values::Int(a) => var.put_values(&c_order(a), ..)?,
        Values::Float(a) => var.put_values(&c_order(a), ..)?,
        Values::Double(a) => var.put_values(&c_order(a), ..)?,
    }
    Ok(())
}

/// Elements in row-major order, whatever the array's memory layout
fn c_order<T: Copy>(array: &ArrayD<T>) -> Vec<T> {
    array.iter().copied().collect()
}

fn put_optional(var: &mut VariableMut, key: &str, value: Option<&str>) -> Result<()> {
    if let Some(value) = value {
        var.put_attribute(key, value)?;
    }
    Ok(())
}
