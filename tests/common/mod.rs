//! Synthetic source files shared by the integration tests

#![allow(dead_code)]

use ndarray::{ArrayD, IxDyn};
use netcdf::{create, FileMut, VariableMut};
use std::path::Path;

pub const SOURCE_VAR: &str = "NO_emissions";
pub const SOURCE_FILL: f32 = -999.0;
pub const SOURCE_STANDARD_NAME: &str =
    "tendency_of_atmosphere_mass_content_of_nitrogen_monoxide_due_to_emission_from_aviation";

/// Packed sources store shorts with these CF attributes
pub const PACKED_FILL: i16 = -32767;
pub const PACKED_SCALE: f64 = 0.5;
pub const PACKED_OFFSET: f64 = 1.0;
pub const PACKED_VALID_MAX: i16 = 1000;

/// Heights of the hybrid-height levels, in metres
pub const LEVEL_HEIGHTS: [f32; 2] = [20.0, 120.0];

/// Value stored at `(t, y, x)` in the synthetic emissions field
pub fn emission_value(t: usize, y: usize, x: usize) -> f32 {
    1.0e-12 * (1 + t * 100 + y * 10 + x) as f32
}

/// Stored value at `(t, y, x)` in a packed source
pub fn packed_value(t: usize, y: usize, x: usize) -> i16 {
    (t * 20 + y * 4 + x) as i16
}

/// What a packed source holds at `(t, y, x)` once unpacked
pub fn unpacked_value(t: usize, y: usize, x: usize) -> f32 {
    (f64::from(packed_value(t, y, x)) * PACKED_SCALE + PACKED_OFFSET) as f32
}

/// Shape and storage of a synthetic emissions file
#[derive(Debug, Clone)]
pub struct SourceLayout {
    pub ntime: usize,
    /// Number of hybrid-height levels; `None` for a surface field
    pub nlev: Option<usize>,
    pub nlat: usize,
    pub nlon: usize,
    /// Dimension written without a coordinate variable
    pub without_coord: Option<&'static str>,
    /// Store the field as CF-packed shorts
    pub packed: bool,
}

impl SourceLayout {
    pub fn new(ntime: usize, nlat: usize, nlon: usize) -> Self {
        Self {
            ntime,
            nlev: None,
            nlat,
            nlon,
            without_coord: None,
            packed: false,
        }
    }
}

/// Write a plain float32 `time × lat × lon` emissions file
pub fn write_source_file(path: &Path, ntime: usize, nlat: usize, nlon: usize) {
    write_source(path, &SourceLayout::new(ntime, nlat, nlon));
}

/// Write a `time × [level_height ×] lat × lon` emissions file.
///
/// Longitude and latitude are stored as float32 without bounds, time as
/// float64 Gregorian days. The first stored point holds the fill value and
/// the second an invalid value: NaN, or just above `valid_range` when packed.
pub fn write_source(path: &Path, layout: &SourceLayout) {
    let mut file = create(path).expect("Failed to create source file");

    let mut dims = vec![("time", layout.ntime)];
    if let Some(nlev) = layout.nlev {
        dims.push(("level_height", nlev));
    }
    dims.push(("lat", layout.nlat));
    dims.push(("lon", layout.nlon));
    for &(name, len) in &dims {
        file.add_dimension(name, len).expect("Failed to add dimension");
    }
    file.add_attribute("history", "synthetic test data")
        .expect("Failed to add history");
    file.add_attribute("institution", "nowhere")
        .expect("Failed to add institution");

    let time: Vec<f64> = (0..layout.ntime).map(|t| 5400.0 + 30.4 * t as f64).collect();
    let lat: Vec<f32> = (0..layout.nlat)
        .map(|j| -90.0 + 180.0 * (j as f32 + 0.5) / layout.nlat as f32)
        .collect();
    let lon: Vec<f32> = (0..layout.nlon)
        .map(|i| 360.0 * i as f32 / layout.nlon as f32)
        .collect();

    if layout.without_coord != Some("time") {
        let mut var = file.add_variable::<f64>("time", &["time"]).unwrap();
        var.put_attribute("units", "days since 1960-01-01").unwrap();
        var.put_attribute("calendar", "gregorian").unwrap();
        var.put_values(&time, ..).unwrap();
    }
    if layout.without_coord != Some("lat") {
        let mut var = file.add_variable::<f32>("lat", &["lat"]).unwrap();
        var.put_attribute("units", "degrees_north").unwrap();
        var.put_attribute("standard_name", "latitude").unwrap();
        var.put_values(&lat, ..).unwrap();
    }
    if layout.without_coord != Some("lon") {
        let mut var = file.add_variable::<f32>("lon", &["lon"]).unwrap();
        var.put_attribute("units", "degrees_east").unwrap();
        var.put_values(&lon, ..).unwrap();
    }
    if let Some(nlev) = layout.nlev {
        write_hybrid_height(&mut file, nlev);
    }

    let dim_names: Vec<&str> = dims.iter().map(|&(name, _)| name).collect();
    let shape: Vec<usize> = dims.iter().map(|&(_, len)| len).collect();
    let (y_axis, x_axis) = (shape.len() - 2, shape.len() - 1);

    let mut var = if layout.packed {
        let mut data: Vec<i16> = ArrayD::from_shape_fn(IxDyn(&shape), |i| {
            packed_value(i[0], i[y_axis], i[x_axis])
        })
        .iter()
        .copied()
        .collect();
        data[0] = PACKED_FILL;
        if layout.nlon > 1 {
            data[1] = PACKED_VALID_MAX + 1;
        }

        let mut var = file.add_variable::<i16>(SOURCE_VAR, &dim_names).unwrap();
        var.put_attribute("_FillValue", PACKED_FILL).unwrap();
        var.put_attribute("scale_factor", PACKED_SCALE).unwrap();
        var.put_attribute("add_offset", PACKED_OFFSET).unwrap();
        var.put_attribute("valid_range", vec![0i16, PACKED_VALID_MAX])
            .unwrap();
        var.put_values(&data, ..).unwrap();
        var
    } else {
        let mut data: Vec<f32> = ArrayD::from_shape_fn(IxDyn(&shape), |i| {
            emission_value(i[0], i[y_axis], i[x_axis])
        })
        .iter()
        .copied()
        .collect();
        data[0] = SOURCE_FILL;
        if layout.nlon > 1 {
            data[1] = f32::NAN;
        }

        let mut var = file.add_variable::<f32>(SOURCE_VAR, &dim_names).unwrap();
        var.put_attribute("_FillValue", SOURCE_FILL).unwrap();
        var.put_values(&data, ..).unwrap();
        var
    };

    describe_emissions(&mut var);
    if layout.nlev.is_some() {
        var.put_attribute("cell_measures", "area: cell_area").unwrap();
        var.put_attribute("coordinates", "true_latitude").unwrap();
    }
}

fn describe_emissions(var: &mut VariableMut) {
    var.put_attribute("standard_name", SOURCE_STANDARD_NAME).unwrap();
    var.put_attribute("units", "kg m-2 s-1").unwrap();
    var.put_attribute("long_name", "NO aircraft emissions").unwrap();
    var.put_attribute("um_stash_source", "m01s00i340").unwrap();
    var.put_attribute("comment", "inherited").unwrap();
}

/// Hybrid-height levels with the 2-D fields a UM file carries alongside
fn write_hybrid_height(file: &mut FileMut, nlev: usize) {
    let heights: Vec<f32> = (0..nlev)
        .map(|k| LEVEL_HEIGHTS.get(k).copied().unwrap_or(100.0 * k as f32))
        .collect();
    let sigma: Vec<f32> = (0..nlev).map(|k| 1.0 - k as f32 / nlev as f32).collect();
    let nlat = file.dimension("lat").expect("lat dimension").len();
    let nlon = file.dimension("lon").expect("lon dimension").len();

    {
        let mut var = file
            .add_variable::<f32>("level_height", &["level_height"])
            .unwrap();
        var.put_attribute("units", "m").unwrap();
        var.put_attribute("standard_name", "atmosphere_hybrid_height_coordinate")
            .unwrap();
        var.put_attribute("positive", "up").unwrap();
        var.put_attribute(
            "formula_terms",
            "a: level_height b: sigma orog: surface_altitude",
        )
        .unwrap();
        var.put_values(&heights, ..).unwrap();
    }
    {
        let mut var = file.add_variable::<f32>("sigma", &["level_height"]).unwrap();
        var.put_values(&sigma, ..).unwrap();
    }
    {
        let mut var = file
            .add_variable::<f32>("surface_altitude", &["lat", "lon"])
            .unwrap();
        var.put_attribute("standard_name", "surface_altitude").unwrap();
        var.put_attribute("units", "m").unwrap();
        var.put_values(&vec![250.0f32; nlat * nlon], ..).unwrap();
    }
    {
        let mut var = file.add_variable::<f64>("cell_area", &["lat", "lon"]).unwrap();
        var.put_attribute("units", "m2").unwrap();
        var.put_values(&vec![1.0e10f64; nlat * nlon], ..).unwrap();
    }
    {
        let mut var = file
            .add_variable::<f32>("true_latitude", &["lat", "lon"])
            .unwrap();
        var.put_attribute("units", "degrees_north").unwrap();
        var.put_values(&vec![0.0f32; nlat * nlon], ..).unwrap();
    }
}

/// Give `lat` and `lon` float64 bounds of `lat ± 10` and `lon ± 1`
pub fn add_horizontal_bounds(path: &Path) {
    let mut file = netcdf::append(path).expect("Failed to reopen source file");
    file.add_dimension("bnds", 2).unwrap();

    for (name, half_width) in [("lat", 10.0), ("lon", 1.0)] {
        let points: Vec<f64> = file
            .variable(name)
            .expect("coordinate exists")
            .get_values::<f64, _>(..)
            .unwrap();
        let bounds: Vec<f64> = points
            .iter()
            .flat_map(|&p| [p - half_width, p + half_width])
            .collect();

        let bounds_name = format!("{name}_bnds");
        {
            let mut var = file
                .add_variable::<f64>(&bounds_name, &[name, "bnds"])
                .unwrap();
            var.put_values(&bounds, ..).unwrap();
        }
        file.variable_mut(name)
            .unwrap()
            .put_attribute("bounds", bounds_name.as_str())
            .unwrap();
    }
}

/// Add a second emissions-like variable so the data variable is ambiguous
pub fn add_second_field(path: &Path, name: &str, stash: Option<&str>) {
    let mut file = netcdf::append(path).expect("Failed to reopen source file");
    let len: usize = ["time", "lat", "lon"]
        .iter()
        .map(|d| file.dimension(d).expect("dimension exists").len())
        .product();
    let mut var = file
        .add_variable::<f32>(name, &["time", "lat", "lon"])
        .unwrap();
    if let Some(stash) = stash {
        var.put_attribute("um_stash_source", stash).unwrap();
    }
    var.put_values(&vec![0.0f32; len], ..).unwrap();
}
