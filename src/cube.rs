//! In-memory emissions cube
//!
//! A cube bundles a data payload with the coordinates describing each of its
//! dimensions, auxiliary coordinates, cell methods and attributes. Numeric
//! arrays keep their storage precision (see [`Values`]) so that the
//! precision rules applied before writing are explicit.

use crate::errors::{EmissError, Result};
use ndarray::{Array1, Array2, ArrayD, Axis};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;
use std::collections::BTreeMap;
use std::fmt;

/// Ordered attribute map
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Storage precision of a numeric array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int32,
    Float32,
    Float64,
}

impl DType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Precision a NetCDF variable is read into
    ///
    /// Integers that do not fit losslessly in an `i32` are not supported.
    pub fn from_netcdf_type(vartype: &NcVariableType) -> Option<Self> {
        match vartype {
            NcVariableType::Float(FloatType::F64) => Some(Self::Float64),
            NcVariableType::Float(FloatType::F32) => Some(Self::Float32),
            NcVariableType::Int(
                IntType::I8 | IntType::U8 | IntType::I16 | IntType::U16 | IntType::I32,
            ) => Some(Self::Int32),
            _ => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric array together with its storage precision
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Int(ArrayD<i32>),
    Float(ArrayD<f32>),
    Double(ArrayD<f64>),
}

impl Values {
    pub fn dtype(&self) -> DType {
        match self {
            Self::Int(_) => DType::Int32,
            Self::Float(_) => DType::Float32,
            Self::Double(_) => DType::Float64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Int(a) => a.shape(),
            Self::Float(a) => a.shape(),
            Self::Double(a) => a.shape(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int(a) => a.len(),
            Self::Float(a) => a.len(),
            Self::Double(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widened copy of the values
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            Self::Int(a) => a.mapv(f64::from),
            Self::Float(a) => a.mapv(f64::from),
            Self::Double(a) => a.clone(),
        }
    }

    /// Narrowed copy of the values
    pub fn to_f32(&self) -> ArrayD<f32> {
        match self {
            Self::Int(a) => a.mapv(|v| v as f32),
            Self::Float(a) => a.clone(),
            Self::Double(a) => a.mapv(|v| v as f32),
        }
    }

    /// Convert to another storage precision
    ///
    /// Narrowing to `Int32` truncates toward zero.
    #[must_use]
    pub fn astype(&self, dtype: DType) -> Self {
        if self.dtype() == dtype {
            return self.clone();
        }
        match dtype {
            DType::Int32 => Self::Int(self.to_f64().mapv(|v| v as i32)),
            DType::Float32 => Self::Float(self.to_f32()),
            DType::Float64 => Self::Double(self.to_f64()),
        }
    }

    /// 1-D array of doubles
    pub fn double_1d(values: Vec<f64>) -> Self {
        Self::Double(Array1::from(values).into_dyn())
    }

    /// 1-D array of integers
    pub fn int_1d(values: Vec<i32>) -> Self {
        Self::Int(Array1::from(values).into_dyn())
    }
}

/// CF axis a coordinate describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKind {
    X,
    Y,
    Z,
    T,
}

impl AxisKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
            Self::T => "T",
        }
    }

    pub fn parse(axis: &str) -> Option<Self> {
        match axis.trim().to_uppercase().as_str() {
            "X" => Some(Self::X),
            "Y" => Some(Self::Y),
            "Z" => Some(Self::Z),
            "T" => Some(Self::T),
            _ => None,
        }
    }
}

/// A labelled 1-D coordinate, optionally bounded
#[derive(Debug, Clone)]
pub struct Coord {
    pub var_name: String,
    pub standard_name: Option<String>,
    pub long_name: Option<String>,
    pub units: Option<String>,
    pub calendar: Option<String>,
    pub axis: Option<AxisKind>,
    pub points: Values,
    pub bounds: Option<Values>,
    pub attributes: Attributes,
}

impl Coord {
    pub fn new(var_name: impl Into<String>, points: Values) -> Self {
        Self {
            var_name: var_name.into(),
            standard_name: None,
            long_name: None,
            units: None,
            calendar: None,
            axis: None,
            points,
            bounds: None,
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_standard_name(mut self, standard_name: impl Into<String>) -> Self {
        self.standard_name = Some(standard_name.into());
        self
    }

    #[must_use]
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    #[must_use]
    pub fn with_axis(mut self, axis: AxisKind) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Name used to look the coordinate up: standard name, else var name
    pub fn name(&self) -> &str {
        self.standard_name.as_deref().unwrap_or(&self.var_name)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn has_bounds(&self) -> bool {
        self.bounds.is_some()
    }

    /// Attach explicit bounds of shape `(len, 2)`
    pub fn set_bounds(&mut self, bounds: Values) -> Result<()> {
        if bounds.shape() != [self.len(), 2] {
            return Err(EmissError::BoundsError {
                coord: self.name().to_string(),
                message: format!(
                    "bounds of shape {:?} do not fit {} points",
                    bounds.shape(),
                    self.len()
                ),
            });
        }
        self.bounds = Some(bounds);
        Ok(())
    }

    /// Guess contiguous bounds half way between neighbouring points.
    ///
    /// The outermost bounds are extrapolated by half the adjacent spacing.
    /// Bounds of `Float32` points stay `Float32`; any other points give
    /// `Float64` bounds. Fails if the coordinate already has bounds or has
    /// fewer than two points.
    pub fn guess_bounds(&mut self) -> Result<()> {
        if self.has_bounds() {
            return Err(EmissError::BoundsError {
                coord: self.name().to_string(),
                message: "coordinate already has bounds".to_string(),
            });
        }

        let bounds = guess_bounds_for(self.name(), &self.points.to_f64())?;
        let bounds = bounds.into_dyn();
        self.bounds = Some(match self.points {
            Values::Float(_) => Values::Float(bounds.mapv(|v| v as f32)),
            _ => Values::Double(bounds),
        });
        Ok(())
    }
}

/// Midpoint bounds for a 1-D array of points
pub fn guess_bounds_for(name: &str, points: &ArrayD<f64>) -> Result<Array2<f64>> {
    if points.ndim() != 1 {
        return Err(EmissError::BoundsError {
            coord: name.to_string(),
            message: format!("cannot guess bounds for a {}-D coordinate", points.ndim()),
        });
    }
    let n = points.len();
    if n < 2 {
        return Err(EmissError::BoundsError {
            coord: name.to_string(),
            message: format!("cannot guess bounds for a coordinate of length {}", n),
        });
    }

    let p: Vec<f64> = points.iter().copied().collect();
    let mut diffs: Vec<f64> = p.windows(2).map(|w| w[1] - w[0]).collect();
    diffs.insert(0, diffs[0]);
    diffs.push(diffs[diffs.len() - 1]);

    let mut bounds = Array2::<f64>::zeros((n, 2));
    for i in 0..n {
        bounds[[i, 0]] = p[i] - diffs[i] * 0.5;
        bounds[[i, 1]] = p[i] + diffs[i + 1] * 0.5;
    }
    Ok(bounds)
}

/// A CF cell method such as `time: mean`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMethod {
    pub method: String,
    pub coords: Vec<String>,
}

impl CellMethod {
    pub fn new(method: impl Into<String>, coord: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            coords: vec![coord.into()],
        }
    }

    /// Parse a `cell_methods` attribute, ignoring any parenthesised comments
    pub fn parse_all(text: &str) -> Vec<CellMethod> {
        let mut methods = Vec::new();
        let mut names = Vec::new();
        let mut depth = 0usize;

        for token in text.split_whitespace() {
            if token.starts_with('(') {
                depth += 1;
            }
            if depth > 0 {
                if token.ends_with(')') {
                    depth -= 1;
                }
                continue;
            }
            if let Some(name) = token.strip_suffix(':') {
                names.push(name.to_string());
            } else if !names.is_empty() {
                methods.push(CellMethod {
                    method: token.to_string(),
                    coords: std::mem::take(&mut names),
                });
            }
        }
        methods
    }
}

impl fmt::Display for CellMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for coord in &self.coords {
            write!(f, "{}: ", coord)?;
        }
        f.write_str(&self.method)
    }
}

/// An auxiliary coordinate spanning one data dimension, or none if scalar
#[derive(Debug, Clone)]
pub struct AuxCoord {
    pub coord: Coord,
    pub dim: Option<usize>,
}

/// The emissions field being converted
#[derive(Debug, Clone)]
pub struct EmissionsCube {
    pub var_name: String,
    pub standard_name: Option<String>,
    pub long_name: Option<String>,
    pub units: Option<String>,
    pub data: Values,
    pub mask: Option<ArrayD<bool>>,
    pub fill_value: Option<f64>,
    pub dim_coords: Vec<Coord>,
    pub aux_coords: Vec<AuxCoord>,
    pub cell_methods: Vec<CellMethod>,
    pub attributes: Attributes,
}

impl EmissionsCube {
    /// Build a cube, checking that there is one coordinate per data
    /// dimension and that each coordinate matches its dimension length
    pub fn new(var_name: impl Into<String>, data: Values, dim_coords: Vec<Coord>) -> Result<Self> {
        let shape = data.shape().to_vec();
        if shape.len() != dim_coords.len() {
            return Err(EmissError::Generic(format!(
                "data has {} dimensions but {} dimension coordinates were given",
                shape.len(),
                dim_coords.len()
            )));
        }
        for (coord, &len) in dim_coords.iter().zip(&shape) {
            if coord.len() != len {
                return Err(EmissError::ShapeMismatch {
                    coord: coord.name().to_string(),
                    expected: len,
                    found: coord.len(),
                });
            }
        }

        Ok(Self {
            var_name: var_name.into(),
            standard_name: None,
            long_name: None,
            units: None,
            data,
            mask: None,
            fill_value: None,
            dim_coords,
            aux_coords: Vec::new(),
            cell_methods: Vec::new(),
            attributes: Attributes::new(),
        })
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Data dimension described by the coordinate on `axis`
    pub fn axis_dim(&self, axis: AxisKind) -> Option<usize> {
        self.dim_coords.iter().position(|c| c.axis == Some(axis))
    }

    pub fn coord_by_axis(&self, axis: AxisKind) -> Option<&Coord> {
        self.dim_coords.iter().find(|c| c.axis == Some(axis))
    }

    pub fn coord_by_axis_mut(&mut self, axis: AxisKind) -> Option<&mut Coord> {
        self.dim_coords.iter_mut().find(|c| c.axis == Some(axis))
    }

    /// Like [`Self::coord_by_axis_mut`] but failing with `AxisNotFound`
    pub fn require_axis_mut(&mut self, axis: AxisKind) -> Result<&mut Coord> {
        self.coord_by_axis_mut(axis)
            .ok_or_else(|| EmissError::AxisNotFound {
                axis: axis.as_str().to_string(),
            })
    }

    /// Find a dimension or auxiliary coordinate by standard name or var name
    pub fn coord(&self, name: &str) -> Option<&Coord> {
        self.dim_coords
            .iter()
            .chain(self.aux_coords.iter().map(|a| &a.coord))
            .find(|c| c.standard_name.as_deref() == Some(name) || c.var_name == name)
    }

    /// Attach an auxiliary coordinate to a data dimension, or as a scalar
    pub fn add_aux_coord(&mut self, coord: Coord, dim: Option<usize>) -> Result<()> {
        let expected = match dim {
            Some(d) => *self.shape().get(d).ok_or_else(|| {
                EmissError::Generic(format!(
                    "cube has no dimension {} for coordinate '{}'",
                    d,
                    coord.name()
                ))
            })?,
            None => 1,
        };
        if coord.len() != expected {
            return Err(EmissError::ShapeMismatch {
                coord: coord.name().to_string(),
                expected,
                found: coord.len(),
            });
        }
        self.aux_coords.push(AuxCoord { coord, dim });
        Ok(())
    }

    /// Insert a new length-one dimension at `position` described by `coord`
    pub fn insert_axis(&mut self, position: usize, coord: Coord) -> Result<()> {
        if coord.len() != 1 {
            return Err(EmissError::ShapeMismatch {
                coord: coord.name().to_string(),
                expected: 1,
                found: coord.len(),
            });
        }
        if position > self.ndim() {
            return Err(EmissError::Generic(format!(
                "cannot insert a dimension at position {} of a {}-D cube",
                position,
                self.ndim()
            )));
        }

        let axis = Axis(position);
        self.data = match std::mem::replace(&mut self.data, Values::int_1d(Vec::new())) {
            Values::Int(a) => Values::Int(a.insert_axis(axis)),
            Values::Float(a) => Values::Float(a.insert_axis(axis)),
            Values::Double(a) => Values::Double(a.insert_axis(axis)),
        };
        self.mask = self.mask.take().map(|m| m.insert_axis(axis));
        self.dim_coords.insert(position, coord);
        for aux in &mut self.aux_coords {
            if let Some(d) = aux.dim.as_mut() {
                if *d >= position {
                    *d += 1;
                }
            }
        }
        Ok(())
    }

    /// Payload with masked points replaced by `fill`
    pub fn filled_f32(&self, fill: f32) -> ArrayD<f32> {
        let mut data = self.data.to_f32();
        if let Some(mask) = &self.mask {
            ndarray::Zip::from(&mut data)
                .and(mask)
                .for_each(|value, &masked| {
                    if masked {
                        *value = fill;
                    }
                });
        }
        data
    }

    /// Number of masked points in the payload
    pub fn masked_count(&self) -> usize {
        self.mask
            .as_ref()
            .map_or(0, |m| m.iter().filter(|&&masked| masked).count())
    }
}
