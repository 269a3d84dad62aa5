//! Centralized error handling for the emissions converter
//!
//! Every fallible operation in the crate returns [`Result`], carrying an
//! [`EmissError`] that wraps library errors (NetCDF, I/O, ndarray, JSON) and
//! the precondition failures detected by the pipeline itself.

use std::fmt;

/// Main error type for emissions conversion
#[derive(Debug)]
pub enum EmissError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Configuration file could not be parsed
    ConfigError(serde_json::Error),

    /// Configuration parsed but holds an unusable value
    InvalidConfig { message: String },

    /// Variable not found in NetCDF file
    VariableNotFound { var: String },

    /// More than one variable could be the emissions field
    AmbiguousVariable { candidates: Vec<String> },

    /// A dimension of the data variable has no coordinate variable
    CoordinateNotFound { var: String, dim: String },

    /// No coordinate on the cube maps to the requested axis
    AxisNotFound { axis: String },

    /// Generated time points do not match the time dimension
    TimeLengthMismatch { expected: usize, found: usize },

    /// Bounds could not be guessed or attached
    BoundsError { coord: String, message: String },

    /// Coordinate length does not match the dimension it is attached to
    ShapeMismatch { coord: String, expected: usize, found: usize },

    /// Generic error for everything else
    Generic(String),
}

impl fmt::Display for EmissError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmissError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            EmissError::IoError(e) => write!(f, "I/O error: {}", e),
            EmissError::ArrayError(e) => write!(f, "Array error: {}", e),
            EmissError::ConfigError(e) => write!(f, "Configuration error: {}", e),
            EmissError::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            EmissError::VariableNotFound { var } => write!(f, "Variable '{}' not found in file", var),
            EmissError::AmbiguousVariable { candidates } => write!(
                f,
                "Cannot choose the emissions variable, candidates are: {}",
                candidates.join(", ")
            ),
            EmissError::CoordinateNotFound { var, dim } => write!(
                f,
                "Dimension '{}' of variable '{}' has no coordinate variable",
                dim, var
            ),
            EmissError::AxisNotFound { axis } => write!(f, "No coordinate found for axis '{}'", axis),
            EmissError::TimeLengthMismatch { expected, found } => write!(
                f,
                "Time axis mismatch: {} time points generated but the time dimension has length {}",
                expected, found
            ),
            EmissError::BoundsError { coord, message } => {
                write!(f, "Bounds error on coordinate '{}': {}", coord, message)
            }
            EmissError::ShapeMismatch {
                coord,
                expected,
                found,
            } => write!(
                f,
                "Coordinate '{}' has length {} but the dimension has length {}",
                coord, found, expected
            ),
            EmissError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EmissError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EmissError::NetCDFError(e) => Some(e),
            EmissError::IoError(e) => Some(e),
            EmissError::ArrayError(e) => Some(e),
            EmissError::ConfigError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for EmissError {
    fn from(error: netcdf::Error) -> Self {
        EmissError::NetCDFError(error)
    }
}

impl From<std::io::Error> for EmissError {
    fn from(error: std::io::Error) -> Self {
        EmissError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for EmissError {
    fn from(error: ndarray::ShapeError) -> Self {
        EmissError::ArrayError(error)
    }
}

impl From<serde_json::Error> for EmissError {
    fn from(error: serde_json::Error) -> Self {
        EmissError::ConfigError(error)
    }
}

impl From<String> for EmissError {
    fn from(error: String) -> Self {
        EmissError::Generic(error)
    }
}

impl From<&str> for EmissError {
    fn from(error: &str) -> Self {
        EmissError::Generic(error.to_string())
    }
}

/// Result type alias for emissions conversion
pub type Result<T> = std::result::Result<T, EmissError>;
