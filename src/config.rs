//! Conversion settings
//!
//! [`EmissionConfig::default`] reproduces the canonical aircraft NO
//! conversion. A JSON file may override any subset of the fields; the CLI
//! then overrides the JSON.

use crate::calendar::Calendar360;
use crate::errors::{EmissError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Emissions file converted when no input is given
pub const DEFAULT_EMISSIONS_FILE: &str = "/group_workspaces/jasmin2/ukca/vol1/mkoehler/emissions/ACCMIP-MACCity_anthrop_1960-2020/sectors/NOx/n96e/chunks/MACCity_aircraft_NO_1975-1989_n96l85.nc";

/// Units UKCA expects for every emissions field
pub const EMISSION_UNITS: &str = "kg m-2 s-1";

/// Fill value written for masked points
pub const DEFAULT_FILL_VALUE: f64 = 1e20;

/// CF conventions version declared in the output
pub const CF_CONVENTIONS_VERSION: &str = "CF-1.5";

/// Attributes written on the emissions variable rather than globally
pub const LOCAL_KEYS: [&str; 4] = [
    "vertical_scaling",
    "missing_value",
    "um_stash_source",
    "tracer_name",
];

/// Attributes UKCA reads from the file header
pub const GLOBAL_KEYS: [&str; 6] = [
    "emission_type",
    "update_type",
    "update_freq_in_hours",
    "um_version",
    "source",
    "data_version",
];

/// Settings for the mid-month time axis
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeAxisConfig {
    /// Reference date of the `days since` units
    pub epoch: String,
    /// Year of the first time point
    pub first_year: i32,
    /// Month of the first time point
    pub first_month: u32,
    /// Number of monthly time points
    pub count: usize,
}

impl Default for TimeAxisConfig {
    fn default() -> Self {
        Self {
            epoch: "1960-01-01 00:00:00".to_string(),
            first_year: 1974,
            first_month: 12,
            count: 181,
        }
    }
}

impl TimeAxisConfig {
    pub fn calendar(&self) -> Result<Calendar360> {
        Calendar360::from_epoch_str(&self.epoch)
    }
}

/// Everything needed to convert one emissions file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmissionConfig {
    /// Source NetCDF file
    pub emissions_file: PathBuf,
    /// Name of the emissions variable; detected when absent
    pub variable: Option<String>,
    /// STASH code the emissions are associated with
    pub stash: String,
    /// Tracer name, also used in the output variable and file names
    pub species_name: String,
    pub long_name: String,
    pub vertical_scaling: String,
    /// Emission type flag (`1` = time series)
    pub emission_type: String,
    pub update_type: String,
    pub update_freq_in_hours: String,
    pub um_version: String,
    pub source: String,
    pub data_version: String,
    pub time: TimeAxisConfig,
    pub fill_value: f64,
    /// Add a length-one `model_level_number` axis after time
    pub add_model_level: bool,
    /// Directory receiving `ukca_emiss_<species>.nc`
    pub output_dir: PathBuf,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            emissions_file: PathBuf::from(DEFAULT_EMISSIONS_FILE),
            variable: None,
            stash: "m01s00i340".to_string(),
            species_name: "NO_aircrft".to_string(),
            long_name: "NOx aircraft emissions".to_string(),
            vertical_scaling: "all_levels".to_string(),
            emission_type: "1".to_string(),
            update_type: "1".to_string(),
            update_freq_in_hours: "120".to_string(),
            um_version: "10.4".to_string(),
            source: "MACCity_aircraft_NO_1960-2020_n96l85.nc".to_string(),
            data_version: "Beta release".to_string(),
            time: TimeAxisConfig::default(),
            fill_value: DEFAULT_FILL_VALUE,
            add_model_level: false,
            output_dir: PathBuf::from("."),
        }
    }
}

impl EmissionConfig {
    /// Parse a JSON document; missing fields take their default value
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check values that would otherwise fail half way through a conversion
    pub fn validate(&self) -> Result<()> {
        if self.species_name.trim().is_empty() {
            return Err(EmissError::InvalidConfig {
                message: "species_name must not be empty".to_string(),
            });
        }
        if self.time.count == 0 {
            return Err(EmissError::InvalidConfig {
                message: "time.count must be at least 1".to_string(),
            });
        }
        // stored as float32 in the output
        if !(self.fill_value as f32).is_finite() {
            return Err(EmissError::InvalidConfig {
                message: format!("fill_value {} is not a finite float32", self.fill_value),
            });
        }
        self.time.calendar()?;
        Ok(())
    }

    /// Name of the emissions variable in the output file
    pub fn var_name(&self) -> String {
        format!("emissions_{}", self.species_name)
    }

    /// File name of the output, without directory
    pub fn output_file_name(&self) -> String {
        format!("ukca_emiss_{}.nc", self.species_name)
    }

    /// Full path of the output file
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.output_file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_the_aircraft_no_file() {
        let config = EmissionConfig::default();
        assert_eq!(config.var_name(), "emissions_NO_aircrft");
        assert_eq!(config.output_file_name(), "ukca_emiss_NO_aircrft.nc");
        assert_eq!(config.time.count, 181);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EmissionConfig::from_json_str(
            r#"{ "species_name": "CO", "stash": "m01s00i303", "time": { "count": 12 } }"#,
        )
        .unwrap();
        assert_eq!(config.species_name, "CO");
        assert_eq!(config.stash, "m01s00i303");
        assert_eq!(config.time.count, 12);
        assert_eq!(config.time.first_year, 1974);
        assert_eq!(config.um_version, "10.4");
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        assert!(matches!(
            EmissionConfig::from_json_str(r#"{ "speciesname": "CO" }"#),
            Err(EmissError::ConfigError(_))
        ));
        assert!(matches!(
            EmissionConfig::from_json_str(r#"{ "time": { "count": 0 } }"#),
            Err(EmissError::InvalidConfig { .. })
        ));
        assert!(EmissionConfig::from_json_str(r#"{ "species_name": " " }"#).is_err());
    }

    #[test]
    fn fill_value_must_fit_in_float32() {
        assert!(EmissionConfig::from_json_str(r#"{ "fill_value": 1e30 }"#).is_ok());
        assert!(matches!(
            EmissionConfig::from_json_str(r#"{ "fill_value": 1e39 }"#),
            Err(EmissError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn json_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("co.json");
        fs::write(&path, r#"{ "species_name": "CO", "add_model_level": true }"#).unwrap();

        let config = EmissionConfig::from_json_file(&path).unwrap();
        assert_eq!(config.species_name, "CO");
        assert!(config.add_model_level);

        assert!(matches!(
            EmissionConfig::from_json_file(&dir.path().join("absent.json")),
            Err(EmissError::IoError(_))
        ));
    }
}
