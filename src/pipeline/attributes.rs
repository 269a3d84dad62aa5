//! Identifying metadata required by UKCA
//!
//! Sets the variable name, long name and units, and replaces the attribute
//! map with the fixed set UKCA reads. UKCA expects every value as a string,
//! numbers included.

use crate::config::{EmissionConfig, EMISSION_UNITS};
use crate::cube::{Attributes, EmissionsCube};
use log::{debug, info};
use netcdf::AttributeValue;

/// Overwrite the cube's names, units and attributes from `config`
pub fn apply_metadata(cube: &mut EmissionsCube, config: &EmissionConfig) {
    cube.var_name = config.var_name();
    cube.long_name = Some(config.long_name.clone());
    cube.units = Some(EMISSION_UNITS.to_string());

    if !cube.attributes.is_empty() {
        debug!(
            "Dropping {} attributes inherited from the source file",
            cube.attributes.len()
        );
    }
    cube.attributes = ukca_attributes(config);

    info!(
        "Renamed emissions variable to '{}' ({})",
        cube.var_name, EMISSION_UNITS
    );
}

/// The fixed UKCA attribute set for `config`
pub fn ukca_attributes(config: &EmissionConfig) -> Attributes {
    let pairs = [
        // written on the variable
        ("vertical_scaling", &config.vertical_scaling),
        ("um_stash_source", &config.stash),
        ("tracer_name", &config.species_name),
        // written globally
        ("emission_type", &config.emission_type),
        ("update_type", &config.update_type),
        ("update_freq_in_hours", &config.update_freq_in_hours),
        ("um_version", &config.um_version),
        ("source", &config.source),
        ("data_version", &config.data_version),
    ];

    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), AttributeValue::Str(value.clone())))
        .collect()
}
