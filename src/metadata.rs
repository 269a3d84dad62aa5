//! Inspection of written ancillary files
//!
//! This module provides functions for examining the structure of a NetCDF
//! file, used by the `--describe` flag to check a freshly written output.

use crate::cube::Attributes;
use crate::errors::{EmissError, Result};
use netcdf::{AttributeValue, File};

/// Structured metadata for a NetCDF variable
#[derive(Debug, Clone)]
pub struct VariableMetadata {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<DimensionInfo>,
    pub attributes: Attributes,
}

impl VariableMetadata {
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.length).collect()
    }
}

/// Information about a dimension
#[derive(Debug, Clone)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Get structured metadata for a variable
pub fn get_variable_metadata(file: &File, var_name: &str) -> Result<VariableMetadata> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| EmissError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    let dimensions = var
        .dimensions()
        .iter()
        .map(|d| DimensionInfo {
            name: d.name().to_string(),
            length: d.len(),
            is_unlimited: d.is_unlimited(),
        })
        .collect();

    let mut attributes = Attributes::new();
    for attr in var.attributes() {
        attributes.insert(attr.name().to_string(), attr.value()?);
    }

    Ok(VariableMetadata {
        name: var_name.to_string(),
        data_type: format!("{:?}", var.vartype()).to_lowercase(),
        dimensions,
        attributes,
    })
}

/// File-level attributes
pub fn global_attributes(file: &File) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for attr in file.attributes() {
        attributes.insert(attr.name().to_string(), attr.value()?);
    }
    Ok(attributes)
}

/// Render an attribute value the way `ncdump` would, roughly
pub fn format_attribute(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => format!("\"{}\"", s),
        AttributeValue::Float(f) => format!("{}f", f),
        AttributeValue::Double(d) => d.to_string(),
        AttributeValue::Int(i) => i.to_string(),
        AttributeValue::Short(s) => format!("{}s", s),
        AttributeValue::Floats(fs) => format!("{:?}", fs),
        AttributeValue::Doubles(ds) => format!("{:?}", ds),
        AttributeValue::Ints(is) => format!("{:?}", is),
        other => format!("{:?}", other),
    }
}

/// Prints dimensions, variables and global attributes of a NetCDF file.
pub fn describe_file(file: &File) -> Result<()> {
    println!("\n Dimensions");
    println!("==============");

    let mut dimensions: Vec<_> = file.dimensions().collect();
    dimensions.sort_by_key(|d| d.name());
    if dimensions.is_empty() {
        println!("   (No dimensions found)");
    }
    for dim in dimensions {
        let length_info = if dim.is_unlimited() {
            format!("{} (unlimited)", dim.len())
        } else {
            dim.len().to_string()
        };
        println!("    {} = {}", dim.name(), length_info);
    }

    println!("\n Variables");
    println!("=============");

    let mut names: Vec<String> = file.variables().map(|v| v.name()).collect();
    names.sort();
    for name in names {
        let meta = get_variable_metadata(file, &name)?;
        if meta.dimensions.is_empty() {
            println!("    {} ({}): scalar", meta.name, meta.data_type);
        } else {
            let dims: Vec<&str> = meta.dimensions.iter().map(|d| d.name.as_str()).collect();
            let shape: Vec<String> = meta.shape().iter().map(|s| s.to_string()).collect();
            println!(
                "    {} ({}): [{}] = ({})",
                meta.name,
                meta.data_type,
                dims.join(", "),
                shape.join(" × ")
            );
        }
        for (key, value) in &meta.attributes {
            println!("      • {}: {}", key, format_attribute(value));
        }
    }

    println!("\n Global Attributes");
    println!("=====================");
    for (key, value) in global_attributes(file)? {
        println!("    {}: {}", key, format_attribute(&value));
    }

    Ok(())
}
