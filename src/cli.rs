//! Defines command-line interface options using `clap`.

use clap::Parser;
use std::path::PathBuf;
use ukca_emiss::config::EmissionConfig;
use ukca_emiss::errors::Result;

/// Convert an emissions NetCDF file into a UKCA ancillary
#[derive(Parser, Debug)]
#[command(
    name = "ukca_emiss",
    version,
    about = "Convert gridded emissions into UKCA NetCDF4-classic ancillaries"
)]
pub struct Args {
    /// Path to the source emissions NetCDF file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// JSON file overriding the built-in conversion settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Name of the emissions variable (detected when omitted)
    #[arg(long)]
    pub variable: Option<String>,

    /// Species name used for the tracer, output variable and file name
    #[arg(long)]
    pub species: Option<String>,

    /// STASH code the emissions are associated with, e.g. m01s00i340
    #[arg(long)]
    pub stash: Option<String>,

    /// Directory for the output file
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Add a length-one model_level_number axis after time
    #[arg(long)]
    pub model_level: bool,

    /// Print the structure of the written file
    #[arg(long)]
    pub describe: bool,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Built-in defaults, then the JSON file, then command-line flags
    pub fn to_config(&self) -> Result<EmissionConfig> {
        let mut config = match &self.config {
            Some(path) => EmissionConfig::from_json_file(path)?,
            None => EmissionConfig::default(),
        };

        if let Some(file) = &self.file {
            config.emissions_file = file.clone();
        }
        if let Some(variable) = &self.variable {
            config.variable = Some(variable.clone());
        }
        if let Some(species) = &self.species {
            config.species_name = species.clone();
        }
        if let Some(stash) = &self.stash {
            config.stash = stash.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.model_level {
            config.add_model_level = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_gives_the_default_conversion() {
        let args = Args::parse_from(["ukca_emiss"]);
        let config = args.to_config().unwrap();
        assert_eq!(config, EmissionConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "ukca_emiss",
            "--file",
            "in.nc",
            "--species",
            "CO",
            "--stash",
            "m01s00i303",
            "-o",
            "out",
            "--model-level",
        ]);
        let config = args.to_config().unwrap();
        assert_eq!(config.emissions_file, PathBuf::from("in.nc"));
        assert_eq!(config.output_path(), PathBuf::from("out").join("ukca_emiss_CO.nc"));
        assert_eq!(config.stash, "m01s00i303");
        assert!(config.add_model_level);
    }

    #[test]
    fn flags_override_the_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "species_name": "CO", "stash": "m01s00i303", "time": { "count": 12 } }"#,
        )
        .unwrap();

        let args = Args::parse_from([
            "ukca_emiss",
            "--config",
            path.to_str().unwrap(),
            "--species",
            "CO_biomass",
        ]);
        let config = args.to_config().unwrap();
        assert_eq!(config.species_name, "CO_biomass");
        assert_eq!(config.stash, "m01s00i303");
        assert_eq!(config.time.count, 12);
        assert_eq!(config.um_version, "10.4");
    }

    #[test]
    fn invalid_json_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "time": { "count": 0 } }"#).unwrap();

        let args = Args::parse_from(["ukca_emiss", "--config", path.to_str().unwrap()]);
        assert!(args.to_config().is_err());
    }
}
