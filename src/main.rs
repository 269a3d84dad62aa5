//! Entry point for the emissions converter.
//! Handles CLI parsing and logging, then runs the conversion pipeline.

use clap::Parser;
use log::LevelFilter;
mod cli;

use cli::Args;
use ukca_emiss::metadata::describe_file;
use ukca_emiss::pipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    println!(
        r#"
------------------------------------------------------------------
                 UKCA emissions ancillary converter
------------------------------------------------------------------
                        "#
    );

    let config = args.to_config()?;
    println!(
        "Converting {} as {} (STASH {})",
        config.emissions_file.display(),
        config.var_name(),
        config.stash
    );

    let output_path = pipeline::run(&config)?;
    println!("✅ Saved result to {}", output_path.display());

    if args.describe {
        let file = netcdf::open(&output_path)?;
        describe_file(&file)?;
    }

    Ok(())
}
