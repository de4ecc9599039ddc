//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `catalog_core` linkage and print the core version.
//! - With a config path argument, open the catalog and print a summary.

use catalog_core::{Catalog, CatalogConfig};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("catalog_core version={}", catalog_core::core_version());

    let Some(config_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match summarize(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_summary module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = CatalogConfig::from_json_file(config_path)?;
    let catalog = Catalog::from_config(&config)?;

    for category in catalog.list_categories()? {
        println!(
            "category name={} color={} description={}",
            category.name,
            category.color,
            category.description.as_deref().unwrap_or("")
        );
    }
    println!("tags count={}", catalog.tag_count()?);

    catalog.close()?;
    Ok(())
}
