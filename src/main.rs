use std::env;

use anyhow::Context;
use log::{error, info, warn};

use github_harvest::{HarvesterBuilder, Repository};

const DEFAULT_REPO: &str = "scikit-learn/scikit-learn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let repo = match env::var("HARVEST_REPO") {
        Ok(full_name) => Repository::from_full_name(&full_name)?,
        Err(_) => Repository::from_full_name(DEFAULT_REPO)?,
    };

    let max_items = match env::var("HARVEST_MAX_ITEMS") {
        Ok(value) => Some(
            value
                .parse::<usize>()
                .with_context(|| format!("HARVEST_MAX_ITEMS is not a number: {}", value))?,
        ),
        Err(_) => None,
    };

    let output_dir = env::var("HARVEST_OUTPUT_DIR").unwrap_or_else(|_| ".".to_string());

    let mut builder = HarvesterBuilder::new()
        .repository(repo.clone())
        .output_dir(output_dir);
    if let Some(max) = max_items {
        builder = builder.max_items(max);
    }
    let harvester = builder.build()?;

    if !harvester.has_credential() {
        error!("GITHUB_TOKEN not found, data collection cannot start.");
        error!("Add GITHUB_TOKEN to the environment and rerun.");
        return Ok(());
    }

    info!("Starting data collection from {}", repo.full_name);
    match max_items {
        Some(max) => info!("Fetching at most {} items per task", max),
        None => warn!("No item limit configured, ALL data will be fetched. This may take hours."),
    }

    match harvester.rate_limit().await {
        Ok(status) => info!("{}", status),
        Err(err) => warn!("Could not read rate limit status: {}", err),
    }

    let reports = harvester.run_all().await;

    info!("Data collection completed");
    println!("Files created:");
    for report in &reports {
        println!(
            "- {} ({} records)",
            report.path.display(),
            report.records_written
        );
    }

    Ok(())
}
