//! Detect command implementation.

use anyhow::Result;
use console::style;

use super::Selection;

/// Execute the detect command.
pub async fn execute(selection: &Selection) -> Result<()> {
    let scheduler = super::create_scheduler(selection)?;

    println!(
        "{} backend: {}",
        style("✓").green().bold(),
        style(scheduler.backend().name()).cyan()
    );
    println!("  log directory: {}", scheduler.log_dir().display());

    Ok(())
}
