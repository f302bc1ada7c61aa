//! Wait command implementation.
//!
//! Blocks until every given identifier has reached a terminal state. Per-job
//! failures are logged by the core, not turned into a non-zero exit; callers
//! inspect job logs for outcomes.

use anyhow::Result;
use console::style;

use super::Selection;

/// Execute the wait command.
pub async fn execute(selection: &Selection, ids: &[String]) -> Result<()> {
    let scheduler = super::create_scheduler(selection)?;

    let handles: Vec<_> = ids.iter().map(|id| scheduler.handle(id)).collect();
    scheduler.wait(&handles).await?;

    println!(
        "{} {} job(s) terminal",
        style("✓").green().bold(),
        handles.len()
    );

    Ok(())
}
