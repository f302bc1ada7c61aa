//! Slots command implementation.

use anyhow::Result;
use console::style;

use super::Selection;

/// Execute the slots command: print the slot count for the current
/// execution context, noting when this process is itself inside a managed
/// job.
pub async fn execute(selection: &Selection) -> Result<()> {
    let scheduler = super::create_scheduler(selection)?;

    println!("{}", scheduler.slots());
    if scheduler.in_managed_job() {
        eprintln!(
            "{}",
            style(format!("running inside a {} job", scheduler.backend())).dim()
        );
    }

    Ok(())
}
