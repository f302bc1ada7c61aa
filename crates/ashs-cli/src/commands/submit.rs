//! Submit command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use super::Selection;

/// Execute the submit command.
pub async fn execute(
    selection: &Selection,
    stage: u32,
    name: Option<&str>,
    sync: bool,
    script: &Path,
    args: Vec<String>,
) -> Result<()> {
    let scheduler = super::create_scheduler(selection)?;

    let name = match name {
        Some(name) => name.to_string(),
        None => script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "job".to_string()),
    };

    if sync {
        let code = scheduler.submit_sync(stage, &name, script, &args).await?;
        if code != 0 {
            anyhow::bail!("job `{name}` exited with code {code}");
        }
        println!("{} {} completed", style("✓").green().bold(), name);
    } else {
        let handle = scheduler.submit(stage, &name, script, &args).await?;
        println!("{handle}");
    }

    Ok(())
}
