//! Array command implementation.
//!
//! Submits a 1-D parameter sweep, or a 2-D outer-major Cartesian product
//! when an inner value list is given, and prints the resulting handles in
//! parameter order.

use std::path::Path;

use anyhow::Result;

use super::Selection;

/// Execute the array command.
#[allow(clippy::too_many_arguments)]
pub async fn execute(
    selection: &Selection,
    stage: u32,
    name: &str,
    values: &str,
    inner: Option<&str>,
    script: &Path,
    args: Vec<String>,
) -> Result<()> {
    let scheduler = super::create_scheduler(selection)?;

    let handles = match inner {
        Some(inner) => {
            scheduler
                .submit_array_double(stage, name, values, inner, script, &args)
                .await?
        }
        None => {
            scheduler
                .submit_array_single(stage, name, values, script, &args)
                .await?
        }
    };

    let ids: Vec<String> = handles.iter().map(|h| h.to_string()).collect();
    println!("{}", ids.join(" "));

    Ok(())
}
