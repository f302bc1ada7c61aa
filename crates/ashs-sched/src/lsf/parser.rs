//! Parsers for LSF command output.

use crate::error::{SchedError, SchedResult};

/// Extract the job id from bsub output.
///
/// The canonical shape is `Job <id> is submitted to queue <name>.`; the id
/// is the decimal run enclosed by the first `<...>` pair.
pub fn parse_bsub_id(output: &str) -> SchedResult<String> {
    let id = output
        .find('<')
        .and_then(|start| {
            let rest = &output[start + 1..];
            rest.find('>').map(|end| &rest[..end])
        })
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()));

    match id {
        Some(id) => Ok(id.to_string()),
        None => Err(SchedError::IdExtract {
            command: "bsub".to_string(),
            output: output.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bsub_id() {
        let output = "Job <8675309> is submitted to queue <normal>.\n";
        assert_eq!(parse_bsub_id(output).unwrap(), "8675309");
    }

    #[test]
    fn test_parse_bsub_id_unparseable() {
        assert!(parse_bsub_id("").is_err());
        assert!(parse_bsub_id("Request aborted by esub.\n").is_err());
        // First angle-bracket pair must hold the id, not arbitrary text.
        assert!(parse_bsub_id("Job <pending> is submitted to queue <normal>.\n").is_err());
    }
}
