//! Parsers for SGE command output.

use crate::error::{SchedError, SchedResult};

/// Extract the job id from qsub output.
///
/// The canonical shape is `Your job <id> ("<name>") has been submitted`;
/// array submissions say `Your job-array <id>.<range>`. Either way the id is
/// the first decimal run after the `Your job` prefix.
pub fn parse_qsub_id(output: &str) -> SchedResult<String> {
    for line in output.lines() {
        if let Some(rest) = line.trim().strip_prefix("Your job") {
            let digits: String = rest
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if !digits.is_empty() {
                return Ok(digits);
            }
        }
    }

    Err(SchedError::IdExtract {
        command: "qsub".to_string(),
        output: output.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qsub_id() {
        let output = "Your job 11 (\"ashs_reg_L\") has been submitted\n";
        assert_eq!(parse_qsub_id(output).unwrap(), "11");
    }

    #[test]
    fn test_parse_qsub_id_array() {
        let output = "Your job-array 12.1-10:1 (\"sweep\") has been submitted\n";
        assert_eq!(parse_qsub_id(output).unwrap(), "12");
    }

    #[test]
    fn test_parse_qsub_id_skips_banner_lines() {
        let output = "Warning: no suitable queues\nYour job 4711 (\"x\") has been submitted\n";
        assert_eq!(parse_qsub_id(output).unwrap(), "4711");
    }

    #[test]
    fn test_parse_qsub_id_unparseable() {
        assert!(parse_qsub_id("").is_err());
        assert!(parse_qsub_id("Unable to run job: denied\n").is_err());
        assert!(parse_qsub_id("Your job has been submitted\n").is_err());
    }
}
