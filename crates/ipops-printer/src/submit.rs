// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print submission via the local `lp` utility.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use ipops_core::error::{IpopsError, Result};
use ipops_core::paths::find_executable;

const LP_TOOL: &str = "lp";

static CONFIRMATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^request id is (\S+) \((\d+) file\(s\)\)\n$").unwrap());

/// Parsed `lp` confirmation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpConfirmation {
    pub job_id: String,
    pub file_count: u64,
}

/// Submits rendered PDFs to the local printing daemon.
pub struct PrintSubmitter {
    lp_exe: PathBuf,
}

impl PrintSubmitter {
    /// Resolve `lp` on PATH; failing here means CUPS (or an equivalent
    /// spooler) is not installed.
    pub fn resolve() -> Result<Self> {
        Ok(Self {
            lp_exe: find_executable(LP_TOOL)?,
        })
    }

    /// Print one PDF. The job is handed to `lp` on stdin and allowed to
    /// run to completion even if termination has been requested.
    pub fn submit(&self, pdf: &[u8]) -> Result<Option<LpConfirmation>> {
        let mut child = Command::new(&self.lp_exe)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        child
            .stdin
            .take()
            .expect("stdin was piped")
            .write_all(pdf)?;
        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(IpopsError::Subprocess {
                command: LP_TOOL.into(),
                detail: format!(
                    "{}; stderr: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(stdout = %stdout.trim_end(), "lp accepted job");
        Ok(parse_confirmation(&stdout))
    }
}

/// Match the spooler's confirmation line. An unrecognised but non-empty
/// reply is worth a warning; the job was still accepted.
fn parse_confirmation(stdout: &str) -> Option<LpConfirmation> {
    if stdout.is_empty() {
        return None;
    }
    match CONFIRMATION.captures(stdout) {
        Some(captures) => Some(LpConfirmation {
            job_id: captures[1].to_owned(),
            file_count: captures[2].parse().ok()?,
        }),
        None => {
            warn!(stdout = %stdout.trim_end(), "unrecognised confirmation from lp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_confirmation() {
        let parsed = parse_confirmation("request id is OfficeJet-17 (1 file(s))\n").unwrap();
        assert_eq!(parsed.job_id, "OfficeJet-17");
        assert_eq!(parsed.file_count, 1);
    }

    #[test]
    fn empty_stdout_is_no_confirmation() {
        assert_eq!(parse_confirmation(""), None);
    }

    #[test]
    fn unrecognised_stdout_is_no_confirmation() {
        assert_eq!(parse_confirmation("printer on fire\n"), None);
        assert_eq!(
            parse_confirmation("request id is OfficeJet-17 (1 file(s)) and more\n"),
            None
        );
    }
}
