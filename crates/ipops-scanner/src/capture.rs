// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flatbed capture via the SANE `scanimage` utility.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use ipops_core::error::{IpopsError, Result};
use ipops_core::paths::find_executable;

const SCAN_TOOL: &str = "scanimage";

/// Intermediary image format requested from the scanner backend.
const IMAGE_FORMAT: &str = "png";

pub struct ScanCapture {
    scanimage_exe: PathBuf,
}

impl ScanCapture {
    /// Resolve `scanimage` on PATH; failing here means SANE-utils is not
    /// installed.
    pub fn resolve() -> Result<Self> {
        Ok(Self {
            scanimage_exe: find_executable(SCAN_TOOL)?,
        })
    }

    /// Run one scan and return the captured image bytes.
    ///
    /// A non-zero exit is a per-scan failure; the operator can reseat
    /// the page and retry without losing session state.
    pub fn capture(&self) -> Result<Vec<u8>> {
        info!("scanning");
        let output = Command::new(&self.scanimage_exe)
            .arg("--format")
            .arg(IMAGE_FORMAT)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(IpopsError::Subprocess {
                command: SCAN_TOOL.into(),
                detail: format!(
                    "{}; stderr: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        debug!(bytes = output.stdout.len(), "scan captured");
        Ok(output.stdout)
    }
}
