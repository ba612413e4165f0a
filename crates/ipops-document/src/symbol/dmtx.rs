// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data-Matrix codec backed by the libdmtx command-line utilities.
//
// `dmtxwrite` takes the message on stdin and renders a PNG; `dmtxread`
// takes an image file and prints one decoded message per line. Images
// cross the process boundary through a scratch directory.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use image::DynamicImage;
use tracing::{debug, warn};

use ipops_core::error::{IpopsError, Result};
use ipops_core::paths::find_executable;

use super::{SymbolBitmap, SymbolCodec};

const WRITE_TOOL: &str = "dmtxwrite";
const READ_TOOL: &str = "dmtxread";

/// Symbol codec shelling out to `dmtxwrite` / `dmtxread`.
pub struct DmtxTool {
    write_exe: PathBuf,
    read_exe: PathBuf,
}

impl DmtxTool {
    /// Resolve both utilities on PATH. Fails with `MissingExecutable`
    /// naming the first absent tool.
    pub fn resolve() -> Result<Self> {
        Ok(Self {
            write_exe: find_executable(WRITE_TOOL)?,
            read_exe: find_executable(READ_TOOL)?,
        })
    }

    /// Defer PATH resolution to spawn time. For wiring into a writer
    /// that may never invoke the codec (text mode).
    pub fn unchecked() -> Self {
        Self {
            write_exe: PathBuf::from(WRITE_TOOL),
            read_exe: PathBuf::from(READ_TOOL),
        }
    }
}

impl SymbolCodec for DmtxTool {
    fn encode(&self, payload: &[u8]) -> Result<SymbolBitmap> {
        let scratch = tempfile::tempdir()?;
        let symbol_path = scratch.path().join("symbol.png");

        let mut child = Command::new(&self.write_exe)
            .arg("-o")
            .arg(&symbol_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        child
            .stdin
            .take()
            .expect("stdin was piped")
            .write_all(payload)?;
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(IpopsError::Subprocess {
                command: WRITE_TOOL.into(),
                detail: format!(
                    "{}; stderr: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let rgb = image::open(&symbol_path)
            .map_err(|e| IpopsError::Subprocess {
                command: WRITE_TOOL.into(),
                detail: format!("unreadable output image: {e}"),
            })?
            .to_rgb8();
        debug!(
            payload_len = payload.len(),
            width = rgb.width(),
            height = rgb.height(),
            "symbol encoded"
        );
        Ok(SymbolBitmap {
            width: rgb.width() as usize,
            height: rgb.height() as usize,
            pixels: rgb.into_raw(),
        })
    }

    fn decode(&self, image: &DynamicImage) -> Result<Vec<Vec<u8>>> {
        let scratch = tempfile::tempdir()?;
        let scan_path = scratch.path().join("scan.png");
        image
            .save(&scan_path)
            .map_err(|e| IpopsError::Decode(format!("saving scan for {READ_TOOL}: {e}")))?;

        let output = Command::new(&self.read_exe)
            .arg(&scan_path)
            .stdin(Stdio::null())
            .output()?;

        // dmtxread exits non-zero when it finds nothing; an empty result
        // is the caller's problem, not a subprocess failure.
        if !output.status.success() && !output.stdout.is_empty() {
            return Err(IpopsError::Subprocess {
                command: READ_TOOL.into(),
                detail: format!(
                    "{}; stderr: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        if !output.stderr.is_empty() {
            warn!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "{READ_TOOL} wrote to stderr"
            );
        }

        // TODO: talk to libdmtx over FFI instead; line splitting cannot
        // represent a message whose first byte is 0x0a.
        let messages: Vec<Vec<u8>> = output
            .stdout
            .split(|&b| b == b'\n')
            .filter(|m| !m.is_empty())
            .map(<[u8]>::to_vec)
            .collect();
        debug!(symbols = messages.len(), "scan decoded");
        Ok(messages)
    }
}
