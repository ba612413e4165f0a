// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outbound sink: the named pipe the reassembled stream is delivered to.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::info;

use ipops_core::error::Result;

/// Append drained bytes to the sink path. The pipe is opened per drain
/// and closed again so a slow reader never pins this process.
pub fn append(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut sink = OpenOptions::new().create(true).append(true).open(path)?;
    sink.write_all(bytes)?;
    info!(bytes = bytes.len(), path = %path.display(), "drained bytes delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn appends_across_calls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("printun");

        append(&path, b"HELLO").unwrap();
        append(&path, b"WORLD").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"HELLOWORLD");
    }
}
