// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Debug utility: encode stdin as one Data-Matrix symbol and save it as a
// PNG at the given path. Useful for eyeballing symbol density before
// committing a chunk size to paper.

use std::io::Read;
use std::process::ExitCode;

use ipops_document::symbol::{DmtxTool, SymbolCodec};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [output_path] = args.as_slice() else {
        eprintln!("usage: ipops-make-matrix OUTPUT.png < payload");
        return ExitCode::from(2);
    };

    match run(output_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ipops-make-matrix: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(output_path: &str) -> ipops_core::Result<()> {
    let mut payload = Vec::new();
    std::io::stdin().read_to_end(&mut payload)?;

    let bitmap = DmtxTool::resolve()?.encode(&payload)?;
    let img = image::RgbImage::from_raw(
        bitmap.width as u32,
        bitmap.height as u32,
        bitmap.pixels,
    )
    .ok_or_else(|| {
        ipops_core::IpopsError::Decode("symbol bitmap size does not match pixel data".into())
    })?;
    img.save(output_path)
        .map_err(|e| ipops_core::IpopsError::Io(std::io::Error::other(e)))?;
    Ok(())
}
