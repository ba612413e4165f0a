// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ipops-printer — the sending end of the paper link.
//
// Reads length-prefixed records from stdin, coalesces them into frames,
// renders each frame as a PDF of symbol-bearing pages, and hands it to
// the local `lp` spooler. Runs until stdin closes or SIGINT/SIGTERM,
// then persists the page counter.

mod accumulate;
mod counter;
mod submit;

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use ipops_core::config::{PageDataFormat, PrinterSettings};
use ipops_core::error::Result;
use ipops_core::shutdown;
use ipops_document::symbol::DmtxTool;
use ipops_document::FrameWriter;

use accumulate::{Accumulated, FrameAccumulator};
use counter::PageCounter;
use submit::PrintSubmitter;

fn main() -> ExitCode {
    if std::env::args().len() > 1 {
        eprintln!("ipops-printer: command line arguments not recognized");
        std::process::exit(-1);
    }

    let settings = match PrinterSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("ipops-printer: {e}");
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(settings.log_level.tracing_level())
        .init();

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exiting");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(settings: &PrinterSettings) -> Result<()> {
    let submitter = PrintSubmitter::resolve().inspect_err(|_| {
        info!(
            "Ensure CUPS is installed on your Linux system \
             and that the 'lp' binary is available on your PATH."
        );
    })?;

    // The symbol tools are only exercised in Data-Matrix mode; text mode
    // defers their resolution so it can run without libdmtx installed.
    let codec = match settings.pdf_data_format {
        PageDataFormat::DataMatrix => DmtxTool::resolve()?,
        PageDataFormat::Text => DmtxTool::unchecked(),
    };
    let writer = FrameWriter::new(settings.pdf_data_format, settings.max_buffer_size, codec);

    let counter = PageCounter::open_default();
    let mut next_page = counter.load()?;

    let stop = shutdown::install()?;
    let mut accumulator = FrameAccumulator::new(std::io::stdin(), settings, Arc::clone(&stop));
    info!(starting_page_number = next_page, "listener loop started");

    loop {
        let frame = match accumulator.accumulate()? {
            Accumulated::Terminated => break,
            Accumulated::Frame(frame) => frame,
        };
        if frame.is_empty() {
            continue;
        }

        let (pdf, pages) = writer.write_frame(&frame, next_page)?;
        if pages == 0 {
            continue;
        }

        if let Some(confirmation) = submitter.submit(&pdf)? {
            info!(
                job_id = %confirmation.job_id,
                files = confirmation.file_count,
                "print job confirmed"
            );
        }

        next_page += pages as u64;
        info!(pages, next_page, "frame printed");
    }

    info!("listener loop ended");
    counter.save(next_page)?;
    Ok(())
}
