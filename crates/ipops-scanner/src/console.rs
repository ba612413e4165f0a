// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator console: a prompt-driven loop around scan, decode, record,
// drain, deliver.

use std::io::{BufRead, Write};

use colored::Colorize;
use tracing::{error, info, warn};

use ipops_core::config::{PageDataFormat, ScannerSettings};
use ipops_core::error::Result;
use ipops_core::types::{PageState, ScannedPage};
use ipops_document::decode_page;
use ipops_document::symbol::DmtxTool;

use crate::capture::ScanCapture;
use crate::ocr::TextPageReader;
use crate::session::SessionStore;
use crate::sink;

/// How scanned images become numbered pages.
enum PageReader {
    Matrix(DmtxTool),
    Text(TextPageReader),
}

impl PageReader {
    fn read(&self, image_bytes: &[u8]) -> Result<ScannedPage> {
        match self {
            Self::Matrix(codec) => decode_page(codec, image_bytes),
            Self::Text(reader) => reader.read_page(image_bytes),
        }
    }
}

/// Run the interactive session until the operator declines to continue.
pub fn run(settings: &ScannerSettings) -> Result<()> {
    let capture = ScanCapture::resolve().inspect_err(|_| {
        eprintln!(
            "Ensure SANE-utils is installed on your Linux system \
             and that the 'scanimage' binary is available on your PATH."
        );
    })?;
    let reader = match settings.page_format {
        PageDataFormat::DataMatrix => PageReader::Matrix(DmtxTool::resolve()?),
        PageDataFormat::Text => PageReader::Text(TextPageReader::resolve().inspect_err(|_| {
            eprintln!(
                "Ensure tesseract-ocr is installed on your Linux system \
                 and that the 'tesseract' binary is available on your PATH."
            );
        })?),
    };

    let store = SessionStore::open_default();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    let anchor = prompt_anchor(&mut input)?;
    info!(anchor, "session started");

    loop {
        match ingest_one(&capture, &reader, &store, anchor) {
            Ok(Some(drained)) => sink::append(&settings.inbound_path, &drained)?,
            Ok(None) => info!("no contiguous block ready yet"),
            Err(e) if e.is_recoverable_scan_error() => {
                warn!(error = %e, "scan not usable, try again");
                let message = format!("Scan not usable: {e}");
                println!("{}", message.as_str().red());
            }
            Err(e) => {
                error!(error = %e, "unrecoverable failure");
                return Err(e);
            }
        }

        print_states(&store, anchor)?;

        if !prompt_continue(&mut input)? {
            break;
        }
    }

    info!("session ended");
    Ok(())
}

/// One scan cycle: capture, decode, record, drain.
fn ingest_one(
    capture: &ScanCapture,
    reader: &PageReader,
    store: &SessionStore,
    anchor: u64,
) -> Result<Option<Vec<u8>>> {
    let image = capture.capture()?;
    let page = reader.read(&image)?;
    info!(
        page_number = page.page_number,
        payload_len = page.payload.len(),
        "page ingested"
    );
    store.record(page.page_number, &page.payload)?;
    store.drain_contiguous(anchor)
}

/// Colour-coded batch overview, one line per page number.
fn print_states(store: &SessionStore, anchor: u64) -> Result<()> {
    for (page, state) in store.states(anchor)? {
        let label = match state {
            PageState::Unseen => state.label().red(),
            PageState::Seen => state.label().yellow(),
            PageState::Sent => state.label().green(),
        };
        println!("  {page:>6}  {label}");
    }
    Ok(())
}

fn prompt_anchor(input: &mut impl BufRead) -> Result<u64> {
    loop {
        print!("Starting page number for this batch: ");
        std::io::stdout().flush()?;

        let Some(line) = read_line(input)? else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed at the anchor prompt",
            )
            .into());
        };
        match line.trim().parse::<u64>() {
            Ok(anchor) => return Ok(anchor),
            Err(_) => println!("Enter a non-negative page number."),
        }
    }
}

fn prompt_continue(input: &mut impl BufRead) -> Result<bool> {
    loop {
        print!("Scan another page? [Y/n] ");
        std::io::stdout().flush()?;

        let Some(line) = read_line(input)? else {
            return Ok(false);
        };
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Answer y or n."),
        }
    }
}

/// One line of operator input; `None` at EOF.
fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
