// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ipops-scanner — the receiving end of the paper link.
//
// Drives the flatbed through an interactive session: each scanned page
// is decoded, stored in the session state file, and the lowest
// contiguous run of pages is forwarded to the inbound named pipe.

mod capture;
mod console;
mod ocr;
mod session;
mod sink;

use std::process::ExitCode;

use tracing::error;

use ipops_core::config::ScannerSettings;
use ipops_core::error::IpopsError;

fn main() -> ExitCode {
    if std::env::args().len() > 1 {
        eprintln!("ipops-scanner: command line arguments not recognized");
        std::process::exit(-1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = match ScannerSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("ipops-scanner: {e}");
            return ExitCode::from(2);
        }
    };

    match console::run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exiting");
            // Missing backends are a setup problem, not a subprocess
            // failure; the original tooling reported them as exit 2.
            let code = match e {
                IpopsError::MissingExecutable(_) => 2,
                other => other.exit_code(),
            };
            ExitCode::from(code as u8)
        }
    }
}
