// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Graceful-termination flag, set from SIGINT/SIGTERM and observed at
// polling boundaries and between supervisor iterations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::{IpopsError, Result};

/// Register SIGINT/SIGTERM handlers and return the flag they set.
///
/// The flag transitions false to true exactly once; nothing ever clears it.
/// Callers share the `Arc` with every loop that must observe termination.
pub fn install() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| IpopsError::InvalidState(format!("installing signal handler: {e}")))?;
    debug!("termination handler installed");
    Ok(flag)
}

/// Read the flag.
pub fn requested(flag: &AtomicBool) -> bool {
    flag.load(Ordering::SeqCst)
}
