// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Domain types shared between the printer and scanner ends.

use serde::{Deserialize, Serialize};

/// What the scanner knows about a page number in the current batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageState {
    /// Not yet decoded from any scan.
    Unseen,
    /// Decoded and stored, waiting for its predecessors.
    Seen,
    /// Flushed to the sink.
    Sent,
}

impl PageState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unseen => "UNSEEN",
            Self::Seen => "SEEN",
            Self::Sent => "SENT",
        }
    }
}

/// A page recovered from one scan: the sequence byte and the opaque
/// payload that followed it inside the symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPage {
    pub page_number: u64,
    pub payload: Vec<u8>,
}
