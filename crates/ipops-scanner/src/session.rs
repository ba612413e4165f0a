// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session state and page reassembly.
//
// Every scanned page lands in a per-session JSON file keyed by page
// number; the drain operation forwards the lowest contiguous block of
// unsent pages to the sink. The file is the source of truth: each
// operation loads it, mutates, and atomically rewrites it, so an
// interrupted session can be inspected or resumed by hand.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ipops_core::error::{IpopsError, Result};
use ipops_core::paths::state_dir;
use ipops_core::types::PageState;

const STATE_APP: &str = "IPoPS-scanner";

/// JSON wire form: page numbers as decimal string keys, payloads base64.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    sent: Vec<u64>,
    data: BTreeMap<String, String>,
}

/// In-memory form. `sent` is a set ordered by page number; the emitted
/// order of drained pages is therefore strictly ascending.
#[derive(Debug, Default)]
struct SessionState {
    sent: BTreeSet<u64>,
    data: BTreeMap<u64, Vec<u8>>,
}

impl SessionState {
    fn from_file(file: StateFile) -> Result<Self> {
        let mut data = BTreeMap::new();
        for (key, value) in file.data {
            let page: u64 = key.parse().map_err(|_| {
                IpopsError::InvalidState(format!("non-numeric page key {key:?} in state file"))
            })?;
            let payload = BASE64.decode(value.as_bytes()).map_err(|e| {
                IpopsError::InvalidState(format!("undecodable payload for page {page}: {e}"))
            })?;
            data.insert(page, payload);
        }
        Ok(Self {
            sent: file.sent.into_iter().collect(),
            data,
        })
    }

    fn to_file(&self) -> StateFile {
        StateFile {
            sent: self.sent.iter().copied().collect(),
            data: self
                .data
                .iter()
                .map(|(page, payload)| (page.to_string(), BASE64.encode(payload)))
                .collect(),
        }
    }
}

/// Durable record of one scanning session.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at the conventional location, stamped with the session's
    /// start time so distinct sessions never share state.
    pub fn open_default() -> Self {
        let path = state_dir(STATE_APP).join(format!(
            "state.{}",
            chrono::Utc::now().timestamp()
        ));
        Self { path }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store a freshly decoded page. A rescan of the same page number
    /// overwrites the earlier payload.
    pub fn record(&self, page_number: u64, payload: &[u8]) -> Result<()> {
        let mut state = self.load()?;
        state.data.insert(page_number, payload.to_vec());
        self.persist(&state)?;
        debug!(page_number, payload_len = payload.len(), "page recorded");
        Ok(())
    }

    /// Page states over `[anchor, max(data)]`; empty before the first
    /// recorded page.
    pub fn states(&self, anchor: u64) -> Result<BTreeMap<u64, PageState>> {
        let state = self.load()?;
        let Some(&max_known) = state.data.keys().next_back() else {
            return Ok(BTreeMap::new());
        };
        Ok((anchor..=max_known)
            .map(|page| {
                let page_state = if state.sent.contains(&page) {
                    PageState::Sent
                } else if state.data.contains_key(&page) {
                    PageState::Seen
                } else {
                    PageState::Unseen
                };
                (page, page_state)
            })
            .collect())
    }

    /// Mark the lowest contiguous block of unsent pages as sent and
    /// return its concatenated payload, or `None` when no page is ready.
    ///
    /// The block starts just past the highest sent page (or at the
    /// anchor when nothing has been sent) and ends at the first gap.
    /// The cursor advances every step, so a stray sent entry inside the
    /// range ends the block instead of spinning.
    pub fn drain_contiguous(&self, anchor: u64) -> Result<Option<Vec<u8>>> {
        let mut state = self.load()?;
        let Some(&max_known) = state.data.keys().next_back() else {
            return Ok(None);
        };
        let start = state
            .sent
            .iter()
            .next_back()
            .map(|&highest| highest + 1)
            .unwrap_or(anchor);

        let mut run = Vec::new();
        let mut page = start;
        while page <= max_known {
            if !state.data.contains_key(&page) || state.sent.contains(&page) {
                break;
            }
            run.push(page);
            page += 1;
        }
        if run.is_empty() {
            return Ok(None);
        }

        let mut drained = Vec::new();
        for page in &run {
            drained.extend_from_slice(&state.data[page]);
        }
        state.sent.extend(run.iter().copied());
        self.persist(&state)?;

        info!(
            first = run[0],
            last = run[run.len() - 1],
            bytes = drained.len(),
            "contiguous block drained"
        );
        Ok(Some(drained))
    }

    fn load(&self) -> Result<SessionState> {
        match std::fs::read(&self.path) {
            Ok(bytes) => SessionState::from_file(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SessionState::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, state: &SessionState) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut scratch = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut scratch, &state.to_file())?;
        scratch
            .persist(&self.path)
            .map_err(|e| IpopsError::Io(e.error))?;
        Ok(())
    }
}
