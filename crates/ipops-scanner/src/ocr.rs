// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-page ingestion, the counterpart to the printer's text mode.
//
// The external `tesseract` utility recognises the page; the base64 body
// and the footer page number are separated at the first blank line.
// Footer digits come out of OCR mangled in predictable ways, so a small
// confusable-glyph table is applied before parsing.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

use ipops_core::error::{IpopsError, Result};
use ipops_core::paths::find_executable;
use ipops_core::types::ScannedPage;

const OCR_TOOL: &str = "tesseract";

/// Characters the recogniser is allowed to emit: the base64 alphabet
/// plus padding.
const CHAR_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

/// Reads printed text pages back into `(page_number, payload)`.
pub struct TextPageReader {
    tesseract_exe: PathBuf,
}

impl TextPageReader {
    /// Resolve `tesseract` on PATH; failing here means tesseract-ocr is
    /// not installed.
    pub fn resolve() -> Result<Self> {
        Ok(Self {
            tesseract_exe: find_executable(OCR_TOOL)?,
        })
    }

    /// Recognise one scanned text page.
    pub fn read_page(&self, image_bytes: &[u8]) -> Result<ScannedPage> {
        let scratch = tempfile::tempdir()?;
        let scan_path = scratch.path().join("scan.png");
        std::fs::File::create(&scan_path)?.write_all(image_bytes)?;

        let output = Command::new(&self.tesseract_exe)
            .arg(&scan_path)
            .arg("stdout")
            .arg("--psm")
            .arg("6")
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={CHAR_WHITELIST}"))
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(IpopsError::Subprocess {
                command: OCR_TOOL.into(),
                detail: format!(
                    "{}; stderr: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        parse_text_page(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Split recognised text into the base64 body and the footer page
/// number, clean both up, and decode.
fn parse_text_page(text: &str) -> Result<ScannedPage> {
    let (body, footer) = text.split_once("\n\n").unwrap_or((text, ""));

    let body: String = body
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | ' '))
        .collect();
    let footer = normalise_footer(footer);

    let page_number: u64 = footer.parse().map_err(|_| {
        IpopsError::Decode(format!("failed to parse page number: {footer:?}"))
    })?;
    let payload = BASE64
        .decode(body.as_bytes())
        .map_err(|e| IpopsError::Decode(format!("undecodable page body: {e}")))?;

    debug!(page_number, payload_len = payload.len(), "text page recognised");
    Ok(ScannedPage {
        page_number,
        payload,
    })
}

/// Strip whitespace and substitute the glyphs OCR reliably confuses for
/// footer digits.
fn normalise_footer(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            '\n' | '\r' | ' ' => None,
            '=' | '_' | '—' => Some('-'),
            'o' | 'O' => Some('0'),
            'i' | 'l' | 'L' => Some('1'),
            'z' | 'Z' => Some('2'),
            'A' => Some('4'),
            'b' | 'G' => Some('6'),
            other => Some(other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_body_and_footer() {
        // "SE9UIFNUVUZG" is base64 for "HOT STUFF".
        let page = parse_text_page("SE9UIF\nNUVUZG\n\n42\n").unwrap();
        assert_eq!(page.page_number, 42);
        assert_eq!(page.payload, b"HOT STUFF");
    }

    #[test]
    fn footer_confusables_are_normalised() {
        // OCR rendering "108" as "lo8".
        let page = parse_text_page("SE9UIFNUVUZG\n\nlo8\n").unwrap();
        assert_eq!(page.page_number, 108);

        assert_eq!(normalise_footer(" Z o b \n"), "206");
        assert_eq!(normalise_footer("ZoGl"), "2061");
        assert_eq!(normalise_footer("=_—"), "---");
    }

    #[test]
    fn missing_footer_is_a_decode_error() {
        let err = parse_text_page("SE9UIFNUVUZG\n").unwrap_err();
        assert!(matches!(err, IpopsError::Decode(_)));
    }

    #[test]
    fn dashed_footer_is_a_decode_error() {
        // '=' in the footer normalises to '-', which cannot begin a page
        // number.
        let err = parse_text_page("SE9UIFNUVUZG\n\n=12\n").unwrap_err();
        assert!(matches!(err, IpopsError::Decode(_)));
    }

    #[test]
    fn garbled_body_is_a_decode_error() {
        let err = parse_text_page("!!!not-base64!!!\n\n3\n").unwrap_err();
        assert!(matches!(err, IpopsError::Decode(_)));
    }
}
