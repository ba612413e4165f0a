// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanned-image to page decoding.

use tracing::debug;

use ipops_core::error::{IpopsError, Result};
use ipops_core::types::ScannedPage;

use crate::symbol::SymbolCodec;

/// Decode one scanned page image into its sequence number and payload.
///
/// A usable scan carries exactly one symbol whose payload is at least two
/// bytes: the sequence byte, then the opaque chunk text. The chunk is
/// stored as the symbol carried it; base85 is undone downstream of the
/// reassembler, not here.
pub fn decode_page<C: SymbolCodec>(codec: &C, image_bytes: &[u8]) -> Result<ScannedPage> {
    let image = image::load_from_memory(image_bytes)
        .map_err(|e| IpopsError::Decode(format!("unreadable scan image: {e}")))?;

    let mut symbols = codec.decode(&image)?;
    let payload = match symbols.len() {
        0 => return Err(IpopsError::Decode("no symbol found in scan".into())),
        1 => symbols.remove(0),
        n => {
            return Err(IpopsError::Decode(format!(
                "expected one symbol per page, found {n}"
            )));
        }
    };
    if payload.len() < 2 {
        return Err(IpopsError::Decode(format!(
            "symbol payload too short: {} bytes",
            payload.len()
        )));
    }

    let page_number = u64::from(payload[0]);
    debug!(page_number, payload_len = payload.len() - 1, "page decoded");
    Ok(ScannedPage {
        page_number,
        payload: payload[1..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::testing::StubCodec;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn single_symbol_decodes() {
        let codec = StubCodec::decoding(vec![b"\x2aPAYLOAD".to_vec()]);
        let page = decode_page(&codec, &png_bytes()).unwrap();
        assert_eq!(page.page_number, 42);
        assert_eq!(page.payload, b"PAYLOAD");
    }

    #[test]
    fn zero_symbols_is_a_decode_error() {
        let codec = StubCodec::decoding(vec![]);
        let err = decode_page(&codec, &png_bytes()).unwrap_err();
        assert!(matches!(err, IpopsError::Decode(_)));
    }

    #[test]
    fn multiple_symbols_is_a_decode_error() {
        let codec = StubCodec::decoding(vec![b"\x01a".to_vec(), b"\x02b".to_vec()]);
        let err = decode_page(&codec, &png_bytes()).unwrap_err();
        assert!(matches!(err, IpopsError::Decode(_)));
    }

    #[test]
    fn short_payload_is_a_decode_error() {
        let codec = StubCodec::decoding(vec![vec![0x05]]);
        let err = decode_page(&codec, &png_bytes()).unwrap_err();
        assert!(matches!(err, IpopsError::Decode(_)));
    }

    #[test]
    fn garbage_image_is_a_decode_error() {
        let codec = StubCodec::decoding(vec![b"\x01x".to_vec()]);
        let err = decode_page(&codec, b"not an image").unwrap_err();
        assert!(matches!(err, IpopsError::Decode(_)));
    }
}
