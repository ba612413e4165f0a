// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seam for the external Data-Matrix encoder/decoder.

pub mod dmtx;

pub use dmtx::DmtxTool;

use ipops_core::error::Result;

/// A rendered symbol as tightly-packed RGB8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolBitmap {
    pub width: usize,
    pub height: usize,
    /// `width * height * 3` bytes, row-major.
    pub pixels: Vec<u8>,
}

/// Capability set of the external Data-Matrix library.
///
/// Everything downstream (PDF writer, page decoder) is written against
/// this trait; the production implementation is [`DmtxTool`], tests use an
/// in-memory stub.
pub trait SymbolCodec {
    /// Encode a payload into one symbol bitmap.
    fn encode(&self, payload: &[u8]) -> Result<SymbolBitmap>;

    /// Decode every symbol found in an image, one payload per symbol.
    fn decode(&self, image: &image::DynamicImage) -> Result<Vec<Vec<u8>>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Records encoded payloads and replays canned decode results.
    #[derive(Default)]
    pub struct StubCodec {
        pub encoded: RefCell<Vec<Vec<u8>>>,
        pub decode_result: Vec<Vec<u8>>,
    }

    impl StubCodec {
        pub fn decoding(decode_result: Vec<Vec<u8>>) -> Self {
            Self {
                encoded: RefCell::new(Vec::new()),
                decode_result,
            }
        }
    }

    impl SymbolCodec for StubCodec {
        fn encode(&self, payload: &[u8]) -> Result<SymbolBitmap> {
            self.encoded.borrow_mut().push(payload.to_vec());
            // An 8x8 checkerboard stands in for a real symbol.
            let width = 8;
            let height = 8;
            let mut pixels = Vec::with_capacity(width * height * 3);
            for y in 0..height {
                for x in 0..width {
                    let value = if (x + y) % 2 == 0 { 0x00 } else { 0xff };
                    pixels.extend_from_slice(&[value; 3]);
                }
            }
            Ok(SymbolBitmap {
                width,
                height,
                pixels,
            })
        }

        fn decode(&self, _image: &image::DynamicImage) -> Result<Vec<Vec<u8>>> {
            Ok(self.decode_result.clone())
        }
    }
}
