// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPoPS document processing: the page codec shared by both ends of the
// paper link. Frames become symbol-bearing PDF pages on the printer
// side; scanned images become numbered payloads on the scanner side.

pub mod base85;
pub mod decode;
pub mod pdf;
pub mod symbol;

pub use decode::decode_page;
pub use pdf::writer::FrameWriter;
pub use symbol::{DmtxTool, SymbolBitmap, SymbolCodec};
