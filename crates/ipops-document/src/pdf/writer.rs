// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame-to-PDF writer using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by
// constructing `PdfPage` structs containing `Vec<Op>` operation lists,
// then serialised via `PdfDocument::save()`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use tracing::{debug, info};

use ipops_core::config::PageDataFormat;
use ipops_core::error::Result;

use crate::base85;
use crate::symbol::SymbolCodec;

// A4 throughout; the physical channel is a desk printer.
const PAGE_W: Mm = Mm(210.0);
const PAGE_H: Mm = Mm(297.0);
const MARGIN_MM: f32 = 20.0;

const TEXT_FONT_SIZE_PT: f32 = 12.0;
const TEXT_LINE_HEIGHT_PT: f32 = 14.0;
const FOOTER_FONT_SIZE_PT: f32 = 16.0;
const FOOTER_BASELINE_MM: f32 = 15.0;

/// Widest a symbol may render, in points. Larger bitmaps are scaled down
/// to this bound; smaller ones keep their natural size.
const MAX_SYMBOL_WIDTH_PT: f32 = 550.0;

/// Renders accumulated frames as printable PDF pages.
///
/// In Data-Matrix mode each page carries one symbol whose payload is the
/// page's sequence byte followed by the base85 of a frame chunk. In text
/// mode the whole frame is base64-encoded and reflowed as monospaced
/// text, the degraded fallback a human or OCR pass can still recover.
pub struct FrameWriter<C> {
    format: PageDataFormat,
    chunk_size: usize,
    codec: C,
}

impl<C: SymbolCodec> FrameWriter<C> {
    /// `chunk_size` caps the bytes carried by one page in Data-Matrix mode.
    pub fn new(format: PageDataFormat, chunk_size: usize, codec: C) -> Self {
        Self {
            format,
            chunk_size,
            codec,
        }
    }

    /// Render one frame. Returns the PDF bytes and the number of pages
    /// written; the caller advances its page counter by the latter.
    pub fn write_frame(&self, frame: &[u8], starting_page_number: u64) -> Result<(Vec<u8>, usize)> {
        info!(
            frame_len = frame.len(),
            starting_page_number,
            format = ?self.format,
            "rendering frame"
        );
        let mut doc = PdfDocument::new("IPoPS frame");
        let pages = match self.format {
            PageDataFormat::Text => self.text_pages(frame, starting_page_number),
            PageDataFormat::DataMatrix => {
                self.matrix_pages(&mut doc, frame, starting_page_number)?
            }
        };
        let pages_written = pages.len();
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(pages = pages_written, bytes = bytes.len(), "frame rendered");
        Ok((bytes, pages_written))
    }

    // -- Text mode ------------------------------------------------------------

    fn text_pages(&self, frame: &[u8], starting_page_number: u64) -> Vec<PdfPage> {
        let encoded = BASE64.encode(frame);

        // Courier advances exactly 0.6 em per glyph, so character wrap is
        // an exact computation rather than an estimate.
        let char_width_mm = 0.6 * TEXT_FONT_SIZE_PT * 0.3528;
        let usable_width_mm = PAGE_W.0 - 2.0 * MARGIN_MM;
        let chars_per_line = (usable_width_mm / char_width_mm) as usize;

        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let page_h_pt = PAGE_H.into_pt().0;
        let lines_per_page =
            ((page_h_pt - 2.0 * margin_pt) / TEXT_LINE_HEIGHT_PT) as usize;

        let line_chunks: Vec<&[u8]> = encoded.as_bytes().chunks(chars_per_line).collect();

        let mut pages = Vec::new();
        for (page_index, page_lines) in line_chunks.chunks(lines_per_page).enumerate() {
            let mut ops: Vec<Op> = Vec::new();
            for (line_index, line) in page_lines.iter().enumerate() {
                let y_pt = page_h_pt - margin_pt - (line_index as f32 * TEXT_LINE_HEIGHT_PT);
                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor {
                    pos: Point {
                        x: Pt(margin_pt),
                        y: Pt(y_pt),
                    },
                });
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(TEXT_FONT_SIZE_PT),
                    font: BuiltinFont::Courier,
                });
                ops.push(Op::WriteTextBuiltinFont {
                    // Base64 output is ASCII; the chunk boundaries cannot
                    // split a character.
                    items: vec![TextItem::Text(
                        String::from_utf8_lossy(line).into_owned(),
                    )],
                    font: BuiltinFont::Courier,
                });
                ops.push(Op::EndTextSection);
            }
            ops.extend(footer_ops(starting_page_number + page_index as u64));
            pages.push(PdfPage::new(PAGE_W, PAGE_H, ops));
        }

        // An empty frame still renders one numbered page.
        if pages.is_empty() {
            pages.push(PdfPage::new(
                PAGE_W,
                PAGE_H,
                footer_ops(starting_page_number),
            ));
        }
        pages
    }

    // -- Data-Matrix mode -----------------------------------------------------

    fn matrix_pages(
        &self,
        doc: &mut PdfDocument,
        frame: &[u8],
        starting_page_number: u64,
    ) -> Result<Vec<PdfPage>> {
        let mut pages = Vec::new();

        for (chunk_index, chunk) in frame.chunks(self.chunk_size).enumerate() {
            let abs_page = starting_page_number + chunk_index as u64;

            let mut payload = Vec::with_capacity(1 + chunk.len().div_ceil(4) * 5);
            payload.push((abs_page % 256) as u8);
            payload.extend_from_slice(base85::encode(chunk).as_bytes());

            let bitmap = self.codec.encode(&payload)?;
            debug!(
                abs_page,
                chunk_len = chunk.len(),
                symbol_w = bitmap.width,
                symbol_h = bitmap.height,
                "page encoded"
            );

            let raw = RawImage {
                pixels: RawImageData::U8(bitmap.pixels),
                width: bitmap.width,
                height: bitmap.height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // One point per pixel at 72 dpi, capped at the printable bound.
            let natural_w_pt = bitmap.width as f32;
            let natural_h_pt = bitmap.height as f32;
            let scale = (MAX_SYMBOL_WIDTH_PT / natural_w_pt).min(1.0);
            let rendered_w_pt = natural_w_pt * scale;
            let rendered_h_pt = natural_h_pt * scale;

            let page_w_pt = PAGE_W.into_pt().0;
            let page_h_pt = PAGE_H.into_pt().0;
            let margin_pt = Mm(MARGIN_MM).into_pt().0;
            let x_offset = (page_w_pt - rendered_w_pt) / 2.0;
            let y_offset = page_h_pt - margin_pt - rendered_h_pt;

            let mut ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(x_offset)),
                    translate_y: Some(Pt(y_offset)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(72.0),
                    rotate: None,
                },
            }];
            ops.extend(footer_ops(abs_page));
            pages.push(PdfPage::new(PAGE_W, PAGE_H, ops));
        }

        Ok(pages)
    }
}

/// Centred page-number footer, approximating Courier's fixed advance to
/// place the baseline.
fn footer_ops(page_number: u64) -> Vec<Op> {
    let text = page_number.to_string();
    let text_w_pt = text.len() as f32 * 0.6 * FOOTER_FONT_SIZE_PT;
    let x_pt = (PAGE_W.into_pt().0 - text_w_pt) / 2.0;
    let y_pt = Mm(FOOTER_BASELINE_MM).into_pt().0;

    vec![
        Op::StartTextSection,
        Op::SetTextCursor {
            pos: Point {
                x: Pt(x_pt),
                y: Pt(y_pt),
            },
        },
        Op::SetFontSizeBuiltinFont {
            size: Pt(FOOTER_FONT_SIZE_PT),
            font: BuiltinFont::Courier,
        },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text)],
            font: BuiltinFont::Courier,
        },
        Op::EndTextSection,
    ]
}
