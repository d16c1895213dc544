//! Pagination engine: walks a flowable sequence down US-Letter pages,
//! wrapping text, breaking pages at the bottom margin, and scaling
//! images to the text width.

use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};

use super::Flowable;
use crate::error::{AppError, Result};

// US-Letter, 0.5 inch margins on every side.
const PAGE_W_MM: f64 = 215.9;
const PAGE_H_MM: f64 = 279.4;
const MARGIN_MM: f64 = 12.7;

const PT_TO_MM: f64 = 0.352_778;

const HEADING_SIZE_PT: f64 = 18.0;
const BODY_SIZE_PT: f64 = 11.0;
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Image pixels are interpreted at 96 px per inch; display width is
/// capped at 6 inches.
const IMAGE_DPI: f64 = 96.0;
const MAX_IMAGE_W_MM: f64 = 152.4;
const MM_PER_INCH: f64 = 25.4;

/// Rough advance width of a Helvetica glyph as a fraction of the font
/// size; builtin fonts expose no metrics, so wrapping is an estimate.
const AVG_GLYPH_WIDTH_EM: f64 = 0.5;

pub fn render(doc_title: &str, flowables: &[Flowable]) -> Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new(doc_title, Mm(PAGE_W_MM as f32), Mm(PAGE_H_MM as f32), "Layer 1");
    let body_font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::Render(e.to_string()))?;
    let heading_font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::Render(e.to_string()))?;

    let first_layer = doc.get_page(page).get_layer(layer);
    let mut cursor = Cursor {
        doc: &doc,
        layer: first_layer,
        y_mm: PAGE_H_MM - MARGIN_MM,
    };

    for flowable in flowables {
        match flowable {
            Flowable::Heading(text) => cursor.text_block(text, HEADING_SIZE_PT, &heading_font),
            Flowable::Paragraph(text) => cursor.text_block(text, BODY_SIZE_PT, &body_font),
            Flowable::Spacer(points) => cursor.gap(points * PT_TO_MM),
            Flowable::Image(image) => cursor.image(&image.bytes)?,
        }
    }

    doc.save_to_bytes().map_err(|e| AppError::Render(e.to_string()))
}

struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    /// Top of the remaining free space, measured from the page bottom.
    y_mm: f64,
}

impl Cursor<'_> {
    fn remaining(&self) -> f64 {
        self.y_mm - MARGIN_MM
    }

    fn break_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W_MM as f32), Mm(PAGE_H_MM as f32), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y_mm = PAGE_H_MM - MARGIN_MM;
    }

    fn ensure(&mut self, height_mm: f64) {
        if self.remaining() < height_mm {
            self.break_page();
        }
    }

    /// A spacer never forces a page break; leftover gap at the bottom
    /// of a page just disappears.
    fn gap(&mut self, height_mm: f64) {
        self.y_mm = (self.y_mm - height_mm).max(MARGIN_MM);
    }

    /// Wrapped text, broken across pages line by line.
    fn text_block(&mut self, text: &str, size_pt: f64, font: &IndirectFontRef) {
        let line_height = size_pt * LINE_HEIGHT_FACTOR * PT_TO_MM;
        for line in wrap(text, max_chars_per_line(size_pt)) {
            self.ensure(line_height);
            self.y_mm -= line_height;
            self.layer.use_text(line, size_pt as f32, Mm(MARGIN_MM as f32), Mm(self.y_mm as f32), font);
        }
    }

    fn image(&mut self, bytes: &[u8]) -> Result<()> {
        let decoded = printpdf::image_crate::load_from_memory(bytes)
            .map_err(|e| AppError::Render(format!("malformed image: {}", e)))?;

        use printpdf::image_crate::GenericImageView;
        let (px_w, px_h) = decoded.dimensions();
        if px_w == 0 || px_h == 0 {
            return Err(AppError::Render("image has zero dimensions".to_string()));
        }
        let natural_w = px_w as f64 / IMAGE_DPI * MM_PER_INCH;
        let natural_h = px_h as f64 / IMAGE_DPI * MM_PER_INCH;

        // Natural size at 96 dpi, shrunk to the 6 inch cap and, if still
        // taller than a whole page, to the usable page height.
        let mut scale = (MAX_IMAGE_W_MM / natural_w).min(1.0);
        let usable_h = PAGE_H_MM - 2.0 * MARGIN_MM;
        if natural_h * scale > usable_h {
            scale = usable_h / natural_h;
        }
        let display_h = natural_h * scale;

        self.ensure(display_h);
        self.y_mm -= display_h;

        let image = Image::from_dynamic_image(&decoded);
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_MM as f32)),
                translate_y: Some(Mm(self.y_mm as f32)),
                scale_x: Some(scale as f32),
                scale_y: Some(scale as f32),
                dpi: Some(IMAGE_DPI as f32),
                ..Default::default()
            },
        );
        Ok(())
    }
}

fn max_chars_per_line(size_pt: f64) -> usize {
    let usable_w = PAGE_W_MM - 2.0 * MARGIN_MM;
    let glyph_w = AVG_GLYPH_WIDTH_EM * size_pt * PT_TO_MM;
    (usable_w / glyph_w).floor().max(1.0) as usize
}

/// Greedy word wrap against the estimated line width; single words
/// longer than a line are hard-split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }

        while current.len() > max_chars {
            let split_at = floor_char_boundary(&current, max_chars);
            let rest = current.split_off(split_at);
            lines.push(std::mem::take(&mut current));
            current = rest;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    if index == 0 {
        // Always make progress, even on a multibyte first char.
        s.chars().next().map_or(1, |c| c.len_utf8())
    } else {
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_word_boundaries() {
        let lines = wrap("aaa bbb ccc ddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn wrap_splits_oversized_words() {
        let lines = wrap("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_of_empty_text_is_empty() {
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn long_text_spans_multiple_pages() {
        let paragraph = "word ".repeat(60);
        let flowables: Vec<Flowable> = (0..120)
            .map(|_| Flowable::Paragraph(paragraph.as_str()))
            .collect();

        let bytes = render("spill", &flowables).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        // One page holds roughly 54 body lines; 120 paragraphs of ~4
        // wrapped lines each cannot fit on one page, so the document
        // must contain several page objects.
        let text = String::from_utf8_lossy(&bytes);
        let page_objects =
            text.matches("/Type /Page").count() - text.matches("/Type /Pages").count();
        assert!(page_objects > 1);
    }
}
