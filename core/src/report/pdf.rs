use super::{Page, Report};
use crate::error::{OrthoscanError, Result};

use image::RgbImage;
use log::debug;
use printpdf::{
    image_crate, BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference,
};
use std::io::BufWriter;

/// Turns an ordered page sequence into one document
pub trait DocumentRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>>;
}

const MM_PER_INCH: f32 = 25.4;
const MM_PER_PT: f32 = MM_PER_INCH / 72.0;

/// Average Helvetica glyph width as a fraction of the font size
const HELVETICA_AVG_WIDTH: f32 = 0.5;

/// Multi-page PDF renderer
///
/// Annotated pages are 10 x 10 inches with the title above the image;
/// the summary page is 10 x 5 inches with the diagnosis centred.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    pub document_title: String,
    pub title_size: f32,
    pub body_size: f32,
    pub margin: Mm,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            document_title: "Annotated Orthodontic Images".to_string(),
            title_size: 16.0,
            body_size: 14.0,
            margin: Mm(12.0),
        }
    }
}

impl PdfRenderer {
    fn page_size(page: &Page) -> (Mm, Mm) {
        match page {
            Page::Annotated { .. } => (Mm(254.0), Mm(254.0)),
            Page::Summary { .. } => (Mm(254.0), Mm(127.0)),
        }
    }

    fn draw_page(
        &self,
        layer: &PdfLayerReference,
        page: &Page,
        size: (Mm, Mm),
        font: &IndirectFontRef,
    ) -> Result<()> {
        match page {
            Page::Annotated { title, image, .. } => {
                self.draw_annotated(layer, title, image, size, font)
            }
            Page::Summary { text } => {
                self.draw_summary(layer, text, size, font);
                Ok(())
            }
        }
    }

    fn draw_annotated(
        &self,
        layer: &PdfLayerReference,
        title: &str,
        image: &RgbImage,
        size: (Mm, Mm),
        font: &IndirectFontRef,
    ) -> Result<()> {
        let (Mm(width), Mm(height)) = size;
        let Mm(margin) = self.margin;
        let title_height = self.title_size * MM_PER_PT * 1.5;

        let title_y = height - margin - self.title_size * MM_PER_PT;
        layer.use_text(
            title,
            self.title_size,
            Mm(centered_x(title, self.title_size, width)),
            Mm(title_y),
            font,
        );

        if image.width() == 0 || image.height() == 0 {
            return Err(OrthoscanError::Render(format!(
                "page '{}' has an empty image",
                title
            )));
        }

        // Fit inside the area below the title, preserving aspect ratio
        let box_w = width - 2.0 * margin;
        let box_h = height - 2.0 * margin - title_height;
        let dpi = (image.width() as f32 / (box_w / MM_PER_INCH))
            .max(image.height() as f32 / (box_h / MM_PER_INCH));
        let drawn_w = image.width() as f32 / dpi * MM_PER_INCH;
        let drawn_h = image.height() as f32 / dpi * MM_PER_INCH;

        let buffer = image_crate::RgbImage::from_raw(
            image.width(),
            image.height(),
            image.as_raw().clone(),
        )
        .ok_or_else(|| OrthoscanError::Render(format!("page '{}' has a malformed image", title)))?;
        let pdf_image = Image::from_dynamic_image(&image_crate::DynamicImage::ImageRgb8(buffer));

        pdf_image.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm((width - drawn_w) / 2.0)),
                translate_y: Some(Mm(margin + (box_h - drawn_h) / 2.0)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn draw_summary(&self, layer: &PdfLayerReference, text: &str, size: (Mm, Mm), font: &IndirectFontRef) {
        let (Mm(width), Mm(height)) = size;
        let line_height = self.body_size * MM_PER_PT * 1.4;
        let lines: Vec<&str> = text.lines().collect();

        // Centre the block vertically, first line on top
        let block_height = line_height * lines.len() as f32;
        let mut y = (height + block_height) / 2.0 - line_height;
        for line in lines {
            if !line.is_empty() {
                layer.use_text(
                    line,
                    self.body_size,
                    Mm(centered_x(line, self.body_size, width)),
                    Mm(y),
                    font,
                );
            }
            y -= line_height;
        }
    }
}

/// Approximate left edge that centres `text` on a page of `page_width` mm
fn centered_x(text: &str, font_size: f32, page_width: f32) -> f32 {
    let text_width = text.chars().count() as f32 * font_size * HELVETICA_AVG_WIDTH * MM_PER_PT;
    ((page_width - text_width) / 2.0).max(0.0)
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>> {
        let pages = report.pages();
        let Some(first) = pages.first() else {
            return Err(OrthoscanError::Render("report has no pages".to_string()));
        };

        let first_size = Self::page_size(first);
        let (doc, page_index, layer_index) =
            PdfDocument::new(&self.document_title, first_size.0, first_size.1, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        let layer = doc.get_page(page_index).get_layer(layer_index);
        self.draw_page(&layer, first, first_size, &font)?;

        for page in &pages[1..] {
            let size = Self::page_size(page);
            let (page_index, layer_index) = doc.add_page(size.0, size.1, "Layer 1");
            let layer = doc.get_page(page_index).get_layer(layer_index);
            self.draw_page(&layer, page, size, &font)?;
        }

        let mut writer = BufWriter::new(Vec::new());
        doc.save(&mut writer)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| OrthoscanError::Render(e.to_string()))?;

        debug!("Rendered {} pages into {} bytes", pages.len(), bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnatomicalSlot, DiagnosisResult};

    /// Counts `/Type /Page` dictionaries, skipping the `/Pages` tree node
    fn count_pages(pdf: &[u8]) -> usize {
        let mut count = 0;
        let mut rest = pdf;
        while let Some(at) = rest.windows(5).position(|w| w == b"/Type") {
            rest = &rest[at + 5..];
            let value = rest.trim_ascii_start();
            if let Some(after) = value.strip_prefix(b"/Page") {
                if !after.first().is_some_and(|b| b.is_ascii_alphanumeric()) {
                    count += 1;
                }
            }
        }
        count
    }

    fn full_report() -> Report {
        let pages = AnatomicalSlot::ALL
            .iter()
            .map(|slot| Page::Annotated {
                slot: *slot,
                title: slot.page_title(),
                image: RgbImage::from_pixel(40, 20, image::Rgb([200, 10, 10])),
            })
            .collect();
        Report::new(pages, DiagnosisResult::default())
    }

    #[test]
    fn test_render_full_case_has_six_pages() {
        let bytes = PdfRenderer::default().render(&full_report()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(count_pages(&bytes), 6);
    }

    #[test]
    fn test_render_summary_only() {
        let report = Report::new(Vec::new(), DiagnosisResult::default());
        let bytes = PdfRenderer::default().render(&report).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(count_pages(&bytes), 1);
    }

    #[test]
    fn test_count_pages_ignores_page_tree() {
        let sample = b"<</Type/Pages/Kids[3 0 R]>> <</Type /Page/Parent 2 0 R>> <</Type/Page>>";
        assert_eq!(count_pages(sample), 2);
    }

    #[test]
    fn test_centered_x() {
        assert_eq!(centered_x("", 14.0, 100.0), 50.0);
        assert!(centered_x("Orthodontic Diagnosis:", 14.0, 254.0) > 0.0);
        assert_eq!(centered_x(&"x".repeat(1000), 14.0, 100.0), 0.0);
    }
}
