//! PDF writer for composed reports (printpdf)

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point, Polygon, Rgb,
};
use tracing::debug;

use super::font::ReportFont;
use super::layout::{Block, Report};
use crate::constants::report::*;
use crate::errors::{ExportError, ExportResult};

/// Points to millimetres
const PT_TO_MM: f32 = 0.352_778;

/// Average glyph width as a fraction of the font size, for centering
const AVG_GLYPH_WIDTH: f32 = 0.5;

const LAYER_NAME: &str = "Content";

fn render_error(err: printpdf::Error) -> ExportError {
    ExportError::Render(format!("{err:?}"))
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn add_to(doc: &PdfDocumentReference, font: &ReportFont) -> ExportResult<Self> {
        match font {
            ReportFont::Builtin => Ok(Self {
                regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_error)?,
                bold: doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(render_error)?,
            }),
            ReportFont::External { data, .. } => {
                let regular = doc.add_external_font(data.as_slice()).map_err(render_error)?;
                Ok(Self {
                    bold: regular.clone(),
                    regular,
                })
            }
        }
    }
}

/// Top-down cursor over the pages of one document
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    fonts: Fonts,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl<'a> PageWriter<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference, fonts: Fonts) -> Self {
        Self {
            doc,
            fonts,
            layer,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
            pages: 1,
        }
    }

    /// Start a new page when `height` no longer fits
    fn reserve(&mut self, height: f32) {
        if self.y - height >= MARGIN_MM {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        self.pages += 1;
    }

    fn text(&mut self, text: &str, size: f32, indent: f32, bold: bool, color: (f32, f32, f32)) {
        let height = line_height(size);
        self.reserve(height);
        self.y -= height;

        let font = if bold { &self.fonts.bold } else { &self.fonts.regular };
        self.layer.set_fill_color(rgb(color));
        self.layer
            .use_text(text, size, Mm(MARGIN_MM + indent), Mm(self.y), font);
    }

    fn centered(&mut self, text: &str, size: f32, bold: bool, color: (f32, f32, f32)) {
        let width = text.chars().count() as f32 * size * PT_TO_MM * AVG_GLYPH_WIDTH;
        let content_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
        let indent = ((content_width - width) / 2.0).max(0.0);
        self.text(text, size, indent, bold, color);
    }

    fn rect(&self, x: f32, y: f32, width: f32, height: f32, color: (f32, f32, f32)) {
        let corners = [(x, y), (x + width, y), (x + width, y + height), (x, y + height)];
        let ring = corners
            .iter()
            .map(|&(px, py)| (Point::new(Mm(px), Mm(py)), false))
            .collect();

        self.layer.set_fill_color(rgb(color));
        self.layer.add_polygon(Polygon {
            rings: vec![ring],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn bar(&mut self, percent: f32) {
        let height = BAR_HEIGHT_MM + 2.0;
        self.reserve(height);
        self.y -= height;

        let x = MARGIN_MM + ITEM_INDENT_MM;
        let width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM - ITEM_INDENT_MM;
        let fill = width * percent.clamp(0.0, 100.0) / 100.0;
        self.rect(x, self.y, width, BAR_HEIGHT_MM, BAR_TRACK_COLOR);
        if fill > 0.0 {
            self.rect(x, self.y, fill, BAR_HEIGHT_MM, BAR_FILL_COLOR);
        }
    }

    fn divider(&mut self) {
        self.reserve(SECTION_GAP_MM);
        self.y -= SECTION_GAP_MM / 2.0;
        let width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
        self.rect(MARGIN_MM, self.y, width, 0.3, DIVIDER_COLOR);
        self.y -= SECTION_GAP_MM / 2.0;
    }

    fn gap(&mut self) {
        self.y -= SECTION_GAP_MM;
    }
}

/// Lay out `report` on A4 pages and return the document bytes
pub fn render(report: &Report, font: &ReportFont) -> ExportResult<Vec<u8>> {
    render_pages(report, font).map(|(bytes, _)| bytes)
}

/// Document bytes together with the number of pages written
fn render_pages(report: &Report, font: &ReportFont) -> ExportResult<(Vec<u8>, usize)> {
    let (doc, page, layer) = PdfDocument::new(
        &report.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        LAYER_NAME,
    );

    let pages = {
        let fonts = Fonts::add_to(&doc, font)?;
        let first_layer = doc.get_page(page).get_layer(layer);
        let mut writer = PageWriter::new(&doc, first_layer, fonts);

        writer.centered(&report.title, TITLE_SIZE, true, HEADING_COLOR);
        writer.centered(&report.date, SMALL_SIZE, false, MUTED_COLOR);
        writer.divider();

        for section in &report.sections {
            writer.text(&section.heading, HEADING_SIZE, 0.0, true, HEADING_COLOR);
            for block in &section.blocks {
                match block {
                    Block::Item(text) => {
                        writer.text(text, ITEM_SIZE, ITEM_INDENT_MM, false, TEXT_COLOR)
                    }
                    Block::Detail(text) => {
                        writer.text(text, DETAIL_SIZE, DETAIL_INDENT_MM, false, MUTED_COLOR)
                    }
                    Block::Bar(percent) => writer.bar(*percent),
                    Block::Highlight(text) => {
                        writer.centered(text, HIGHLIGHT_SIZE, true, TEXT_COLOR)
                    }
                    Block::Note(text) => writer.centered(text, SMALL_SIZE, false, MUTED_COLOR),
                }
            }
            writer.gap();
        }

        writer.gap();
        writer.centered(&report.footer, SMALL_SIZE - 1.0, false, MUTED_COLOR);
        writer.pages
    };

    let bytes = doc.save_to_bytes().map_err(render_error)?;
    debug!(pages, bytes = bytes.len(), font = %font.describe(), "Rendered report");
    Ok((bytes, pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::layout::Section;

    fn report(blocks: Vec<Block>) -> Report {
        Report {
            title: "Server Configuration Summary".into(),
            date: "Generated: 2026-10-16".into(),
            sections: vec![Section {
                heading: "Resource Usage".into(),
                blocks,
            }],
            footer: "footer".into(),
        }
    }

    #[test]
    fn test_renders_pdf_bytes() {
        let bytes = render(
            &report(vec![
                Block::Item("Power usage: 795W / 2200W".into()),
                Block::Bar(36.1),
                Block::Highlight("KRW 77,000,000".into()),
            ]),
            &ReportFont::Builtin,
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_report_spills_onto_more_pages() {
        let (_, short) = render_pages(&report(vec![Block::Item("one".into())]), &ReportFont::Builtin)
            .unwrap();
        assert_eq!(short, 1);

        let blocks = (0..200).map(|i| Block::Detail(format!("Line {i}"))).collect();
        let (bytes, pages) = render_pages(&report(blocks), &ReportFont::Builtin).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(pages > 1, "expected a page break, got {pages} page(s)");
    }

    #[test]
    fn test_out_of_range_bar_is_clamped() {
        // Advisory policy can push usage past the limit
        let bytes = render(&report(vec![Block::Bar(250.0), Block::Bar(-5.0)]), &ReportFont::Builtin)
            .unwrap();
        assert!(!bytes.is_empty());
    }
}
