//! Renders generated letter text into a PDF.
//!
//! Rendering is CPU-bound and synchronous. Async callers must run it inside
//! `tokio::task::spawn_blocking`.

use printpdf::{BuiltinFont, Mm, PdfDocument};
use thiserror::Error;

pub mod font_metrics;

use font_metrics::{FontMetricTable, HELVETICA};

// A4 portrait, 25mm margins, Helvetica 11pt.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 25.0;
const FONT_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_FACTOR: f32 = 1.45;
const MM_PER_PT: f32 = 25.4 / 72.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document has no content")]
    EmptyDocument,

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// A plain-text letter: blocks separated by blank lines; single newlines inside
/// a block are hard line breaks (address lines, sign-off).
#[derive(Debug, Clone, PartialEq)]
pub struct LetterDocument {
    pub title: String,
    pub blocks: Vec<String>,
}

impl LetterDocument {
    pub fn from_text(title: &str, text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n");
        let blocks = normalized
            .split("\n\n")
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            title: title.to_string(),
            blocks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, document: &LetterDocument) -> Result<Vec<u8>, RenderError>;
}

/// `printpdf` renderer using the builtin Helvetica font.
pub struct PdfRenderer {
    metrics: &'static FontMetricTable,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self {
            metrics: &HELVETICA,
        }
    }

    fn line_height_mm() -> f32 {
        FONT_SIZE_PT * LINE_HEIGHT_FACTOR * MM_PER_PT
    }

    fn text_width_em() -> f32 {
        (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / MM_PER_PT / FONT_SIZE_PT
    }

    fn lines_per_page() -> usize {
        ((PAGE_HEIGHT_MM - 2.0 * MARGIN_MM) / Self::line_height_mm()).floor() as usize
    }

    /// Wraps and paginates the document. Empty strings are blank separator lines.
    pub fn layout(&self, document: &LetterDocument) -> Vec<Vec<String>> {
        let max_em = Self::text_width_em();
        let per_page = Self::lines_per_page().max(1);

        let mut lines: Vec<String> = Vec::new();
        for (i, block) in document.blocks.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            for hard_line in block.lines() {
                lines.extend(self.metrics.wrap(&to_winansi(hard_line), max_em));
            }
        }

        let mut pages: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for line in lines {
            if current.len() == per_page {
                pages.push(std::mem::take(&mut current));
            }
            // A page never starts with a blank separator.
            if current.is_empty() && line.is_empty() {
                continue;
            }
            current.push(line);
        }
        if !current.is_empty() {
            pages.push(current);
        }
        pages
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, document: &LetterDocument) -> Result<Vec<u8>, RenderError> {
        let pages = self.layout(document);
        if pages.is_empty() {
            return Err(RenderError::EmptyDocument);
        }

        let (pdf, first_page, first_layer) = PdfDocument::new(
            document.title.as_str(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let font = pdf
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;

        let line_height = Self::line_height_mm();
        for (page_number, lines) in pages.iter().enumerate() {
            let (page, layer) = if page_number == 0 {
                (first_page, first_layer)
            } else {
                pdf.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
            };
            let layer = pdf.get_page(page).get_layer(layer);

            for (n, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let y = PAGE_HEIGHT_MM - MARGIN_MM - line_height * (n as f32 + 1.0);
                layer.use_text(line.as_str(), FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
            }
        }

        pdf.save_to_bytes()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }
}

/// Maps typographic punctuation to the ASCII forms the builtin fonts can encode.
fn to_winansi(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '*',
            '\u{00A0}' | '\t' => ' ',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}
