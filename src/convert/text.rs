//! Plain-text sources rendered to a paginated PDF.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::ConvertError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 15.0;
const TOP_Y: f32 = 280.0;
const BOTTOM_Y: f32 = 15.0;
const LINE_STEP: f32 = 4.5;
const FONT_SIZE: f32 = 10.0;

/// Fixed column width the source text is wrapped to.
const MAX_COLS: usize = 90;

/// Render a text file to PDF. Non-UTF-8 bytes are replaced, not rejected —
/// legacy exports are full of stray encodings.
pub fn text_file_to_pdf(source: &Path, dest: &Path) -> Result<(), ConvertError> {
    let bytes = std::fs::read(source)?;
    let content = String::from_utf8_lossy(&bytes);
    let title = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    render_text(&title, &content, dest)
}

/// Render an in-memory string (also used for email bodies).
pub fn render_text(title: &str, content: &str, dest: &Path) -> Result<(), ConvertError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ConvertError::PdfRender(format!("font error: {e}")))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = Mm(TOP_Y);

    for raw_line in content.lines() {
        for line in wrap_text(raw_line, MAX_COLS) {
            if y < Mm(BOTTOM_Y) {
                let (page, layer_index) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                layer = doc.get_page(page).get_layer(layer_index);
                y = Mm(TOP_Y);
            }
            layer.use_text(&line, FONT_SIZE, Mm(MARGIN_LEFT), y, &font);
            y -= Mm(LINE_STEP);
        }
    }

    let mut buf = BufWriter::new(File::create(dest)?);
    doc.save(&mut buf)
        .map_err(|e| ConvertError::PdfRender(format!("save error: {e}")))?;
    Ok(())
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
