//! Document-to-PDF conversion capability.
//!
//! Every source file routes through one [`Convert`] implementation. The
//! format is decided up front by mapping the (lowercased) file extension to a
//! closed [`FormatTag`]; unmapped extensions produce a typed
//! [`ConvertError::UnrecognizedFormat`] instead of a dispatch failure.

pub mod email;
pub mod image;
pub mod office;
pub mod pdf;
pub mod text;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use office::OfficeRenderer;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized data format '.{0}'")]
    UnrecognizedFormat(String),

    #[error("image decoding failed: {0}")]
    Image(String),

    #[error("PDF rendering failed: {0}")]
    PdfRender(String),

    #[error("PDF merge failed: {0}")]
    Merge(String),

    #[error("referenced intermediate file is missing: {}", .0.display())]
    MissingIntermediate(PathBuf),

    #[error("office renderer '{program}' failed: {detail}")]
    Renderer { program: String, detail: String },

    #[error("office renderer '{program}' timed out after {secs}s")]
    RendererTimeout { program: String, secs: u64 },

    #[error("email decomposition failed: {0}")]
    Email(String),
}

/// Closed enumeration of everything the migration knows how to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatTag {
    Pdf,
    Jpeg,
    Png,
    Tiff,
    Bmp,
    Text,
    WordProcessor,
    Spreadsheet,
    Presentation,
    Email,
}

impl FormatTag {
    /// Map a lowercased extension onto a tag. `.doc`/`.rtf` route the same
    /// way as `.docx`; `.jpeg` the same way as `.jpg`.
    pub fn from_extension(ext: &str) -> Option<FormatTag> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            "txt" | "log" => Some(Self::Text),
            "doc" | "docx" | "rtf" | "odt" => Some(Self::WordProcessor),
            "xls" | "xlsx" | "ods" => Some(Self::Spreadsheet),
            "ppt" | "pptx" | "odp" => Some(Self::Presentation),
            "eml" | "msg" => Some(Self::Email),
            _ => None,
        }
    }

    /// Tag for a path. Unknown extensions get one more chance through the
    /// mime database, which catches raster and text aliases (`.jfif`, …).
    pub fn from_path(path: &Path) -> Option<FormatTag> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        if let Some(tag) = Self::from_extension(&ext) {
            return Some(tag);
        }
        let mime = mime_guess::from_path(path).first()?;
        match (mime.type_().as_str(), mime.subtype().as_str()) {
            ("image", "jpeg") => Some(Self::Jpeg),
            ("image", "png") => Some(Self::Png),
            ("image", "tiff") => Some(Self::Tiff),
            ("image", "bmp") => Some(Self::Bmp),
            ("text", _) => Some(Self::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
            Self::Text => "text",
            Self::WordProcessor => "word_processor",
            Self::Spreadsheet => "spreadsheet",
            Self::Presentation => "presentation",
            Self::Email => "email",
        }
    }
}

/// The conversion capability the pipeline depends on.
pub trait Convert {
    /// Produce a PDF at `dest` from the document at `source`.
    fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConvertError>;
}

/// Production converter: native handlers for PDF, raster images, plain text
/// and email containers; an external renderer for office formats.
#[derive(Debug, Default)]
pub struct Converter {
    pub office: OfficeRenderer,
}

impl Convert for Converter {
    fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConvertError> {
        let tag = FormatTag::from_path(source).ok_or_else(|| {
            let ext = source
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            ConvertError::UnrecognizedFormat(ext)
        })?;
        tracing::debug!(source = %source.display(), format = tag.as_str(), "converting document");
        match tag {
            FormatTag::Pdf => pdf::copy_pdf(source, dest),
            FormatTag::Jpeg | FormatTag::Png | FormatTag::Tiff | FormatTag::Bmp => {
                image::image_to_pdf(source, dest, tag)
            }
            FormatTag::Text => text::text_file_to_pdf(source, dest),
            FormatTag::WordProcessor | FormatTag::Spreadsheet | FormatTag::Presentation => {
                self.office.render(source, dest)
            }
            FormatTag::Email => email::email_to_pdf(self, source, dest),
        }
    }
}
