//! Raster image sources embedded one image per PDF page.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use printpdf::image_crate::codecs::bmp::BmpDecoder;
use printpdf::image_crate::codecs::jpeg::JpegDecoder;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::image_crate::codecs::tiff::TiffDecoder;
use printpdf::{Image, ImageTransform, Mm, PdfDocument};

use super::{ConvertError, FormatTag};

/// Render density for placing pixels on the page. Scanned clinical documents
/// are commonly 150 dpi; the page is sized to the image so nothing is cropped.
const RENDER_DPI: f32 = 150.0;

pub fn image_to_pdf(source: &Path, dest: &Path, tag: FormatTag) -> Result<(), ConvertError> {
    let reader = BufReader::new(File::open(source)?);

    let image = match tag {
        FormatTag::Jpeg => JpegDecoder::new(reader)
            .map_err(|e| ConvertError::Image(e.to_string()))
            .and_then(|d| Image::try_from(d).map_err(|e| ConvertError::Image(e.to_string())))?,
        FormatTag::Png => PngDecoder::new(reader)
            .map_err(|e| ConvertError::Image(e.to_string()))
            .and_then(|d| Image::try_from(d).map_err(|e| ConvertError::Image(e.to_string())))?,
        FormatTag::Tiff => TiffDecoder::new(reader)
            .map_err(|e| ConvertError::Image(e.to_string()))
            .and_then(|d| Image::try_from(d).map_err(|e| ConvertError::Image(e.to_string())))?,
        FormatTag::Bmp => BmpDecoder::new(reader)
            .map_err(|e| ConvertError::Image(e.to_string()))
            .and_then(|d| Image::try_from(d).map_err(|e| ConvertError::Image(e.to_string())))?,
        other => return Err(ConvertError::UnrecognizedFormat(other.as_str().to_string())),
    };

    let width = Mm::from(image.image.width.into_pt(RENDER_DPI));
    let height = Mm::from(image.image.height.into_pt(RENDER_DPI));

    let title = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    let (doc, page, layer) = PdfDocument::new(&title, width, height, "Layer 1");
    image.add_to_layer(
        doc.get_page(page).get_layer(layer),
        ImageTransform {
            dpi: Some(RENDER_DPI),
            ..Default::default()
        },
    );

    let mut buf = BufWriter::new(File::create(dest)?);
    doc.save(&mut buf)
        .map_err(|e| ConvertError::PdfRender(format!("save error: {e}")))?;
    Ok(())
}
