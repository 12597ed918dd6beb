//! Turning print sources into page bitmaps.
//!
//! A [`PrintSource`] is resolved once at the top of the pipeline: either a
//! file on disk (PDF or image) or a bitmap the caller already decoded. The
//! [`BitmapConverter`] turns it into a lazy sequence of RGB [`Bitmap`]s, one
//! per printed page.

use crate::bitmap::Bitmap;
use crate::config::RenderConfig;
use crate::error::{PrintError, Result};
use crate::pdf_renderer::{PageIterator, PdfRasterizer};
use image::ImageReader;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Something that can be printed as one document.
#[derive(Debug, Clone)]
pub enum PrintSource {
    /// A PDF or image file.
    File(PathBuf),
    /// An already-decoded bitmap, printed as a single-page document.
    Bitmap { name: String, bitmap: Bitmap },
}

impl PrintSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        PrintSource::File(path.into())
    }

    pub fn bitmap(name: impl Into<String>, bitmap: Bitmap) -> Self {
        PrintSource::Bitmap {
            name: name.into(),
            bitmap,
        }
    }

    /// The path, or the bitmap's name as a path.
    pub fn path(&self) -> &Path {
        match self {
            PrintSource::File(path) => path,
            PrintSource::Bitmap { name, .. } => Path::new(name),
        }
    }

    /// Document name announced to the printer: the file name.
    pub fn document_name(&self) -> String {
        match self {
            PrintSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            PrintSource::Bitmap { name, .. } => name.clone(),
        }
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        match self {
            PrintSource::File(path) => path
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            PrintSource::Bitmap { name, .. } => Path::new(name)
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.clone()),
        }
    }
}

impl From<PathBuf> for PrintSource {
    fn from(path: PathBuf) -> Self {
        PrintSource::File(path)
    }
}

impl From<&Path> for PrintSource {
    fn from(path: &Path) -> Self {
        PrintSource::File(path.to_path_buf())
    }
}

/// Whether a path names a PDF, judged by extension.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Decode an image file into a bitmap.
pub fn decode_image(path: &Path) -> Result<Bitmap> {
    let decode_error = |message: String| PrintError::Decode {
        path: path.to_path_buf(),
        message,
    };

    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| decode_error(e.to_string()))?;

    let bitmap = Bitmap::from_dynamic(image);
    debug!(
        "Decoded {:?} to {}x{} (rotated: {})",
        path,
        bitmap.width(),
        bitmap.height(),
        bitmap.was_rotated()
    );
    Ok(bitmap)
}

/// Converts print sources into page bitmaps.
///
/// Pdfium is only bound the first time a PDF is converted, so image-only
/// batches work without the library installed.
pub struct BitmapConverter {
    config: RenderConfig,
    rasterizer: OnceCell<PdfRasterizer>,
}

impl BitmapConverter {
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rasterizer: OnceCell::new(),
        })
    }

    fn rasterizer(&self) -> Result<&PdfRasterizer> {
        if let Some(rasterizer) = self.rasterizer.get() {
            return Ok(rasterizer);
        }
        let rasterizer = PdfRasterizer::new(self.config.clone())?;
        Ok(self.rasterizer.get_or_init(|| rasterizer))
    }

    /// Convert a source into its page bitmaps.
    ///
    /// Images are decoded immediately; PDF pages are rendered as the
    /// returned iterator is advanced.
    pub fn convert(&self, source: PrintSource) -> Result<Pages<'_>> {
        match source {
            PrintSource::Bitmap { bitmap, .. } => Ok(Pages::Single(Some(bitmap))),
            PrintSource::File(path) => {
                if !path.is_file() {
                    return Err(PrintError::InputNotFound(path));
                }
                if is_pdf(&path) {
                    Ok(Pages::Pdf(self.rasterizer()?.pages(&path)?))
                } else {
                    Ok(Pages::Single(Some(decode_image(&path)?)))
                }
            }
        }
    }
}

/// Page bitmaps of one source, produced lazily.
pub enum Pages<'a> {
    Pdf(PageIterator<'a>),
    Single(Option<Bitmap>),
}

impl<'a> Iterator for Pages<'a> {
    type Item = Result<Bitmap>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Pages::Pdf(pages) => pages.next(),
            Pages::Single(bitmap) => bitmap.take().map(Ok),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Pages::Pdf(pages) => pages.size_hint(),
            Pages::Single(bitmap) => {
                let n = usize::from(bitmap.is_some());
                (n, Some(n))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("a/b/report.pdf")));
        assert!(is_pdf(Path::new("REPORT.PDF")));
        assert!(!is_pdf(Path::new("scan.png")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_source_names() {
        let source = PrintSource::file("docs/2024/report.final.pdf");
        assert_eq!(source.document_name(), "report.final.pdf");
        assert_eq!(source.stem(), "report.final");
        assert_eq!(source.path(), Path::new("docs/2024/report.final.pdf"));

        let source = PrintSource::bitmap("label.png", Bitmap::from_rgb(RgbImage::new(1, 1)));
        assert_eq!(source.document_name(), "label.png");
        assert_eq!(source.stem(), "label");
    }

    #[test]
    fn test_convert_landscape_png_rotates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.png");
        let mut image = RgbImage::new(40, 20);
        image.put_pixel(0, 0, Rgb([9, 9, 9]));
        image.save(&path).unwrap();

        let converter = BitmapConverter::new(RenderConfig::default()).unwrap();
        let pages: Vec<Bitmap> = converter
            .convert(PrintSource::file(&path))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].size(), (20, 40));
        assert!(pages[0].was_rotated());
    }

    #[test]
    fn test_convert_portrait_jpeg_keeps_orientation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tall.jpg");
        RgbImage::from_pixel(20, 40, Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();

        let converter = BitmapConverter::new(RenderConfig::default()).unwrap();
        let mut pages = converter.convert(PrintSource::file(&path)).unwrap();
        assert_eq!(pages.size_hint(), (1, Some(1)));
        let page = pages.next().unwrap().unwrap();
        assert_eq!(page.size(), (20, 40));
        assert!(pages.next().is_none());
    }

    #[test]
    fn test_convert_corrupt_image_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really").unwrap();

        let converter = BitmapConverter::new(RenderConfig::default()).unwrap();
        let result = converter.convert(PrintSource::file(&path));
        assert!(matches!(result, Err(PrintError::Decode { .. })));
    }

    #[test]
    fn test_convert_missing_file() {
        let converter = BitmapConverter::new(RenderConfig::default()).unwrap();
        let result = converter.convert(PrintSource::file("/definitely/not/here.png"));
        assert!(matches!(result, Err(PrintError::InputNotFound(_))));
    }

    #[test]
    fn test_convert_decoded_bitmap_passes_through() {
        let converter = BitmapConverter::new(RenderConfig::default()).unwrap();
        let source = PrintSource::bitmap("x", Bitmap::from_rgb(RgbImage::new(3, 5)));
        let pages: Vec<_> = converter.convert(source).unwrap().collect();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].as_ref().unwrap().size(), (3, 5));
    }

    #[test]
    fn test_converter_rejects_invalid_config() {
        assert!(BitmapConverter::new(RenderConfig::with_dpi(0)).is_err());
    }
}
