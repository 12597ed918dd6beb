//! PDF rasterization using pdfium (Google's PDF engine).
//!
//! Pages are rendered one at a time as the caller pulls them, so a long
//! document never holds more than one page bitmap in memory.

use crate::bitmap::Bitmap;
use crate::config::RenderConfig;
use crate::error::{PrintError, Result};
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF rasterizer bound to a pdfium library instance.
pub struct PdfRasterizer {
    /// Render configuration.
    config: RenderConfig,
    /// Pdfium library instance.
    pdfium: Pdfium,
}

impl PdfRasterizer {
    /// Bind pdfium and create a rasterizer.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;

        let pdfium = Pdfium::new(Self::bind(&config)?);

        info!("PDF rasterizer initialized at {} DPI", config.dpi);

        Ok(Self { config, pdfium })
    }

    /// Try the configured directory first, then the working directory and
    /// the usual system locations.
    fn bind(config: &RenderConfig) -> Result<Box<dyn PdfiumLibraryBindings>> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(ref dir) = config.pdfium_path {
            candidates.push(dir.clone());
        }
        candidates.extend(["./", "/usr/lib", "/usr/local/lib"].map(PathBuf::from));

        for dir in &candidates {
            match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
                Ok(bindings) => {
                    debug!("Bound pdfium from {:?}", dir);
                    return Ok(bindings);
                }
                Err(e) => debug!("No pdfium in {:?}: {}", dir, e),
            }
        }

        Pdfium::bind_to_system_library().map_err(|e| {
            PrintError::Pdfium(format!("Failed to load pdfium library: {}", e))
        })
    }

    /// Get the configured DPI.
    pub fn dpi(&self) -> u32 {
        self.config.dpi
    }

    /// Open a PDF and return a lazy iterator over its pages.
    pub fn pages<'a>(&'a self, pdf_path: &Path) -> Result<PageIterator<'a>> {
        let document = self
            .pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| PrintError::Decode {
                path: pdf_path.to_path_buf(),
                message: format!("Failed to load PDF: {}", e),
            })?;

        let page_count = document.pages().len() as usize;
        debug!("Opened {:?} with {} pages", pdf_path, page_count);

        Ok(PageIterator {
            rasterizer: self,
            document,
            current_page: 0,
            total_pages: page_count,
        })
    }

    /// Render a single page to an RGB bitmap.
    fn render_page(&self, document: &PdfDocument, page_idx: usize) -> Result<Bitmap> {
        let page = document.pages().get(page_idx as u16).map_err(|e| {
            PrintError::PdfRender(format!("Failed to get page {}: {}", page_idx + 1, e))
        })?;

        // PDF pages are 72 points per inch
        let scale = self.config.dpi as f32 / 72.0;
        let width = (page.width().value * scale) as u32;
        let height = (page.height().value * scale) as u32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .rotate_if_landscape(PdfPageRenderRotation::None, false);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            PrintError::PdfRender(format!("Failed to render page {}: {}", page_idx + 1, e))
        })?;

        let rgba_image: RgbaImage = bitmap.as_image().into_rgba8();
        let flattened = apply_background(rgba_image, self.config.background_color);

        Ok(Bitmap::from_dynamic(image::DynamicImage::ImageRgba8(
            flattened,
        )))
    }
}

/// Composite transparent areas onto the background color.
fn apply_background(mut image: RgbaImage, background: (u8, u8, u8)) -> RgbaImage {
    let (r, g, b) = background;

    for pixel in image.pixels_mut() {
        let alpha = pixel[3] as f32 / 255.0;
        if alpha < 1.0 {
            let inv_alpha = 1.0 - alpha;
            pixel[0] = ((pixel[0] as f32 * alpha) + (r as f32 * inv_alpha)) as u8;
            pixel[1] = ((pixel[1] as f32 * alpha) + (g as f32 * inv_alpha)) as u8;
            pixel[2] = ((pixel[2] as f32 * alpha) + (b as f32 * inv_alpha)) as u8;
            pixel[3] = 255;
        }
    }

    image
}

/// Iterator over the pages of one PDF, rendering on demand.
pub struct PageIterator<'a> {
    rasterizer: &'a PdfRasterizer,
    document: PdfDocument<'a>,
    current_page: usize,
    total_pages: usize,
}

impl<'a> Iterator for PageIterator<'a> {
    type Item = Result<Bitmap>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_page >= self.total_pages {
            return None;
        }

        let result = self
            .rasterizer
            .render_page(&self.document, self.current_page);
        self.current_page += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_pages - self.current_page;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for PageIterator<'a> {}
