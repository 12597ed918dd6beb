//! Devices that compose each page into a paper-sized RGB canvas.
//!
//! Used where no drawing device context exists: each composed page is handed
//! to a [`PageSink`], which either writes it to disk as PNG or collects the
//! document's pages into one PDF job for the system print queue.

use super::PrintDevice;
use crate::bitmap::Bitmap;
use crate::error::{PrintError, Result};
use crate::fit::FitRect;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Destination for composed pages.
pub trait PageSink {
    /// Deliver page `page_number` (1-indexed) of `document`.
    fn submit(&mut self, printer: &str, document: &str, page_number: usize, page: &RgbImage)
        -> Result<()>;

    /// `document` is complete after `pages` pages.
    fn finish(&mut self, _printer: &str, _document: &str, _pages: usize) -> Result<()> {
        Ok(())
    }
}

/// A print device that rasterizes pages itself.
pub struct RasterDevice<S: PageSink> {
    name: String,
    paper: (u32, u32),
    sink: S,
    document: Option<String>,
    canvas: Option<RgbImage>,
    pages_in_document: usize,
}

impl<S: PageSink> RasterDevice<S> {
    pub fn new(name: impl Into<String>, paper: (u32, u32), sink: S) -> Self {
        Self {
            name: name.into(),
            paper,
            sink,
            document: None,
            canvas: None,
            pages_in_document: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: PageSink> PrintDevice for RasterDevice<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn paper_size(&self) -> (u32, u32) {
        self.paper
    }

    fn start_document(&mut self, name: &str) -> Result<()> {
        debug!("{}: start document {:?}", self.name, name);
        self.document = Some(name.to_string());
        self.pages_in_document = 0;
        Ok(())
    }

    fn start_page(&mut self) -> Result<()> {
        let (w, h) = self.paper;
        self.canvas = Some(RgbImage::from_pixel(w, h, Rgb([255, 255, 255])));
        Ok(())
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, rect: FitRect) -> Result<()> {
        let canvas = self.canvas.as_mut().ok_or(PrintError::InvalidState {
            operation: "draw",
            state: "no page is started",
        })?;
        if rect.width() <= 0 || rect.height() <= 0 {
            return Ok(());
        }

        let scaled = if bitmap.size() == (rect.width() as u32, rect.height() as u32) {
            bitmap.as_rgb().clone()
        } else {
            imageops::resize(
                bitmap.as_rgb(),
                rect.width() as u32,
                rect.height() as u32,
                FilterType::Triangle,
            )
        };
        imageops::overlay(canvas, &scaled, rect.x1 as i64, rect.y1 as i64);
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        let canvas = self.canvas.take().ok_or(PrintError::InvalidState {
            operation: "end a page",
            state: "no page is started",
        })?;
        self.pages_in_document += 1;
        let document = self.document.as_deref().unwrap_or("untitled");
        self.sink
            .submit(&self.name, document, self.pages_in_document, &canvas)
    }

    fn end_document(&mut self) -> Result<()> {
        match self.document.take() {
            Some(document) => {
                info!(
                    "{}: finished {:?} ({} pages)",
                    self.name, document, self.pages_in_document
                );
                self.sink
                    .finish(&self.name, &document, self.pages_in_document)
            }
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.canvas = None;
        self.document = None;
        Ok(())
    }
}

/// Encode an RGB image to PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    let mut encoder = png::Encoder::new(&mut buffer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Fast);

    let mut writer = encoder
        .write_header()
        .map_err(|e| PrintError::PngEncoding(format!("Failed to write PNG header: {}", e)))?;

    writer
        .write_image_data(image.as_raw())
        .map_err(|e| PrintError::PngEncoding(format!("Failed to write PNG data: {}", e)))?;

    drop(writer);

    Ok(buffer.into_inner())
}

/// File name for a composed page: `<stem>_page_0001.png`.
fn page_file_name(document: &str, page_number: usize) -> String {
    let stem = Path::new(document)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    format!("{}_page_{:04}.png", stem, page_number)
}

/// Writes composed pages into a directory ("print to file").
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl PageSink for DirectorySink {
    fn submit(
        &mut self,
        _printer: &str,
        document: &str,
        page_number: usize,
        page: &RgbImage,
    ) -> Result<()> {
        let path = self.dir.join(page_file_name(document, page_number));
        std::fs::write(&path, encode_png(page)?)?;
        debug!("Wrote {:?}", path);
        self.written.push(path);
        Ok(())
    }
}

/// Composed pages of one document, assembled into a single PDF.
///
/// Each page becomes a full-bleed RGB image whose media box is the canvas
/// size at `dpi`, so the printer receives the page exactly as composed.
#[cfg(feature = "system-printers")]
pub struct PdfJob {
    doc: printpdf::PdfDocument,
    pages: Vec<printpdf::PdfPage>,
    dpi: u32,
}

#[cfg(feature = "system-printers")]
impl PdfJob {
    pub fn new(title: &str, dpi: u32) -> Self {
        Self {
            doc: printpdf::PdfDocument::new(title),
            pages: Vec::new(),
            dpi: dpi.max(1),
        }
    }

    pub fn add_page(&mut self, page: &RgbImage) {
        use printpdf::{Op, PdfPage, Pt, RawImage, RawImageData, RawImageFormat, XObjectTransform};

        let raw = RawImage {
            pixels: RawImageData::U8(page.as_raw().clone()),
            width: page.width() as usize,
            height: page.height() as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let id = self.doc.add_image(&raw);

        let ops = vec![Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: None,
                scale_y: None,
                dpi: Some(self.dpi as f32),
                rotate: None,
            },
        }];
        self.pages.push(PdfPage::new(
            self.pixels_to_mm(page.width()),
            self.pixels_to_mm(page.height()),
            ops,
        ));
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize the document.
    pub fn finish(self) -> Vec<u8> {
        let PdfJob { mut doc, pages, .. } = self;
        doc.with_pages(pages);
        let mut warnings: Vec<printpdf::PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&printpdf::PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!("PDF job serialized with {} warnings", warnings.len());
        }
        bytes
    }

    fn pixels_to_mm(&self, pixels: u32) -> printpdf::Mm {
        printpdf::Mm(pixels as f32 * 25.4 / self.dpi as f32)
    }
}

/// A print queue that accepts finished job files.
#[cfg(feature = "system-printers")]
pub trait Spooler {
    /// Queue the file at `path` as `job_name`; returns the job id.
    fn submit_job(&mut self, path: &Path, job_name: &str) -> Result<String>;
}

#[cfg(feature = "system-printers")]
impl Spooler for printers::common::base::printer::Printer {
    fn submit_job(&mut self, path: &Path, job_name: &str) -> Result<String> {
        use printers::common::base::job::PrinterJobOptions;

        let options = PrinterJobOptions {
            name: Some(job_name),
            raw_properties: &[],
        };
        let path_str = path.to_string_lossy().into_owned();
        self.print_file(&path_str, options)
            .map(|job_id| job_id.to_string())
            .map_err(|e| PrintError::device(self.name.as_str(), format!("spooling failed: {}", e)))
    }
}

/// Spools each document to an installed printer as one PDF job.
#[cfg(feature = "system-printers")]
pub struct SpoolSink<Q: Spooler = printers::common::base::printer::Printer> {
    queue: Q,
    staging: tempfile::TempDir,
    dpi: u32,
    pending: Option<PdfJob>,
}

#[cfg(feature = "system-printers")]
impl SpoolSink {
    pub fn new(printer_name: &str, dpi: u32) -> Result<Self> {
        let printer = printers::get_printer_by_name(printer_name).ok_or_else(|| {
            PrintError::PrinterNotFound {
                name: printer_name.to_string(),
            }
        })?;
        Self::with_queue(printer, dpi)
    }
}

#[cfg(feature = "system-printers")]
impl<Q: Spooler> SpoolSink<Q> {
    pub fn with_queue(queue: Q, dpi: u32) -> Result<Self> {
        let staging = tempfile::TempDir::with_prefix("batch-print-spool-")?;
        Ok(Self {
            queue,
            staging,
            dpi,
            pending: None,
        })
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }
}

#[cfg(feature = "system-printers")]
impl<Q: Spooler> PageSink for SpoolSink<Q> {
    fn submit(
        &mut self,
        _printer: &str,
        document: &str,
        page_number: usize,
        page: &RgbImage,
    ) -> Result<()> {
        let dpi = self.dpi;
        self.pending
            .get_or_insert_with(|| PdfJob::new(document, dpi))
            .add_page(page);
        debug!("Staged page {} of {:?}", page_number, document);
        Ok(())
    }

    fn finish(&mut self, printer: &str, document: &str, pages: usize) -> Result<()> {
        let Some(job) = self.pending.take() else {
            debug!("{:?} has no pages, nothing to spool", document);
            return Ok(());
        };

        let path = self
            .staging
            .path()
            .join(format!("{}.pdf", uuid::Uuid::new_v4()));
        std::fs::write(&path, job.finish())?;

        let job_id = self.queue.submit_job(&path, document)?;
        info!(
            "Spooled {:?} ({} pages) to {} as job {}",
            document, pages, printer, job_id
        );
        Ok(())
    }
}
