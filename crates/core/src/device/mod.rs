//! Print devices: the drawing end of the pipeline.
//!
//! A [`PrintDevice`] is the connection to one printer. It is driven by a
//! [`DeviceSession`](crate::session::DeviceSession), which owns the
//! document/page state machine; devices only translate each call into the
//! platform's printing primitives.

use crate::bitmap::Bitmap;
use crate::config::PaperConfig;
use crate::error::Result;
use crate::fit::FitRect;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[cfg(windows)]
pub mod gdi;
pub mod raster;

pub use raster::{encode_png, DirectorySink, PageSink, RasterDevice};
#[cfg(feature = "system-printers")]
pub use raster::{PdfJob, SpoolSink, Spooler};

/// Connection to a printer capable of drawing bitmaps page by page.
pub trait PrintDevice {
    /// Printer name.
    fn name(&self) -> &str;

    /// Paper size in device units (pixels).
    fn paper_size(&self) -> (u32, u32);

    fn start_document(&mut self, name: &str) -> Result<()>;

    fn start_page(&mut self) -> Result<()>;

    /// Draw a bitmap stretched into `rect`.
    fn draw_bitmap(&mut self, bitmap: &Bitmap, rect: FitRect) -> Result<()>;

    fn end_page(&mut self) -> Result<()>;

    fn end_document(&mut self) -> Result<()>;

    /// Release the connection.
    fn close(&mut self) -> Result<()>;
}

/// Which kind of device to open for a printer name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    /// Win32 GDI device context.
    Gdi,
    /// Compose pages and submit each document to the system spooler as one PDF job.
    Spool,
    /// Compose pages and write them as PNG files into a directory.
    Directory(PathBuf),
}

impl Backend {
    /// GDI on Windows, the spooler elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Backend::Gdi
        } else {
            Backend::Spool
        }
    }
}

/// Open a device for the named printer.
pub fn open_device(
    backend: &Backend,
    printer: &str,
    paper: &PaperConfig,
) -> Result<Box<dyn PrintDevice>> {
    match backend {
        Backend::Directory(dir) => Ok(Box::new(RasterDevice::new(
            printer,
            paper.pixels(),
            DirectorySink::new(dir.clone())?,
        ))),
        Backend::Spool => open_spool(printer, paper),
        Backend::Gdi => open_gdi(printer),
    }
}

#[cfg(feature = "system-printers")]
fn open_spool(printer: &str, paper: &PaperConfig) -> Result<Box<dyn PrintDevice>> {
    Ok(Box::new(RasterDevice::new(
        printer,
        paper.pixels(),
        SpoolSink::new(printer, paper.dpi)?,
    )))
}

#[cfg(not(feature = "system-printers"))]
fn open_spool(printer: &str, _paper: &PaperConfig) -> Result<Box<dyn PrintDevice>> {
    Err(crate::error::PrintError::device(
        printer,
        "spooling requires the `system-printers` feature",
    ))
}

#[cfg(windows)]
fn open_gdi(printer: &str) -> Result<Box<dyn PrintDevice>> {
    Ok(Box::new(gdi::GdiDevice::open(printer)?))
}

#[cfg(not(windows))]
fn open_gdi(printer: &str) -> Result<Box<dyn PrintDevice>> {
    Err(crate::error::PrintError::device(
        printer,
        "GDI device contexts are only available on Windows",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_platform_default_backend() {
        let backend = Backend::platform_default();
        if cfg!(windows) {
            assert_eq!(backend, Backend::Gdi);
        } else {
            assert_eq!(backend, Backend::Spool);
        }
    }

    #[test]
    fn test_open_directory_device_uses_paper_config() {
        let dir = TempDir::new().unwrap();
        let paper = PaperConfig::default().dpi(100);
        let device = open_device(&Backend::Directory(dir.path().to_path_buf()), "file", &paper)
            .unwrap();
        assert_eq!(device.name(), "file");
        assert_eq!(device.paper_size(), (850, 1100));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_gdi_unavailable_off_windows() {
        let result = open_device(&Backend::Gdi, "HP1", &PaperConfig::default());
        assert!(matches!(
            result,
            Err(crate::error::PrintError::Device { .. })
        ));
    }
}
