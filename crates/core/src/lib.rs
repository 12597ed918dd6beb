//! # batch-print-core
//!
//! Silent batch printing of PDF and image files.
//!
//! Every file becomes one print document and every page one bitmap, fitted
//! to the paper and drawn through a [`PrintDevice`]:
//!
//! - **pdfium** (Google's PDF engine) renders PDF pages
//! - **image** decodes PNG, JPEG and friends
//! - **GDI** device contexts on Windows, the system spooler elsewhere, or a
//!   directory of PNG pages ("print to file")
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batch_print_core::{
//!     find_printable, Backend, BatchPrinter, PaperConfig, PrintSource, RenderConfig,
//!     SendOptions, SystemCatalog,
//! };
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let printer = BatchPrinter::new(
//!         RenderConfig::default(),
//!         PaperConfig::default(),
//!         Backend::platform_default(),
//!     )?;
//!
//!     let files = find_printable(Path::new("."), &[".pdf".to_string()])?;
//!     let summary = printer.send(
//!         &SystemCatalog,
//!         None,
//!         files.into_iter().map(PrintSource::File),
//!         &SendOptions::with_message("SENT $path TO $printer"),
//!         &mut std::io::stdout(),
//!     )?;
//!
//!     println!("Printed {} pages on {}", summary.total_pages, summary.printer);
//!     Ok(())
//! }
//! ```
//!
//! ## Driving a Device Directly
//!
//! ```rust,no_run
//! use batch_print_core::{open_device, with_session, Backend, Bitmap, PaperConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let bitmap = Bitmap::from_dynamic(image::open("scan.png")?);
//!     let device = open_device(
//!         &Backend::Directory("./out".into()),
//!         "file",
//!         &PaperConfig::default(),
//!     )?;
//!
//!     with_session(device, |session| {
//!         session.document("scan.png", |doc| doc.print_bitmap(&bitmap).map(|_| ()))
//!     })?;
//!     Ok(())
//! }
//! ```

pub mod bitmap;
pub mod catalog;
pub mod config;
pub mod converter;
pub mod device;
pub mod error;
pub mod files;
pub mod fit;
pub mod pdf_renderer;
pub mod printer;
pub mod selector;
pub mod session;
pub mod shell;
pub mod template;

// Re-export main types for convenience
pub use bitmap::Bitmap;
pub use catalog::{resolve_printer, PrinterCatalog, StaticCatalog, SystemCatalog};
pub use config::{
    DispatchMode, PaperConfig, PaperSize, PrintConfig, PrintedDocument, RenderConfig,
    SelectConfig, SendOptions, SendSummary, DEFAULT_MESSAGE,
};
pub use converter::{BitmapConverter, PrintSource};
pub use device::{open_device, Backend, PrintDevice};
pub use error::{PrintError, Result};
pub use files::find_printable;
pub use fit::{fit_to_paper, FitRect};
pub use pdf_renderer::PdfRasterizer;
pub use printer::BatchPrinter;
pub use selector::{choose_printer, select_printer};
pub use session::{with_session, DeviceSession, SessionState};
pub use template::StatusTemplate;

/// Extensions printed when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".pdf"];

/// Extensions the converter can turn into bitmaps.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff"];

/// Check if a file extension can be printed.
pub fn is_supported_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|&e| e.eq_ignore_ascii_case(ext))
}

/// Initialize the library's logging.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    init_logging_with("warn");
}

/// Initialize logging, using `default_level` when `RUST_LOG` is unset.
pub fn init_logging_with(default_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
