//! Batch orchestration: sources in, documents out.
//!
//! This module provides the high-level API for sending a list of files to a
//! printer, one document per file and one page per bitmap.

use crate::catalog::{resolve_printer, PrinterCatalog};
use crate::config::{
    DispatchMode, PaperConfig, PrintedDocument, RenderConfig, SendOptions, SendSummary,
};
use crate::converter::{BitmapConverter, PrintSource};
use crate::device::{open_device, Backend, PrintDevice};
use crate::error::{PrintError, Result};
use crate::session::{with_session, DeviceSession};
use crate::shell::shell_print;
use crate::template::{StatusFields, StatusTemplate};
use std::io::Write;
use std::time::Instant;
use tracing::{debug, error, info};

/// Sends print sources to a printer.
pub struct BatchPrinter {
    converter: BitmapConverter,
    backend: Backend,
    paper: PaperConfig,
}

impl BatchPrinter {
    /// Create a batch printer with the given configuration.
    pub fn new(render: RenderConfig, paper: PaperConfig, backend: Backend) -> Result<Self> {
        paper.validate()?;
        info!(
            "Initializing batch printer with backend={:?}, dpi={}",
            backend, render.dpi
        );
        Ok(Self {
            converter: BitmapConverter::new(render)?,
            backend,
            paper,
        })
    }

    pub fn converter(&self) -> &BitmapConverter {
        &self.converter
    }

    /// Print every source on `printer` (or the catalog's default).
    ///
    /// Device mode opens one session for the whole batch; shell mode hands
    /// each file to the operating system and never opens a device. Status
    /// lines, if a template is set, are written to `status`.
    pub fn send<I>(
        &self,
        catalog: &dyn PrinterCatalog,
        printer: Option<&str>,
        sources: I,
        options: &SendOptions,
        status: &mut dyn Write,
    ) -> Result<SendSummary>
    where
        I: IntoIterator<Item = PrintSource>,
    {
        match options.mode {
            DispatchMode::Device => {
                let name = resolve_printer(catalog, printer)?;
                let device = open_device(&self.backend, &name, &self.paper)?;
                self.send_with_device(device, sources, options, status)
            }
            DispatchMode::Shell => {
                let name = catalog
                    .default_printer()?
                    .unwrap_or_else(|| "default printer".to_string());
                self.shell_send(&name, sources, options, status)
            }
        }
    }

    /// Device-mode send over an already opened device. The device is closed
    /// before returning, whatever happens.
    pub fn send_with_device<I>(
        &self,
        device: Box<dyn PrintDevice>,
        sources: I,
        options: &SendOptions,
        status: &mut dyn Write,
    ) -> Result<SendSummary>
    where
        I: IntoIterator<Item = PrintSource>,
    {
        let start = Instant::now();
        let template = options.message.as_deref().map(StatusTemplate::new);

        let (printer, documents) = with_session(device, |session| {
            let printer = session.printer_name().to_string();
            let mut documents = Vec::new();
            for source in sources {
                let printed = self.print_document(session, source)?;
                announce(template.as_ref(), &printer, &printed, status)?;
                documents.push(printed);
            }
            Ok((printer, documents))
        })?;

        Ok(summarize(printer, DispatchMode::Device, documents, start))
    }

    /// Print one source as one document on an open session.
    pub fn print_document(
        &self,
        session: &mut DeviceSession,
        source: PrintSource,
    ) -> Result<PrintedDocument> {
        let path = source.path().to_path_buf();
        let document = source.document_name();
        debug!("Printing {:?} as {:?}", path, document);

        let pages = self.converter.convert(source).map_err(|e| {
            error!("Failed to convert {:?}: {}", path, e);
            e
        })?;

        let count = session.document(&document, |doc| {
            let mut count = 0;
            for bitmap in pages {
                let bitmap = bitmap?;
                let rect = doc.print_bitmap(&bitmap)?;
                count += 1;
                debug!("Page {} of {:?} drawn at {:?}", count, document, rect);
            }
            Ok(count)
        })?;

        info!("Printed {:?} ({} pages)", path, count);
        Ok(PrintedDocument {
            path,
            document,
            pages: count,
        })
    }

    fn shell_send<I>(
        &self,
        printer: &str,
        sources: I,
        options: &SendOptions,
        status: &mut dyn Write,
    ) -> Result<SendSummary>
    where
        I: IntoIterator<Item = PrintSource>,
    {
        let start = Instant::now();
        let template = options.message.as_deref().map(StatusTemplate::new);
        let mut documents = Vec::new();

        for source in sources {
            let path = match source {
                PrintSource::File(path) => path,
                PrintSource::Bitmap { name, .. } => {
                    return Err(PrintError::InvalidConfig(format!(
                        "shell mode can only print files, got decoded bitmap {:?}",
                        name
                    )))
                }
            };
            shell_print(&path)?;
            let printed = PrintedDocument {
                document: PrintSource::File(path.clone()).document_name(),
                path,
                pages: 0,
            };
            announce(template.as_ref(), printer, &printed, status)?;
            documents.push(printed);
        }

        Ok(summarize(
            printer.to_string(),
            DispatchMode::Shell,
            documents,
            start,
        ))
    }
}

/// Write the status line for a finished document.
fn announce(
    template: Option<&StatusTemplate>,
    printer: &str,
    printed: &PrintedDocument,
    status: &mut dyn Write,
) -> Result<()> {
    let Some(template) = template else {
        return Ok(());
    };
    let stem = printed
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let line = template.render(&StatusFields {
        printer,
        path: &printed.path,
        document: &printed.document,
        stem: &stem,
    });
    writeln!(status, "{}", line)?;
    Ok(())
}

fn summarize(
    printer: String,
    mode: DispatchMode,
    documents: Vec<PrintedDocument>,
    start: Instant,
) -> SendSummary {
    let total_pages = documents.iter().map(|d| d.pages).sum();
    SendSummary {
        printer,
        mode,
        documents,
        total_pages,
        duration_ms: start.elapsed().as_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::catalog::StaticCatalog;
    use image::RgbImage;
    use tempfile::TempDir;

    fn printer(backend: Backend) -> BatchPrinter {
        BatchPrinter::new(
            RenderConfig::default(),
            PaperConfig::default().dpi(100),
            backend,
        )
        .unwrap()
    }

    #[test]
    fn test_send_decoded_bitmaps_to_directory() {
        let out = TempDir::new().unwrap();
        let printer = printer(Backend::Directory(out.path().to_path_buf()));
        let catalog = StaticCatalog::new(["file"]);
        let sources = vec![
            PrintSource::bitmap("first.png", Bitmap::from_rgb(RgbImage::new(20, 40))),
            PrintSource::bitmap("second.png", Bitmap::from_rgb(RgbImage::new(40, 20))),
        ];
        let mut status = Vec::new();

        let summary = printer
            .send(
                &catalog,
                Some("file"),
                sources,
                &SendOptions::with_message("$document via $printer"),
                &mut status,
            )
            .unwrap();

        assert_eq!(summary.printer, "file");
        assert_eq!(summary.total_pages, 2);
        assert_eq!(summary.documents[1].document, "second.png");
        assert_eq!(
            String::from_utf8(status).unwrap(),
            "first.png via file\nsecond.png via file\n"
        );
        assert!(out.path().join("first_page_0001.png").is_file());
        assert!(out.path().join("second_page_0001.png").is_file());
    }

    #[test]
    fn test_send_unknown_printer_fails_before_opening() {
        let out = TempDir::new().unwrap();
        let target = out.path().join("never-created");
        let printer = printer(Backend::Directory(target.clone()));
        let catalog = StaticCatalog::new(["A", "B"]);
        let result = printer.send(
            &catalog,
            Some("C"),
            Vec::<PrintSource>::new(),
            &SendOptions::default(),
            &mut Vec::new(),
        );
        assert!(matches!(result, Err(PrintError::PrinterNotFound { .. })));
        assert!(!target.exists());
    }

    #[test]
    fn test_no_message_writes_nothing() {
        let out = TempDir::new().unwrap();
        let printer = printer(Backend::Directory(out.path().to_path_buf()));
        let catalog = StaticCatalog::new(["file"]).with_default("file");
        let mut status = Vec::new();
        let summary = printer
            .send(
                &catalog,
                None,
                vec![PrintSource::bitmap("a", Bitmap::from_rgb(RgbImage::new(2, 2)))],
                &SendOptions::default(),
                &mut status,
            )
            .unwrap();
        assert_eq!(summary.documents.len(), 1);
        assert!(status.is_empty());
    }

    #[test]
    fn test_shell_mode_rejects_decoded_bitmaps() {
        let printer = printer(Backend::Spool);
        let catalog = StaticCatalog::new(Vec::<String>::new());
        let result = printer.send(
            &catalog,
            None,
            vec![PrintSource::bitmap("a", Bitmap::from_rgb(RgbImage::new(2, 2)))],
            &SendOptions::default().mode(DispatchMode::Shell),
            &mut Vec::new(),
        );
        assert!(matches!(result, Err(PrintError::InvalidConfig(_))));
    }
}
