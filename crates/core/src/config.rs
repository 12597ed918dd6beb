//! Configuration types for batch printing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default status line printed after each document.
pub const DEFAULT_MESSAGE: &str = "SENT $path TO $printer";

/// Configuration for PDF rasterization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Rasterization DPI (dots per inch).
    /// Default: 200.
    pub dpi: u32,

    /// Background color composited under transparent areas.
    /// Default: white (255, 255, 255).
    pub background_color: (u8, u8, u8),

    /// Directory holding the pdfium shared library. If None, searches
    /// the working directory and the usual system locations.
    pub pdfium_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            background_color: (255, 255, 255),
            pdfium_path: None,
        }
    }
}

impl RenderConfig {
    /// Create a render config with specified DPI.
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi,
            ..Default::default()
        }
    }

    /// Set the background color.
    pub fn background_color(mut self, color: (u8, u8, u8)) -> Self {
        self.background_color = color;
        self
    }

    /// Set the pdfium library directory.
    pub fn pdfium_path(mut self, path: PathBuf) -> Self {
        self.pdfium_path = Some(path);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.dpi == 0 || self.dpi > 1200 {
            return Err(crate::error::PrintError::InvalidConfig(
                "dpi must be between 1 and 1200".to_string(),
            ));
        }
        Ok(())
    }
}

/// Physical paper sizes known to the raster-composing backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    Letter,
    A4,
    Legal,
    Photo4x6,
}

impl PaperSize {
    /// Portrait size in thousandths of an inch.
    pub fn mils(&self) -> (u32, u32) {
        match self {
            PaperSize::Letter => (8500, 11000),
            PaperSize::A4 => (8268, 11693),
            PaperSize::Legal => (8500, 14000),
            PaperSize::Photo4x6 => (4000, 6000),
        }
    }

    /// Portrait size in device pixels at the given DPI.
    pub fn pixels(&self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.mils();
        (
            (w as u64 * dpi as u64 / 1000) as u32,
            (h as u64 * dpi as u64 / 1000) as u32,
        )
    }
}

impl std::str::FromStr for PaperSize {
    type Err = crate::error::PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "letter" => Ok(PaperSize::Letter),
            "a4" => Ok(PaperSize::A4),
            "legal" => Ok(PaperSize::Legal),
            "4x6" | "photo4x6" => Ok(PaperSize::Photo4x6),
            other => Err(crate::error::PrintError::InvalidConfig(format!(
                "unknown paper size '{}'",
                other
            ))),
        }
    }
}

/// Paper used by backends that compose pages themselves (spool, directory).
/// GDI devices report their own paper size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// Paper size.
    /// Default: Letter.
    pub size: PaperSize,

    /// Device resolution of the composed page.
    /// Default: 300.
    pub dpi: u32,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            size: PaperSize::Letter,
            dpi: 300,
        }
    }
}

impl PaperConfig {
    /// Create a paper config for the given size.
    pub fn new(size: PaperSize) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Set the device DPI.
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Paper size in device pixels.
    pub fn pixels(&self) -> (u32, u32) {
        self.size.pixels(self.dpi)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.dpi < 72 || self.dpi > 1200 {
            return Err(crate::error::PrintError::InvalidConfig(
                "paper dpi must be between 72 and 1200".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which files to print and on which printer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectConfig {
    /// Root directory scanned recursively.
    /// Default: current directory.
    pub root: PathBuf,

    /// Printable extensions, with or without the leading dot.
    /// Default: [".pdf"].
    pub extensions: Vec<String>,

    /// Printer to use without prompting, if installed.
    pub expected_printer: Option<String>,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extensions: crate::DEFAULT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            expected_printer: None,
        }
    }
}

impl SelectConfig {
    /// Scan the given root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Replace the extension allow-list.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the expected printer.
    pub fn expected_printer(mut self, name: impl Into<String>) -> Self {
        self.expected_printer = Some(name.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.extensions.is_empty() {
            return Err(crate::error::PrintError::InvalidConfig(
                "at least one printable extension is required".to_string(),
            ));
        }
        if self.extensions.iter().any(|e| e.trim_start_matches('.').is_empty()) {
            return Err(crate::error::PrintError::InvalidConfig(
                "extensions must not be empty".to_string(),
            ));
        }
        if let Some(ext) = self
            .extensions
            .iter()
            .find(|e| !crate::is_supported_extension(e))
        {
            return Err(crate::error::PrintError::InvalidConfig(format!(
                "cannot print {:?} files (supported: {})",
                ext,
                crate::SUPPORTED_EXTENSIONS.join(", ")
            )));
        }
        Ok(())
    }
}

/// How documents reach the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Draw bitmaps through a device context. Silent.
    #[default]
    Device,
    /// Hand each file to the operating system's "print" action.
    /// May show UI and always uses the default printer.
    Shell,
}

/// Options for a single `send` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendOptions {
    /// Dispatch mode.
    pub mode: DispatchMode,

    /// Status template printed after each document, if any.
    pub message: Option<String>,
}

impl SendOptions {
    /// Device mode with the given status template.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Set the dispatch mode.
    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Combined configuration for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrintConfig {
    /// File and printer selection.
    pub select: SelectConfig,

    /// PDF rasterization.
    pub render: RenderConfig,

    /// Paper for raster-composing backends.
    pub paper: PaperConfig,

    /// Dispatch options.
    pub send: SendOptions,
}

impl PrintConfig {
    /// Validate the entire configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.select.validate()?;
        self.render.validate()?;
        self.paper.validate()?;
        Ok(())
    }
}

/// One document that went to the printer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintedDocument {
    /// Source path (or the name of a pre-decoded bitmap).
    pub path: PathBuf,

    /// Document name announced to the device.
    pub document: String,

    /// Pages drawn. Zero in shell mode, where the OS decides.
    pub pages: usize,
}

/// Result of a `send` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendSummary {
    /// Printer the documents were sent to.
    pub printer: String,

    /// Dispatch mode used.
    pub mode: DispatchMode,

    /// Documents in the order they were printed.
    pub documents: Vec<PrintedDocument>,

    /// Total pages drawn.
    pub total_pages: usize,

    /// Wall-clock time for the whole batch.
    pub duration_ms: u128,
}
