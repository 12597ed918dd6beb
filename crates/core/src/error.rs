//! Error types for batch printing.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the batch-print library.
#[derive(Error, Debug)]
pub enum PrintError {
    /// The requested printer is not in the installed catalog.
    #[error("Printer not found: {name}")]
    PrinterNotFound { name: String },

    /// The user declined or failed to choose a printer.
    #[error("No printer selected")]
    NoSelection,

    /// An input file could not be decoded into an RGB bitmap.
    #[error("Failed to decode '{path}': {message}")]
    Decode { path: PathBuf, message: String },

    /// Opening or talking to a device context failed.
    #[error("Device error on '{printer}': {message}")]
    Device { printer: String, message: String },

    /// A document/page call was issued in the wrong state.
    #[error("Invalid device state: cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// PDF rendering failed.
    #[error("PDF rendering failed: {0}")]
    PdfRender(String),

    /// Pdfium library error.
    #[error("Pdfium error: {0}")]
    Pdfium(String),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncoding(String),

    /// The operating system's print action failed.
    #[error("Shell print failed for '{path}': {message}")]
    ShellPrint { path: PathBuf, message: String },

    /// Input file not found.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem or console I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, PrintError>;

impl PrintError {
    /// Shorthand for a [`PrintError::Device`].
    pub fn device(printer: impl Into<String>, message: impl Into<String>) -> Self {
        PrintError::Device {
            printer: printer.into(),
            message: message.into(),
        }
    }

    /// Whether the run must abort. Selection failures degrade to
    /// "report and exit" instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PrintError::PrinterNotFound { .. } | PrintError::NoSelection
        )
    }

    /// Short machine-readable kind, used in run summaries and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PrintError::PrinterNotFound { .. } => "printer_not_found",
            PrintError::NoSelection => "no_selection",
            PrintError::Decode { .. } => "decode_error",
            PrintError::Device { .. } | PrintError::InvalidState { .. } => "device_error",
            PrintError::PdfRender(_) | PrintError::Pdfium(_) => "decode_error",
            PrintError::PngEncoding(_) => "device_error",
            PrintError::ShellPrint { .. } => "shell_error",
            PrintError::InputNotFound(_) | PrintError::Io(_) => "io_error",
            PrintError::InvalidConfig(_) => "config_error",
        }
    }
}
