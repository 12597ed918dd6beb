//! Choosing a printer: the configured one if installed, otherwise a prompt.

use crate::catalog::PrinterCatalog;
use crate::error::{PrintError, Result};
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// Label of the menu entry that declines to print.
pub const QUIT_ENTRY: &str = "QUIT";

/// Pick a printer from `printers`.
///
/// `expected` is used as-is when installed. Otherwise the user is shown a
/// numbered menu on `output` and the answer is read from `input`. Anything
/// that is not the index of a printer (QUIT, garbage, an empty line, end of
/// input) yields [`PrintError::NoSelection`].
pub fn select_printer<R, W>(
    printers: &[String],
    expected: Option<&str>,
    input: &mut R,
    output: &mut W,
) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    if let Some(name) = expected {
        if printers.iter().any(|p| p == name) {
            info!("Using configured printer {:?}", name);
            return Ok(name.to_string());
        }
        warn!("Configured printer {:?} is not installed", name);
        writeln!(output, "EXPECTED PRINTER NOT FOUND ({})", name)?;
    }

    writeln!(output, "CHOOSE PRINTER OR QUIT")?;
    let entries = printers.iter().map(String::as_str).chain([QUIT_ENTRY]);
    for (no, entry) in entries.enumerate() {
        writeln!(output, "{}. {}", no, entry)?;
    }
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(PrintError::NoSelection);
    }

    match line.trim().parse::<usize>() {
        Ok(index) if index < printers.len() => {
            info!("User chose printer {:?}", printers[index]);
            Ok(printers[index].clone())
        }
        _ => Err(PrintError::NoSelection),
    }
}

/// Query the catalog once and run [`select_printer`] against it.
pub fn choose_printer<R, W>(
    catalog: &dyn PrinterCatalog,
    expected: Option<&str>,
    input: &mut R,
    output: &mut W,
) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    let printers = catalog.printer_names()?;
    select_printer(&printers, expected, input, output)
}
