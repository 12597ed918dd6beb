//! Installed printers.
//!
//! The catalog is queried once during setup and passed down; nothing in the
//! crate caches it globally.

use crate::error::{PrintError, Result};
use tracing::{debug, info};

/// Source of installed printer names.
pub trait PrinterCatalog {
    /// Names of all installed printers.
    fn printer_names(&self) -> Result<Vec<String>>;

    /// The system default printer, if one is set.
    fn default_printer(&self) -> Result<Option<String>>;
}

/// Printers known to the operating system's print service.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCatalog;

#[cfg(feature = "system-printers")]
impl PrinterCatalog for SystemCatalog {
    fn printer_names(&self) -> Result<Vec<String>> {
        let names: Vec<String> = printers::get_printers()
            .into_iter()
            .map(|p| p.name)
            .collect();
        debug!("System catalog lists {} printers", names.len());
        Ok(names)
    }

    fn default_printer(&self) -> Result<Option<String>> {
        Ok(printers::get_default_printer().map(|p| p.name))
    }
}

#[cfg(not(feature = "system-printers"))]
impl PrinterCatalog for SystemCatalog {
    fn printer_names(&self) -> Result<Vec<String>> {
        tracing::warn!("Built without `system-printers`; no printers are listed");
        Ok(Vec::new())
    }

    fn default_printer(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// A fixed list of printers.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    names: Vec<String>,
    default: Option<String>,
}

impl StaticCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            default: None,
        }
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }
}

impl PrinterCatalog for StaticCatalog {
    fn printer_names(&self) -> Result<Vec<String>> {
        Ok(self.names.clone())
    }

    fn default_printer(&self) -> Result<Option<String>> {
        Ok(self.default.clone())
    }
}

/// Resolve `requested` against the catalog, or fall back to the default
/// printer when nothing was requested.
pub fn resolve_printer(catalog: &dyn PrinterCatalog, requested: Option<&str>) -> Result<String> {
    match requested.filter(|name| !name.is_empty()) {
        Some(name) => {
            if catalog.printer_names()?.iter().any(|p| p == name) {
                Ok(name.to_string())
            } else {
                Err(PrintError::PrinterNotFound {
                    name: name.to_string(),
                })
            }
        }
        None => {
            let name = catalog
                .default_printer()?
                .ok_or_else(|| PrintError::PrinterNotFound {
                    name: "<default printer>".to_string(),
                })?;
            info!("Using default printer {:?}", name);
            Ok(name)
        }
    }
}
