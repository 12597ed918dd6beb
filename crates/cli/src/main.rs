//! batch-print: silently print every PDF or image under a directory.
//!
//! Picks the configured printer (or asks for one), prints each matching file
//! as its own document, and reports one status line per file.

use anyhow::{Context, Result};
use batch_print_core::{
    choose_printer, find_printable, init_logging_with, Backend, BatchPrinter, DispatchMode,
    PaperConfig, PaperSize, PrintConfig, PrintSource, PrinterCatalog, RenderConfig,
    SelectConfig, SendOptions, StaticCatalog, SystemCatalog, DEFAULT_EXTENSIONS,
    DEFAULT_MESSAGE,
};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Printed once every file has been sent.
const COMPLETE_MESSAGE: &str = "WORK COMPLETE";

const PAUSE_PROMPT: &str = "PRESS ENTER TO QUIT";

/// Silently print every matching file under a directory.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory searched recursively for files to print
    #[arg(default_value = ".")]
    root: PathBuf,

    /// File extension to print (repeatable)
    #[arg(
        short,
        long = "ext",
        value_name = "EXT",
        default_values_t = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string())
    )]
    extensions: Vec<String>,

    /// Printer to use when installed; otherwise a menu is shown
    #[arg(short, long)]
    printer: Option<String>,

    /// Status line printed after each file ($printer, $path, $document, $stem)
    #[arg(short, long, default_value = DEFAULT_MESSAGE)]
    message: String,

    /// Suppress the per-file status line
    #[arg(long, conflicts_with = "message")]
    quiet: bool,

    /// Use the operating system's print action instead of drawing pages
    #[arg(long)]
    shell: bool,

    /// Write composed pages as PNG files into this directory instead of printing
    #[arg(short, long, value_name = "DIR", conflicts_with = "shell")]
    output_dir: Option<PathBuf>,

    /// Paper size for composed pages (letter, a4, legal, 4x6)
    #[arg(long, default_value = "letter")]
    paper: PaperSize,

    /// Device resolution for composed pages
    #[arg(long, default_value_t = 300)]
    paper_dpi: u32,

    /// Resolution PDF pages are rasterized at
    #[arg(long, default_value_t = 200)]
    dpi: u32,

    /// Directory containing the pdfium library
    #[arg(long, value_name = "DIR")]
    pdfium_path: Option<PathBuf>,

    /// List installed printers and exit
    #[arg(long)]
    list_printers: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    summary_json: bool,

    /// Exit without waiting for Enter
    #[arg(long)]
    no_pause: bool,

    /// Verbose logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> PrintConfig {
        let mut select = SelectConfig::with_root(&self.root).extensions(&self.extensions);
        if let Some(ref printer) = self.printer {
            select = select.expected_printer(printer);
        }

        let mut render = RenderConfig::with_dpi(self.dpi);
        if let Some(ref path) = self.pdfium_path {
            render = render.pdfium_path(path.clone());
        }

        let mode = if self.shell {
            DispatchMode::Shell
        } else {
            DispatchMode::Device
        };
        let send = if self.quiet {
            SendOptions::default().mode(mode)
        } else {
            SendOptions::with_message(&self.message).mode(mode)
        };

        PrintConfig {
            select,
            render,
            paper: PaperConfig::new(self.paper).dpi(self.paper_dpi),
            send,
        }
    }

    fn backend(&self) -> Backend {
        match self.output_dir {
            Some(ref dir) => Backend::Directory(dir.clone()),
            None => Backend::platform_default(),
        }
    }

    fn catalog(&self) -> Box<dyn PrinterCatalog> {
        match self.output_dir {
            Some(_) => Box::new(StaticCatalog::new(["file"]).with_default("file")),
            None => Box::new(SystemCatalog),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging_with(match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    });

    let catalog = args.catalog();

    if args.list_printers {
        let default = catalog.default_printer()?;
        for name in catalog.printer_names().context("Failed to list printers")? {
            let marker = if default.as_deref() == Some(name.as_str()) {
                " (default)"
            } else {
                ""
            };
            println!("{}{}", name, marker);
        }
        return Ok(());
    }

    let result = run(&args, catalog.as_ref());
    complete(
        result,
        !args.no_pause,
        &mut io::stdout().lock(),
        &mut io::stdin().lock(),
    )
}

/// Select a printer and print everything; "no printer" is a clean exit.
fn run(args: &Args, catalog: &dyn PrinterCatalog) -> Result<()> {
    let config = args.config();
    config.validate().context("Invalid configuration")?;
    debug!("Configuration: {:?}", config);

    let stdin = io::stdin();
    let stdout = io::stdout();

    let printer = match config.send.mode {
        DispatchMode::Shell => None,
        DispatchMode::Device => {
            let chosen = choose_printer(
                catalog,
                config.select.expected_printer.as_deref(),
                &mut stdin.lock(),
                &mut stdout.lock(),
            );
            match chosen {
                Ok(name) => Some(name),
                Err(e) if !e.is_fatal() => {
                    println!("NO PRINTER SELECTED");
                    return Ok(());
                }
                Err(e) => return Err(e).context("Failed to choose a printer"),
            }
        }
    };

    let files = find_printable(&config.select.root, &config.select.extensions)
        .with_context(|| format!("Failed to scan {:?}", config.select.root))?;
    info!("Found {} files to print", files.len());

    let printer_name = printer.as_deref();
    let batch = BatchPrinter::new(config.render.clone(), config.paper, args.backend())
        .context("Failed to set up printing")?;

    let summary = batch
        .send(
            catalog,
            printer_name,
            files.into_iter().map(PrintSource::File),
            &config.send,
            &mut stdout.lock(),
        )
        .map_err(|e| {
            error!("Printing failed ({}): {}", e.kind(), e);
            e
        })
        .with_context(|| match printer_name {
            Some(name) => format!("Failed to print on {:?}", name),
            None => "Failed to print".to_string(),
        })?;

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

/// Announce a successful run and optionally wait for Enter. Failures are
/// returned untouched, without the completion line or the pause.
fn complete(
    result: Result<()>,
    pause: bool,
    out: &mut dyn Write,
    input: &mut dyn BufRead,
) -> Result<()> {
    result?;
    writeln!(out, "{}", COMPLETE_MESSAGE)?;
    if pause {
        writeln!(out, "{}", PAUSE_PROMPT)?;
        out.flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use batch_print_core::PrintError;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["batch-print"]);
        let config = args.config();
        assert_eq!(config.select.root, PathBuf::from("."));
        assert_eq!(config.select.extensions, DEFAULT_EXTENSIONS);
        assert_eq!(config.send.message.as_deref(), Some(DEFAULT_MESSAGE));
        assert_eq!(config.send.mode, DispatchMode::Device);
        assert_eq!(args.backend(), Backend::platform_default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_populate_config() {
        let args = Args::parse_from([
            "batch-print",
            "scans",
            "--ext",
            ".png",
            "--ext",
            "jpg",
            "--printer",
            "HP1",
            "--paper",
            "a4",
            "--paper-dpi",
            "150",
            "--quiet",
            "--shell",
        ]);
        let config = args.config();
        assert_eq!(config.select.root, PathBuf::from("scans"));
        assert_eq!(config.select.extensions, vec![".png", "jpg"]);
        assert_eq!(config.select.expected_printer.as_deref(), Some("HP1"));
        assert_eq!(config.paper.size, PaperSize::A4);
        assert_eq!(config.paper.dpi, 150);
        assert_eq!(config.send.message, None);
        assert_eq!(config.send.mode, DispatchMode::Shell);
    }

    #[test]
    fn test_output_dir_uses_file_printer() {
        let args = Args::parse_from(["batch-print", "--output-dir", "out"]);
        assert_eq!(args.backend(), Backend::Directory(PathBuf::from("out")));
        let catalog = args.catalog();
        assert_eq!(catalog.printer_names().unwrap(), vec!["file".to_string()]);
    }

    #[test]
    fn test_shell_conflicts_with_output_dir() {
        let result = Args::try_parse_from(["batch-print", "--shell", "--output-dir", "out"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_selection_is_not_fatal() {
        assert!(!PrintError::NoSelection.is_fatal());
    }

    #[test]
    fn test_complete_announces_and_pauses_after_success() {
        let mut out = Vec::new();
        let mut input = io::Cursor::new(b"\nleftover".to_vec());
        complete(Ok(()), true, &mut out, &mut input).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "WORK COMPLETE\nPRESS ENTER TO QUIT\n"
        );
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn test_complete_without_pause_reads_nothing() {
        let mut out = Vec::new();
        let mut input = io::Cursor::new(b"\n".to_vec());
        complete(Ok(()), false, &mut out, &mut input).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "WORK COMPLETE\n");
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn test_failed_run_skips_completion_and_pause() {
        let mut out = Vec::new();
        let mut input = io::Cursor::new(b"\n".to_vec());
        let failed = Err(anyhow::Error::new(PrintError::device("HP1", "offline")));
        let result = complete(failed, true, &mut out, &mut input);
        assert!(result.is_err());
        assert!(out.is_empty());
        assert_eq!(input.position(), 0);
    }
}
