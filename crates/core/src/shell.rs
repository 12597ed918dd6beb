//! Printing through the operating system's "print" action.
//!
//! Not silent: the registered application may open a window or ask the user
//! something, and the call can block until it does. Always goes to the
//! default printer.

use crate::error::{PrintError, Result};
use std::path::Path;
use tracing::info;

/// Hand `path` to the shell's print verb.
#[cfg(windows)]
pub fn shell_print(path: &Path) -> Result<()> {
    use windows::core::{w, PCWSTR};
    use windows::Win32::UI::Shell::ShellExecuteW;
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

    if !path.exists() {
        return Err(PrintError::InputNotFound(path.to_path_buf()));
    }

    let file: Vec<u16> = path
        .as_os_str()
        .to_string_lossy()
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();

    // SAFETY: `file` is null-terminated and outlives the call.
    let instance = unsafe {
        ShellExecuteW(
            None,
            w!("print"),
            PCWSTR::from_raw(file.as_ptr()),
            PCWSTR::null(),
            PCWSTR::null(),
            SW_SHOWNORMAL,
        )
    };

    // Values up to 32 are error codes.
    let code = instance.0 as isize;
    if code <= 32 {
        return Err(PrintError::ShellPrint {
            path: path.to_path_buf(),
            message: format!("ShellExecute returned {}", code),
        });
    }
    info!("Shell print started for {:?}", path);
    Ok(())
}

/// Hand `path` to `lp` (or `lpr`) for the default destination.
#[cfg(not(windows))]
pub fn shell_print(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PrintError::InputNotFound(path.to_path_buf()));
    }

    let program = print_command().ok_or_else(|| PrintError::ShellPrint {
        path: path.to_path_buf(),
        message: "neither 'lp' nor 'lpr' found in PATH".to_string(),
    })?;

    let output = std::process::Command::new(&program).arg(path).output()?;
    if !output.status.success() {
        return Err(PrintError::ShellPrint {
            path: path.to_path_buf(),
            message: format!(
                "{:?} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    info!(
        "Shell print submitted for {:?}: {}",
        path,
        String::from_utf8_lossy(&output.stdout).trim()
    );
    Ok(())
}

/// The spooler front-end to use for shell printing.
#[cfg(not(windows))]
fn print_command() -> Option<std::path::PathBuf> {
    which::which("lp").or_else(|_| which::which("lpr")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_print_missing_file() {
        let result = shell_print(Path::new("/no/such/file.pdf"));
        assert!(matches!(result, Err(PrintError::InputNotFound(_))));
    }
}
