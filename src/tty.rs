//! Terminal I/O utilities for CLI.
//!
//! Provides TTY detection and user prompting.

use std::io::{self, BufRead, IsTerminal, Write};

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

pub fn is_stderr_tty() -> bool {
    io::stderr().is_terminal()
}

/// Prompting only makes sense when someone can answer.
pub fn can_prompt() -> bool {
    is_stdin_tty() && is_stderr_tty()
}

pub fn prompt(message: &str) -> pgpull::Result<String> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .map_err(|e| pgpull::Error::internal_io(e.to_string(), Some("read stdin".to_string())))?;

    Ok(line.trim().to_string())
}

/// Ask a yes/no question; anything but `y`/`yes` is a no.
pub fn confirm(message: &str) -> pgpull::Result<bool> {
    let answer = prompt(&format!("{} [y/N] ", message))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Print status message to stderr if running in a terminal.
pub fn status(message: &str) {
    if is_stderr_tty() {
        eprintln!("{}", message);
    }
}

// log_status! macro is defined in lib.rs (#[macro_export]) and available crate-wide.
