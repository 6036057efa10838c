//! Interactive stdin prompts for the three run paths.
//!
//! Paths are accepted with or without surrounding quotes (shells and file
//! managers love to add them when dragging a folder onto a terminal);
//! leading and trailing whitespace and quote characters are stripped
//! before use.

use std::io::{self, BufRead, Write};

/// Strip surrounding whitespace and quote characters from raw input.
///
/// Applied to every prompted path before any validation.
#[must_use]
pub fn normalize_input(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Prompt for one path on stdin and return the normalized answer.
///
/// The prompt is written to stdout and flushed before blocking on input,
/// so it shows up even without a trailing newline.
///
/// # Errors
///
/// Propagates stdin/stdout I/O failures (including EOF, which yields an
/// empty answer and is rejected by the caller's precondition check).
pub fn prompt_path(label: &str) -> io::Result<String> {
    let stdin = io::stdin();
    let mut line = String::new();

    print!("{}: ", label);
    io::stdout().flush()?;
    stdin.lock().read_line(&mut line)?;

    Ok(normalize_input(&line))
}
