use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::tokens::TokenKind;

/// Renders one token as `<kind> value </kind>`. The value is written verbatim, no escaping.
pub fn tag(kind: TokenKind, value: &str) -> String {
    format!("<{kind}> {value} </{kind}>")
}

/// Writes one entry per line, in order, with nothing added around them.
///
/// The entries go to a temporary file next to `path` that replaces `path` only once everything is
/// written, so a failed write never leaves a partial file behind.
pub fn write_tagged_tokens<I, S>(path: impl AsRef<Path>, tokens: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create output file '{}'.", path.display()))?;

    let mut out = BufWriter::new(file);
    for token in tokens {
        writeln!(out, "{}", token.as_ref())
            .with_context(|| format!("Failed to write to '{}'.", path.display()))?;
    }
    let file = out
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("Failed to flush '{}'.", path.display()))?;
    // Dropping the returned temporary file removes it.
    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace '{}'.", path.display()))?;
    Ok(())
}
