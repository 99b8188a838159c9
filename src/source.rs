use std::path::{Path, PathBuf};

use miette::Diagnostic;

/// A cleaned source line that still knows where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the original file.
    pub number: usize,
    /// Byte offset of the first character of `text` in the original file.
    pub offset: usize,
    pub text: String,
}

impl AsRef<str> for SourceLine {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// A source file as read from disk, with its cleaned lines.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub lines: Vec<SourceLine>,
}

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum SourceError {
    #[error("Failed to read source '{}'.", .path.display())]
    #[diagnostic(code(jack::source::unreadable))]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[line {line}] Block comment is not closed on the line it starts.")]
    #[diagnostic(
        code(jack::source::multiline_comment),
        help("block comments spanning several lines are not supported")
    )]
    UnterminatedBlockComment { line: usize },
}

pub fn read_source(path: impl AsRef<Path>) -> Result<SourceFile, SourceError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let lines = clean_lines(&text)?;
    Ok(SourceFile {
        path: path.to_path_buf(),
        text,
        lines,
    })
}

/// Strips comments and surrounding whitespace from every line and drops the empty ones.
pub fn clean_lines(text: &str) -> Result<Vec<SourceLine>, SourceError> {
    let mut lines = Vec::new();
    let mut line_start = 0;
    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let number = idx + 1;
        let start = line_start;
        line_start += raw.len();

        let raw = raw.strip_suffix('\n').unwrap_or(raw);
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let code = strip_comments(raw, number)?;
        let trimmed = code.trim();
        if !trimmed.is_empty() {
            let leading = code.len() - code.trim_start().len();
            lines.push(SourceLine {
                number,
                offset: start + leading,
                text: trimmed.to_string(),
            });
        }
    }
    Ok(lines)
}

/// Removes `// ...` and same-line `/* ... */` comments. Comment markers inside a string constant
/// are left alone. A removed block comment is blanked byte for byte, so columns still line up
/// with the original text.
fn strip_comments(line: &str, number: usize) -> Result<String, SourceError> {
    let mut code = String::with_capacity(line.len());
    let mut in_string = false;
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        if c == '"' {
            in_string = !in_string;
        } else if !in_string && rest.starts_with("//") {
            break;
        } else if !in_string && rest.starts_with("/*") {
            let Some(end) = rest[2..].find("*/") else {
                return Err(SourceError::UnterminatedBlockComment { line: number });
            };
            let len = 2 + end + 2;
            code.extend(std::iter::repeat(' ').take(len));
            rest = &rest[len..];
            continue;
        }
        code.push(c);
        rest = &rest[c.len_utf8()..];
    }
    Ok(code)
}
