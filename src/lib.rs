//! Front end for the Jack teaching language.
//!
//! A source file goes through four stages:
//!
//! ```text
//! source::read_source → scanner::Scanner → compiler::Compiler → output::write_tagged_tokens
//! ```
//!
//! The [`compiler::Compiler`] validates the grammar and the scoping of names while it emits the
//! parse tree as a flat list of tagged tokens. Output is only written when the whole class
//! parsed.

pub mod compiler;
pub mod declarations;
pub mod output;
pub mod scanner;
pub mod source;
pub mod tokens;

use std::fmt::{Display, Formatter};
use std::iter;
use std::path::Path;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use tracing::{info, trace_span};

pub use compiler::{compile, CompileError, Compiler};
use scanner::Scanner;
pub use source::{SourceFile, SourceLine};
use tokens::Tokens;

/// Root marker the driver wraps around the tagged tokens.
pub const ROOT_TAG: &str = "tokens";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    SourceError,
    CompilationError,
    OutputError,
}

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum AnalyzerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] source::SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] LocatedError),

    #[error("Failed to write tagged tokens.")]
    #[diagnostic(code(jack::output))]
    Output(#[from] anyhow::Error),
}

impl AnalyzerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Source(_) => ErrorKind::SourceError,
            Self::Compile(_) => ErrorKind::CompilationError,
            Self::Output(_) => ErrorKind::OutputError,
        }
    }

    /// The compile error underneath, if this is one.
    pub fn compile_error(&self) -> Option<&CompileError> {
        match self {
            Self::Compile(e) => Some(&e.error),
            _ => None,
        }
    }
}

/// A compile error together with where it happened.
#[derive(Debug)]
pub struct LocatedError {
    pub error: CompileError,
    pub line: usize,
    /// The offending token, `None` once the tokens ran out.
    pub lexeme: Option<String>,
    span: Option<SourceSpan>,
    source_code: Option<NamedSource<String>>,
}

impl LocatedError {
    pub fn span(&self) -> Option<SourceSpan> {
        self.span
    }

    /// Attaches the text the span points into, so reports can show the offending line.
    pub fn with_source_code(mut self, name: impl AsRef<str>, text: String) -> Self {
        self.source_code = Some(NamedSource::new(name, text));
        self
    }
}

impl std::error::Error for LocatedError {}

impl Display for LocatedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.lexeme {
            Some(lexeme) => write!(
                f,
                "[line {}] Error at '{}': {}",
                self.line, lexeme, self.error
            ),
            None => write!(f, "[line {}] Error at end: {}", self.line, self.error),
        }
    }
}

impl Diagnostic for LocatedError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.help()
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source_code.as_ref().map(|s| s as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(iter::once(LabeledSpan::new_with_span(
            Some(self.error.to_string()),
            span,
        ))))
    }
}

pub struct Analyzer;

impl Analyzer {
    /// Analyzes one source file and writes the wrapped tagged tokens to `output`. Returns the
    /// number of tagged tokens written.
    pub fn run_file(
        source: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<usize, AnalyzerError> {
        let SourceFile { path, text, lines } = source::read_source(source)?;
        info!(path = %path.display(), lines = lines.len(), "read source");

        let tagged = Self::analyze(&lines)
            .map_err(|e| e.with_source_code(path.display().to_string(), text))?;

        let output = output.as_ref();
        let open = format!("<{ROOT_TAG}>");
        let close = format!("</{ROOT_TAG}>");
        let framed = iter::once(open.as_str())
            .chain(tagged.iter().map(String::as_str))
            .chain(iter::once(close.as_str()));
        output::write_tagged_tokens(output, framed)?;
        info!(path = %output.display(), tokens = tagged.len(), "wrote tagged tokens");
        Ok(tagged.len())
    }

    /// Scans and parses cleaned lines. Compile errors carry the line, token and span they
    /// occurred at.
    pub fn analyze(lines: &[SourceLine]) -> Result<Vec<String>, LocatedError> {
        let span = trace_span!("analyze()");
        let _e = span.enter();

        let mut scanner = Scanner::new();
        for line in lines {
            scanner.scan_line(line.number, line.offset, &line.text);
        }

        let mut compiler = Compiler::new(Tokens::new(scanner.take_tokens()));
        match compiler.parse_unit() {
            Ok(()) => Ok(compiler.into_tagged_tokens()),
            Err(error) => {
                let position = compiler.position();
                let lexeme = compiler
                    .current_lexeme()
                    .filter(|_| !compiler.is_exhausted())
                    .map(str::to_string);
                Err(LocatedError {
                    error,
                    line: scanner.line_of(position).unwrap_or_default(),
                    lexeme,
                    span: scanner.span_of(position),
                    source_code: None,
                })
            }
        }
    }
}
