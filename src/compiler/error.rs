use miette::Diagnostic;

use crate::declarations::Scope;
use crate::tokens::TokenError;

/// Category of a compile failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An expected keyword, symbol or structure was not found.
    Syntax,
    /// The token text itself is malformed.
    Lexical,
    /// Duplicate declaration, undeclared use or stale subroutine locals.
    Scope,
    /// The token sequence ended too early or continues after the unit, or the nesting limit was
    /// reached.
    Exhaustion,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Token(#[from] TokenError),

    #[error("Expect {expected}, found '{found}'.")]
    #[diagnostic(code(jack::syntax))]
    Unexpected { expected: String, found: String },

    #[error("'{name}' is already declared as a {scope}.")]
    #[diagnostic(code(jack::scope::duplicate))]
    AlreadyDeclared { scope: Scope, name: String },

    #[error("Undefined variable '{0}'.")]
    #[diagnostic(
        code(jack::scope::undefined),
        help("variables must be declared as a field, static, parameter or var first")
    )]
    UndefinedVariable(String),

    #[error("Subroutine starts while locals of a previous subroutine are still declared.")]
    #[diagnostic(code(jack::scope::stale_locals))]
    StaleLocals,

    #[error("Unexpected end of token stream.")]
    #[diagnostic(code(jack::exhaustion::unexpected_end))]
    UnexpectedEnd,

    #[error("Extra code after unit, starting at '{0}'.")]
    #[diagnostic(code(jack::exhaustion::trailing))]
    TrailingTokens(String),

    #[error("Nesting deeper than {0} levels.")]
    #[diagnostic(
        code(jack::exhaustion::nesting),
        help("split the expression or block into smaller pieces")
    )]
    TooDeep(usize),
}

impl CompileError {
    pub fn unexpected(expected: impl ToString, found: impl ToString) -> Self {
        Self::Unexpected {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Token(e) => e.kind(),
            Self::Unexpected { .. } => ErrorKind::Syntax,
            Self::AlreadyDeclared { .. } | Self::UndefinedVariable(_) | Self::StaleLocals => {
                ErrorKind::Scope
            }
            Self::UnexpectedEnd | Self::TrailingTokens(_) | Self::TooDeep(_) => {
                ErrorKind::Exhaustion
            }
        }
    }
}
