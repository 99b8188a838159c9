use std::fmt::{Display, Formatter};

use miette::Diagnostic;
use phf::phf_map;

use crate::compiler::ErrorKind;

/// Largest value an integer constant may take.
pub const MAX_INT_CONSTANT: u16 = 32767;

/// The reserved single-character symbols. Every one of them is also a cut point for the scanner.
pub const SYMBOLS: [char; 19] = [
    '{', '}', '(', ')', '[', ']', '.', ',', ';', '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Symbol,
    IntegerConstant,
    StringConstant,
    Identifier,
}

impl TokenKind {
    /// Tag name used in the serialized output.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Symbol => "symbol",
            Self::IntegerConstant => "integerConstant",
            Self::StringConstant => "stringConstant",
            Self::Identifier => "identifier",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    Method,
    Function,
    Constructor,
    Int,
    Boolean,
    Char,
    Void,
    Var,
    Static,
    Field,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
    True,
    False,
    Null,
    This,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "class" => Keyword::Class,
    "method" => Keyword::Method,
    "function" => Keyword::Function,
    "constructor" => Keyword::Constructor,
    "int" => Keyword::Int,
    "boolean" => Keyword::Boolean,
    "char" => Keyword::Char,
    "void" => Keyword::Void,
    "var" => Keyword::Var,
    "static" => Keyword::Static,
    "field" => Keyword::Field,
    "let" => Keyword::Let,
    "do" => Keyword::Do,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "return" => Keyword::Return,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "this" => Keyword::This,
};

impl Keyword {
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        KEYWORDS.get(lexeme).copied()
    }

    /// All reserved spellings, in no particular order.
    pub fn spellings() -> impl Iterator<Item = &'static str> {
        KEYWORDS.keys().copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Method => "method",
            Self::Function => "function",
            Self::Constructor => "constructor",
            Self::Int => "int",
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Void => "void",
            Self::Var => "var",
            Self::Static => "static",
            Self::Field => "field",
            Self::Let => "let",
            Self::Do => "do",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::Return => "return",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::This => "this",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum TokenError {
    #[error("Integer constant '{0}' is out of range [0, 32767].")]
    #[diagnostic(code(jack::lexical::integer_range))]
    IntegerOutOfRange(String),
    #[error("'{0}' starts with a digit but is not an integer constant.")]
    #[diagnostic(
        code(jack::lexical::leading_digit),
        help("identifiers can't start with a digit")
    )]
    LeadingDigit(String),
    #[error("Unrecognized token '{0}'.")]
    #[diagnostic(code(jack::lexical::unrecognized))]
    Unrecognized(String),
    #[error("Expect {expected}, found {found} '{lexeme}'.")]
    #[diagnostic(code(jack::syntax::kind_mismatch))]
    KindMismatch {
        expected: TokenKind,
        found: TokenKind,
        lexeme: String,
    },
    #[error("No more tokens.")]
    #[diagnostic(code(jack::exhaustion::end_of_stream))]
    EndOfStream,
    #[error("Can't step before the first token.")]
    #[diagnostic(code(jack::exhaustion::before_start))]
    BeforeStart,
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IntegerOutOfRange(_) | Self::LeadingDigit(_) | Self::Unrecognized(_) => {
                ErrorKind::Lexical
            }
            Self::KindMismatch { .. } => ErrorKind::Syntax,
            Self::EndOfStream | Self::BeforeStart => ErrorKind::Exhaustion,
        }
    }
}

type Result<T, E = TokenError> = core::result::Result<T, E>;

pub fn is_symbol(c: char) -> bool {
    SYMBOLS.contains(&c)
}

/// Decides the kind of a raw token. Digit-leading text that is not a valid integer constant is an
/// error rather than a fallback to identifier.
pub fn classify(lexeme: &str) -> Result<TokenKind> {
    if KEYWORDS.contains_key(lexeme) {
        return Ok(TokenKind::Keyword);
    }

    let mut chars = lexeme.chars();
    let first = chars.next();
    if let (Some(c), None) = (first, chars.next()) {
        if is_symbol(c) {
            return Ok(TokenKind::Symbol);
        }
    }

    match first {
        Some(c) if c.is_ascii_digit() => int_value(lexeme).map(|_| TokenKind::IntegerConstant),
        Some('"') if lexeme.len() >= 2 && lexeme.ends_with('"') => Ok(TokenKind::StringConstant),
        Some(_) if is_identifier(lexeme) => Ok(TokenKind::Identifier),
        _ => Err(TokenError::Unrecognized(lexeme.to_string())),
    }
}

fn int_value(lexeme: &str) -> Result<u16> {
    if !lexeme.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenError::LeadingDigit(lexeme.to_string()));
    }
    // Anything too long for u32 is out of range as well.
    match lexeme.parse::<u32>() {
        Ok(n) if n <= MAX_INT_CONSTANT as u32 => Ok(n as u16),
        _ => Err(TokenError::IntegerOutOfRange(lexeme.to_string())),
    }
}

fn is_identifier(lexeme: &str) -> bool {
    !lexeme.starts_with(|c: char| c.is_ascii_digit())
        && lexeme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Cursor over a token sequence.
///
/// Implementors provide raw access and stepping; classification and the typed accessors are
/// shared. Every accessor classifies the current token again, the kind is never cached.
pub trait TokenStream {
    /// True while there is a token after the current one.
    fn has_more_tokens(&self) -> bool;

    /// Steps to the next token. Fails on the last token.
    fn advance(&mut self) -> Result<()>;

    /// Steps back one token. Fails on the first token.
    fn retreat(&mut self) -> Result<()>;

    /// Index of the current token.
    fn position(&self) -> usize;

    /// Raw text of the current token, `None` for an empty sequence.
    fn current(&self) -> Option<&str>;

    /// Raw text of the token after the current one. Never moves the cursor.
    fn peek(&self) -> Option<&str>;

    fn lexeme(&self) -> Result<&str> {
        self.current().ok_or(TokenError::EndOfStream)
    }

    fn token_kind(&self) -> Result<TokenKind> {
        classify(self.lexeme()?)
    }

    fn keyword(&self) -> Result<Keyword> {
        let lexeme = self.expect_kind(TokenKind::Keyword)?;
        Keyword::from_lexeme(lexeme).ok_or_else(|| TokenError::Unrecognized(lexeme.to_string()))
    }

    fn symbol(&self) -> Result<char> {
        let lexeme = self.expect_kind(TokenKind::Symbol)?;
        lexeme
            .chars()
            .next()
            .ok_or_else(|| TokenError::Unrecognized(lexeme.to_string()))
    }

    fn int_val(&self) -> Result<u16> {
        int_value(self.expect_kind(TokenKind::IntegerConstant)?)
    }

    fn string_val(&self) -> Result<&str> {
        let lexeme = self.expect_kind(TokenKind::StringConstant)?;
        Ok(&lexeme[1..lexeme.len() - 1])
    }

    fn identifier(&self) -> Result<&str> {
        self.expect_kind(TokenKind::Identifier)
    }

    fn expect_kind(&self, expected: TokenKind) -> Result<&str> {
        let lexeme = self.lexeme()?;
        let found = classify(lexeme)?;
        if found != expected {
            return Err(TokenError::KindMismatch {
                expected,
                found,
                lexeme: lexeme.to_string(),
            });
        }
        Ok(lexeme)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tokens {
    tokens: Vec<String>,
    index: usize,
}

impl Tokens {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Tokens {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl TokenStream for Tokens {
    fn has_more_tokens(&self) -> bool {
        self.index + 1 < self.tokens.len()
    }

    fn advance(&mut self) -> Result<()> {
        if !self.has_more_tokens() {
            return Err(TokenError::EndOfStream);
        }
        self.index += 1;
        Ok(())
    }

    fn retreat(&mut self) -> Result<()> {
        if self.index == 0 {
            return Err(TokenError::BeforeStart);
        }
        self.index -= 1;
        Ok(())
    }

    fn position(&self) -> usize {
        self.index
    }

    fn current(&self) -> Option<&str> {
        self.tokens.get(self.index).map(String::as_str)
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.index + 1).map(String::as_str)
    }
}
