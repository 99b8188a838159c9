//! Recursive-descent compilation engine.
//!
//! [`Compiler`] walks a [`TokenStream`] one production at a time. While it descends it validates
//! the structure, records declarations in four [`Declarations`] tables and appends every consumed
//! token, tagged with its kind, to an output buffer. Nothing is recovered: the first error aborts
//! the unit.
//!
//! The productions are split over several files:
//! - this module: the unit, class variables, subroutines and token helpers,
//! - `statements`: `let`, `if`, `while`, `do` and `return`,
//! - `expressions`: expressions, terms and subroutine calls.

use tracing::{debug, trace, trace_span};

pub use error::{CompileError, ErrorKind};

use crate::declarations::{DeclarationTable, Declarations, Scope};
use crate::output;
use crate::scanner;
use crate::tokens::{Keyword, TokenKind, TokenStream, Tokens};

mod error;
mod expressions;
mod statements;
#[cfg(test)]
mod test;

type Result<T, E = CompileError> = core::result::Result<T, E>;

/// How deeply terms and statement blocks may nest before compilation gives up.
pub const MAX_NESTING: usize = 256;

/// Scans and parses one unit, returning the tagged tokens.
pub fn compile<L: AsRef<str>>(lines: &[L]) -> Result<Vec<String>> {
    let span = trace_span!("compile()");
    let _e = span.enter();
    let mut compiler = Compiler::new(Tokens::new(scanner::scan(lines)));
    compiler.parse_unit()?;
    Ok(compiler.into_tagged_tokens())
}

pub struct Compiler<T, D = DeclarationTable> {
    tokens: T,
    // Set once the last token has been consumed; the cursor itself never leaves the sequence.
    exhausted: bool,
    // Open terms and statement blocks.
    depth: usize,
    tagged: Vec<String>,

    class_names: D,
    class_vars: D,
    subroutine_names: D,
    subroutine_vars: D,
}

impl<T: TokenStream> Compiler<T> {
    pub fn new(tokens: T) -> Self {
        Self::with_declarations(
            tokens,
            DeclarationTable::new(),
            DeclarationTable::new(),
            DeclarationTable::new(),
            DeclarationTable::new(),
        )
    }
}

impl<T: TokenStream, D: Declarations> Compiler<T, D> {
    pub fn with_declarations(
        tokens: T,
        class_names: D,
        class_vars: D,
        subroutine_names: D,
        subroutine_vars: D,
    ) -> Self {
        Self {
            tokens,
            exhausted: false,
            depth: 0,
            tagged: Vec::new(),
            class_names,
            class_vars,
            subroutine_names,
            subroutine_vars,
        }
    }

    pub fn tagged_tokens(&self) -> &[String] {
        &self.tagged
    }

    pub fn into_tagged_tokens(self) -> Vec<String> {
        self.tagged
    }

    pub fn declarations(&self, scope: Scope) -> &D {
        match scope {
            Scope::ClassName => &self.class_names,
            Scope::ClassVar => &self.class_vars,
            Scope::SubroutineName => &self.subroutine_names,
            Scope::SubroutineVar => &self.subroutine_vars,
        }
    }

    fn declarations_mut(&mut self, scope: Scope) -> &mut D {
        match scope {
            Scope::ClassName => &mut self.class_names,
            Scope::ClassVar => &mut self.class_vars,
            Scope::SubroutineName => &mut self.subroutine_names,
            Scope::SubroutineVar => &mut self.subroutine_vars,
        }
    }

    pub fn declare(&mut self, scope: Scope, name: &str) -> Result<()> {
        debug!(%scope, name, "declare");
        self.declarations_mut(scope)
            .add_declaration(name)
            .map_err(|_| CompileError::AlreadyDeclared {
                scope,
                name: name.to_string(),
            })
    }

    /// Index of the current token.
    pub fn position(&self) -> usize {
        self.tokens.position()
    }

    /// True once the last token has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Raw text of the current token, if any.
    pub fn current_lexeme(&self) -> Option<&str> {
        self.tokens.current()
    }

    /// class: 'class' className '{' classVarDec* subroutineDec* '}'
    pub fn parse_unit(&mut self) -> Result<()> {
        let span = trace_span!("unit");
        let _e = span.enter();

        self.expect_keyword(&[Keyword::Class])?;
        self.declare_identifier(Scope::ClassName)?;
        self.expect_symbol('{')?;

        while self.check_keyword(&[Keyword::Static, Keyword::Field])?.is_some() {
            self.parse_field_group()?;
        }
        while self
            .check_keyword(&[Keyword::Constructor, Keyword::Function, Keyword::Method])?
            .is_some()
        {
            self.parse_subroutine()?;
        }

        // The closing brace is the last token, so it is emitted without stepping.
        if !self.check_symbol('}')? {
            return Err(CompileError::unexpected("'}'", self.lexeme()?));
        }
        self.emit_current()?;
        if self.tokens.has_more_tokens() {
            self.tokens.advance()?;
            return Err(CompileError::TrailingTokens(self.lexeme()?.to_string()));
        }
        self.exhausted = true;
        Ok(())
    }

    /// classVarDec: ('static' | 'field') type varName (',' varName)* ';'
    pub fn parse_field_group(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Static, Keyword::Field])?;
        self.parse_type()?;
        self.declared_identifier_list(Scope::ClassVar)?;
        self.expect_symbol(';')
    }

    /// subroutineDec: ('constructor' | 'function' | 'method') ('void' | type) subroutineName
    /// '(' parameterList ')' subroutineBody
    pub fn parse_subroutine(&mut self) -> Result<()> {
        if !self.subroutine_vars.is_empty() {
            return Err(CompileError::StaleLocals);
        }

        self.expect_keyword(&[Keyword::Constructor, Keyword::Function, Keyword::Method])?;
        if self.check_keyword(&[Keyword::Void])?.is_some() {
            self.emit_current()?;
            self.step()?;
        } else {
            self.parse_type()?;
        }
        let name = self.declare_identifier(Scope::SubroutineName)?;
        let span = trace_span!("subroutine", name = name.as_str());
        let _e = span.enter();

        self.expect_symbol('(')?;
        self.parse_parameter_list()?;
        self.expect_symbol(')')?;
        self.parse_body()?;

        self.subroutine_vars.clear();
        Ok(())
    }

    /// parameterList: ((type varName) (',' type varName)*)?
    pub fn parse_parameter_list(&mut self) -> Result<()> {
        if !self.is_type()? {
            return Ok(());
        }
        loop {
            self.parse_type()?;
            self.declare_identifier(Scope::SubroutineVar)?;
            if !self.check_symbol(',')? {
                return Ok(());
            }
            self.expect_symbol(',')?;
        }
    }

    /// subroutineBody: '{' varDec* statements '}'
    pub fn parse_body(&mut self) -> Result<()> {
        self.expect_symbol('{')?;
        while self.check_keyword(&[Keyword::Var])?.is_some() {
            self.parse_var_dec()?;
        }
        self.parse_statements()?;
        self.expect_symbol('}')
    }

    /// varDec: 'var' type varName (',' varName)* ';'
    pub fn parse_var_dec(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Var])?;
        self.parse_type()?;
        self.declared_identifier_list(Scope::SubroutineVar)?;
        self.expect_symbol(';')
    }

    /// type: 'int' | 'char' | 'boolean' | className
    fn parse_type(&mut self) -> Result<()> {
        if !self.is_type()? {
            return Err(CompileError::unexpected("type", self.lexeme()?));
        }
        self.emit_current()?;
        self.step()
    }

    fn is_type(&self) -> Result<bool> {
        if self.check_keyword(&[Keyword::Int, Keyword::Char, Keyword::Boolean])?.is_some() {
            return Ok(true);
        }
        self.check_kind(TokenKind::Identifier)
    }

    /// varName (',' varName)*, each name declared in `scope`.
    fn declared_identifier_list(&mut self, scope: Scope) -> Result<()> {
        loop {
            self.declare_identifier(scope)?;
            if !self.check_symbol(',')? {
                return Ok(());
            }
            self.expect_symbol(',')?;
        }
    }
}

// Token iteration
impl<T: TokenStream, D: Declarations> Compiler<T, D> {
    fn stream(&self) -> Result<&T> {
        if self.exhausted {
            return Err(CompileError::UnexpectedEnd);
        }
        Ok(&self.tokens)
    }

    fn lexeme(&self) -> Result<&str> {
        Ok(self.stream()?.lexeme()?)
    }

    /// Moves past the current token. Consuming the last token marks the stream exhausted instead
    /// of moving the cursor out of bounds.
    fn step(&mut self) -> Result<()> {
        if self.tokens.has_more_tokens() {
            self.tokens.advance()?;
        } else {
            self.exhausted = true;
        }
        Ok(())
    }

    fn check_kind(&self, kind: TokenKind) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        Ok(self.tokens.token_kind()? == kind)
    }

    fn check_symbol(&self, symbol: char) -> Result<bool> {
        Ok(self.check_kind(TokenKind::Symbol)? && self.tokens.symbol()? == symbol)
    }

    fn check_keyword(&self, keywords: &[Keyword]) -> Result<Option<Keyword>> {
        if !self.check_kind(TokenKind::Keyword)? {
            return Ok(None);
        }
        let keyword = self.tokens.keyword()?;
        Ok(keywords.contains(&keyword).then_some(keyword))
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<()> {
        if !self.check_symbol(symbol)? {
            return Err(CompileError::unexpected(
                format!("'{symbol}'"),
                self.lexeme()?,
            ));
        }
        self.emit_current()?;
        self.step()
    }

    fn expect_keyword(&mut self, keywords: &[Keyword]) -> Result<Keyword> {
        let Some(keyword) = self.check_keyword(keywords)? else {
            let expected = keywords
                .iter()
                .map(|k| format!("'{k}'"))
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(CompileError::unexpected(expected, self.lexeme()?));
        };
        self.emit_current()?;
        self.step()?;
        Ok(keyword)
    }

    fn expect_identifier(&mut self) -> Result<String> {
        let name = self.stream()?.identifier()?.to_string();
        self.emit_current()?;
        self.step()?;
        Ok(name)
    }

    /// Like `expect_identifier`, but records the name in `scope` before moving on, so a duplicate
    /// is reported at the name itself.
    fn declare_identifier(&mut self, scope: Scope) -> Result<String> {
        let name = self.stream()?.identifier()?.to_string();
        self.declare(scope, &name)?;
        self.emit_current()?;
        self.step()?;
        Ok(name)
    }

    /// Runs one nested production, failing instead of recursing past [`MAX_NESTING`].
    fn nested<R>(&mut self, production: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        if self.depth >= MAX_NESTING {
            return Err(CompileError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    /// Appends the current token to the output, tagged with the kind it has right now.
    fn emit_current(&mut self) -> Result<()> {
        let tokens = self.stream()?;
        let kind = tokens.token_kind()?;
        let tagged = match kind {
            TokenKind::IntegerConstant => output::tag(kind, &tokens.int_val()?.to_string()),
            TokenKind::StringConstant => output::tag(kind, tokens.string_val()?),
            _ => output::tag(kind, tokens.lexeme()?),
        };
        trace!("{tagged}");
        self.tagged.push(tagged);
        Ok(())
    }
}
