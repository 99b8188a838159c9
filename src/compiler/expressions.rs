use crate::compiler::{CompileError, Compiler, Result};
use crate::declarations::Declarations;
use crate::tokens::{Keyword, TokenKind, TokenStream};

const OPS: [char; 9] = ['+', '-', '*', '/', '&', '|', '<', '>', '='];
const UNARY_OPS: [char; 2] = ['-', '~'];
const KEYWORD_CONSTANTS: [Keyword; 4] = [Keyword::True, Keyword::False, Keyword::Null, Keyword::This];

impl<T: TokenStream, D: Declarations> Compiler<T, D> {
    /// expression: term (op term)*
    ///
    /// All binary operators share one precedence and group left to right.
    pub fn parse_expression(&mut self) -> Result<()> {
        if !self.is_term()? {
            return Err(CompileError::unexpected("expression", self.lexeme()?));
        }
        self.parse_term()?;
        while self.check_any_symbol(&OPS)? {
            self.emit_current()?;
            self.step()?;
            self.parse_term()?;
        }
        Ok(())
    }

    /// expressionList: (expression (',' expression)*)?
    pub fn parse_expression_list(&mut self) -> Result<()> {
        if !self.is_term()? {
            return Ok(());
        }
        self.parse_expression()?;
        while self.check_symbol(',')? {
            self.expect_symbol(',')?;
            self.parse_expression()?;
        }
        Ok(())
    }

    /// term: integerConstant | stringConstant | keywordConstant | varName | varName '[' expression
    /// ']' | subroutineCall | '(' expression ')' | unaryOp term
    pub fn parse_term(&mut self) -> Result<()> {
        if !self.is_term()? {
            return Err(CompileError::unexpected("term", self.lexeme()?));
        }
        self.nested(Self::term)
    }

    fn term(&mut self) -> Result<()> {
        match self.stream()?.token_kind()? {
            TokenKind::IntegerConstant | TokenKind::StringConstant | TokenKind::Keyword => {
                self.emit_current()?;
                self.step()
            }
            TokenKind::Identifier if self.is_call_start()? => self.parse_subroutine_call(),
            TokenKind::Identifier => {
                self.expect_variable()?;
                if self.check_symbol('[')? {
                    self.subscript()?;
                }
                Ok(())
            }
            TokenKind::Symbol if self.check_symbol('(')? => {
                self.expect_symbol('(')?;
                self.parse_expression()?;
                self.expect_symbol(')')
            }
            TokenKind::Symbol => {
                // is_term() only lets unary operators through here.
                self.emit_current()?;
                self.step()?;
                self.parse_term()
            }
        }
    }

    /// Whether the current token can start a term. Keywords other than the four constants can't.
    pub fn is_term(&self) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        Ok(match self.tokens.token_kind()? {
            TokenKind::IntegerConstant | TokenKind::StringConstant | TokenKind::Identifier => true,
            TokenKind::Keyword => self.check_keyword(&KEYWORD_CONSTANTS)?.is_some(),
            TokenKind::Symbol => self.check_symbol('(')? || self.check_any_symbol(&UNARY_OPS)?,
        })
    }

    /// The current identifier names a known subroutine, or a known class, class variable or local
    /// that is immediately followed by '.'.
    ///
    /// The following token is only peeked at, the cursor stays where it is.
    pub fn is_subroutine_call(&self) -> Result<bool> {
        if !self.check_kind(TokenKind::Identifier)? {
            return Ok(false);
        }
        let name = self.tokens.identifier()?;
        if self.subroutine_names.is_declared(name) {
            return Ok(true);
        }
        let known = self.class_names.is_declared(name)
            || self.class_vars.is_declared(name)
            || self.subroutine_vars.is_declared(name);
        Ok(known && self.tokens.peek() == Some("."))
    }

    /// An identifier starts a call when it is a known call target or is directly followed by '('
    /// or '.'. The second rule admits subroutines declared further down and other classes.
    fn is_call_start(&self) -> Result<bool> {
        if self.is_subroutine_call()? {
            return Ok(true);
        }
        Ok(self.check_kind(TokenKind::Identifier)?
            && matches!(self.tokens.peek(), Some("(") | Some(".")))
    }

    /// subroutineCall: subroutineName '(' expressionList ')'
    ///   | (className | varName) '.' subroutineName '(' expressionList ')'
    pub fn parse_subroutine_call(&mut self) -> Result<()> {
        if !self.is_call_start()? {
            return Err(CompileError::unexpected("subroutine call", self.lexeme()?));
        }
        self.expect_identifier()?;
        if self.check_symbol('.')? {
            self.expect_symbol('.')?;
            self.expect_identifier()?;
        }
        self.expect_symbol('(')?;
        self.parse_expression_list()?;
        self.expect_symbol(')')
    }

    fn check_any_symbol(&self, symbols: &[char]) -> Result<bool> {
        Ok(self.check_kind(TokenKind::Symbol)? && symbols.contains(&self.tokens.symbol()?))
    }
}
