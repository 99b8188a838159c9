use crate::compiler::{CompileError, Compiler, Result};
use crate::declarations::Declarations;
use crate::tokens::{Keyword, TokenStream};

const STATEMENT_KEYWORDS: [Keyword; 5] = [
    Keyword::Let,
    Keyword::If,
    Keyword::While,
    Keyword::Do,
    Keyword::Return,
];

impl<T: TokenStream, D: Declarations> Compiler<T, D> {
    /// statements: statement*
    ///
    /// Stops at the first token that does not start a statement, normally the closing '}'.
    pub fn parse_statements(&mut self) -> Result<()> {
        while let Some(keyword) = self.check_keyword(&STATEMENT_KEYWORDS)? {
            match keyword {
                Keyword::Let => self.parse_let()?,
                Keyword::If => self.parse_if()?,
                Keyword::While => self.parse_while()?,
                Keyword::Do => self.parse_do()?,
                Keyword::Return => self.parse_return()?,
                _ => unreachable!("not a statement keyword"),
            }
        }
        Ok(())
    }

    /// letStatement: 'let' varName ('[' expression ']')? '=' expression ';'
    pub fn parse_let(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Let])?;
        self.expect_variable()?;
        if self.check_symbol('[')? {
            self.subscript()?;
        }
        self.expect_symbol('=')?;
        self.parse_expression()?;
        self.expect_symbol(';')
    }

    /// ifStatement: 'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?
    pub fn parse_if(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::If])?;
        self.condition()?;
        self.block()?;
        if self.check_keyword(&[Keyword::Else])?.is_some() {
            self.expect_keyword(&[Keyword::Else])?;
            self.block()?;
        }
        Ok(())
    }

    /// whileStatement: 'while' '(' expression ')' '{' statements '}'
    pub fn parse_while(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::While])?;
        self.condition()?;
        self.block()
    }

    /// doStatement: 'do' subroutineCall ';'
    pub fn parse_do(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Do])?;
        self.parse_subroutine_call()?;
        self.expect_symbol(';')
    }

    /// returnStatement: 'return' expression? ';'
    pub fn parse_return(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Return])?;
        if self.is_term()? {
            self.parse_expression()?;
        }
        self.expect_symbol(';')
    }

    fn condition(&mut self) -> Result<()> {
        self.expect_symbol('(')?;
        self.parse_expression()?;
        self.expect_symbol(')')
    }

    fn block(&mut self) -> Result<()> {
        self.expect_symbol('{')?;
        self.nested(Self::parse_statements)?;
        self.expect_symbol('}')
    }

    /// Consumes a variable name that must already be declared as a local or a class variable.
    pub(super) fn expect_variable(&mut self) -> Result<String> {
        let name = self.stream()?.identifier()?.to_string();
        if !self.is_variable(&name) {
            return Err(CompileError::UndefinedVariable(name));
        }
        self.emit_current()?;
        self.step()?;
        Ok(name)
    }

    pub(super) fn is_variable(&self, name: &str) -> bool {
        self.subroutine_vars.is_declared(name) || self.class_vars.is_declared(name)
    }

    /// '[' expression ']'
    pub(super) fn subscript(&mut self) -> Result<()> {
        self.expect_symbol('[')?;
        self.parse_expression()?;
        self.expect_symbol(']')
    }
}
