use super::*;
use crate::declarations::DeclarationError;
use crate::tokens::TokenError;

fn tokens(source: &str) -> Tokens {
    Tokens::new(scanner::scan(&[source]))
}

fn compile_str(source: &str) -> Result<Vec<String>> {
    compile(&[source])
}

fn parse(source: &str) -> (Compiler<Tokens>, Result<()>) {
    let mut compiler = Compiler::new(tokens(source));
    let result = compiler.parse_unit();
    (compiler, result)
}

/// Counts cursor movement so tests can tell whether lookahead stepped.
struct SpyStream {
    inner: Tokens,
    advances: usize,
    retreats: usize,
}

impl SpyStream {
    fn new(source: &str) -> Self {
        Self {
            inner: tokens(source),
            advances: 0,
            retreats: 0,
        }
    }
}

impl TokenStream for SpyStream {
    fn has_more_tokens(&self) -> bool {
        self.inner.has_more_tokens()
    }

    fn advance(&mut self) -> core::result::Result<(), TokenError> {
        self.advances += 1;
        self.inner.advance()
    }

    fn retreat(&mut self) -> core::result::Result<(), TokenError> {
        self.retreats += 1;
        self.inner.retreat()
    }

    fn position(&self) -> usize {
        self.inner.position()
    }

    fn current(&self) -> Option<&str> {
        self.inner.current()
    }

    fn peek(&self) -> Option<&str> {
        self.inner.peek()
    }
}

/// A table that forgets to forget.
#[derive(Default)]
struct NeverCleared(DeclarationTable);

impl Declarations for NeverCleared {
    fn add_declaration(&mut self, name: &str) -> core::result::Result<(), DeclarationError> {
        self.0.add_declaration(name)
    }

    fn is_declared(&self, name: &str) -> bool {
        self.0.is_declared(name)
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn clear(&mut self) {}
}

#[test]
fn minimal_class() {
    let (compiler, result) = parse("class Main { }");
    result.unwrap();
    assert_eq!(
        compiler.tagged_tokens(),
        [
            "<keyword> class </keyword>",
            "<identifier> Main </identifier>",
            "<symbol> { </symbol>",
            "<symbol> } </symbol>",
        ]
    );
    let class_names = compiler.declarations(Scope::ClassName);
    assert!(class_names.is_declared("Main"));
    assert_eq!(class_names.len(), 1);
    assert!(compiler.is_exhausted());
}

#[test]
fn let_with_declared_variable() {
    let mut compiler = Compiler::new(tokens("let variable_name = 1 ;"));
    compiler
        .declare(Scope::SubroutineVar, "variable_name")
        .unwrap();
    compiler.parse_let().unwrap();
    assert_eq!(
        compiler.tagged_tokens(),
        [
            "<keyword> let </keyword>",
            "<identifier> variable_name </identifier>",
            "<symbol> = </symbol>",
            "<integerConstant> 1 </integerConstant>",
            "<symbol> ; </symbol>",
        ]
    );
}

#[test]
fn let_with_undeclared_variable() {
    let mut compiler = Compiler::new(tokens("let variable_name = 1 ;"));
    let err = compiler.parse_let().unwrap_err();
    assert_eq!(
        err,
        CompileError::UndefinedVariable("variable_name".to_string())
    );
    assert_eq!(err.kind(), ErrorKind::Scope);
}

#[test]
fn subroutine_call_lookahead_does_not_move() {
    let mut compiler = Compiler::new(SpyStream::new("Output . printInt ( 1 )"));
    compiler.declare(Scope::ClassName, "Output").unwrap();

    assert!(compiler.is_subroutine_call().unwrap());
    assert_eq!(compiler.position(), 0);
    assert_eq!(compiler.tokens.advances, 0);
    assert_eq!(compiler.tokens.retreats, 0);
    assert!(compiler.tagged_tokens().is_empty());
}

#[test]
fn method_call_on_local_then_consumed() {
    let mut compiler = Compiler::new(SpyStream::new("variable_name . subroutine_name ( )"));
    compiler
        .declare(Scope::SubroutineVar, "variable_name")
        .unwrap();
    compiler
        .declare(Scope::SubroutineName, "subroutine_name")
        .unwrap();

    assert!(compiler.is_subroutine_call().unwrap());
    assert_eq!(compiler.position(), 0);
    assert_eq!(compiler.tokens.advances, 0);
    assert_eq!(compiler.tokens.retreats, 0);

    compiler.parse_subroutine_call().unwrap();
    assert!(compiler.is_exhausted());
    assert_eq!(compiler.position(), 4);
    assert_eq!(compiler.tagged_tokens().len(), 5);
    assert_eq!(
        compiler.tagged_tokens()[2],
        "<identifier> subroutine_name </identifier>"
    );
}

#[test]
fn subroutine_call_recognition() {
    // Known subroutine, no lookahead needed.
    let mut compiler = Compiler::new(tokens("draw ;"));
    compiler.declare(Scope::SubroutineName, "draw").unwrap();
    assert!(compiler.is_subroutine_call().unwrap());

    // Unknown name before '.'.
    let compiler = Compiler::new(tokens("Screen . clear"));
    assert!(!compiler.is_subroutine_call().unwrap());

    // Known variable, but indexed rather than called.
    let mut compiler = Compiler::new(tokens("a [ 0 ]"));
    compiler.declare(Scope::SubroutineVar, "a").unwrap();
    assert!(!compiler.is_subroutine_call().unwrap());

    // Not an identifier at all.
    let compiler = Compiler::new(tokens("( 1 )"));
    assert!(!compiler.is_subroutine_call().unwrap());
}

#[test]
fn full_class() {
    let source = "class Square { \
        field int x, y; static boolean visible; \
        constructor Square new(int ax, int ay) { let x = ax; let y = ay; return this; } \
        method void move(int dx) { var int i; var Array steps; \
          let i = 0; \
          while (i < dx) { let steps[i] = x + i; let i = i + 1; } \
          if (~visible) { do draw(); } else { let visible = false; } \
          do Output.printInt(steps[0]); \
          return; } \
        method void draw() { do Screen.drawRectangle(x, y, x + 10, y + 10); return; } \
        function int max(int a, int b) { if (a > b) { return a; } return b; } \
        }";
    let (compiler, result) = parse(source);
    result.unwrap();

    let tagged = compiler.tagged_tokens();
    assert_eq!(tagged.first().map(String::as_str), Some("<keyword> class </keyword>"));
    assert_eq!(tagged.last().map(String::as_str), Some("<symbol> } </symbol>"));
    assert!(tagged.contains(&"<keyword> while </keyword>".to_string()));
    assert!(tagged.contains(&"<keyword> else </keyword>".to_string()));
    assert!(tagged.contains(&"<identifier> drawRectangle </identifier>".to_string()));
    assert!(tagged.contains(&"<integerConstant> 10 </integerConstant>".to_string()));

    let class_vars = compiler.declarations(Scope::ClassVar);
    assert_eq!(class_vars.len(), 3);
    assert!(class_vars.is_declared("visible"));
    let subroutines = compiler.declarations(Scope::SubroutineName);
    assert_eq!(subroutines.len(), 4);
    assert!(subroutines.is_declared("max"));
    assert!(compiler.declarations(Scope::SubroutineVar).is_empty());
}

#[test]
fn string_and_keyword_constants() {
    let tagged = compile_str(
        "class A { function void f() { var String s; var boolean b; \
         let s = \"hello\"; let b = true; let s = null; return; } }",
    )
    .unwrap();
    assert!(tagged.contains(&"<stringConstant> hello </stringConstant>".to_string()));
    assert!(tagged.contains(&"<keyword> true </keyword>".to_string()));
    assert!(tagged.contains(&"<keyword> null </keyword>".to_string()));
}

#[test]
fn integer_value_is_normalized() {
    let tagged = compile_str("class A { function int f() { return 007; } }").unwrap();
    assert!(tagged.contains(&"<integerConstant> 7 </integerConstant>".to_string()));
}

#[test]
fn expression_shapes() {
    let mut compiler = Compiler::new(tokens("( 1 + 2 ) * - x"));
    compiler.declare(Scope::SubroutineVar, "x").unwrap();
    compiler.parse_expression().unwrap();
    assert_eq!(
        compiler.tagged_tokens(),
        [
            "<symbol> ( </symbol>",
            "<integerConstant> 1 </integerConstant>",
            "<symbol> + </symbol>",
            "<integerConstant> 2 </integerConstant>",
            "<symbol> ) </symbol>",
            "<symbol> * </symbol>",
            "<symbol> - </symbol>",
            "<identifier> x </identifier>",
        ]
    );
    assert!(compiler.is_exhausted());
}

#[test]
fn expression_list() {
    let mut compiler = Compiler::new(tokens("f ( 1 , a [ 2 ] , g ( ) ) ;"));
    compiler.declare(Scope::SubroutineVar, "a").unwrap();
    compiler.parse_subroutine_call().unwrap();
    assert_eq!(compiler.tagged_tokens().len(), 13);
    assert_eq!(compiler.current_lexeme(), Some(";"));
}

#[test]
fn empty_expression_list() {
    let mut compiler = Compiler::new(tokens(") ;"));
    compiler.parse_expression_list().unwrap();
    assert!(compiler.tagged_tokens().is_empty());
    assert_eq!(compiler.position(), 0);
}

#[test]
fn forward_and_external_calls() {
    compile_str(
        "class A { function void f() { do g(); do Sys.halt(); return; } \
         function void g() { return; } }",
    )
    .unwrap();
}

#[test]
fn locals_do_not_leak() {
    let err = compile_str(
        "class A { function void f() { var int x; return; } \
         function void g() { let x = 1; return; } }",
    )
    .unwrap_err();
    assert_eq!(err, CompileError::UndefinedVariable("x".to_string()));
}

#[test]
fn locals_reused_across_subroutines() {
    compile_str(
        "class A { function void f(int x) { var int y; return; } \
         function void g(int x) { var int y; return; } }",
    )
    .unwrap();
}

#[test]
fn fields_visible_in_methods() {
    compile_str("class A { field int x; method void f() { let x = x + 1; return; } }").unwrap();
}

#[test]
fn duplicate_field() {
    let err = compile_str("class A { field int x, x; }").unwrap_err();
    assert_eq!(
        err,
        CompileError::AlreadyDeclared {
            scope: Scope::ClassVar,
            name: "x".to_string()
        }
    );
    assert_eq!(err.kind(), ErrorKind::Scope);
}

#[test]
fn duplicate_subroutine() {
    let err = compile_str(
        "class A { function void f() { return; } function void f() { return; } }",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CompileError::AlreadyDeclared {
            scope: Scope::SubroutineName,
            ..
        }
    ));
}

#[test]
fn duplicate_local() {
    let err = compile_str("class A { function void f(int a) { var int a; return; } }").unwrap_err();
    assert!(matches!(
        err,
        CompileError::AlreadyDeclared {
            scope: Scope::SubroutineVar,
            ..
        }
    ));
}

#[test]
fn stale_locals() {
    let mut compiler = Compiler::with_declarations(
        tokens(
            "class A { function void f(int a) { return; } \
             function void g() { return; } }",
        ),
        NeverCleared::default(),
        NeverCleared::default(),
        NeverCleared::default(),
        NeverCleared::default(),
    );
    let err = compiler.parse_unit().unwrap_err();
    assert_eq!(err, CompileError::StaleLocals);
    assert_eq!(err.kind(), ErrorKind::Scope);
}

#[test]
fn trailing_tokens() {
    let err = compile_str("class A { } class B { }").unwrap_err();
    assert_eq!(err, CompileError::TrailingTokens("class".to_string()));
    assert_eq!(err.kind(), ErrorKind::Exhaustion);
}

#[test]
fn unexpected_end() {
    let (compiler, result) = parse("class A { field int x ;");
    assert_eq!(result.unwrap_err(), CompileError::UnexpectedEnd);
    assert!(compiler.is_exhausted());

    let err = compile_str("class A { function void f() { return").unwrap_err();
    assert_eq!(err, CompileError::UnexpectedEnd);
}

#[test]
fn empty_input() {
    let err = compile::<&str>(&[]).unwrap_err();
    assert_eq!(err, CompileError::Token(TokenError::EndOfStream));
    assert_eq!(err.kind(), ErrorKind::Exhaustion);
}

#[test]
fn missing_class_keyword() {
    let err = compile_str("function A { }").unwrap_err();
    assert_eq!(err, CompileError::unexpected("'class'", "function"));
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn missing_semicolon() {
    let err = compile_str("class A { function void f() { return } }").unwrap_err();
    assert_eq!(err, CompileError::unexpected("';'", "}"));
}

#[test]
fn keyword_is_not_a_term() {
    let err = compile_str("class A { field int x; method void f() { let x = class; return; } }")
        .unwrap_err();
    assert_eq!(err, CompileError::unexpected("expression", "class"));
}

#[test]
fn do_requires_a_call() {
    let err = compile_str("class A { field int x; method void f() { do x; return; } }")
        .unwrap_err();
    assert_eq!(err, CompileError::unexpected("subroutine call", "x"));
}

#[test]
fn lexical_errors_propagate() {
    let err = compile_str("class A { function int f() { return 1abc; } }").unwrap_err();
    assert_eq!(
        err,
        CompileError::Token(TokenError::LeadingDigit("1abc".to_string()))
    );
    assert_eq!(err.kind(), ErrorKind::Lexical);

    let err = compile_str("class A { function int f() { return 32768; } }").unwrap_err();
    assert_eq!(
        err,
        CompileError::Token(TokenError::IntegerOutOfRange("32768".to_string()))
    );

    let err = compile_str("class A { function int f() { return 32767; } }");
    assert!(err.is_ok());
}

#[test]
fn void_only_as_return_type() {
    let err = compile_str("class A { field void x; }").unwrap_err();
    assert_eq!(err, CompileError::unexpected("type", "void"));
}

fn deep_return(prefix: &str, depth: usize, suffix: &str) -> String {
    format!(
        "class Deep {{ function int f() {{ return {}1{}; }} }}",
        prefix.repeat(depth),
        suffix.repeat(depth)
    )
}

#[test]
fn deep_unary_chain_is_an_error() {
    let err = compile_str(&deep_return("- ", 10_000, "")).unwrap_err();
    assert_eq!(err, CompileError::TooDeep(MAX_NESTING));
    assert_eq!(err.kind(), ErrorKind::Exhaustion);
}

#[test]
fn deep_parentheses_are_an_error() {
    let err = compile_str(&deep_return("( ", 20_000, " )")).unwrap_err();
    assert_eq!(err, CompileError::TooDeep(MAX_NESTING));
}

#[test]
fn deep_blocks_are_an_error() {
    let source = format!(
        "class Deep {{ function void f() {{ {}return; {} }} }}",
        "while (true) { ".repeat(5_000),
        "} ".repeat(5_000)
    );
    let err = compile_str(&source).unwrap_err();
    assert_eq!(err, CompileError::TooDeep(MAX_NESTING));
}

#[test]
fn nesting_below_the_limit() {
    compile_str(&deep_return("- ", MAX_NESTING - 1, "")).unwrap();
    compile_str(&deep_return("( ", MAX_NESTING / 2 - 1, " )")).unwrap();
}

#[test]
fn nesting_depth_unwinds() {
    // Many shallow expressions in a row never add up to the limit.
    let body = "let x = (((x))); ".repeat(MAX_NESTING * 2);
    let source = format!("class A {{ field int x; method void f() {{ {body}return; }} }}");
    compile_str(&source).unwrap();
}
