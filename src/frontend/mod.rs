pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
