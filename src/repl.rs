use std::io::{self, Read, Write};

use tracing::debug;

use crate::batch::write_item;
use crate::frontend::{
    lexer::{Lexer, Token},
    parser::Parser,
};

// Two drivers here. One only runs the lexer and prints the code of every
// token, the other runs the whole frontend and reports what it parsed.
// Both stop at end of input, and fail if reading the input failed.

pub fn token_driver<R: Read, W: Write>(input: R, out: &mut W) -> io::Result<()> {
    let mut lexer = Lexer::from_reader(input);

    loop {
        let token = lexer.next_token();
        writeln!(out, "{}\t{}", token.code(), token)?;

        if token == Token::EndOfInput {
            break;
        }
    }

    match lexer.into_source().take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Prompts on stderr, reports on `out`. Diagnostics go to stderr through the
/// parser's sink. Returns the number of items that failed to parse.
pub fn ast_parser_driver<R: Read, W: Write>(
    input: R,
    out: &mut W,
    binops: &[(char, i32)],
    inspect_tree: bool,
) -> io::Result<usize> {
    prompt();

    let mut parser = Parser::new(Lexer::from_reader(input));
    for &(op, prec) in binops {
        parser.install_binop(op, prec);
    }

    let mut failures = 0;

    while let Some(result) = parser.parse_item() {
        match result {
            Ok(item) => {
                debug!(%item, "parsed item");
                write_item(&item, out, inspect_tree)?;
            }
            Err(_) => {
                failures += 1;
                // Skip token for error recovery.
                parser.advance();
            }
        }

        prompt();
    }

    out.flush()?;

    match parser.into_lexer().into_source().take_error() {
        Some(err) => Err(err),
        None => Ok(failures),
    }
}

fn prompt() {
    eprint!("ready> ");
    let _ = io::stderr().flush();
}
