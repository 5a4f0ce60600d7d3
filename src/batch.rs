use std::io::{self, Write};

use tracing::debug;

use crate::frontend::{
    ast::Item,
    lexer::Lex,
    parser::{ParseError, Parser},
};

/// Everything a whole source file parsed into.
#[derive(Debug, Default)]
pub struct Program {
    pub items: Vec<Item>,
    pub errors: Vec<ParseError>,
}

/// Parses every top-level item of `src`, collecting diagnostics instead of
/// printing them. A failed item is skipped one token at a time.
pub fn parse_program(src: &str, binops: &[(char, i32)]) -> Program {
    let mut parser = Parser::with_diagnostics(src.lex(), Vec::<ParseError>::new());
    for &(op, prec) in binops {
        parser.install_binop(op, prec);
    }

    let mut items = vec![];

    while let Some(result) = parser.parse_item() {
        match result {
            Ok(item) => {
                debug!(%item, "parsed item");
                items.push(item);
            }
            // Skip token for error recovery.
            Err(_) => {
                parser.advance();
            }
        }
    }

    Program {
        items,
        errors: parser.into_diagnostics(),
    }
}

pub fn print_program<W: Write>(program: &Program, out: &mut W, inspect_tree: bool) -> io::Result<()> {
    for item in &program.items {
        write_item(item, out, inspect_tree)?;
    }

    Ok(())
}

/// `Parsed <kind>.`, followed by the tree when asked for.
pub fn write_item<W: Write>(item: &Item, out: &mut W, inspect_tree: bool) -> io::Result<()> {
    let what = match item {
        Item::Definition(_) => "a function definition",
        Item::Extern(_) => "an extern",
        Item::Expression(_) => "a top-level expression",
    };
    writeln!(out, "Parsed {what}.")?;

    if inspect_tree {
        writeln!(out, "{item}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{
        ast::{Expr, Function, Prototype},
        lexer::{Location, Token},
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn parsing_a_file() {
        let src = indoc! {"
            # Compute the x'th fibonacci number.
            def fib(x)
              fib(x - 1) + fib(x - 2)

            extern putchard(c);
            fib(40)
        "};

        let program = parse_program(src, &[]);

        assert!(program.errors.is_empty());
        assert_eq!(program.items.len(), 3);
        assert_eq!(
            program.items[1],
            Item::Extern(Prototype::new("putchard", vec!["c".to_string()]))
        );

        let mut out = Vec::new();
        print_program(&program, &mut out, true).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            indoc! {"
                Parsed a function definition.
                (def (proto fib x) (+ (call fib (- x 1)) (call fib (- x 2))))
                Parsed an extern.
                (extern (proto putchard c))
                Parsed a top-level expression.
                (def (proto __anon_expr) (call fib 40))
            "}
        );
    }

    #[test]
    fn errors_are_collected_and_parsing_continues() {
        let src = indoc! {"
            foo(1;
            extern 3(x);
            bar
        "};

        let program = parse_program(src, &[]);

        assert_eq!(
            program.errors,
            vec![
                ParseError::ExpectedArgumentDelimiter {
                    found: Token::Char(';'),
                    location: Location { line: 1, column: 6 },
                },
                ParseError::ExpectedFunctionName {
                    found: Token::Number(3.0),
                    location: Location { line: 2, column: 8 },
                },
            ]
        );
        assert_eq!(
            program.items.last(),
            Some(&Item::Expression(Function::new(
                Prototype::new("__anon_expr", vec![]),
                Expr::Variable("bar".to_string())
            )))
        );
    }

    #[test]
    fn extra_binops_apply() {
        let program = parse_program("a % b", &[('%', 40)]);

        assert_eq!(
            program.items,
            vec![Item::Expression(Function::new(
                Prototype::new("__anon_expr", vec![]),
                Expr::binary('%', Expr::Variable("a".to_string()), Expr::Variable("b".to_string()))
            ))]
        );
    }
}
