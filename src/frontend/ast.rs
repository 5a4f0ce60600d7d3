use std::fmt;

use itertools::Itertools;

// Enum dispatch, no trait objects: every consumer matches exhaustively.
// Children are boxed and owned by exactly one parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary {
        op: char,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn binary(op: char, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

// Prototype, name and parameter names of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub args: Vec<String>,
}

impl Prototype {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

// Function
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub proto: Prototype,
    pub body: Expr,
}

impl Function {
    pub fn new(proto: Prototype, body: Expr) -> Self {
        Self { proto, body }
    }
}

/// One top-level construct of a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Definition(Function),
    Extern(Prototype),
    Expression(Function),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{value}"),
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Binary { op, left, right } => write!(f, "({op} {left} {right})"),
            Expr::Call { callee, args } if args.is_empty() => write!(f, "(call {callee})"),
            Expr::Call { callee, args } => {
                write!(f, "(call {callee} {})", args.iter().join(" "))
            }
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "(proto {})", self.name)
        } else {
            write!(f, "(proto {} {})", self.name, self.args.iter().join(" "))
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(def {} {})", self.proto, self.body)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Definition(function) | Item::Expression(function) => write!(f, "{function}"),
            Item::Extern(proto) => write!(f, "(extern {proto})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    #[test]
    fn displaying_expressions() {
        let expr = Expr::binary(
            '+',
            var("x"),
            Expr::binary('*', Expr::Number(2.0), var("y")),
        );
        assert_eq!(expr.to_string(), "(+ x (* 2 y))");

        let call = Expr::Call {
            callee: "foo".to_string(),
            args: vec![Expr::Number(1.5), var("a")],
        };
        assert_eq!(call.to_string(), "(call foo 1.5 a)");

        let no_args = Expr::Call {
            callee: "rand".to_string(),
            args: vec![],
        };
        assert_eq!(no_args.to_string(), "(call rand)");
    }

    #[test]
    fn displaying_items() {
        let proto = Prototype::new("add", vec!["a".to_string(), "b".to_string()]);
        let function = Function::new(proto.clone(), Expr::binary('+', var("a"), var("b")));

        assert_eq!(
            Item::Definition(function).to_string(),
            "(def (proto add a b) (+ a b))"
        );
        assert_eq!(Item::Extern(proto).to_string(), "(extern (proto add a b))");
        assert_eq!(Prototype::new("nop", vec![]).to_string(), "(proto nop)");
    }
}
