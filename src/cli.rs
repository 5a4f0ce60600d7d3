use std::path::PathBuf;

use clap::{
    builder::{OsStr, PossibleValue},
    Parser, ValueEnum,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// A positional file containing Kaleidoscope code to parse, if not given, starts an interactive session instead
    pub file: Option<PathBuf>,

    /// Print the code of every token read instead of parsing
    #[arg(long)]
    pub tokens: bool,

    /// Print the AST of every parsed item
    #[arg(long)]
    pub inspect_tree: bool,

    /// Maximum level of log events written to stderr
    #[arg(long, value_enum, default_value = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Install or override a binary operator, written OP=PRECEDENCE (e.g. '^=60'), may be repeated
    #[arg(long = "binop", value_name = "OP=PREC", value_parser = parse_binop)]
    pub binops: Vec<(char, i32)>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl ValueEnum for LogLevel {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            LogLevel::Error => PossibleValue::new("error").help("Only errors"),
            LogLevel::Warn => PossibleValue::new("warn").help("Suspicious input, e.g. mangled numbers"),
            LogLevel::Info => PossibleValue::new("info"),
            LogLevel::Debug => PossibleValue::new("debug").help("Parsed items and diagnostics"),
            LogLevel::Trace => PossibleValue::new("trace").help("Every token and grammar rule"),
        })
    }
}

impl From<LogLevel> for OsStr {
    fn from(level: LogLevel) -> OsStr {
        match level {
            LogLevel::Error => "error".into(),
            LogLevel::Warn => "warn".into(),
            LogLevel::Info => "info".into(),
            LogLevel::Debug => "debug".into(),
            LogLevel::Trace => "trace".into(),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> tracing::Level {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// An operator has to lex as a single symbol token to ever be seen by the
// parser, so letters, digits and the grammar's own punctuation are refused.
fn parse_binop(arg: &str) -> Result<(char, i32), String> {
    let (op, prec) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected OP=PRECEDENCE, got `{arg}`"))?;

    let mut chars = op.chars();
    let op = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return Err(format!("operator must be a single character, got `{op}`")),
    };

    if op.is_alphanumeric() || op.is_whitespace() || "().,;#".contains(op) {
        return Err(format!("`{op}` cannot be used as a binary operator"));
    }

    let prec = prec
        .parse::<i32>()
        .map_err(|e| format!("invalid precedence `{prec}`: {e}"))?;

    if prec <= 0 {
        return Err(format!("precedence must be positive, got {prec}"));
    }

    Ok((op, prec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_arguments() {
        let cli = Cli::try_parse_from(["kaleidfront"]).unwrap();

        assert_eq!(cli.file, None);
        assert!(!cli.tokens);
        assert!(!cli.inspect_tree);
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert!(cli.binops.is_empty());
    }

    #[test]
    fn all_arguments() {
        let cli = Cli::try_parse_from([
            "kaleidfront",
            "prog.kal",
            "--tokens",
            "--inspect-tree",
            "--log-level",
            "trace",
            "--binop",
            "^=60",
            "--binop",
            "%=40",
        ])
        .unwrap();

        assert_eq!(cli.file, Some(PathBuf::from("prog.kal")));
        assert!(cli.tokens);
        assert!(cli.inspect_tree);
        assert_eq!(cli.log_level, LogLevel::Trace);
        assert_eq!(cli.binops, vec![('^', 60), ('%', 40)]);
    }

    #[test]
    fn rejecting_bad_binops() {
        assert_eq!(parse_binop("|=5"), Ok(('|', 5)));
        assert!(parse_binop("^").is_err());
        assert!(parse_binop("==5").is_ok());
        assert!(parse_binop("ab=5").is_err());
        assert!(parse_binop("x=5").is_err());
        assert!(parse_binop("(=5").is_err());
        assert!(parse_binop("^=0").is_err());
        assert!(parse_binop("^=high").is_err());
        assert!(Cli::try_parse_from(["kaleidfront", "--binop", "a=1"]).is_err());
    }

    #[test]
    fn log_level_maps_to_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }
}
