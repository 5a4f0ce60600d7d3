mod batch;
mod cli;
mod frontend;
mod repl;

use std::fs::{self, File};
use std::io;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;

use crate::cli::Cli;

pub fn init_subscriber(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_subscriber(cli.log_level.into())?;

    let mut stdout = io::stdout().lock();

    match (&cli.file, cli.tokens) {
        (Some(path), true) => {
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            repl::token_driver(io::BufReader::new(file), &mut stdout)?;
        }

        (None, true) => repl::token_driver(io::stdin().lock(), &mut stdout)?,

        (Some(path), false) => {
            let src = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;

            let program = batch::parse_program(&src, &cli.binops);
            batch::print_program(&program, &mut stdout, cli.inspect_tree)?;

            for error in &program.errors {
                eprintln!("Error: {error}");
            }
            if !program.errors.is_empty() {
                bail!("{}: {} parse error(s)", path.display(), program.errors.len());
            }
        }

        (None, false) => {
            let failures =
                repl::ast_parser_driver(io::stdin().lock(), &mut stdout, &cli.binops, cli.inspect_tree)?;
            tracing::info!(failures, "end of input");
        }
    }

    Ok(())
}
