use tracing::debug;

use crate::frontend::parser::ParseError;

/// Where the parser sends a failure, once, at the point it is detected.
pub trait DiagnosticSink {
    fn report(&mut self, error: &ParseError);
}

/// Prints `Error: <message>` to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&mut self, error: &ParseError) {
        debug!(%error, "parse error");
        eprintln!("Error: {error}");
    }
}

// Collects the diagnostics, for batch runs that report at the end.
impl DiagnosticSink for Vec<ParseError> {
    fn report(&mut self, error: &ParseError) {
        debug!(%error, "parse error");
        self.push(error.clone());
    }
}

impl<D: DiagnosticSink + ?Sized> DiagnosticSink for &mut D {
    fn report(&mut self, error: &ParseError) {
        (**self).report(error)
    }
}
