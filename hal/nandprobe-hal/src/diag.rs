//! Diagnostic output
//!
//! Bring-up reports what it discovered one line at a time. A sink that
//! cannot deliver a line drops it; logging is never an error.

/// Line-oriented diagnostic sink
pub trait DiagnosticSink {
    /// Emit one line (without trailing newline)
    fn log(&mut self, line: &str);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn log(&mut self, line: &str) {
        (**self).log(line)
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn log(&mut self, _line: &str) {}
}
