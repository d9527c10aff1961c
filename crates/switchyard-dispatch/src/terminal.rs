//! Terminal abstraction, the one dependency every generated program provides.

use std::io::{self, Write};

/// Line-oriented access to the process terminal.
///
/// Behaviors that declare a `Terminal` dependency receive the generated
/// program's terminal accessor instead of a registered service.
pub trait Terminal: Send + Sync {
    /// Writes a line to standard output.
    fn write_line(&self, line: &str) -> io::Result<()>;

    /// Writes a line to standard error.
    fn write_error_line(&self, line: &str) -> io::Result<()>;
}

/// [`Terminal`] backed by the process's stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdTerminal;

impl Terminal for StdTerminal {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", line)
    }

    fn write_error_line(&self, line: &str) -> io::Result<()> {
        let mut err = io::stderr().lock();
        writeln!(err, "{}", line)
    }
}
