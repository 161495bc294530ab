//! Interactive terminal confirmer.

use std::io::{BufRead, Write};
use std::sync::Mutex;

use crate::engine::diff;
use crate::ports::confirm::Confirmer;

/// Asks on a writer and reads the answer from a reader.
///
/// The first line of a message is the question; any further lines are a
/// diff, printed in colour above it. Generic over the streams so the
/// prompt/answer cycle can be exercised with in-memory buffers;
/// [`TerminalConfirmer::stdio`] wires stdin/stdout.
pub struct TerminalConfirmer<R: BufRead + Send, W: Write + Send> {
    io: Mutex<(R, W)>,
}

impl<R: BufRead + Send, W: Write + Send> TerminalConfirmer<R, W> {
    /// Creates a confirmer over the given streams.
    pub fn new(reader: R, writer: W) -> Self {
        Self { io: Mutex::new((reader, writer)) }
    }
}

impl TerminalConfirmer<std::io::BufReader<std::io::Stdin>, std::io::Stdout> {
    /// Confirmer bound to the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead + Send, W: Write + Send> Confirmer for TerminalConfirmer<R, W> {
    fn confirm(&self, message: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut guard = self.io.lock().map_err(|e| format!("confirmer lock poisoned: {e}"))?;
        let (reader, writer) = &mut *guard;

        let mut lines = message.lines();
        let question = lines.next().unwrap_or_default();
        for detail in lines {
            writeln!(writer, "{}", diff::paint(detail))?;
        }
        write!(writer, "{question} [y/N] ")?;
        writer.flush()?;

        let mut line = String::new();
        // EOF reads zero bytes and falls through to refusal.
        reader.read_line(&mut line)?;
        let answer = line.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
