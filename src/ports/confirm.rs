//! Confirmation port: the yes/no checkpoint guarding destructive writes.

/// Answers yes/no questions before a file is overwritten.
///
/// Production wires an interactive terminal; tests and pipelines wire a
/// policy object so nothing ever blocks waiting for a human.
pub trait Confirmer: Send + Sync {
    /// Asks whether the action described by `message` may proceed.
    ///
    /// # Errors
    ///
    /// Returns an error if no answer can be obtained (I/O failure, or a
    /// policy that forbids prompting). Callers must treat an error as refusal.
    fn confirm(&self, message: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
