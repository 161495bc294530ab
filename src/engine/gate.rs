//! The yes/no checkpoint every overwrite passes through.

use crate::ports::confirm::Confirmer;

/// A [`Confirmer`] plus the `force` override.
///
/// With `force` set the confirmer is never consulted and every question is
/// approved.
#[derive(Clone, Copy)]
pub struct Gate<'a> {
    confirmer: &'a dyn Confirmer,
    force: bool,
}

impl<'a> Gate<'a> {
    /// Gate asking `confirmer` unless `force` is set.
    #[must_use]
    pub fn new(confirmer: &'a dyn Confirmer, force: bool) -> Self {
        Self { confirmer, force }
    }

    /// Asks the question unless forced.
    ///
    /// # Errors
    ///
    /// Propagates the confirmer's failure; callers treat it as refusal.
    pub fn confirm(&self, message: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        if self.force {
            tracing::debug!("gate forced: {}", message.lines().next().unwrap_or_default());
            return Ok(true);
        }
        self.confirmer.confirm(message)
    }
}
