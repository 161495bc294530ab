//! Non-interactive `Confirmer` policies.
//!
//! These replace the terminal whenever nobody is there to answer: `--yes`
//! runs, CI pipelines, and tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ports::confirm::Confirmer;

/// Approves every question without asking.
pub struct AlwaysApprove;

impl Confirmer for AlwaysApprove {
    fn confirm(&self, _message: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(true)
    }
}

/// Refuses every question without asking.
pub struct AlwaysRefuse;

impl Confirmer for AlwaysRefuse {
    fn confirm(&self, _message: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(false)
    }
}

/// Fails whenever a question is asked.
///
/// Used for non-interactive runs where silently approving or refusing would
/// both be wrong: the affected file is reported as an error instead.
pub struct FailIfPrompted;

impl Confirmer for FailIfPrompted {
    fn confirm(&self, message: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let first_line = message.lines().next().unwrap_or_default();
        Err(format!("confirmation required in non-interactive mode: {first_line}").into())
    }
}

/// Answers from a fixed script and remembers every question asked.
///
/// Once the script runs out every further question is refused.
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    /// Creates a confirmer that replies with `answers` in order.
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far, oldest first.
    #[must_use]
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Number of questions asked so far.
    #[must_use]
    pub fn prompts(&self) -> usize {
        self.asked.lock().map(|a| a.len()).unwrap_or_default()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, message: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        self.asked
            .lock()
            .map_err(|e| format!("confirmer lock poisoned: {e}"))?
            .push(message.to_string());
        let mut answers =
            self.answers.lock().map_err(|e| format!("confirmer lock poisoned: {e}"))?;
        Ok(answers.pop_front().unwrap_or(false))
    }
}
