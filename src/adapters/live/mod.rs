//! Live adapters for real external interactions.

pub mod confirm;
pub mod filesystem;
pub mod llm;
