//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system (filesystem, LLM, the human at the terminal).
//! Implementations live in `src/adapters/`.

pub mod confirm;
pub mod filesystem;
pub mod llm;

pub use confirm::Confirmer;
pub use filesystem::FileSystem;
pub use llm::{
    CompletionFuture, CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, Role,
};
