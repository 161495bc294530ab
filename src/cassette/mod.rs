//! Cassette format for recording and replaying LLM exchanges.
//!
//! `FORGEPLAN_RECORD=<file>` captures every completion of a run;
//! `FORGEPLAN_REPLAY=<file>` serves them back without network access.

pub mod format;
pub mod recorder;
pub mod replayer;
