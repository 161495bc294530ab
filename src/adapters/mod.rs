//! Adapter implementations of the port traits.
//!
//! - `live`: real disk, network and terminal.
//! - `recording` / `replaying`: cassette capture and playback of LLM traffic.
//! - `policy`: non-interactive confirmers.
//! - `memory`: in-memory filesystem.

pub mod live;
pub mod memory;
pub mod policy;
pub mod recording;
pub mod replaying;
