//! Recording adapters that capture interactions to cassettes.

pub mod llm;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

/// Record a `Result<T, E>` interaction using the ok/err JSON convention.
///
/// Mirror of `replaying::decode_result`:
/// - `Ok(v)` is stored as `{"ok": v}`
/// - `Err(e)` is stored as `{"err": e}`
pub(crate) fn record_result<I, T, E>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    I: Serialize,
    T: Serialize,
    E: Serialize,
{
    let encode = |value: serde_json::Result<serde_json::Value>| {
        value.unwrap_or_else(|e| serde_json::json!({ "unserializable": e.to_string() }))
    };

    let input_json = encode(serde_json::to_value(input));
    let output_json = match result {
        Ok(v) => serde_json::json!({ "ok": encode(serde_json::to_value(v)) }),
        Err(e) => serde_json::json!({ "err": encode(serde_json::to_value(e)) }),
    };

    match recorder.lock() {
        Ok(mut guard) => guard.record(port, method, input_json, output_json),
        Err(e) => tracing::warn!("cassette recorder lock poisoned, dropping {port}::{method}: {e}"),
    }
}
