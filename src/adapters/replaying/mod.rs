//! Replaying adapters that serve recorded interactions.

pub mod llm;

pub use llm::ReplayingLlmClient;

use serde::de::DeserializeOwned;

/// Decode a recorded `{"ok": ..}` / `{"err": ..}` output.
///
/// Mirror of `recording::record_result`. A bare value without either key is
/// treated as a success payload so hand-written cassettes stay short.
pub(crate) fn decode_result<T, E>(output: &serde_json::Value) -> Result<Result<T, E>, String>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    if let Some(err) = output.get("err") {
        return serde_json::from_value(err.clone())
            .map(Err)
            .map_err(|e| format!("failed to decode recorded error: {e}"));
    }
    let value = output.get("ok").unwrap_or(output);
    serde_json::from_value(value.clone())
        .map(Ok)
        .map_err(|e| format!("failed to decode recorded output: {e}"))
}
