pub mod core;
pub mod datasets;
pub mod layouts;
pub mod settings;
pub mod table;
pub mod views;

use crate::ipc::error::err;
use crate::ipc::types::Request;
use serde_json::Value;

/// Required non-empty string param, or a ready `bad_params` response.
pub(crate) fn required_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, Value> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(err(&req.id, "bad_params", format!("missing params.{}", key), None)),
    }
}
