pub mod probe;
pub mod servers;

use crate::proxy::mappers::response::{decode, DEFAULT_FIELD_SEPARATOR};
use std::io::Read;

pub fn decode_stdin(separator: Option<&str>) -> Result<String, String> {
    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .map_err(|e| format!("failed_to_read_stdin: {}", e))?;
    // Shells append a trailing newline the upstream never sends.
    let body = body.strip_suffix('\n').unwrap_or(&body);
    let decoded = decode(body, separator.unwrap_or(DEFAULT_FIELD_SEPARATOR));
    serde_json::to_string_pretty(&decoded).map_err(|e| format!("failed_to_serialize: {}", e))
}
