//! Shared test utilities for the trustgate workspace.
//!
//! This crate exists because `xtask` needs `normalize_nondeterministic` at
//! runtime (not behind `#[cfg(test)]`), so a `#[cfg(test)]` module inside
//! `trustgate-types` would not suffice.

use serde_json::{Number, Value};

/// Decimal places kept by [`normalize_nondeterministic`] for fractional numbers.
pub const FLOAT_PLACES: i32 = 6;

/// Normalize non-deterministic JSON fields for golden-file comparison.
///
/// 1. **Root-only**: `tool.version` becomes `"__VERSION__"` when the root object looks like a
///    report envelope (`schema`, `tool`, `verdict`, `trust`, `gates`).
/// 2. **Recursive**: `started_at` and `finished_at` become `"__TIMESTAMP__"` at any depth.
///    `evaluated_at` is left alone; it is pinned with `--now`.
/// 3. **Recursive**: fractional numbers are rounded to [`FLOAT_PLACES`] so weighted sums
///    compare equal regardless of summation order.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_envelope = ["schema", "tool", "verdict", "trust", "gates"]
            .iter()
            .all(|k| obj.contains_key(*k));
        if is_envelope
            && let Some(tool) = obj.get_mut("tool")
            && let Some(tool_obj) = tool.as_object_mut()
            && tool_obj.contains_key("name")
            && tool_obj.contains_key("version")
        {
            tool_obj.insert(
                "version".to_string(),
                Value::String("__VERSION__".to_string()),
            );
        }
    }
    normalize_recursive(&mut value);
    value
}

fn normalize_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["started_at", "finished_at"] {
                if map.contains_key(key) {
                    map.insert(key.to_string(), Value::String("__TIMESTAMP__".to_string()));
                }
            }
            for val in map.values_mut() {
                normalize_recursive(val);
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                normalize_recursive(val);
            }
        }
        Value::Number(n) if n.is_f64() => {
            if let Some(rounded) = n.as_f64().map(round).and_then(Number::from_f64) {
                *n = rounded;
            }
        }
        _ => {}
    }
}

fn round(x: f64) -> f64 {
    let scale = 10f64.powi(FLOAT_PLACES);
    (x * scale).round() / scale
}
