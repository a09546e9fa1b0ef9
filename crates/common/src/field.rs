//! # Field Resolver
//!
//! Ekstraksi nilai dari payload upstream yang tidak konsisten.
//!
//! Upstream cluster mengekspos counter yang sama dengan nama field berbeda
//! antar deployment (`pendingCount` vs `pending` vs `batchQueueSize`).
//! Module ini menyediakan abstraksi "ordered list of accessors": daftar
//! kandidat key (atau dotted path) yang dicoba berurutan.
//!
//! ## Prinsip
//!
//! - Tidak pernah panic, tidak pernah menghasilkan NaN
//! - Ketiadaan data selalu direpresentasikan sebagai fallback / `None`
//! - `null` diperlakukan sama dengan key yang tidak ada

use serde_json::Value;

/// Ordered list of candidate keys. Each candidate may be a dotted path
/// (`"health.status"`) that walks nested objects.
pub type Candidates = &'static [&'static str];

static NULL: Value = Value::Null;

// ════════════════════════════════════════════════════════════════════════════
// LOOKUP
// ════════════════════════════════════════════════════════════════════════════

/// Walk a single candidate path. Returns `None` when any segment is missing,
/// when an intermediate value is not an object, or when the leaf is `null`.
pub fn lookup<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = obj;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Return the first candidate whose value is present and not `null`.
///
/// Non-object inputs always yield `None`.
pub fn pick<'a>(obj: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    if !obj.is_object() {
        return None;
    }
    candidates.iter().find_map(|path| lookup(obj, path))
}

/// Like [`pick`] but returns an owned value, or `fallback` when nothing matches.
pub fn pick_or(obj: &Value, candidates: &[&str], fallback: Value) -> Value {
    pick(obj, candidates).cloned().unwrap_or(fallback)
}

/// Picked value as an object reference, or `&Value::Null` when the candidate
/// is absent or not an object. Lookups on the result simply miss.
pub fn pick_object<'a>(obj: &'a Value, candidates: &[&str]) -> &'a Value {
    pick(obj, candidates).filter(|v| v.is_object()).unwrap_or(&NULL)
}

/// Picked value as a slice, empty when absent or not an array.
pub fn pick_array<'a>(obj: &'a Value, candidates: &[&str]) -> &'a [Value] {
    match pick(obj, candidates) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NUMERIC COERCION
// ════════════════════════════════════════════════════════════════════════════

/// Coerce a value to a finite number.
///
/// - JSON numbers are taken as-is
/// - strings are trimmed and parsed (empty string is not a number)
/// - booleans map to 1 / 0
/// - everything else, and any non-finite result, is `None`
pub fn to_opt_num(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Coerce to a finite number, else `fallback`.
pub fn to_num(value: Option<&Value>, fallback: f64) -> f64 {
    to_opt_num(value).unwrap_or(fallback)
}

/// Coerce to a non-negative integer counter. Negative, fractional-negative and
/// non-numeric inputs all resolve to 0; fractions are truncated.
pub fn to_count(value: Option<&Value>) -> u64 {
    count_from(to_opt_num(value))
}

/// Convert an optional finite number into a counter (absent → 0).
pub fn count_from(value: Option<f64>) -> u64 {
    match value {
        Some(n) if n.is_finite() && n > 0.0 => n as u64,
        _ => 0,
    }
}

pub fn pick_num(obj: &Value, candidates: &[&str], fallback: f64) -> f64 {
    to_num(pick(obj, candidates), fallback)
}

pub fn pick_opt_num(obj: &Value, candidates: &[&str]) -> Option<f64> {
    to_opt_num(pick(obj, candidates))
}

pub fn pick_count(obj: &Value, candidates: &[&str]) -> u64 {
    to_count(pick(obj, candidates))
}

// ════════════════════════════════════════════════════════════════════════════
// STRING / BOOL COERCION
// ════════════════════════════════════════════════════════════════════════════

/// Render a scalar as a string. Objects and arrays have no meaningful
/// scalar rendering and yield `None`.
pub fn to_opt_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn pick_str(obj: &Value, candidates: &[&str], fallback: &str) -> String {
    to_opt_string(pick(obj, candidates)).unwrap_or_else(|| fallback.to_string())
}

/// First candidate that holds a non-empty string. Used where upstream sends
/// `""` to mean "unknown".
pub fn pick_nonempty_str(obj: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|path| lookup(obj, path))
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()).map(str::to_string))
}

/// Truthiness in the loose sense upstream producers use: `false`, `0`, `""`
/// and `null` are false, everything else is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn pick_bool(obj: &Value, candidates: &[&str], fallback: bool) -> bool {
    pick(obj, candidates).map(truthy).unwrap_or(fallback)
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════
