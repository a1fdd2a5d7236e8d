//! Model version tags.

/// Version tag reported when scoring falls back to the rule engine.
pub const RULE_MODEL_VERSION: &str = "rule-v0";

/// Prefix of trained model versions (`ml-1`, `ml-2`, ...).
pub const TRAINED_VERSION_PREFIX: &str = "ml-";

/// Next version in the trained sequence.
///
/// A missing or malformed prior version resets the sequence to `ml-1`.
#[must_use]
pub fn next_model_version(current: Option<&str>) -> String {
    let first = || format!("{TRAINED_VERSION_PREFIX}1");

    let Some(current) = current else {
        return first();
    };
    let Some(suffix) = current.strip_prefix(TRAINED_VERSION_PREFIX) else {
        return first();
    };
    match suffix.parse::<u64>() {
        Ok(index) => format!("{TRAINED_VERSION_PREFIX}{}", index + 1),
        Err(_) => first(),
    }
}
