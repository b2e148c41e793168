use std::sync::LazyLock;

use regex::Regex;

/// Duration token: a whole number followed by a unit suffix, e.g. `24h` or `30m`.
const DURATION_PATTERN: &str = r"^(\d+)([A-Za-z]+)$";

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(DURATION_PATTERN).unwrap());

/// Normalizes a duration token to minutes. Only `h` and `m` are recognized; compound tokens are rejected.
pub fn parse_minutes(token: &str) -> Result<u64, String> {
    let token = token.trim();
    if token.is_empty() {
        return Err("duration is empty".to_string());
    }

    let caps = DURATION_RE.captures(token).ok_or_else(|| format!("'{}' is not a <number><unit> duration", token))?;
    let value: u64 = caps[1].parse().map_err(|e| format!("invalid duration value '{}': {}", &caps[1], e))?;

    let factor = match &caps[2] {
        "h" => 60,
        "m" => 1,
        unit => return Err(format!("unrecognized unit '{}' in duration '{}'", unit, token)),
    };

    value.checked_mul(factor).ok_or_else(|| format!("duration '{}' is too large", token))
}
