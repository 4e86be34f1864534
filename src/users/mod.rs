//! The slice of the user account this service owns: the daily calorie target.

pub mod repo;

use serde_json::Value;

use crate::error::{AppError, AppResult};

pub use repo::{PgUserStore, UserStore};

pub const DEFAULT_DAILY_TARGET: i32 = 2000;
pub const MIN_DAILY_TARGET: i32 = 500;
pub const MAX_DAILY_TARGET: i32 = 10_000;

/// Accepts integers, whole-number floats (truncated) and numeric strings.
pub fn parse_target(raw: Option<&Value>) -> AppResult<i32> {
    let raw = raw
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::validation("Target is required"))?;
    let target = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AppError::validation("Invalid target value"))?;

    if !(i64::from(MIN_DAILY_TARGET)..=i64::from(MAX_DAILY_TARGET)).contains(&target) {
        return Err(AppError::validation("Target must be between 500 and 10,000"));
    }
    Ok(target as i32)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_target(Some(&json!(1800))).unwrap(), 1800);
        assert_eq!(parse_target(Some(&json!(1800.9))).unwrap(), 1800);
        assert_eq!(parse_target(Some(&json!(" 2500 "))).unwrap(), 2500);
        assert_eq!(parse_target(Some(&json!(500))).unwrap(), 500);
        assert_eq!(parse_target(Some(&json!(10_000))).unwrap(), 10_000);
    }

    #[test]
    fn distinguishes_missing_invalid_and_out_of_range() {
        let message = |v: Option<&Value>| parse_target(v).unwrap_err().to_string();
        assert_eq!(message(None), "Target is required");
        assert_eq!(message(Some(&Value::Null)), "Target is required");
        assert_eq!(message(Some(&json!("lots"))), "Invalid target value");
        assert_eq!(message(Some(&json!([2000]))), "Invalid target value");
        assert_eq!(message(Some(&json!(499))), "Target must be between 500 and 10,000");
        assert_eq!(message(Some(&json!(10_001))), "Target must be between 500 and 10,000");
    }
}
