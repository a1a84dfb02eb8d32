//! Reading and writing store timestamps.
//!
//! Stores write RFC 3339 strings; older records may carry epoch milliseconds.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

pub fn parse(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

pub fn to_value(dt: &DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse(&json!("2026-03-20T16:00:00+01:00")).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 3, 20, 15, 0, 0).unwrap());
    }

    #[test]
    fn parses_epoch_millis() {
        let dt = parse(&json!(1_774_018_800_000_i64)).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_774_018_800_000);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse(&json!("yesterday")).is_none());
        assert!(parse(&json!(true)).is_none());
        assert!(parse(&Value::Null).is_none());
    }

    #[test]
    fn written_values_parse_back() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 20, 15, 0, 0).unwrap();
        assert_eq!(parse(&to_value(&dt)), Some(dt));
    }
}
