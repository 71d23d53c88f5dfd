// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Date coercion for the `date` type tag

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::value::Value;

const NAIVE_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Coerce a raw value into a point in time.
///
/// Numbers are epoch milliseconds. Strings without an offset are read as UTC.
/// Returns `None` for falsy input and for anything that does not parse.
pub fn to_date(value: &Value) -> Option<DateTime<Utc>> {
    if !value.is_truthy() {
        return None;
    }

    match value {
        Value::Date(date) => Some(*date),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_iso_string_matches_direct_parse() {
        let raw = "1970-12-31T23:59:59.999Z";
        let expected = DateTime::parse_from_rfc3339(raw).unwrap().timestamp_millis();
        let date = to_date(&Value::from(raw)).unwrap();
        assert_eq!(date.timestamp_millis(), expected);
    }

    #[rstest]
    #[case("2024-02-29", 1_709_164_800_000)]
    #[case("2024-02-29T12:30:00", 1_709_209_800_000)]
    #[case("2024-02-29T12:30:00+02:00", 1_709_202_600_000)]
    fn test_string_formats(#[case] raw: &str, #[case] millis: i64) {
        assert_eq!(to_date(&Value::from(raw)).unwrap().timestamp_millis(), millis);
    }

    #[test]
    fn test_epoch_millis() {
        let date = to_date(&Value::from(86_400_000_i64)).unwrap();
        assert_eq!(date.timestamp_millis(), 86_400_000);
    }

    #[rstest]
    #[case(Value::Null)]
    #[case(Value::from(""))]
    #[case(Value::from("not a date"))]
    #[case(Value::from(true))]
    #[case(Value::Array(vec![]))]
    fn test_failures_are_absent(#[case] raw: Value) {
        assert!(to_date(&raw).is_none());
    }
}
