use super::coerce::{
    number_text, parse_bool_text, parse_date, parse_int_text, scalar_text, to_bool,
    to_f64_lossy, to_i64,
};
use super::config::DatePart;
use chrono::Datelike;
use serde_json::Value;

/// Text a value contributes to free-text search.
///
/// Objects contribute their own string properties joined by a space, so a
/// column bound to `idApoderado` matches on the parent's name fields.
pub fn search_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => Some(
            map.values()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        other => scalar_text(other),
    }
}

/// `needle` must already be lower-cased.
pub fn matches_substring(value: Option<&Value>, needle: &str) -> bool {
    value
        .and_then(search_text)
        .map(|text| text.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// `"true"`/`"false"` compare against booleans; everything else compares as
/// text, or numerically when the record holds a number.
pub fn matches_equality(value: Option<&Value>, expected: &str) -> bool {
    let Some(value) = value else {
        return false;
    };
    let expected = expected.trim();
    match expected {
        "true" => return value == &Value::Bool(true),
        "false" => return value == &Value::Bool(false),
        _ => {}
    }
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => {
            if number_text(n) == expected {
                return true;
            }
            match (n.as_f64(), expected.parse::<f64>()) {
                (Some(a), Ok(b)) => a == b,
                _ => false,
            }
        }
        _ => false,
    }
}

pub fn matches_boolean(value: Option<&Value>, expected: &str) -> bool {
    let Some(expected) = parse_bool_text(expected) else {
        return false;
    };
    value.and_then(to_bool) == Some(expected)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub max_exclusive: bool,
}

impl Bucket {
    pub fn contains(&self, v: f64) -> bool {
        let above = self.min.map(|m| v >= m).unwrap_or(true);
        let below = match self.max {
            Some(m) if self.max_exclusive => v < m,
            Some(m) => v <= m,
            None => true,
        };
        above && below
    }
}

/// `"300-349"` is inclusive on both ends, `"500+"` has no upper bound and
/// `"<300"` stops strictly below.
pub fn parse_bucket(raw: &str) -> Option<Bucket> {
    let s = raw.trim();
    if let Some(lower) = s.strip_suffix('+') {
        let min = lower.trim().parse::<f64>().ok()?;
        return Some(Bucket {
            min: Some(min),
            max: None,
            max_exclusive: false,
        });
    }
    if let Some(upper) = s.strip_prefix('<') {
        let max = upper.trim().parse::<f64>().ok()?;
        return Some(Bucket {
            min: None,
            max: Some(max),
            max_exclusive: true,
        });
    }
    let (lo, hi) = s.split_once('-')?;
    let min = lo.trim().parse::<f64>().ok()?;
    let max = hi.trim().parse::<f64>().ok()?;
    Some(Bucket {
        min: Some(min),
        max: Some(max),
        max_exclusive: false,
    })
}

pub fn matches_range(value: Option<&Value>, bucket: &str) -> bool {
    match parse_bucket(bucket) {
        Some(b) => b.contains(to_f64_lossy(value)),
        None => false,
    }
}

pub fn matches_integer(value: Option<&Value>, expected: &str, part: Option<DatePart>) -> bool {
    let Some(expected) = parse_int_text(expected) else {
        return false;
    };
    let Some(value) = value else {
        return false;
    };
    let actual = match part {
        None => to_i64(value),
        Some(DatePart::Month) => parse_date(value).map(|d| i64::from(d.month())),
        Some(DatePart::Year) => parse_date(value).map(|d| i64::from(d.year())),
    };
    actual == Some(expected)
}
