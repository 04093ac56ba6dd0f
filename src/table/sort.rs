use super::coerce::{parse_date, scalar_text, to_f64_lossy};
use super::config::{ColumnDescriptor, ColumnKind, SortDirection, SortState};
use super::resolve::resolve_present;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum SortValue<'a> {
    Null,
    Number(f64),
    Date(NaiveDateTime),
    Raw(&'a Value),
}

fn sort_value<'a>(record: &'a Value, key: &str, kind: Option<ColumnKind>) -> SortValue<'a> {
    let Some(value) = resolve_present(record, key) else {
        return SortValue::Null;
    };
    match kind {
        Some(ColumnKind::Number) => SortValue::Number(to_f64_lossy(Some(value))),
        // Unparseable dates sort together with nulls.
        Some(ColumnKind::Date) => match parse_date(value) {
            Some(d) => SortValue::Date(d),
            None => SortValue::Null,
        },
        _ => SortValue::Raw(value),
    }
}

fn lexical_key(value: &Value) -> String {
    scalar_text(value).unwrap_or_else(|| value.to_string())
}

/// Untyped columns may mix shapes: numbers < booleans < strings < arrays and
/// objects. Ordering within a rank keeps the comparison total.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::Bool(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) | Value::Object(_) => 4,
    }
}

fn compare_raw(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| lexical_key(a).cmp(&lexical_key(b))),
    }
}

fn compare_present(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Date(x), SortValue::Date(y)) => x.cmp(y),
        (SortValue::Raw(x), SortValue::Raw(y)) => compare_raw(x, y),
        _ => Ordering::Equal,
    }
}

/// Nulls are the minimum in both directions; only non-null pairs flip.
fn compare(a: &SortValue<'_>, b: &SortValue<'_>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (SortValue::Null, SortValue::Null) => Ordering::Equal,
        (SortValue::Null, _) => Ordering::Less,
        (_, SortValue::Null) => Ordering::Greater,
        _ => {
            let ord = compare_present(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

/// Stable sort by the single active key. Unsortable columns leave the
/// order untouched.
pub fn sort<'a>(records: &[&'a Value], state: &SortState, columns: &[ColumnDescriptor]) -> Vec<&'a Value> {
    let Some(key) = state.active_key() else {
        return records.to_vec();
    };
    let column = columns.iter().find(|c| c.key == key);
    if column.map(|c| !c.sortable).unwrap_or(false) {
        tracing::debug!(key, "sort requested on unsortable column; keeping input order");
        return records.to_vec();
    }
    let kind = column.map(|c| c.kind);

    let mut keyed: Vec<(SortValue<'a>, &'a Value)> = records
        .iter()
        .map(|r| (sort_value(*r, key, kind), *r))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare(a, b, state.direction));
    keyed.into_iter().map(|(_, r)| r).collect()
}
