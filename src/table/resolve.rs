use serde_json::Value;

/// Walks a dotted path (`"idUsuario.estaActivo"`) into a record.
///
/// Returns `None` as soon as a segment is missing or the current value cannot
/// be descended into. Numeric segments index arrays (`"matriculas.0"`).
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Missing and explicit `null` are the same thing to every stage.
pub fn resolve_present<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    resolve(record, path).filter(|v| !v.is_null())
}
