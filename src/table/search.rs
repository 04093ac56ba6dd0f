use super::config::ColumnDescriptor;
use super::predicate::matches_substring;
use super::resolve::resolve;
use serde_json::Value;

/// Keeps records where any searchable column contains `term`.
pub fn search<'a>(records: &[&'a Value], columns: &[ColumnDescriptor], term: &str) -> Vec<&'a Value> {
    // Whitespace inside the term is significant; only a blank term is empty.
    if term.trim().is_empty() {
        return records.to_vec();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .copied()
        .filter(|record| {
            columns
                .iter()
                .filter(|c| c.searchable)
                .any(|c| matches_substring(resolve(record, &c.key), &needle))
        })
        .collect()
}
