use super::coerce::{scalar_text, to_bool};
use super::resolve::resolve;
use serde_json::Value;
use std::collections::BTreeMap;

/// A filter predicate that needs to know the shape of a particular domain.
///
/// Filter descriptors refer to these by name; the stages never special-case a
/// domain themselves.
pub trait DomainPredicate: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, record: &Value, params: &Value, expected: &str) -> bool;
}

/// Label of the "current" entry of a nested history list.
///
/// Picks the entry flagged active, falling back to the first entry, then joins
/// the configured label paths. The console's classroom filter is this with the
/// enrollment defaults below.
pub struct ActiveEntryLabel;

const DEFAULT_LIST_PATH: &str = "matriculas";
const DEFAULT_ACTIVE_FLAG: &str = "estaActivo";
const DEFAULT_LABEL_PATHS: &[&str] = &["idAula.idGrado.nombre", "idAula.seccion"];

impl ActiveEntryLabel {
    pub fn label(record: &Value, params: &Value) -> Option<String> {
        let list_path = param_str(params, "listPath").unwrap_or(DEFAULT_LIST_PATH);
        let active_flag = param_str(params, "activeFlag").unwrap_or(DEFAULT_ACTIVE_FLAG);
        let separator = param_str(params, "separator").unwrap_or(" ");
        let label_paths: Vec<&str> = match params.get("labelPaths").and_then(Value::as_array) {
            Some(paths) => paths.iter().filter_map(Value::as_str).collect(),
            None => DEFAULT_LABEL_PATHS.to_vec(),
        };

        let entries = resolve(record, list_path)?.as_array()?;
        let entry = entries
            .iter()
            .find(|e| resolve(e, active_flag).and_then(to_bool) == Some(true))
            .or_else(|| entries.first())?;

        let parts: Vec<String> = label_paths
            .iter()
            .filter_map(|p| resolve(entry, p).and_then(scalar_text))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(parts.join(separator))
    }
}

impl DomainPredicate for ActiveEntryLabel {
    fn name(&self) -> &'static str {
        "activeEntryLabel"
    }

    fn matches(&self, record: &Value, params: &Value, expected: &str) -> bool {
        ActiveEntryLabel::label(record, params)
            .map(|label| label == expected.trim())
            .unwrap_or(false)
    }
}

fn param_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

pub struct PluginRegistry {
    predicates: BTreeMap<&'static str, Box<dyn DomainPredicate>>,
}

impl PluginRegistry {
    pub fn empty() -> Self {
        Self {
            predicates: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ActiveEntryLabel));
        registry
    }

    pub fn register(&mut self, predicate: Box<dyn DomainPredicate>) {
        self.predicates.insert(predicate.name(), predicate);
    }

    pub fn get(&self, name: &str) -> Option<&dyn DomainPredicate> {
        self.predicates.get(name).map(|p| &**p)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.predicates.keys().copied().collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
