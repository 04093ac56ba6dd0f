use super::config::{FilterDescriptor, FilterState};
use super::plugins::{DomainPredicate, PluginRegistry};
use super::predicate::{matches_boolean, matches_equality, matches_integer, matches_range};
use super::resolve::resolve;
use serde_json::Value;
use std::collections::BTreeMap;

enum ActiveFilter<'c> {
    Builtin(&'c FilterDescriptor, &'c str),
    Plugin(&'c dyn DomainPredicate, &'c Value, &'c str),
}

impl ActiveFilter<'_> {
    fn matches(&self, record: &Value) -> bool {
        match self {
            ActiveFilter::Builtin(descriptor, expected) => match descriptor {
                FilterDescriptor::Options { path, .. } => {
                    matches_equality(resolve(record, path), expected)
                }
                FilterDescriptor::Boolean { path } => {
                    matches_boolean(resolve(record, path), expected)
                }
                FilterDescriptor::Range { path, .. } => {
                    matches_range(resolve(record, path), expected)
                }
                FilterDescriptor::Integer { path, date_part } => {
                    matches_integer(resolve(record, path), expected, *date_part)
                }
                // Plug-ins are bound in `bind`.
                FilterDescriptor::Plugin { .. } => true,
            },
            ActiveFilter::Plugin(predicate, params, expected) => {
                predicate.matches(record, params, expected)
            }
        }
    }
}

/// Pairs every active filter value with its predicate. Keys without a
/// descriptor and unknown plug-ins are inert.
fn bind<'c>(
    descriptors: &'c BTreeMap<String, FilterDescriptor>,
    state: &'c FilterState,
    plugins: &'c PluginRegistry,
) -> Vec<ActiveFilter<'c>> {
    let mut active = Vec::new();
    for (key, expected) in state.active() {
        let Some(descriptor) = descriptors.get(key) else {
            tracing::debug!(filter = key, "no descriptor for filter key; ignoring");
            continue;
        };
        match descriptor {
            FilterDescriptor::Plugin { name, params } => match plugins.get(name) {
                Some(predicate) => active.push(ActiveFilter::Plugin(predicate, params, expected)),
                None => {
                    tracing::warn!(filter = key, plugin = %name, "unknown filter plug-in; ignoring");
                }
            },
            other => active.push(ActiveFilter::Builtin(other, expected)),
        }
    }
    active
}

/// AND of every active filter, order preserving.
pub fn filter<'a>(
    records: &[&'a Value],
    descriptors: &BTreeMap<String, FilterDescriptor>,
    state: &FilterState,
    plugins: &PluginRegistry,
) -> Vec<&'a Value> {
    let active = bind(descriptors, state, plugins);
    if active.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .copied()
        .filter(|record| active.iter().all(|f| f.matches(record)))
        .collect()
}
