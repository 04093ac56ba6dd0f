//! Tabular data engine: search, filter, sort and paginate arbitrary JSON
//! records for one console table.
//!
//! Every stage is a pure function over borrowed records. The composite
//! [`process`] only clones the rows of the page it returns.

pub mod coerce;
pub mod config;
pub mod error;
pub mod filter;
pub mod paginate;
pub mod plugins;
pub mod predicate;
pub mod resolve;
pub mod search;
pub mod sort;

pub use config::{TableConfig, TableLayout};
pub use error::TableError;
pub use paginate::PageMeta;
pub use plugins::PluginRegistry;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutput {
    pub page: Vec<Value>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Search, filter and sort without paging. Shared by [`process`] and callers
/// that only need the matching count.
pub fn select<'a>(records: &'a [Value], config: &TableConfig, plugins: &PluginRegistry) -> Vec<&'a Value> {
    let all: Vec<&Value> = records.iter().collect();
    let searched = search::search(&all, &config.columns, &config.search_state);
    let filtered = filter::filter(&searched, &config.filters, &config.filter_state, plugins);
    sort::sort(&filtered, &config.sort_state, &config.columns)
}

pub fn process(records: &[Value], config: &TableConfig, plugins: &PluginRegistry) -> PageOutput {
    let selected = select(records, config, plugins);
    let (page, meta) = paginate::paginate(&selected, config.page_size, config.current_page);
    PageOutput {
        page: page.into_iter().cloned().collect(),
        meta,
    }
}
