use super::error::TableError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    #[default]
    Text,
    Number,
    Date,
    Currency,
    Percentage,
    Status,
}

/// One displayable field. `render` belongs to the presentation layer and is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub key: String,
    #[serde(default, rename = "type")]
    pub kind: ColumnKind,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub searchable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<Value>,
}

impl ColumnDescriptor {
    #[cfg(test)]
    pub fn new(key: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            key: key.into(),
            kind,
            sortable: true,
            searchable: true,
            label: None,
            render: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePart {
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FilterDescriptor {
    /// Fixed option set, exact match.
    Options {
        path: String,
        #[serde(default)]
        options: Vec<String>,
    },
    Boolean {
        path: String,
    },
    /// Named buckets such as `"300-349"` or `"500+"`.
    Range {
        path: String,
        #[serde(default)]
        buckets: Vec<String>,
    },
    Integer {
        path: String,
        #[serde(default, rename = "datePart", skip_serializing_if = "Option::is_none")]
        date_part: Option<DatePart>,
    },
    /// Resolved by name against the plug-in registry.
    Plugin {
        name: String,
        #[serde(default)]
        params: Value,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortState {
    pub fn active_key(&self) -> Option<&str> {
        self.key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Same key flips direction, a new key starts ascending.
    pub fn toggled(&self, key: &str) -> SortState {
        let direction = match (self.active_key(), self.direction) {
            (Some(current), SortDirection::Asc) if current == key => SortDirection::Desc,
            (Some(current), SortDirection::Desc) if current == key => SortDirection::Asc,
            _ => SortDirection::Asc,
        };
        SortState {
            key: Some(key.to_string()),
            direction,
        }
    }
}

/// Empty, `null` and `all` mean "no constraint".
pub fn is_unconstrained(value: &str) -> bool {
    let t = value.trim();
    t.is_empty() || t.eq_ignore_ascii_case("all")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct FilterState(BTreeMap<String, String>);

impl From<BTreeMap<String, Value>> for FilterState {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut state = FilterState::default();
        for (key, value) in raw {
            state.set(key, &value);
        }
        state
    }
}

impl FilterState {
    pub fn set(&mut self, key: impl Into<String>, value: &Value) {
        let key = key.into();
        let text = match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(_) | Value::Bool(_) => super::coerce::scalar_text(value),
            _ => None,
        };
        match text {
            Some(t) if !is_unconstrained(&t) => {
                self.0.insert(key, t);
            }
            _ => {
                self.0.remove(&key);
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Entries that actually constrain the result.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(_, v)| !is_unconstrained(v))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Columns and filters a console screen registers once per dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableLayout {
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: BTreeMap<String, FilterDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: BTreeMap<String, FilterDescriptor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub search_state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filter_state: FilterState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort_state: SortState,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_current_page")]
    pub current_page: i64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            filters: BTreeMap::new(),
            search_state: String::new(),
            filter_state: FilterState::default(),
            sort_state: SortState::default(),
            page_size: DEFAULT_PAGE_SIZE,
            current_page: 1,
        }
    }
}

impl TableConfig {
    pub fn validate(&self, max_page_size: usize) -> Result<(), TableError> {
        if self.page_size == 0 || self.page_size > max_page_size {
            return Err(TableError::bad_params(format!(
                "config.pageSize must be in range 1..={}",
                max_page_size
            ))
            .with_details(json!({ "pageSize": self.page_size })));
        }
        for column in &self.columns {
            if column.key.trim().is_empty() {
                return Err(TableError::bad_params("config.columns[].key must not be empty"));
            }
        }
        Ok(())
    }

    /// Columns/filters the request left empty come from the stored layout.
    pub fn with_layout_defaults(mut self, layout: &TableLayout) -> Self {
        if self.columns.is_empty() {
            self.columns = layout.columns.clone();
        }
        if self.filters.is_empty() {
            self.filters = layout.filters.clone();
        }
        self
    }
}

pub fn parse_config(raw: Option<&Value>, max_page_size: usize) -> Result<TableConfig, TableError> {
    let config = match raw {
        None => TableConfig::default(),
        Some(v) if v.is_null() => TableConfig::default(),
        Some(v) if !v.is_object() => {
            return Err(TableError::bad_params("config must be an object"));
        }
        Some(v) => serde_json::from_value::<TableConfig>(v.clone())
            .map_err(|e| TableError::bad_params(format!("invalid config: {}", e)))?,
    };
    config.validate(max_page_size)?;
    Ok(config)
}

pub fn parse_layout(raw: &Value) -> Result<TableLayout, TableError> {
    serde_json::from_value::<TableLayout>(raw.clone())
        .map_err(|e| TableError::bad_params(format!("invalid layout: {}", e)))
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_current_page() -> i64 {
    1
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
