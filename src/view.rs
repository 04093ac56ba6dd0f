use crate::table::config::{DEFAULT_PAGE_SIZE, FilterState, SortState, TableConfig, TableLayout};
use crate::table::TableError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Caller-owned state of one console table: search box, filter dropdowns,
/// sorted column and pager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub filters: FilterState,
    #[serde(default)]
    pub sort: SortState,
    pub page_size: usize,
    pub current_page: i64,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewAction {
    SetSearch {
        #[serde(default)]
        term: String,
    },
    SetFilter {
        key: String,
        #[serde(default)]
        value: Value,
    },
    ClearFilters,
    ToggleSort {
        key: String,
    },
    SetPage {
        page: i64,
    },
    #[serde(rename_all = "camelCase")]
    SetPageSize {
        page_size: usize,
    },
}

impl TableView {
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            filters: FilterState::default(),
            sort: SortState::default(),
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.current_page = 1;
    }

    pub fn set_filter(&mut self, key: &str, value: &Value) {
        self.filters.set(key, value);
        self.current_page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.current_page = 1;
    }

    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = self.sort.toggled(key);
    }

    /// Clamped into `[1, totalPages]`; an empty table stays on page 1.
    pub fn set_page(&mut self, page: i64, total_pages: usize) {
        let last = total_pages.max(1) as i64;
        self.current_page = page.clamp(1, last);
    }

    pub fn set_page_size(&mut self, page_size: usize, max_page_size: usize) -> Result<(), TableError> {
        if page_size == 0 || page_size > max_page_size {
            return Err(TableError::bad_params(format!(
                "pageSize must be in range 1..={}",
                max_page_size
            ))
            .with_details(json!({ "pageSize": page_size })));
        }
        self.page_size = page_size;
        self.current_page = 1;
        Ok(())
    }

    /// Pulls a stale page back in range, e.g. after rows were deleted.
    pub fn clamp_page(&mut self, total_pages: usize) -> bool {
        let before = self.current_page;
        self.set_page(before, total_pages);
        before != self.current_page
    }

    pub fn apply(
        &mut self,
        action: &ViewAction,
        total_pages: usize,
        max_page_size: usize,
    ) -> Result<(), TableError> {
        match action {
            ViewAction::SetSearch { term } => self.set_search(term),
            ViewAction::SetFilter { key, value } => self.set_filter(key, value),
            ViewAction::ClearFilters => self.clear_filters(),
            ViewAction::ToggleSort { key } => {
                if key.trim().is_empty() {
                    return Err(TableError::bad_params("toggleSort.key must not be empty"));
                }
                self.toggle_sort(key)
            }
            ViewAction::SetPage { page } => self.set_page(*page, total_pages),
            ViewAction::SetPageSize { page_size } => {
                self.set_page_size(*page_size, max_page_size)?
            }
        }
        Ok(())
    }

    pub fn to_config(&self, layout: &TableLayout) -> TableConfig {
        TableConfig {
            columns: layout.columns.clone(),
            filters: layout.filters.clone(),
            search_state: self.search.clone(),
            filter_state: self.filters.clone(),
            sort_state: self.sort.clone(),
            page_size: self.page_size,
            current_page: self.current_page,
        }
    }
}

pub fn parse_action(raw: Option<&Value>) -> Result<ViewAction, TableError> {
    let Some(raw) = raw else {
        return Err(TableError::bad_params("missing action"));
    };
    serde_json::from_value::<ViewAction>(raw.clone())
        .map_err(|e| TableError::bad_params(format!("invalid action: {}", e)))
}
