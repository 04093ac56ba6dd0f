use serde::{Deserialize, Serialize};

/// Page-switcher width.
pub const PAGE_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub page_numbers: Vec<usize>,
    pub total_records: usize,
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// At most five page numbers centred on the current page where possible.
pub fn page_numbers(total_pages: usize, current_page: i64) -> Vec<usize> {
    if total_pages == 0 {
        return Vec::new();
    }
    if total_pages <= PAGE_WINDOW {
        return (1..=total_pages).collect();
    }
    let total = total_pages as i64;
    if current_page <= 3 {
        (1..=PAGE_WINDOW).collect()
    } else if current_page >= total - 2 {
        (total_pages - 4..=total_pages).collect()
    } else {
        let current = current_page as usize;
        (current - 2..=current + 2).collect()
    }
}

/// Slices one page out of `items`. Pages outside `1..=totalPages` come back
/// empty; callers clamp before asking.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, current_page: i64) -> (Vec<T>, PageMeta) {
    let page_size = page_size.max(1);
    let len = items.len();
    let total_pages = total_pages(len, page_size);

    let (start, end) = if current_page < 1 {
        (0, 0)
    } else {
        let start = (current_page as usize - 1)
            .saturating_mul(page_size)
            .min(len);
        let end = start.saturating_add(page_size).min(len);
        (start, end)
    };

    let meta = PageMeta {
        total_pages,
        start_index: start,
        end_index: end,
        page_numbers: page_numbers(total_pages, current_page),
        total_records: len,
    };
    (items[start..end].to_vec(), meta)
}
