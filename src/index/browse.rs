// Pure pagination over chord index entries
// Browser session state is an explicit record passed in, never ambient
// global state, so page math is testable without a rendering surface

use serde::{Deserialize, Serialize};

use super::ChordIndexEntry;

/// One display session's pagination state (1-based page numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageState {
    fn default() -> Self {
        PageState {
            page: 1,
            per_page: 10,
        }
    }
}

/// One page of index entries plus navigation facts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub entries: Vec<ChordIndexEntry>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Slice one page out of the index
pub fn page_slice(entries: &[ChordIndexEntry], state: &PageState) -> PageView {
    let per_page = state.per_page.max(1);
    let page = state.page.max(1);

    let total_items = entries.len();
    let total_pages = total_items.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page).min(total_items);
    let end = start.saturating_add(per_page).min(total_items);

    PageView {
        entries: entries[start..end].to_vec(),
        page,
        per_page,
        total_items,
        total_pages,
        has_next: end < total_items,
        has_previous: page > 1 && total_items > 0,
    }
}

/// Keep only entries mentioning a chord label (case-insensitive substring)
pub fn filter_by_chord(entries: &[ChordIndexEntry], query: &str) -> Vec<ChordIndexEntry> {
    let query = query.to_lowercase();
    entries
        .iter()
        .filter(|e| e.chords.iter().any(|c| c.to_lowercase().contains(&query)))
        .cloned()
        .collect()
}

/// Keep only entries with at least `min_length` chords
pub fn filter_by_min_length(entries: &[ChordIndexEntry], min_length: usize) -> Vec<ChordIndexEntry> {
    entries
        .iter()
        .filter(|e| e.chords.len() >= min_length)
        .cloned()
        .collect()
}
