//! # Session List Store
//!
//! Holds the authoritative session catalog and materializes it for
//! display in bounded pages. Catalogs can reach thousands of entries;
//! re-rendering everything on each change is the one genuine performance
//! concern here, so the visible window only ever grows by one page at a
//! time, so appending a page is O(page_size) regardless of catalog size.
//! Filtering and wholesale reload are O(n) by necessity since they change
//! the windowed universe.

/// Incrementally paged view over the session catalog.
///
/// The *catalog* is the full list as fetched (server order, newest
/// first), replaced wholesale on every fetch and never partially merged.
/// The *effective* catalog is the catalog after filtering. The *visible
/// window* is the prefix of the effective catalog materialized so far.
#[derive(Debug, Clone)]
pub struct SessionListStore {
    /// Full catalog, server order.
    catalog: Vec<String>,
    /// Catalog after filtering; equals `catalog` when no filter is set.
    effective: Vec<String>,
    /// Active filter term, lowercased. `None` means unfiltered.
    filter: Option<String>,
    /// Index of the last materialized page.
    page: usize,
    /// Length of the visible window: `min((page + 1) * page_size, effective.len())`.
    visible_len: usize,
    page_size: usize,
}

impl SessionListStore {
    /// Create an empty store.
    ///
    /// A `page_size` of zero is nonsensical and is bumped to one.
    pub fn new(page_size: usize) -> Self {
        Self {
            catalog: Vec::new(),
            effective: Vec::new(),
            filter: None,
            page: 0,
            visible_len: 0,
            page_size: page_size.max(1),
        }
    }

    /// Replace the catalog wholesale.
    ///
    /// Clears any active filter and resets pagination: the visible window
    /// becomes the first page of the new catalog.
    pub fn load_catalog(&mut self, sessions: Vec<String>) {
        self.catalog = sessions;
        self.effective = self.catalog.clone();
        self.filter = None;
        self.reset_window();
        tracing::debug!(total = self.catalog.len(), "Session catalog replaced");
    }

    /// Apply a case-insensitive substring filter over session identifiers.
    ///
    /// An empty term restores the full unfiltered catalog. Either way,
    /// pagination resets to the first page. Catalog order is preserved.
    pub fn filter(&mut self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            self.effective = self.catalog.clone();
            self.filter = None;
        } else {
            let needle = term.to_lowercase();
            self.effective = self
                .catalog
                .iter()
                .filter(|name| name.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            self.filter = Some(needle);
        }
        self.reset_window();
        tracing::debug!(
            term,
            matches = self.effective.len(),
            "Session filter applied"
        );
    }

    /// Materialize the next page, returning the newly appended batch.
    ///
    /// Appends exactly `page_size` items (or the remainder, if fewer) in
    /// catalog order. A no-op returning an empty slice when the window
    /// already covers the effective catalog.
    pub fn next_page(&mut self) -> &[String] {
        if !self.has_more() {
            return &[];
        }
        self.page += 1;
        let start = self.visible_len;
        self.visible_len = self
            .effective
            .len()
            .min(self.visible_len + self.page_size);
        &self.effective[start..self.visible_len]
    }

    /// Whether items remain beyond the current visible window.
    pub fn has_more(&self) -> bool {
        (self.page + 1) * self.page_size < self.effective.len()
    }

    /// The visible window: the materialized prefix of the effective catalog.
    pub fn visible(&self) -> &[String] {
        &self.effective[..self.visible_len]
    }

    /// Number of entries in the effective (post-filter) catalog.
    pub fn len(&self) -> usize {
        self.effective.len()
    }

    /// True when the effective catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.effective.is_empty()
    }

    /// The active filter term, if any.
    pub fn filter_term(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Configured page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn reset_window(&mut self) {
        self.page = 0;
        self.visible_len = self.effective.len().min(self.page_size);
    }
}

impl Default for SessionListStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("session_{i:04}")).collect()
    }

    #[test]
    fn test_load_shows_first_page() {
        let mut store = SessionListStore::new(50);
        store.load_catalog(sessions(120));

        assert_eq!(store.visible().len(), 50);
        assert_eq!(store.visible()[0], "session_0000");
        assert_eq!(store.len(), 120);
        assert!(store.has_more());
    }

    #[test]
    fn test_paging_through_120_items() {
        let mut store = SessionListStore::new(50);
        let all = sessions(120);
        store.load_catalog(all.clone());

        let batch = store.next_page().to_vec();
        assert_eq!(batch, &all[50..100]);
        assert_eq!(store.visible().len(), 100);
        assert!(store.has_more());

        let batch = store.next_page().to_vec();
        assert_eq!(batch, &all[100..120]);
        assert_eq!(store.visible().len(), 120);
        assert!(!store.has_more());

        // Idempotent at the end.
        assert!(store.next_page().is_empty());
        assert_eq!(store.visible().len(), 120);
    }

    #[test]
    fn test_visible_window_is_catalog_prefix() {
        let mut store = SessionListStore::new(10);
        let all = sessions(35);
        store.load_catalog(all.clone());

        for _ in 0..3 {
            store.next_page();
        }
        assert_eq!(store.visible(), &all[..35]);
    }

    #[test]
    fn test_catalog_smaller_than_page() {
        let mut store = SessionListStore::new(50);
        store.load_catalog(sessions(7));

        assert_eq!(store.visible().len(), 7);
        assert!(!store.has_more());
        assert!(store.next_page().is_empty());
    }

    #[test]
    fn test_filter_is_case_insensitive_and_order_preserving() {
        let mut store = SessionListStore::new(50);
        store.load_catalog(vec![
            "Focus_20240101_120000".into(),
            "calm_20240102_120000".into(),
            "FOCUS_20240103_120000".into(),
        ]);

        store.filter("focus");
        assert_eq!(
            store.visible(),
            &["Focus_20240101_120000", "FOCUS_20240103_120000"]
        );
        assert_eq!(store.filter_term(), Some("focus"));
    }

    #[test]
    fn test_empty_filter_restores_full_catalog() {
        let mut store = SessionListStore::new(10);
        store.load_catalog(sessions(30));

        store.filter("session_002");
        assert_eq!(store.len(), 10);

        store.filter("");
        assert_eq!(store.len(), 30);
        assert_eq!(store.visible().len(), 10); // pagination reset to page 0
        assert!(store.filter_term().is_none());
    }

    #[test]
    fn test_filter_resets_pagination() {
        let mut store = SessionListStore::new(10);
        store.load_catalog(sessions(100));
        store.next_page();
        store.next_page();
        assert_eq!(store.visible().len(), 30);

        store.filter("session_00");
        assert_eq!(store.len(), 10);
        assert_eq!(store.visible().len(), 10);
        assert!(!store.has_more());
    }

    #[test]
    fn test_load_resets_window_after_growth() {
        let mut store = SessionListStore::new(10);
        store.load_catalog(sessions(50));
        store.next_page();
        assert_eq!(store.visible().len(), 20);

        store.load_catalog(sessions(15));
        assert_eq!(store.visible().len(), 10);
        assert!(store.has_more());
    }

    #[test]
    fn test_has_more_false_iff_window_covers_catalog() {
        let mut store = SessionListStore::new(25);
        store.load_catalog(sessions(75));

        while store.has_more() {
            store.next_page();
        }
        assert_eq!(store.visible().len(), store.len());
    }

    #[test]
    fn test_zero_page_size_is_bumped() {
        let store = SessionListStore::new(0);
        assert_eq!(store.page_size(), 1);
    }
}
