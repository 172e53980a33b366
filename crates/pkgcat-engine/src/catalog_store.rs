//! Catalog Store: the full package list plus its derived view

use pkgcat_core::catalog::{self, SortKey, ViewState};
use pkgcat_core::{
    CatalogApi, FetchError, PackageSummary, RequestSequence, Ticket, ValidationError,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    Idle,
    Loading,
    Ready(Vec<PackageSummary>),
    Failed(FetchError),
}

/// One rendered page of the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogView<'a> {
    pub items: Vec<&'a PackageSummary>,
    pub page: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
    pub total_count: usize,
}

pub struct CatalogStore {
    state: CatalogState,
    view: ViewState,
    /// Indices into the full list, filtered and sorted
    visible: Vec<usize>,
    sequence: RequestSequence,
}

impl CatalogStore {
    pub fn new(view: ViewState) -> Self {
        Self {
            state: CatalogState::Idle,
            view,
            visible: Vec::new(),
            sequence: RequestSequence::new(),
        }
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn packages(&self) -> &[PackageSummary] {
        match &self.state {
            CatalogState::Ready(list) => list,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, CatalogState::Loading)
    }

    /// Start a (re)load. The current list is dropped; nothing partial is shown.
    pub fn begin_load(&mut self) -> Ticket {
        self.state = CatalogState::Loading;
        self.visible.clear();
        self.sequence.issue()
    }

    /// Apply a load result. Returns false when the ticket was superseded.
    pub fn complete_load(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<PackageSummary>, FetchError>,
    ) -> bool {
        if !self.sequence.is_current(ticket) {
            warn!(ticket = ticket.value(), "discarding stale catalog response");
            return false;
        }
        match result {
            Ok(list) => {
                debug!(count = list.len(), "catalog loaded");
                self.state = CatalogState::Ready(list);
                self.recompute();
            }
            Err(e) => {
                self.state = CatalogState::Failed(e);
                self.visible.clear();
            }
        }
        true
    }

    pub async fn load(&mut self, api: &dyn CatalogApi) -> Result<(), FetchError> {
        let ticket = self.begin_load();
        let result = api.list_packages().await;
        let outcome = match &result {
            Ok(_) => Ok(()),
            Err(e) => Err(e.clone()),
        };
        self.complete_load(ticket, result);
        outcome
    }

    /// Blocking notice for the catalog view, if any
    pub fn notice(&self) -> Option<String> {
        match &self.state {
            CatalogState::Idle | CatalogState::Loading => Some("Loading packages...".to_string()),
            CatalogState::Failed(e) => Some(format!("Error loading packages: {e}")),
            CatalogState::Ready(list) if list.is_empty() => {
                Some("No packages available.".to_string())
            }
            CatalogState::Ready(_) => None,
        }
    }

    /// Changing the term always returns to the first page
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.view.search_term = term.into();
        self.view.page = 1;
        self.recompute();
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.view.sort_key = key;
        self.recompute();
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        self.view.page_size = page_size;
        self.view.page = 1;
        self.recompute();
        Ok(())
    }

    /// Jump to `page`, clamped into `1..=total_pages`
    pub fn set_page(&mut self, page: usize) {
        self.view.page = page.clamp(1, self.total_pages());
    }

    pub fn next_page(&mut self) -> bool {
        if self.view.page < self.total_pages() {
            self.view.page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.view.page > 1 {
            self.view.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn filtered_count(&self) -> usize {
        self.visible.len()
    }

    pub fn total_pages(&self) -> usize {
        catalog::total_pages(self.visible.len(), self.view.page_size)
    }

    pub fn visible(&self) -> CatalogView<'_> {
        let packages = self.packages();
        let page = catalog::paginate(&self.visible, self.view.page, self.view.page_size);
        CatalogView {
            items: page.items.iter().map(|&i| &packages[i]).collect(),
            page: self.view.page,
            total_pages: page.total_pages,
            filtered_count: self.visible.len(),
            total_count: packages.len(),
        }
    }

    /// Rebuild the filtered/sorted index and keep the page in range
    fn recompute(&mut self) {
        let packages = match &self.state {
            CatalogState::Ready(list) => list,
            _ => {
                self.visible.clear();
                return;
            }
        };
        let mut visible = catalog::filter_indices(packages, &self.view.search_term);
        catalog::sort_indices(packages, &mut visible, self.view.sort_key);
        self.visible = visible;

        let total = self.total_pages();
        if self.view.page > total {
            self.view.page = total;
        }
        if self.view.page == 0 {
            self.view.page = 1;
        }
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(ViewState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Vec<PackageSummary> {
        (1..=n)
            .map(|i| PackageSummary::new(i.to_string(), format!("Package {i:02}")))
            .collect()
    }

    fn ready_store(list: Vec<PackageSummary>) -> CatalogStore {
        let mut store = CatalogStore::default();
        let ticket = store.begin_load();
        assert!(store.complete_load(ticket, Ok(list)));
        store
    }

    #[test]
    fn test_first_page_of_23() {
        let store = ready_store(numbered(23));
        let view = store.visible();
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.items.len(), 10);
        assert_eq!(view.items[0].identifier, "1");
        assert_eq!(view.items[9].identifier, "10");
    }

    #[test]
    fn test_search_resets_page_and_recounts() {
        let mut list = numbered(23);
        for pkg in list.iter_mut().take(5) {
            pkg.name = Some(format!("Special {}", pkg.identifier));
        }
        let mut store = ready_store(list);
        store.next_page();
        store.next_page();
        assert_eq!(store.view_state().page, 3);

        store.set_search_term("special");
        let view = store.visible();
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.filtered_count, 5);
        assert_eq!(view.items.len(), 5);
    }

    #[test]
    fn test_sort_applies_to_filtered_list() {
        let list = vec![
            PackageSummary::new("3", "Gamma"),
            PackageSummary::new("1", "Alpha"),
            PackageSummary::new("2", "Beta"),
        ];
        let mut store = ready_store(list);
        store.set_sort_key(SortKey::Id);
        store.set_search_term("a");
        let ids: Vec<_> = store
            .visible()
            .items
            .iter()
            .map(|p| p.identifier.clone())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        store.set_sort_key(SortKey::Name);
        let names: Vec<_> = store
            .visible()
            .items
            .iter()
            .map(|p| p.display_name().to_string())
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn test_page_bounds() {
        let mut store = ready_store(numbered(12));
        assert!(!store.previous_page());
        assert!(store.next_page());
        assert!(!store.next_page());
        assert_eq!(store.visible().items.len(), 2);

        store.set_page(99);
        assert_eq!(store.view_state().page, 2);
        store.set_page(0);
        assert_eq!(store.view_state().page, 1);
    }

    #[test]
    fn test_page_clamped_when_reload_shrinks_list() {
        let mut store = ready_store(numbered(30));
        store.set_page(3);
        let ticket = store.begin_load();
        store.complete_load(ticket, Ok(numbered(12)));
        assert_eq!(store.view_state().page, 2);
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let mut store = ready_store(numbered(30));
        store.set_page(3);
        store.set_page_size(25).unwrap();
        assert_eq!(store.view_state().page, 1);
        assert_eq!(store.total_pages(), 2);
        assert_eq!(store.set_page_size(0), Err(ValidationError::InvalidPageSize));
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut store = CatalogStore::default();
        let stale = store.begin_load();
        let fresh = store.begin_load();
        assert!(store.complete_load(fresh, Ok(numbered(2))));
        assert!(!store.complete_load(stale, Ok(numbered(50))));
        assert_eq!(store.packages().len(), 2);
    }

    #[test]
    fn test_notices() {
        let mut store = CatalogStore::default();
        assert_eq!(store.notice().as_deref(), Some("Loading packages..."));

        let ticket = store.begin_load();
        store.complete_load(ticket, Ok(Vec::new()));
        assert_eq!(store.notice().as_deref(), Some("No packages available."));
        assert_eq!(store.visible().total_pages, 1);

        let ticket = store.begin_load();
        store.complete_load(
            ticket,
            Err(FetchError::Status {
                endpoint: "GET /packages".to_string(),
                status: 503,
            }),
        );
        let notice = store.notice().unwrap();
        assert!(notice.starts_with("Error loading packages"));
        assert!(notice.contains("503"));
        assert!(store.packages().is_empty());
    }
}
