//! Detail Resolver: summary from the catalog, full record on demand

use pkgcat_core::{
    CatalogApi, FetchError, PackageDetail, PackageSummary, RequestSequence, Ticket, Title,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// No fetch attempted (the summary carries no JSON content reference)
    Empty,
    Loading,
    Loaded(PackageDetail),
    Failed(FetchError),
}

pub struct DetailResolver {
    summary: PackageSummary,
    state: DetailState,
    title_filter: String,
    sequence: RequestSequence,
}

impl DetailResolver {
    pub fn new(summary: PackageSummary) -> Self {
        Self {
            summary,
            state: DetailState::Empty,
            title_filter: String::new(),
            sequence: RequestSequence::new(),
        }
    }

    pub fn summary(&self) -> &PackageSummary {
        &self.summary
    }

    pub fn identifier(&self) -> &str {
        &self.summary.identifier
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn detail(&self) -> Option<&PackageDetail> {
        match &self.state {
            DetailState::Loaded(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn can_fetch(&self) -> bool {
        self.summary.content.has_json()
    }

    /// Swap in another summary. Returns a ticket when the identifier changed
    /// and a fetch should be issued.
    pub fn set_summary(&mut self, summary: PackageSummary) -> Option<Ticket> {
        let changed = summary.identifier != self.summary.identifier;
        self.summary = summary;
        if !changed {
            return None;
        }
        self.title_filter.clear();
        self.state = DetailState::Empty;
        self.begin_fetch()
    }

    /// Start a fetch. `None` when the summary cannot be resolved; the
    /// resolver then stays empty.
    pub fn begin_fetch(&mut self) -> Option<Ticket> {
        if !self.can_fetch() {
            debug!(
                identifier = %self.summary.identifier,
                "no JSON content reference, not fetching"
            );
            self.sequence.invalidate();
            self.state = DetailState::Empty;
            return None;
        }
        self.state = DetailState::Loading;
        Some(self.sequence.issue())
    }

    /// Re-synchronize after a mutation
    pub fn refresh(&mut self) -> Option<Ticket> {
        self.begin_fetch()
    }

    pub fn complete_fetch(
        &mut self,
        ticket: Ticket,
        result: Result<PackageDetail, FetchError>,
    ) -> bool {
        if !self.sequence.is_current(ticket) {
            warn!(
                identifier = %self.summary.identifier,
                ticket = ticket.value(),
                "discarding stale detail response"
            );
            return false;
        }
        self.state = match result {
            Ok(detail) => DetailState::Loaded(detail),
            Err(e) => DetailState::Failed(e),
        };
        true
    }

    pub async fn fetch(&mut self, api: &dyn CatalogApi) -> Result<(), FetchError> {
        let Some(ticket) = self.begin_fetch() else {
            return Ok(());
        };
        let result = api.package_detail(&self.summary.identifier).await;
        let outcome = match &result {
            Ok(_) => Ok(()),
            Err(e) => Err(e.clone()),
        };
        self.complete_fetch(ticket, result);
        outcome
    }

    /// Blocking notice for the detail view, if any
    pub fn notice(&self) -> Option<String> {
        match &self.state {
            DetailState::Empty => Some("No package details available.".to_string()),
            DetailState::Loading => Some("Loading package details...".to_string()),
            DetailState::Failed(e) => Some(format!("Error: {e}")),
            DetailState::Loaded(_) => None,
        }
    }

    /// Name from the full record when present, else from the summary
    pub fn display_name(&self) -> &str {
        match self.detail() {
            Some(detail) if detail.name.as_deref().is_some_and(|n| !n.is_empty()) => {
                detail.display_name()
            }
            _ => self.summary.display_name(),
        }
    }

    pub fn title_filter(&self) -> &str {
        &self.title_filter
    }

    pub fn set_title_filter(&mut self, filter: impl Into<String>) {
        self.title_filter = filter.into();
    }

    /// Titles matching the sub-filter, in server order
    pub fn visible_titles(&self) -> Vec<&Title> {
        let Some(detail) = self.detail() else {
            return Vec::new();
        };
        let needle = self.title_filter.to_lowercase();
        detail
            .titles
            .iter()
            .filter(|t| needle.is_empty() || t.title.to_lowercase().contains(&needle))
            .collect()
    }
}
