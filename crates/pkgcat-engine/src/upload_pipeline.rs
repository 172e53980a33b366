//! Upload Pipeline: validate, submit, classify

use pkgcat_core::{
    CatalogApi, FetchError, RequestSequence, Ticket, UploadForm, UploadResult, UploadSubmission,
    ValidationError,
};
use tracing::{info, warn};

/// `Idle -> Submitting -> Done(outcome)`; a new submit may start from any
/// finished state and clears the previous outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Submitting,
    Done(UploadResult),
}

/// Identifier-type enumeration used to populate the selector
#[derive(Debug, Clone, PartialEq)]
pub enum IdentifierTypes {
    NotLoaded,
    Loaded(Vec<String>),
    /// Fetch failed; the selector is empty
    Unavailable,
}

impl IdentifierTypes {
    pub fn options(&self) -> &[String] {
        match self {
            Self::Loaded(types) => types,
            _ => &[],
        }
    }
}

/// What the caller should do after a submit completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCompletion {
    /// Accepted: re-synchronize the package view
    Refresh,
    /// Rejected or transport failure: nothing to refresh
    Keep,
    /// Superseded by a newer submit and ignored
    Stale,
}

pub struct UploadPipeline {
    form: UploadForm,
    identifier_types: IdentifierTypes,
    state: UploadState,
    sequence: RequestSequence,
    types_sequence: RequestSequence,
}

impl UploadPipeline {
    pub fn new(form: UploadForm) -> Self {
        Self {
            form,
            identifier_types: IdentifierTypes::NotLoaded,
            state: UploadState::Idle,
            sequence: RequestSequence::new(),
            types_sequence: RequestSequence::new(),
        }
    }

    pub fn form(&self) -> &UploadForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut UploadForm {
        &mut self.form
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn result(&self) -> Option<&UploadResult> {
        match &self.state {
            UploadState::Done(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, UploadState::Submitting)
    }

    pub fn identifier_types(&self) -> &IdentifierTypes {
        &self.identifier_types
    }

    pub fn begin_identifier_types(&mut self) -> Ticket {
        self.types_sequence.issue()
    }

    /// Failure degrades to an empty selector; uploads stay possible
    pub fn complete_identifier_types(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<String>, FetchError>,
    ) -> bool {
        if !self.types_sequence.is_current(ticket) {
            return false;
        }
        self.identifier_types = match result {
            Ok(types) => {
                self.form.select_default_identifier_type(&types);
                IdentifierTypes::Loaded(types)
            }
            Err(e) => {
                warn!(error = %e, "identifier types unavailable");
                self.form.identifier_type = None;
                IdentifierTypes::Unavailable
            }
        };
        true
    }

    pub async fn load_identifier_types(&mut self, api: &dyn CatalogApi) {
        let ticket = self.begin_identifier_types();
        let result = api.identifier_types().await;
        self.complete_identifier_types(ticket, result);
    }

    pub fn cycle_identifier_type(&mut self) {
        let types = self.identifier_types.options().to_vec();
        self.form.cycle_identifier_type(&types);
    }

    /// Validate the form and move to `Submitting`. Prior outcomes are
    /// cleared either way.
    pub fn begin_submit(&mut self) -> Result<(Ticket, UploadSubmission), ValidationError> {
        self.state = UploadState::Idle;
        let submission = self.form.build(self.identifier_types.options())?;
        self.state = UploadState::Submitting;
        Ok((self.sequence.issue(), submission))
    }

    pub fn complete_submit(&mut self, ticket: Ticket, result: UploadResult) -> UploadCompletion {
        if !self.sequence.is_current(ticket) {
            warn!(ticket = ticket.value(), "discarding stale upload response");
            return UploadCompletion::Stale;
        }
        let completion = if result.is_accepted() {
            info!(
                package_id = self.form.effective_package_id(),
                warnings = result.warnings().len(),
                "upload accepted"
            );
            UploadCompletion::Refresh
        } else {
            UploadCompletion::Keep
        };
        self.state = UploadState::Done(result);
        completion
    }

    pub async fn submit(
        &mut self,
        api: &dyn CatalogApi,
    ) -> Result<UploadCompletion, ValidationError> {
        let (ticket, submission) = self.begin_submit()?;
        let result = api.upload(&submission).await;
        Ok(self.complete_submit(ticket, result))
    }
}
