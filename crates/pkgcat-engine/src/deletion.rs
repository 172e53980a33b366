//! Deletion Workflow: confirm, delete, navigate away

use pkgcat_core::{CatalogApi, Error, FetchError, RequestSequence, Result, Ticket};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionState {
    /// No dialog. Carries the inline error from a failed attempt, if any.
    Closed { error: Option<String> },
    Confirming,
    Deleting,
    /// Terminal: the package is gone and the caller should leave its view
    Deleted,
}

impl DeletionState {
    fn label(&self) -> &'static str {
        match self {
            Self::Closed { .. } => "closed",
            Self::Confirming => "confirming",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
        }
    }
}

pub struct DeletionWorkflow {
    identifier: String,
    state: DeletionState,
    sequence: RequestSequence,
}

impl DeletionWorkflow {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            state: DeletionState::Closed { error: None },
            sequence: RequestSequence::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> &DeletionState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            DeletionState::Closed { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.state, DeletionState::Deleted)
    }

    /// Open the confirmation dialog. Clears any previous inline error.
    pub fn request_delete(&mut self) -> Result<()> {
        match self.state {
            DeletionState::Closed { .. } => {
                self.state = DeletionState::Confirming;
                Ok(())
            }
            _ => Err(self.invalid("request delete")),
        }
    }

    pub fn cancel(&mut self) -> Result<()> {
        match self.state {
            DeletionState::Confirming => {
                self.state = DeletionState::Closed { error: None };
                Ok(())
            }
            _ => Err(self.invalid("cancel")),
        }
    }

    pub fn confirm(&mut self) -> Result<Ticket> {
        match self.state {
            DeletionState::Confirming => {
                self.state = DeletionState::Deleting;
                Ok(self.sequence.issue())
            }
            _ => Err(self.invalid("confirm")),
        }
    }

    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: std::result::Result<(), FetchError>,
    ) -> bool {
        if !self.sequence.is_current(ticket) || self.state != DeletionState::Deleting {
            warn!(identifier = %self.identifier, "discarding stale delete response");
            return false;
        }
        self.state = match result {
            Ok(()) => {
                info!(identifier = %self.identifier, "package deleted");
                DeletionState::Deleted
            }
            Err(e) => {
                warn!(identifier = %self.identifier, error = %e, "delete failed");
                DeletionState::Closed {
                    error: Some(format!("Failed to delete package: {e}")),
                }
            }
        };
        true
    }

    /// Confirm and run the request. The returned state says whether to
    /// navigate away.
    pub async fn confirm_and_delete(&mut self, api: &dyn CatalogApi) -> Result<&DeletionState> {
        let ticket = self.confirm()?;
        let result = api.delete_package(&self.identifier).await;
        self.complete(ticket, result);
        Ok(&self.state)
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error() -> FetchError {
        FetchError::Status {
            endpoint: "DELETE /package/9".to_string(),
            status: 500,
        }
    }

    #[test]
    fn test_cancel_returns_to_closed() {
        let mut workflow = DeletionWorkflow::new("9");
        workflow.request_delete().unwrap();
        assert_eq!(workflow.state(), &DeletionState::Confirming);
        workflow.cancel().unwrap();
        assert_eq!(workflow.state(), &DeletionState::Closed { error: None });
    }

    #[test]
    fn test_success_is_terminal() {
        let mut workflow = DeletionWorkflow::new("9");
        workflow.request_delete().unwrap();
        let ticket = workflow.confirm().unwrap();
        assert!(workflow.complete(ticket, Ok(())));
        assert!(workflow.is_deleted());
        assert!(workflow.request_delete().is_err());
    }

    #[test]
    fn test_failure_closes_with_inline_error() {
        let mut workflow = DeletionWorkflow::new("9");
        workflow.request_delete().unwrap();
        let ticket = workflow.confirm().unwrap();
        workflow.complete(ticket, Err(server_error()));

        assert!(!workflow.is_deleted());
        let error = workflow.error().unwrap();
        assert!(error.starts_with("Failed to delete package"));
        assert!(error.contains("500"));

        workflow.request_delete().unwrap();
        assert_eq!(workflow.error(), None);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut workflow = DeletionWorkflow::new("9");
        let err = workflow.confirm().unwrap_err();
        assert_eq!(err.to_string(), "Cannot confirm while closed");
        assert!(workflow.cancel().is_err());

        workflow.request_delete().unwrap();
        workflow.confirm().unwrap();
        assert!(workflow.confirm().is_err());
        assert!(workflow.cancel().is_err());
    }
}
