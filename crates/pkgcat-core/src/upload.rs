//! Upload submission building and response classification

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

pub const UPLOAD_FAILED: &str = "Failed to upload package";
pub const UPLOAD_ACCEPTED: &str = "Package uploaded";

/// Extensions the backend's parser accepts
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["tsv", "csv"];

#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    fn has_accepted_extension(&self) -> bool {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ACCEPTED_EXTENSIONS
                    .iter()
                    .any(|accepted| ext.eq_ignore_ascii_case(accepted))
            })
    }
}

/// Whether the upload creates a package or revises a known one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    Create,
    /// Package id is fixed and not editable
    Edit { package_id: String },
}

/// Editable upload form. [`UploadForm::build`] turns it into a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    pub target: UploadTarget,
    pub file: Option<UploadFile>,
    /// Only read in create mode
    pub package_id: String,
    pub package_name: String,
    pub identifier_type: Option<String>,
    pub identifier_value: String,
}

impl UploadForm {
    pub fn create() -> Self {
        Self {
            target: UploadTarget::Create,
            file: None,
            package_id: String::new(),
            package_name: String::new(),
            identifier_type: None,
            identifier_value: String::new(),
        }
    }

    pub fn edit(package_id: impl Into<String>, package_name: impl Into<String>) -> Self {
        let package_id = package_id.into();
        Self {
            target: UploadTarget::Edit {
                package_id: package_id.clone(),
            },
            package_id,
            package_name: package_name.into(),
            ..Self::create()
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.target, UploadTarget::Edit { .. })
    }

    /// The id that will be submitted, honoring edit mode
    pub fn effective_package_id(&self) -> &str {
        match &self.target {
            UploadTarget::Edit { package_id } => package_id,
            UploadTarget::Create => &self.package_id,
        }
    }

    pub fn set_package_id(&mut self, value: impl Into<String>) {
        if !self.is_edit() {
            self.package_id = value.into();
        }
    }

    /// Select the first available type unless the current one is still valid
    pub fn select_default_identifier_type(&mut self, types: &[String]) {
        let current_valid = self
            .identifier_type
            .as_ref()
            .is_some_and(|t| types.contains(t));
        if !current_valid {
            self.identifier_type = types.first().cloned();
        }
    }

    /// Move the type selector forward through `types`, wrapping
    pub fn cycle_identifier_type(&mut self, types: &[String]) {
        if types.is_empty() {
            self.identifier_type = None;
            return;
        }
        let next = match &self.identifier_type {
            Some(current) => types
                .iter()
                .position(|t| t == current)
                .map(|i| (i + 1) % types.len())
                .unwrap_or(0),
            None => 0,
        };
        self.identifier_type = Some(types[next].clone());
    }

    pub fn build(
        &self,
        identifier_types: &[String],
    ) -> std::result::Result<UploadSubmission, ValidationError> {
        let file = self.file.clone().ok_or(ValidationError::MissingFile)?;
        if !file.has_accepted_extension() {
            return Err(ValidationError::UnsupportedFileType(file.file_name));
        }

        let package_name = self.package_name.trim();
        if package_name.is_empty() {
            return Err(ValidationError::MissingPackageName);
        }

        let package_id = match &self.target {
            UploadTarget::Edit { package_id } => Some(package_id.clone()),
            UploadTarget::Create => {
                let id = self.package_id.trim();
                if id.is_empty() {
                    return Err(ValidationError::MissingPackageId);
                }
                Some(id.to_string())
            }
        };

        let additional_identifier = self.additional_identifier(identifier_types)?;

        Ok(UploadSubmission {
            file,
            package_id,
            package_name: package_name.to_string(),
            additional_identifier,
        })
    }

    fn additional_identifier(
        &self,
        identifier_types: &[String],
    ) -> std::result::Result<Option<AdditionalIdentifier>, ValidationError> {
        let raw = self.identifier_value.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let identifier: i64 = raw
            .parse()
            .map_err(|_| ValidationError::NonNumericIdentifier(raw.to_string()))?;
        let kind = self
            .identifier_type
            .clone()
            .or_else(|| identifier_types.first().cloned())
            .ok_or(ValidationError::MissingIdentifierType)?;
        Ok(Some(AdditionalIdentifier { kind, identifier }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdditionalIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: i64,
}

/// A validated upload, ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSubmission {
    pub file: UploadFile,
    pub package_id: Option<String>,
    pub package_name: String,
    pub additional_identifier: Option<AdditionalIdentifier>,
}

impl UploadSubmission {
    /// `additional_identifiers` form field: a single-element JSON array
    pub fn additional_identifiers_json(&self) -> Result<Option<String>> {
        match &self.additional_identifier {
            Some(id) => Ok(Some(serde_json::to_string(&[id])?)),
            None => Ok(None),
        }
    }
}

/// Server-reported issue tied to one input row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// `None` when the server sent no usable row number
    pub row: Option<u64>,
    pub text: String,
    pub raw_data: String,
}

impl std::fmt::Display for RowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.row {
            Some(row) => write!(f, "Row {}: {}", row, self.text)?,
            None => write!(f, "Row ?: {}", self.text)?,
        }
        if !self.raw_data.is_empty() {
            write!(f, " (Data: {})", self.raw_data)?;
        }
        Ok(())
    }
}

/// Outcome of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadResult {
    Accepted {
        message: String,
        warnings: Vec<RowIssue>,
    },
    Rejected {
        message: String,
        errors: Vec<RowIssue>,
        warnings: Vec<RowIssue>,
    },
    TransportFailure {
        reason: String,
    },
}

/// How an outcome should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    /// Accepted, but with row warnings
    Warning,
    Error,
}

impl UploadResult {
    pub fn transport_failure(reason: impl Into<String>) -> Self {
        Self::TransportFailure {
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Accepted { message, .. } | Self::Rejected { message, .. } => message,
            Self::TransportFailure { .. } => UPLOAD_FAILED,
        }
    }

    pub fn warnings(&self) -> &[RowIssue] {
        match self {
            Self::Accepted { warnings, .. } | Self::Rejected { warnings, .. } => warnings,
            Self::TransportFailure { .. } => &[],
        }
    }

    pub fn errors(&self) -> &[RowIssue] {
        match self {
            Self::Rejected { errors, .. } => errors,
            _ => &[],
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Accepted { warnings, .. } if warnings.is_empty() => Severity::Success,
            Self::Accepted { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponseBody {
    #[serde(default)]
    message: serde_json::Value,
    #[serde(default)]
    error: serde_json::Value,
    #[serde(default)]
    errors: serde_json::Value,
    #[serde(default)]
    warnings: serde_json::Value,
}

/// Row entries are read field by field so one odd entry cannot sink the
/// whole response.
#[derive(Debug, Deserialize)]
struct WireRowIssue {
    #[serde(default)]
    row: serde_json::Value,
    #[serde(default)]
    warning: serde_json::Value,
    #[serde(default)]
    error: serde_json::Value,
    #[serde(default)]
    message: serde_json::Value,
    #[serde(default)]
    data: serde_json::Value,
}

/// Accepts `4`, `4.0` and `"4"`; anything else has no row number
fn row_number(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl From<WireRowIssue> for RowIssue {
    fn from(wire: WireRowIssue) -> Self {
        let row = row_number(&wire.row);
        let text = value_text(wire.warning)
            .or_else(|| value_text(wire.error))
            .or_else(|| value_text(wire.message))
            .unwrap_or_default();
        Self {
            row,
            text,
            raw_data: value_text(wire.data).unwrap_or_default(),
        }
    }
}

fn row_issue(entry: serde_json::Value) -> RowIssue {
    if entry.is_object() {
        if let Ok(wire) = serde_json::from_value::<WireRowIssue>(entry.clone()) {
            return wire.into();
        }
    }
    RowIssue {
        row: None,
        text: value_text(entry).unwrap_or_default(),
        raw_data: String::new(),
    }
}

fn row_issues(wire: serde_json::Value) -> Vec<RowIssue> {
    match wire {
        serde_json::Value::Array(entries) => entries.into_iter().map(row_issue).collect(),
        serde_json::Value::Null => Vec::new(),
        single => vec![row_issue(single)],
    }
}

/// Classify an upload response. A body that is not the structured JSON
/// contract counts as a transport failure whatever the status.
pub fn classify_upload_response(status: u16, body: &[u8]) -> UploadResult {
    let parsed: UploadResponseBody = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return UploadResult::transport_failure(format!(
                "unreadable upload response (HTTP {status}): {e}"
            ));
        }
    };

    if (200..300).contains(&status) {
        UploadResult::Accepted {
            message: value_text(parsed.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UPLOAD_ACCEPTED.to_string()),
            warnings: row_issues(parsed.warnings),
        }
    } else {
        UploadResult::Rejected {
            message: value_text(parsed.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UPLOAD_FAILED.to_string()),
            errors: row_issues(parsed.errors),
            warnings: row_issues(parsed.warnings),
        }
    }
}
