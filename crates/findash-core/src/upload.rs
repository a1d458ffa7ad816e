//! Upload candidate validation and the upload flow
//!
//! Files are checked before any bytes go to the ingestion backend. The type
//! check is permissive: either a known media type or a `.csv` extension is
//! enough, since browsers and operating systems report media types
//! inconsistently.
//!
//! Validation runs twice in a full flow, once when the file is selected and
//! again right before submission. No verdict is cached between the two.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::UploadCandidate;

/// Largest accepted file (5 MiB)
pub const MAX_UPLOAD_SIZE: u64 = 5 * 1024 * 1024;

/// Accepted file extensions (compared lower-cased, without the dot)
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv"];

/// Accepted declared media types
pub const ALLOWED_MEDIA_TYPES: &[&str] = &["text/csv", "application/vnd.ms-excel"];

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Upload successful!";
pub const UPLOAD_FAILURE_MESSAGE: &str = "Upload failed. Please try again.";

/// Why a candidate was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    InvalidType,
    TooLarge,
}

impl Violation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidType => "invalid_type",
            Self::TooLarge => "too_large",
        }
    }

    /// Message shown to the user
    pub fn message(&self) -> String {
        match self {
            Self::InvalidType => "Invalid file type. Please upload a CSV file.".to_string(),
            Self::TooLarge => format!(
                "File too large. Maximum size is {} MB.",
                MAX_UPLOAD_SIZE / 1024 / 1024
            ),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Outcome of validating a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "violation", rename_all = "snake_case")]
pub enum Verdict {
    Acceptable,
    Rejected(Violation),
}

impl Verdict {
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::Acceptable)
    }

    pub fn violation(&self) -> Option<Violation> {
        match self {
            Self::Acceptable => None,
            Self::Rejected(v) => Some(*v),
        }
    }
}

/// Fixed upload acceptance rules
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadPolicy;

impl UploadPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether a candidate may be submitted
    ///
    /// Type is checked before size, so an oversized `.txt` is `InvalidType`.
    pub fn validate(&self, candidate: &UploadCandidate) -> Verdict {
        let verdict = if !Self::type_allowed(candidate) {
            Verdict::Rejected(Violation::InvalidType)
        } else if candidate.size_bytes > MAX_UPLOAD_SIZE {
            Verdict::Rejected(Violation::TooLarge)
        } else {
            Verdict::Acceptable
        };

        debug!(
            name = %candidate.name,
            media_type = %candidate.declared_media_type,
            size_bytes = candidate.size_bytes,
            ?verdict,
            "Validated upload candidate"
        );
        verdict
    }

    fn type_allowed(candidate: &UploadCandidate) -> bool {
        if ALLOWED_MEDIA_TYPES.contains(&candidate.declared_media_type.as_str()) {
            return true;
        }
        candidate
            .extension()
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Where the upload flow currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    /// A validated candidate is held and may be submitted
    Ready,
    Rejected(Violation),
    Submitting,
    Succeeded,
    Failed,
}

/// Inputs to the upload flow
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// The user picked a file
    Selected(UploadCandidate),
    /// The user cleared the picker
    Cleared,
    /// The user triggered submission; carries the file as observed now
    SubmitRequested(UploadCandidate),
    SubmitSucceeded,
    SubmitFailed,
}

/// Upload flow state
///
/// Only holds a candidate that passed validation. Every rejection and every
/// finished submission drops it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadState {
    selected: Option<UploadCandidate>,
    pub phase: UploadPhase,
    pub message: Option<String>,
}

impl UploadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&UploadCandidate> {
        self.selected.as_ref()
    }

    /// Candidate to hand to the ingestion backend, only while submitting
    pub fn pending_submission(&self) -> Option<&UploadCandidate> {
        match self.phase {
            UploadPhase::Submitting => self.selected.as_ref(),
            _ => None,
        }
    }

    /// Whether the submit trigger should be enabled
    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && self.phase != UploadPhase::Submitting
    }

    pub fn apply(self, event: UploadEvent) -> Self {
        let policy = UploadPolicy::new();
        match event {
            UploadEvent::Selected(candidate) => match policy.validate(&candidate) {
                Verdict::Acceptable => Self {
                    selected: Some(candidate),
                    phase: UploadPhase::Ready,
                    message: None,
                },
                Verdict::Rejected(violation) => Self::rejected(violation),
            },
            UploadEvent::Cleared => Self::default(),
            UploadEvent::SubmitRequested(current) => {
                if !self.can_submit() {
                    debug!(phase = ?self.phase, "Ignoring submit request");
                    return self;
                }
                match policy.validate(&current) {
                    Verdict::Acceptable => Self {
                        selected: Some(current),
                        phase: UploadPhase::Submitting,
                        message: None,
                    },
                    Verdict::Rejected(violation) => {
                        info!(name = %current.name, %violation, "File changed since selection");
                        Self::rejected(violation)
                    }
                }
            }
            UploadEvent::SubmitSucceeded => Self {
                selected: None,
                phase: UploadPhase::Succeeded,
                message: Some(UPLOAD_SUCCESS_MESSAGE.to_string()),
            },
            UploadEvent::SubmitFailed => Self {
                selected: None,
                phase: UploadPhase::Failed,
                message: Some(UPLOAD_FAILURE_MESSAGE.to_string()),
            },
        }
    }

    fn rejected(violation: Violation) -> Self {
        Self {
            selected: None,
            phase: UploadPhase::Rejected(violation),
            message: Some(violation.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(size: u64) -> UploadCandidate {
        UploadCandidate::new("statement.csv", "text/csv", size)
    }

    #[test]
    fn test_extension_overrides_unknown_media_type() {
        let candidate = UploadCandidate::new("data.CSV", "application/octet-stream", 1000);
        assert_eq!(UploadPolicy::new().validate(&candidate), Verdict::Acceptable);
    }

    #[test]
    fn test_media_type_overrides_extension() {
        let excel = UploadCandidate::new("export", "application/vnd.ms-excel", 10);
        assert!(UploadPolicy::new().validate(&excel).is_acceptable());

        let csv = UploadCandidate::new("export.dat", "text/csv", 10);
        assert!(UploadPolicy::new().validate(&csv).is_acceptable());
    }

    #[test]
    fn test_media_type_must_match_exactly() {
        for media_type in ["Text/CSV; charset=utf-8", "text/csv; charset=utf-8", "TEXT/CSV"] {
            let candidate = UploadCandidate::new("export.dat", media_type, 10);
            assert_eq!(
                UploadPolicy::new().validate(&candidate),
                Verdict::Rejected(Violation::InvalidType),
                "{media_type}"
            );
        }

        // The extension alternative still applies
        let candidate = UploadCandidate::new("export.csv", "Text/CSV; charset=utf-8", 10);
        assert!(UploadPolicy::new().validate(&candidate).is_acceptable());
    }

    #[test]
    fn test_size_boundary() {
        let policy = UploadPolicy::new();
        assert_eq!(policy.validate(&csv(5 * 1024 * 1024)), Verdict::Acceptable);
        assert_eq!(
            policy.validate(&csv(5 * 1024 * 1024 + 1)),
            Verdict::Rejected(Violation::TooLarge)
        );
        assert_eq!(policy.validate(&csv(0)), Verdict::Acceptable);
    }

    #[test]
    fn test_invalid_type() {
        let candidate = UploadCandidate::new("data.txt", "text/plain", 100);
        assert_eq!(
            UploadPolicy::new().validate(&candidate),
            Verdict::Rejected(Violation::InvalidType)
        );
    }

    #[test]
    fn test_no_extension_unknown_type() {
        let candidate = UploadCandidate::new("csv", "", 100);
        assert_eq!(
            UploadPolicy::new().validate(&candidate).violation(),
            Some(Violation::InvalidType)
        );
    }

    #[test]
    fn test_type_checked_before_size() {
        let candidate = UploadCandidate::new("huge.txt", "text/plain", MAX_UPLOAD_SIZE * 4);
        assert_eq!(
            UploadPolicy::new().validate(&candidate).violation(),
            Some(Violation::InvalidType)
        );
    }

    #[test]
    fn test_violation_messages() {
        assert_eq!(
            Violation::InvalidType.message(),
            "Invalid file type. Please upload a CSV file."
        );
        assert_eq!(
            Violation::TooLarge.message(),
            "File too large. Maximum size is 5 MB."
        );
    }

    #[test]
    fn test_verdict_serialization() {
        let json = serde_json::to_value(Verdict::Rejected(Violation::TooLarge)).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["violation"], "too_large");

        let json = serde_json::to_value(Verdict::Acceptable).unwrap();
        assert_eq!(json["status"], "acceptable");
    }

    #[test]
    fn test_select_valid_file() {
        let state = UploadState::new().apply(UploadEvent::Selected(csv(100)));
        assert_eq!(state.phase, UploadPhase::Ready);
        assert_eq!(state.selected(), Some(&csv(100)));
        assert!(state.can_submit());
        assert!(state.pending_submission().is_none());
    }

    #[test]
    fn test_rejected_selection_clears_previous_candidate() {
        let state = UploadState::new()
            .apply(UploadEvent::Selected(csv(100)))
            .apply(UploadEvent::Selected(UploadCandidate::new(
                "photo.png",
                "image/png",
                100,
            )));

        assert_eq!(state.phase, UploadPhase::Rejected(Violation::InvalidType));
        assert!(state.selected().is_none());
        assert!(!state.can_submit());
        assert_eq!(
            state.message.as_deref(),
            Some("Invalid file type. Please upload a CSV file.")
        );
    }

    #[test]
    fn test_submit_revalidates_changed_file() {
        let state = UploadState::new()
            .apply(UploadEvent::Selected(csv(100)))
            .apply(UploadEvent::SubmitRequested(csv(MAX_UPLOAD_SIZE + 1)));

        assert_eq!(state.phase, UploadPhase::Rejected(Violation::TooLarge));
        assert!(state.selected().is_none());
        assert!(state.pending_submission().is_none());
    }

    #[test]
    fn test_submit_uses_current_candidate() {
        let state = UploadState::new()
            .apply(UploadEvent::Selected(csv(100)))
            .apply(UploadEvent::SubmitRequested(csv(250)));

        assert_eq!(state.phase, UploadPhase::Submitting);
        assert_eq!(state.pending_submission(), Some(&csv(250)));
    }

    #[test]
    fn test_submit_without_selection_is_ignored() {
        let state = UploadState::new().apply(UploadEvent::SubmitRequested(csv(100)));
        assert_eq!(state, UploadState::new());
    }

    #[test]
    fn test_submit_while_submitting_is_ignored() {
        let submitting = UploadState::new()
            .apply(UploadEvent::Selected(csv(100)))
            .apply(UploadEvent::SubmitRequested(csv(100)));
        let again = submitting.clone().apply(UploadEvent::SubmitRequested(csv(999)));
        assert_eq!(again, submitting);
    }

    #[test]
    fn test_outcomes_drop_candidate() {
        let submitting = UploadState::new()
            .apply(UploadEvent::Selected(csv(100)))
            .apply(UploadEvent::SubmitRequested(csv(100)));

        let ok = submitting.clone().apply(UploadEvent::SubmitSucceeded);
        assert_eq!(ok.phase, UploadPhase::Succeeded);
        assert!(ok.selected().is_none());
        assert_eq!(ok.message.as_deref(), Some(UPLOAD_SUCCESS_MESSAGE));

        let failed = submitting.apply(UploadEvent::SubmitFailed);
        assert_eq!(failed.phase, UploadPhase::Failed);
        assert!(failed.selected().is_none());
        assert_eq!(failed.message.as_deref(), Some(UPLOAD_FAILURE_MESSAGE));
    }

    #[test]
    fn test_cleared_resets() {
        let state = UploadState::new()
            .apply(UploadEvent::Selected(csv(100)))
            .apply(UploadEvent::Cleared);
        assert_eq!(state, UploadState::new());
    }
}
