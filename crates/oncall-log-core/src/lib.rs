//! OnCall Log Core Library
//!
//! Entry wizard for on-call pharmacist logs: a three-step form with
//! per-step gates, asynchronous patient lookups that tolerate out-of-order
//! responses, and a single guarded submission.
//!
//! # Architecture
//!
//! ```text
//!   Step 1: call context ──gate──▶ Step 2: clinical detail ──gate──▶ Step 3: resolution
//!                                     │            │                          │
//!                               DrugLookup   PatientDirectory            gate + submit
//!                            (lazy search)  (tagged by patient ID,             │
//!                                            stale replies dropped)            ▼
//!                                                                       SubmissionSink
//!                                                                  ┌──────────┴──────────┐
//!                                                               Submitted           SubmitFailed
//!                                                            (draft discarded)   (draft kept, retry)
//! ```
//!
//! # Modules
//!
//! - [`wizard`]: The step state machine and its validation gates
//! - [`models`]: Domain types (DraftLogEntry, DrugRecord, CallLog, etc.)
//! - [`lookup`]: Drug search and patient directory collaborators
//! - [`submission`]: Submission sink and stored-record digests
//! - [`session`]: Async driver wiring a wizard to its collaborators
//! - [`access`]: Roles and capabilities
//! - [`config`]: Option lists and limits

pub mod access;
pub mod config;
pub mod lookup;
pub mod models;
pub mod session;
pub mod submission;
pub mod wizard;

// Re-export commonly used types
pub use access::{Author, Capability, Role};
pub use config::WizardConfig;
pub use lookup::{
    DrugLookup, LookupError, PatientDirectory, StaticDrugCatalog, StaticPatientDirectory,
};
pub use models::{
    CallLog, DraftLogEntry, DrugRecord, FieldUpdate, FlagField, LogStatus, PatientDemographics,
    SubmissionReceipt, TextField, UrgencyLevel,
};
pub use session::{SessionAdvance, WizardSession};
pub use submission::{InMemorySubmissionSink, SubmissionError, SubmissionSink};
pub use wizard::{Advance, LogWizard, Step, WizardError, WizardState};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use uuid::Uuid;

use lookup::PatientLookupResponse;
use wizard::PatientLookupOutcome;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum OnCallLogError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Lookup error: {0}")]
    LookupError(String),

    #[error("Submission error: {0}")]
    SubmissionError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Wizard error: {0}")]
    WizardError(String),
}

impl From<WizardError> for OnCallLogError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::Validation(v) => OnCallLogError::ValidationError(v.to_string()),
            WizardError::Submission(s) => OnCallLogError::SubmissionError(s.to_string()),
            other => OnCallLogError::WizardError(other.to_string()),
        }
    }
}

impl From<LookupError> for OnCallLogError {
    fn from(e: LookupError) -> Self {
        OnCallLogError::LookupError(e.to_string())
    }
}

impl From<SubmissionError> for OnCallLogError {
    fn from(e: SubmissionError) -> Self {
        OnCallLogError::SubmissionError(e.to_string())
    }
}

impl From<serde_json::Error> for OnCallLogError {
    fn from(e: serde_json::Error) -> Self {
        OnCallLogError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for OnCallLogError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        OnCallLogError::WizardError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create a wizard with default options and the built-in drug catalog.
#[uniffi::export]
pub fn new_log_wizard() -> Arc<LogWizardHandle> {
    Arc::new(LogWizardHandle::new(WizardConfig::default()))
}

/// Create a wizard from a JSON config.
#[uniffi::export]
pub fn new_log_wizard_with_config(
    config_json: String,
) -> Result<Arc<LogWizardHandle>, OnCallLogError> {
    let config = WizardConfig::from_json(&config_json)?;
    Ok(Arc::new(LogWizardHandle::new(config)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe wizard wrapper for FFI.
///
/// The host performs patient lookups and submissions itself and reports the
/// results back: `set_text` returns the patient ID to look up, `advance`
/// returns a submission ID and draft JSON to submit.
#[derive(uniffi::Object)]
pub struct LogWizardHandle {
    wizard: Mutex<LogWizard>,
    drugs: StaticDrugCatalog,
}

impl LogWizardHandle {
    fn new(config: WizardConfig) -> Self {
        Self {
            wizard: Mutex::new(LogWizard::new(config)),
            drugs: StaticDrugCatalog::default(),
        }
    }
}

#[uniffi::export]
impl LogWizardHandle {
    // =========================================================================
    // State
    // =========================================================================

    /// Current step number (1-3).
    pub fn current_step(&self) -> Result<u8, OnCallLogError> {
        Ok(self.wizard.lock()?.step().number())
    }

    pub fn state(&self) -> Result<FfiWizardState, OnCallLogError> {
        Ok(self.wizard.lock()?.state().into())
    }

    /// Draft as JSON, using the form's field names.
    pub fn draft_json(&self) -> Result<String, OnCallLogError> {
        let wizard = self.wizard.lock()?;
        Ok(serde_json::to_string(wizard.draft())?)
    }

    /// Teams that can be notified.
    pub fn notify_team_options(&self) -> Result<Vec<String>, OnCallLogError> {
        Ok(self.wizard.lock()?.config().notify_teams.clone())
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Set a text field. Returns a patient ID when a lookup should start.
    pub fn set_text(
        &self,
        field: FfiTextField,
        value: String,
    ) -> Result<Option<String>, OnCallLogError> {
        let mut wizard = self.wizard.lock()?;
        let ticket = wizard.update_field(FieldUpdate::Text(field.into(), value));
        Ok(ticket.map(|t| t.patient_id))
    }

    pub fn set_flag(&self, field: FfiFlagField, value: bool) -> Result<(), OnCallLogError> {
        let mut wizard = self.wizard.lock()?;
        wizard.update_field(FieldUpdate::Flag(field.into(), value));
        Ok(())
    }

    pub fn set_urgency(&self, level: FfiUrgencyLevel) -> Result<(), OnCallLogError> {
        let mut wizard = self.wizard.lock()?;
        wizard.update_field(FieldUpdate::Urgency(level.into()));
        Ok(())
    }

    /// Search the drug catalog, replacing previous results.
    pub fn search_drugs(&self, term: String) -> Result<Vec<FfiDrug>, OnCallLogError> {
        let mut wizard = self.wizard.lock()?;
        let results = wizard.search_drugs(&self.drugs, &term)?;
        Ok(results.iter().cloned().map(FfiDrug::from).collect())
    }

    /// Select a search result by position.
    pub fn select_search_result(&self, index: u32) -> Result<Option<FfiDrug>, OnCallLogError> {
        let mut wizard = self.wizard.lock()?;
        Ok(wizard
            .select_search_result(index as usize)
            .map(FfiDrug::from))
    }

    /// Toggle a notification team. Returns whether it is now selected.
    pub fn toggle_team(&self, team: String) -> Result<bool, OnCallLogError> {
        Ok(self.wizard.lock()?.toggle_team(&team))
    }

    /// Apply demographics the host fetched. Returns false if stale.
    pub fn apply_patient_details(
        &self,
        details: FfiPatientDetails,
    ) -> Result<bool, OnCallLogError> {
        let date_of_birth = NaiveDate::parse_from_str(&details.date_of_birth, models::DOB_FORMAT)
            .map_err(|e| {
            OnCallLogError::InvalidInput(format!(
                "date of birth {:?}: {}",
                details.date_of_birth, e
            ))
        })?;

        let response = PatientLookupResponse {
            patient_id: details.patient_id,
            result: Ok(PatientDemographics::new(
                details.name,
                date_of_birth,
                details.ward,
            )),
        };

        let mut wizard = self.wizard.lock()?;
        Ok(wizard.apply_patient_lookup(response) == PatientLookupOutcome::Applied)
    }

    /// Report that the host's patient lookup failed.
    pub fn report_patient_lookup_failure(
        &self,
        patient_id: String,
        message: String,
    ) -> Result<(), OnCallLogError> {
        let response = PatientLookupResponse {
            patient_id,
            result: Err(LookupError::Unavailable(message)),
        };
        self.wizard.lock()?.apply_patient_lookup(response);
        Ok(())
    }

    // =========================================================================
    // Navigation & Submission
    // =========================================================================

    /// Whether a step (1-3) passes its gate.
    pub fn validate_step(&self, step: u8) -> Result<bool, OnCallLogError> {
        let step = Step::from_number(step)
            .ok_or_else(|| OnCallLogError::InvalidInput(format!("no step {}", step)))?;
        Ok(self.wizard.lock()?.validate_step(step))
    }

    pub fn advance(&self) -> Result<FfiAdvance, OnCallLogError> {
        let mut wizard = self.wizard.lock()?;
        match wizard.advance()? {
            Advance::Moved(step) => Ok(FfiAdvance {
                step: step.number(),
                submission_id: None,
                draft_json: None,
            }),
            Advance::Submit(ticket) => Ok(FfiAdvance {
                step: Step::Resolution.number(),
                submission_id: Some(ticket.id.to_string()),
                draft_json: Some(serde_json::to_string(&ticket.draft)?),
            }),
        }
    }

    /// Step back. Returns the step now shown.
    pub fn retreat(&self) -> Result<u8, OnCallLogError> {
        Ok(self.wizard.lock()?.retreat().number())
    }

    /// Report the outcome of a host-performed submission.
    pub fn complete_submission(
        &self,
        submission_id: String,
        outcome: FfiSubmissionOutcome,
    ) -> Result<FfiWizardState, OnCallLogError> {
        let id = Uuid::parse_str(&submission_id)
            .map_err(|e| OnCallLogError::InvalidInput(format!("submission id: {}", e)))?;

        let result = match outcome {
            FfiSubmissionOutcome::Stored { log_id, digest } => Ok(SubmissionReceipt {
                log_id,
                digest,
                submitted_at: chrono::Utc::now(),
            }),
            FfiSubmissionOutcome::Failed { message } => Err(SubmissionError::Unavailable(message)),
        };

        let mut wizard = self.wizard.lock()?;
        wizard.complete_submission(id, result)?;
        Ok(wizard.state().into())
    }

    /// Discard the current log and start again on step 1.
    pub fn start_new_log(&self) -> Result<(), OnCallLogError> {
        self.wizard.lock()?.start_new_log();
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe wizard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiWizardState {
    Editing,
    Submitting,
    Submitted,
    SubmitFailed,
}

impl From<WizardState> for FfiWizardState {
    fn from(state: WizardState) -> Self {
        match state {
            WizardState::Editing(_) => FfiWizardState::Editing,
            WizardState::Submitting => FfiWizardState::Submitting,
            WizardState::Submitted => FfiWizardState::Submitted,
            WizardState::SubmitFailed => FfiWizardState::SubmitFailed,
        }
    }
}

/// FFI-safe text field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiTextField {
    TimeOfCall,
    Site,
    CallerName,
    CallerDesignation,
    MeetsCriteria,
    RequestType,
    ClinicDepartment,
    InquiryDetails,
    PatientId,
    PatientName,
    PatientDob,
    PatientWard,
    ClinicalImpact,
    InterventionType,
    TimeSpent,
    MilesTraveled,
    RestTime,
    FollowUpDate,
    Resolution,
}

impl From<FfiTextField> for TextField {
    fn from(field: FfiTextField) -> Self {
        match field {
            FfiTextField::TimeOfCall => TextField::TimeOfCall,
            FfiTextField::Site => TextField::Site,
            FfiTextField::CallerName => TextField::CallerName,
            FfiTextField::CallerDesignation => TextField::CallerDesignation,
            FfiTextField::MeetsCriteria => TextField::MeetsCriteria,
            FfiTextField::RequestType => TextField::RequestType,
            FfiTextField::ClinicDepartment => TextField::ClinicDepartment,
            FfiTextField::InquiryDetails => TextField::InquiryDetails,
            FfiTextField::PatientId => TextField::PatientId,
            FfiTextField::PatientName => TextField::PatientName,
            FfiTextField::PatientDob => TextField::PatientDob,
            FfiTextField::PatientWard => TextField::PatientWard,
            FfiTextField::ClinicalImpact => TextField::ClinicalImpact,
            FfiTextField::InterventionType => TextField::InterventionType,
            FfiTextField::TimeSpent => TextField::TimeSpent,
            FfiTextField::MilesTraveled => TextField::MilesTraveled,
            FfiTextField::RestTime => TextField::RestTime,
            FfiTextField::FollowUpDate => TextField::FollowUpDate,
            FfiTextField::Resolution => TextField::Resolution,
        }
    }
}

/// FFI-safe yes/no field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiFlagField {
    PeerReview,
    HospitalVisit,
    CompensatoryRest,
    CallTriage,
    SiteManagerReview,
    FollowUpRequired,
}

impl From<FfiFlagField> for FlagField {
    fn from(field: FfiFlagField) -> Self {
        match field {
            FfiFlagField::PeerReview => FlagField::PeerReview,
            FfiFlagField::HospitalVisit => FlagField::HospitalVisit,
            FfiFlagField::CompensatoryRest => FlagField::CompensatoryRest,
            FfiFlagField::CallTriage => FlagField::CallTriage,
            FfiFlagField::SiteManagerReview => FlagField::SiteManagerReview,
            FfiFlagField::FollowUpRequired => FlagField::FollowUpRequired,
        }
    }
}

/// FFI-safe urgency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiUrgencyLevel {
    Low,
    Normal,
    High,
    Emergency,
}

impl From<FfiUrgencyLevel> for UrgencyLevel {
    fn from(level: FfiUrgencyLevel) -> Self {
        match level {
            FfiUrgencyLevel::Low => UrgencyLevel::Low,
            FfiUrgencyLevel::Normal => UrgencyLevel::Normal,
            FfiUrgencyLevel::High => UrgencyLevel::High,
            FfiUrgencyLevel::Emergency => UrgencyLevel::Emergency,
        }
    }
}

/// FFI-safe drug record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDrug {
    pub id: u32,
    pub name: String,
    pub code: String,
    pub classification: String,
}

impl From<DrugRecord> for FfiDrug {
    fn from(drug: DrugRecord) -> Self {
        Self {
            id: drug.id,
            name: drug.name,
            code: drug.code,
            classification: drug.classification,
        }
    }
}

/// FFI-safe patient details from a host lookup.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientDetails {
    pub patient_id: String,
    pub name: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    pub ward: String,
}

/// FFI-safe advance result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAdvance {
    pub step: u8,
    /// Set when the host should now submit `draft_json`
    pub submission_id: Option<String>,
    pub draft_json: Option<String>,
}

/// FFI-safe submission outcome.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiSubmissionOutcome {
    Stored { log_id: String, digest: String },
    Failed { message: String },
}
