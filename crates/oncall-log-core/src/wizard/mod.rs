//! The three-step log entry wizard.
//!
//! ```text
//!   Step 1 ⇄ Step 2 ⇄ Step 3 ──advance──▶ Submitting ──ok──▶ Submitted
//!  (call)   (clinical) (resolution)          │
//!                                            └──err──▶ SubmitFailed ──retry──▶ Submitting
//!                                                           │
//!                                                         edit ──▶ Step 3
//! ```
//!
//! Forward moves are gated by [`check_step`]; backward moves never are.
//!
//! The wizard performs no I/O. Submitting hands out a [`SubmissionTicket`]
//! that the caller sends to a [`crate::submission::SubmissionSink`] and
//! reports back through [`LogWizard::complete_submission`]. Patient lookups
//! work the same way with [`PatientLookupTicket`]s. [`crate::WizardSession`]
//! wires both to real collaborators.

mod validation;

pub use validation::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::access::{Capability, Role};
use crate::config::WizardConfig;
use crate::lookup::{
    DrugLookup, LookupError, LookupResult, PatientLookupResponse, PatientLookupTicket,
};
use crate::models::{DraftLogEntry, DrugRecord, FieldUpdate, SubmissionReceipt, TextField};
use crate::submission::SubmissionError;

/// Wizard errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("No submission is in progress")]
    NotSubmitting,

    #[error("Unknown submission: {0}")]
    UnknownSubmission(Uuid),

    #[error("This log has already been submitted")]
    AlreadySubmitted,

    #[error("Logs can only be submitted from step 3 (currently on step {})", .0.number())]
    NotOnFinalStep(Step),

    #[error("Failed to create on-call log: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Role {role} is not allowed to {capability:?}")]
    AccessDenied { role: Role, capability: Capability },
}

pub type WizardResult<T> = Result<T, WizardError>;

/// A wizard step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Step 1: who called, from where, about what
    CallContext,
    /// Step 2: inquiry, patient and drugs
    ClinicalDetail,
    /// Step 3: time spent, follow-up and outcome
    Resolution,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::CallContext, Step::ClinicalDetail, Step::Resolution];

    /// 1-based step number.
    pub fn number(&self) -> u8 {
        match self {
            Step::CallContext => 1,
            Step::ClinicalDetail => 2,
            Step::Resolution => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Step> {
        match n {
            1 => Some(Step::CallContext),
            2 => Some(Step::ClinicalDetail),
            3 => Some(Step::Resolution),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Step> {
        Step::from_number(self.number() + 1)
    }

    pub fn previous(&self) -> Option<Step> {
        self.number().checked_sub(1).and_then(Step::from_number)
    }

    /// Heading shown for the step.
    pub fn description(&self) -> &'static str {
        match self {
            Step::CallContext => "Enter basic call details",
            Step::ClinicalDetail => "Add patient and drug information",
            Step::Resolution => "Complete final details",
        }
    }
}

/// Where the wizard is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WizardState {
    Editing(Step),
    Submitting,
    Submitted,
    SubmitFailed,
}

/// Result of a successful [`LogWizard::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved forward to this step
    Moved(Step),
    /// Left step 3; the ticket must be sent to a submission sink
    Submit(SubmissionTicket),
}

/// A snapshot of the draft handed out for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionTicket {
    pub id: Uuid,
    pub draft: DraftLogEntry,
}

/// Non-blocking message for the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Patient name, date of birth and ward were filled in
    PatientDetailsLoaded { patient_id: String },
    /// A lookup failed; the draft was left as it was
    LookupFailed(String),
}

/// What happened to a patient lookup response.
#[derive(Debug, Clone, PartialEq)]
pub enum PatientLookupOutcome {
    /// Demographics were written into the draft
    Applied,
    /// The draft's patient ID had moved on, or the draft is locked; response dropped
    Stale,
    /// The lookup failed; demographics left as they were
    Failed(LookupError),
}

/// Multi-step editor for one on-call log.
#[derive(Debug, Clone)]
pub struct LogWizard {
    config: WizardConfig,
    state: WizardState,
    draft: DraftLogEntry,
    search_results: Vec<DrugRecord>,
    in_flight: Option<Uuid>,
    receipt: Option<SubmissionReceipt>,
    submission_error: Option<SubmissionError>,
    notice: Option<Notice>,
}

impl Default for LogWizard {
    fn default() -> Self {
        Self::new(WizardConfig::default())
    }
}

impl LogWizard {
    /// Create a wizard on step 1 with an empty draft.
    pub fn new(config: WizardConfig) -> Self {
        Self {
            config,
            state: WizardState::Editing(Step::CallContext),
            draft: DraftLogEntry::new(),
            search_results: Vec::new(),
            in_flight: None,
            receipt: None,
            submission_error: None,
            notice: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> WizardState {
        self.state
    }

    /// The step on screen. Submission states show step 3.
    pub fn step(&self) -> Step {
        match self.state {
            WizardState::Editing(step) => step,
            _ => Step::Resolution,
        }
    }

    pub fn draft(&self) -> &DraftLogEntry {
        &self.draft
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    /// Results of the latest drug search.
    pub fn search_results(&self) -> &[DrugRecord] {
        &self.search_results
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Receipt of the submission that closed this wizard.
    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    /// Why the last submission failed, while in `SubmitFailed`.
    pub fn submission_error(&self) -> Option<&SubmissionError> {
        self.submission_error.as_ref()
    }

    /// Whether the submit control should be disabled.
    pub fn is_submitting(&self) -> bool {
        self.state == WizardState::Submitting
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Replace one draft field.
    ///
    /// Returns a lookup ticket when the patient ID changed to a non-blank
    /// value. Edits after a failed submission return the wizard to step 3.
    /// Edits while submitting or after a successful submission are ignored.
    pub fn update_field(&mut self, update: FieldUpdate) -> Option<PatientLookupTicket> {
        if self.is_locked() {
            tracing::warn!(state = ?self.state, "ignoring edit while the log is locked");
            return None;
        }

        let ticket = match &update {
            FieldUpdate::Text(TextField::PatientId, value)
                if *value != self.draft.patient_id && !value.trim().is_empty() =>
            {
                Some(PatientLookupTicket {
                    patient_id: value.clone(),
                })
            }
            _ => None,
        };

        self.draft.apply(update);
        self.leave_failed_state();

        if let Some(ticket) = &ticket {
            tracing::debug!(patient_id = %ticket.patient_id, "patient lookup requested");
        }
        ticket
    }

    /// Append a drug to the selection and clear the search results.
    pub fn select_drug(&mut self, drug: DrugRecord) {
        if self.is_locked() {
            tracing::warn!(state = ?self.state, "ignoring drug selection while the log is locked");
            return;
        }
        tracing::debug!(code = %drug.code, "drug selected");
        self.draft.push_drug(drug);
        self.search_results.clear();
        self.leave_failed_state();
    }

    /// Run a drug search, replacing any previous results.
    ///
    /// A blank term clears the results. Other lookup failures clear them too
    /// and raise a [`Notice::LookupFailed`].
    pub fn search_drugs(
        &mut self,
        lookup: &dyn DrugLookup,
        term: &str,
    ) -> LookupResult<&[DrugRecord]> {
        self.search_results.clear();

        match lookup.search(term) {
            Ok(matches) => {
                self.search_results
                    .extend(matches.take(self.config.max_drug_results));
                Ok(self.search_results.as_slice())
            }
            Err(LookupError::EmptyQuery) => Ok(self.search_results.as_slice()),
            Err(e) => {
                tracing::warn!(error = %e, "drug search failed");
                self.notice = Some(Notice::LookupFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Select one of the current search results by position.
    pub fn select_search_result(&mut self, index: usize) -> Option<DrugRecord> {
        let drug = self.search_results.get(index)?.clone();
        self.select_drug(drug.clone());
        Some(drug)
    }

    /// Add the team to the notification set, or remove it if present.
    ///
    /// Returns whether the team is selected afterwards.
    pub fn toggle_team(&mut self, team: &str) -> bool {
        if self.is_locked() {
            tracing::warn!(state = ?self.state, "ignoring team toggle while the log is locked");
            return self.draft.notify_teams.contains(team);
        }
        if !self.config.is_known_team(team) {
            tracing::debug!(team, "toggling team outside the configured list");
        }
        let selected = self.draft.toggle_team(team);
        self.leave_failed_state();
        selected
    }

    /// Apply a patient lookup response if it still matches the draft.
    pub fn apply_patient_lookup(&mut self, response: PatientLookupResponse) -> PatientLookupOutcome {
        if self.is_locked() || response.patient_id != self.draft.patient_id {
            tracing::debug!(
                patient_id = %response.patient_id,
                "discarding stale patient lookup"
            );
            return PatientLookupOutcome::Stale;
        }

        match response.result {
            Ok(patient) => {
                self.draft.patient_name = patient.name.clone();
                self.draft.patient_dob = patient.formatted_dob();
                self.draft.patient_ward = patient.ward.clone();
                self.notice = Some(Notice::PatientDetailsLoaded {
                    patient_id: response.patient_id,
                });
                PatientLookupOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(patient_id = %response.patient_id, error = %e, "patient lookup failed");
                self.notice = Some(Notice::LookupFailed(e.to_string()));
                PatientLookupOutcome::Failed(e)
            }
        }
    }

    /// The draft cannot change while a submission is in flight or done.
    fn is_locked(&self) -> bool {
        matches!(self.state, WizardState::Submitting | WizardState::Submitted)
    }

    fn leave_failed_state(&mut self) {
        if self.state == WizardState::SubmitFailed {
            self.state = WizardState::Editing(Step::Resolution);
            self.submission_error = None;
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Check a step's gate against the current draft.
    pub fn check_step(&self, step: Step) -> Result<(), ValidationError> {
        check_step(&self.draft, step)
    }

    /// Whether a step's gate passes.
    pub fn validate_step(&self, step: Step) -> bool {
        validate_step(&self.draft, step)
    }

    /// Move forward, or submit when leaving step 3.
    ///
    /// A failed gate leaves the wizard where it was.
    pub fn advance(&mut self) -> WizardResult<Advance> {
        match self.state {
            WizardState::Editing(step) => match step.next() {
                Some(next) => {
                    self.check_step(step).map_err(|e| {
                        tracing::debug!(step = step.number(), error = %e, "step gate failed");
                        e
                    })?;
                    self.state = WizardState::Editing(next);
                    tracing::debug!(step = next.number(), "advanced");
                    Ok(Advance::Moved(next))
                }
                None => self.submit().map(Advance::Submit),
            },
            WizardState::SubmitFailed => self.submit().map(Advance::Submit),
            WizardState::Submitting => Err(WizardError::SubmissionInFlight),
            WizardState::Submitted => Err(WizardError::AlreadySubmitted),
        }
    }

    /// Move back one step. Never validates; a no-op on step 1 and while
    /// submitting or submitted.
    pub fn retreat(&mut self) -> Step {
        match self.state {
            WizardState::Editing(step) => {
                if let Some(previous) = step.previous() {
                    self.state = WizardState::Editing(previous);
                }
            }
            WizardState::SubmitFailed => {
                self.state = WizardState::Editing(Step::ClinicalDetail);
                self.submission_error = None;
            }
            WizardState::Submitting | WizardState::Submitted => {}
        }
        self.step()
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Start a submission from step 3 or after a failed attempt.
    pub fn submit(&mut self) -> WizardResult<SubmissionTicket> {
        match self.state {
            WizardState::Editing(Step::Resolution) | WizardState::SubmitFailed => {}
            WizardState::Editing(step) => return Err(WizardError::NotOnFinalStep(step)),
            WizardState::Submitting => return Err(WizardError::SubmissionInFlight),
            WizardState::Submitted => return Err(WizardError::AlreadySubmitted),
        }

        self.check_step(Step::Resolution)?;

        let id = Uuid::new_v4();
        self.in_flight = Some(id);
        self.state = WizardState::Submitting;
        self.submission_error = None;
        tracing::info!(submission_id = %id, "submitting on-call log");

        Ok(SubmissionTicket {
            id,
            draft: self.draft.clone(),
        })
    }

    /// Record the outcome of a submission.
    ///
    /// On success the draft is discarded. On failure it is kept exactly as it
    /// was and the wizard moves to `SubmitFailed`.
    pub fn complete_submission(
        &mut self,
        id: Uuid,
        result: Result<SubmissionReceipt, SubmissionError>,
    ) -> WizardResult<()> {
        if self.state != WizardState::Submitting {
            return Err(WizardError::NotSubmitting);
        }
        if self.in_flight != Some(id) {
            return Err(WizardError::UnknownSubmission(id));
        }
        self.in_flight = None;

        match result {
            Ok(receipt) => {
                tracing::info!(submission_id = %id, log_id = %receipt.log_id, "on-call log submitted");
                self.state = WizardState::Submitted;
                self.draft = DraftLogEntry::new();
                self.search_results.clear();
                self.notice = None;
                self.receipt = Some(receipt);
            }
            Err(e) => {
                tracing::warn!(submission_id = %id, error = %e, "on-call log submission failed");
                self.state = WizardState::SubmitFailed;
                self.submission_error = Some(e);
            }
        }
        Ok(())
    }

    /// Give up on an in-flight submission whose outcome will never be
    /// reported, keeping the draft for a retry.
    ///
    /// Returns false if `id` is not the submission in flight.
    pub fn abandon_submission(&mut self, id: Uuid) -> bool {
        if self.state != WizardState::Submitting || self.in_flight != Some(id) {
            return false;
        }
        tracing::warn!(submission_id = %id, "on-call log submission abandoned");
        self.in_flight = None;
        self.state = WizardState::SubmitFailed;
        self.submission_error = Some(SubmissionError::Cancelled);
        true
    }

    /// Discard everything and start a fresh log on step 1.
    pub fn start_new_log(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
