//! Async driver tying a [`LogWizard`] to its collaborators.
//!
//! Patient lookups are detached from the session: [`WizardSession::lookup_patient`]
//! returns a `'static` future, so the caller can keep editing while it runs
//! and hand the response back with [`WizardSession::apply_patient_lookup`].
//! Submission holds the session for its duration, which keeps a second
//! submit from starting. Dropping a submit future before the sink answers
//! leaves the wizard in `SubmitFailed` with the draft intact.

use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

use crate::access::{Author, Capability};
use crate::config::WizardConfig;
use crate::lookup::{
    resolve_ticket, DrugLookup, LookupResult, PatientDirectory, PatientLookupResponse,
    PatientLookupTicket,
};
use crate::models::{DrugRecord, FieldUpdate, SubmissionReceipt};
use crate::submission::{SubmissionError, SubmissionSink};
use crate::wizard::{
    Advance, LogWizard, PatientLookupOutcome, Step, SubmissionTicket, WizardError, WizardResult,
};

/// Result of [`WizardSession::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAdvance {
    Moved(Step),
    Submitted(SubmissionReceipt),
}

/// One pharmacist's log entry session.
pub struct WizardSession {
    wizard: LogWizard,
    author: Author,
    drugs: Arc<dyn DrugLookup>,
    patients: Arc<dyn PatientDirectory>,
    sink: Arc<dyn SubmissionSink>,
}

impl WizardSession {
    /// Open a session for `author`, who must be allowed to create logs.
    pub fn new(
        config: WizardConfig,
        author: Author,
        drugs: Arc<dyn DrugLookup>,
        patients: Arc<dyn PatientDirectory>,
        sink: Arc<dyn SubmissionSink>,
    ) -> WizardResult<Self> {
        if !author.role.can(Capability::CreateLog) {
            return Err(WizardError::AccessDenied {
                role: author.role,
                capability: Capability::CreateLog,
            });
        }

        tracing::debug!(author = %author.name, role = %author.role, "opened log wizard");
        Ok(Self {
            wizard: LogWizard::new(config),
            author,
            drugs,
            patients,
            sink,
        })
    }

    pub fn wizard(&self) -> &LogWizard {
        &self.wizard
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn update_field(&mut self, update: FieldUpdate) -> Option<PatientLookupTicket> {
        self.wizard.update_field(update)
    }

    /// Resolve a ticket against the patient directory.
    pub fn lookup_patient(
        &self,
        ticket: PatientLookupTicket,
    ) -> impl Future<Output = PatientLookupResponse> + Send + 'static {
        let directory = Arc::clone(&self.patients);
        async move { resolve_ticket(directory.as_ref(), ticket).await }
    }

    pub fn apply_patient_lookup(&mut self, response: PatientLookupResponse) -> PatientLookupOutcome {
        self.wizard.apply_patient_lookup(response)
    }

    pub fn search_drugs(&mut self, term: &str) -> LookupResult<&[DrugRecord]> {
        self.wizard.search_drugs(self.drugs.as_ref(), term)
    }

    pub fn select_search_result(&mut self, index: usize) -> Option<DrugRecord> {
        self.wizard.select_search_result(index)
    }

    pub fn select_drug(&mut self, drug: DrugRecord) {
        self.wizard.select_drug(drug)
    }

    pub fn toggle_team(&mut self, team: &str) -> bool {
        self.wizard.toggle_team(team)
    }

    pub fn retreat(&mut self) -> Step {
        self.wizard.retreat()
    }

    /// Move forward; leaving step 3 submits and waits for the sink.
    pub async fn advance(&mut self) -> WizardResult<SessionAdvance> {
        match self.wizard.advance()? {
            Advance::Moved(step) => Ok(SessionAdvance::Moved(step)),
            Advance::Submit(ticket) => self.send(ticket).await.map(SessionAdvance::Submitted),
        }
    }

    /// Submit again after a failure.
    pub async fn retry_submit(&mut self) -> WizardResult<SubmissionReceipt> {
        let ticket = self.wizard.submit()?;
        self.send(ticket).await
    }

    /// Start a fresh log after a submission.
    pub fn start_new_log(&mut self) {
        self.wizard.start_new_log();
    }

    async fn send(&mut self, ticket: SubmissionTicket) -> WizardResult<SubmissionReceipt> {
        let pending = PendingSubmission {
            wizard: &mut self.wizard,
            id: Some(ticket.id),
        };
        let result = self.sink.submit(&self.author, &ticket.draft).await;
        pending.complete(result.clone())?;
        result.map_err(WizardError::from)
    }
}

/// Abandons the submission if the future driving it is dropped before the
/// sink answers, so the wizard does not stay in `Submitting`.
struct PendingSubmission<'a> {
    wizard: &'a mut LogWizard,
    id: Option<Uuid>,
}

impl PendingSubmission<'_> {
    fn complete(
        mut self,
        result: Result<SubmissionReceipt, SubmissionError>,
    ) -> WizardResult<()> {
        match self.id.take() {
            Some(id) => self.wizard.complete_submission(id, result),
            None => Err(WizardError::NotSubmitting),
        }
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.wizard.abandon_submission(id);
        }
    }
}
