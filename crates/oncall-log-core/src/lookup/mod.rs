//! Collaborators the wizard looks things up in.
//!
//! - [`DrugLookup`]: synchronous search returning a lazy result sequence
//! - [`PatientDirectory`]: asynchronous demographic resolution by patient ID
//!
//! Patient lookups are tagged with the patient ID that triggered them so a
//! late response for a superseded ID can be recognised and dropped.

mod drugs;
mod patients;

pub use drugs::*;
pub use patients::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DrugRecord, PatientDemographics};

/// Lookup errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Lookup service unavailable: {0}")]
    Unavailable(String),

    #[error("Search term is empty")]
    EmptyQuery,
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Lazy sequence of drug matches. Calling `search` again restarts it.
pub type DrugMatches<'a> = Box<dyn Iterator<Item = DrugRecord> + Send + 'a>;

/// Drug search backend.
pub trait DrugLookup: Send + Sync {
    /// Search drugs by name or code.
    fn search<'a>(&'a self, term: &str) -> LookupResult<DrugMatches<'a>>;
}

/// Patient demographics backend.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    /// Resolve a patient ID to demographics.
    async fn resolve(&self, patient_id: &str) -> LookupResult<PatientDemographics>;
}

/// A patient lookup issued for a specific patient ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientLookupTicket {
    pub patient_id: String,
}

/// The outcome of a patient lookup, still tagged with its patient ID.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientLookupResponse {
    pub patient_id: String,
    pub result: LookupResult<PatientDemographics>,
}

/// Run a ticket against a directory.
pub async fn resolve_ticket(
    directory: &dyn PatientDirectory,
    ticket: PatientLookupTicket,
) -> PatientLookupResponse {
    let result = directory.resolve(&ticket.patient_id).await;
    PatientLookupResponse {
        patient_id: ticket.patient_id,
        result,
    }
}
