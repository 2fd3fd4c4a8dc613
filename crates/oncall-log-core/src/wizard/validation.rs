//! Step gates.
//!
//! Each step has a presence check that must pass before the wizard moves
//! forward out of it:
//!
//! | Step | Required |
//! |---|---|
//! | 1 | time of call, site, caller name, caller designation, meets criteria, request type |
//! | 2 | inquiry details, and a patient ID or at least one drug |
//! | 3 | time spent, resolution |

use std::fmt;

use thiserror::Error;

use super::Step;
use crate::models::{DraftLogEntry, TextField};

const CALL_CONTEXT_REQUIRED: [TextField; 6] = [
    TextField::TimeOfCall,
    TextField::Site,
    TextField::CallerName,
    TextField::CallerDesignation,
    TextField::MeetsCriteria,
    TextField::RequestType,
];

const RESOLUTION_REQUIRED: [TextField; 2] = [TextField::TimeSpent, TextField::Resolution];

/// Something a step needs before it can be left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// A text field that must be filled in
    Field(TextField),
    /// Either a patient ID or at least one selected drug
    PatientOrDrug,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Field(field) => f.write_str(field.label()),
            Requirement::PatientOrDrug => f.write_str("Patient ID or at least one drug"),
        }
    }
}

/// A step gate did not pass.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "Please fill in all required fields before proceeding (step {}: {})",
    .step.number(),
    join(.missing)
)]
pub struct ValidationError {
    pub step: Step,
    pub missing: Vec<Requirement>,
}

fn join(missing: &[Requirement]) -> String {
    missing
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check a step's gate, listing everything that is missing.
pub fn check_step(draft: &DraftLogEntry, step: Step) -> Result<(), ValidationError> {
    let mut missing: Vec<Requirement> = Vec::new();

    match step {
        Step::CallContext => missing.extend(
            CALL_CONTEXT_REQUIRED
                .iter()
                .filter(|f| !draft.is_filled(**f))
                .map(|f| Requirement::Field(*f)),
        ),
        Step::ClinicalDetail => {
            if !draft.is_filled(TextField::InquiryDetails) {
                missing.push(Requirement::Field(TextField::InquiryDetails));
            }
            if !draft.is_filled(TextField::PatientId) && draft.selected_drugs.is_empty() {
                missing.push(Requirement::PatientOrDrug);
            }
        }
        Step::Resolution => missing.extend(
            RESOLUTION_REQUIRED
                .iter()
                .filter(|f| !draft.is_filled(**f))
                .map(|f| Requirement::Field(*f)),
        ),
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { step, missing })
    }
}

/// Whether a step's gate passes.
pub fn validate_step(draft: &DraftLogEntry, step: Step) -> bool {
    check_step(draft, step).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DrugRecord;

    fn make_call_context() -> DraftLogEntry {
        let mut draft = DraftLogEntry::new();
        draft.time_of_call = "2025-02-10T14:30".into();
        draft.site = "central".into();
        draft.caller_name = "Dr. Smith".into();
        draft.caller_designation = "doctor".into();
        draft.meets_criteria = "yes".into();
        draft.request_type = "medicine".into();
        draft
    }

    #[test]
    fn test_call_context_complete() {
        let draft = make_call_context();
        assert!(validate_step(&draft, Step::CallContext));
    }

    #[test]
    fn test_call_context_missing_caller() {
        let mut draft = make_call_context();
        draft.caller_name.clear();

        let err = check_step(&draft, Step::CallContext).unwrap_err();
        assert_eq!(err.step, Step::CallContext);
        assert_eq!(err.missing, vec![Requirement::Field(TextField::CallerName)]);
        assert!(err.to_string().contains("Caller name"));
    }

    #[test]
    fn test_optional_fields_not_required() {
        let draft = make_call_context();
        assert!(draft.clinic_department.is_empty());
        assert!(validate_step(&draft, Step::CallContext));
    }

    #[test]
    fn test_empty_draft_lists_all_missing() {
        let draft = DraftLogEntry::new();
        let err = check_step(&draft, Step::CallContext).unwrap_err();
        assert_eq!(err.missing.len(), 6);
    }

    #[test]
    fn test_clinical_detail_needs_patient_or_drug() {
        let mut draft = DraftLogEntry::new();
        draft.inquiry_details = "Renal dosing".into();

        let err = check_step(&draft, Step::ClinicalDetail).unwrap_err();
        assert_eq!(err.missing, vec![Requirement::PatientOrDrug]);

        draft.patient_id = "P1".into();
        assert!(validate_step(&draft, Step::ClinicalDetail));

        draft.patient_id.clear();
        draft.selected_drugs.push(DrugRecord::new(1, "Paracetamol", "PAR001", "BNF"));
        assert!(validate_step(&draft, Step::ClinicalDetail));
    }

    #[test]
    fn test_clinical_detail_needs_inquiry() {
        let mut draft = DraftLogEntry::new();
        draft.patient_id = "P1".into();

        let err = check_step(&draft, Step::ClinicalDetail).unwrap_err();
        assert_eq!(err.missing, vec![Requirement::Field(TextField::InquiryDetails)]);
    }

    #[test]
    fn test_resolution_step() {
        let mut draft = DraftLogEntry::new();
        draft.time_spent = "20".into();
        assert!(!validate_step(&draft, Step::Resolution));

        draft.resolution = "Advice given".into();
        assert!(validate_step(&draft, Step::Resolution));
    }
}
