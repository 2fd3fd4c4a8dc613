//! Submitted on-call log records.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::draft::{DraftLogEntry, TextField, UrgencyLevel};
use super::drug::DrugRecord;

/// Format produced by the time-of-call and follow-up inputs.
pub const CALL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A draft value that cannot be turned into a stored record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("{} must be a whole number of minutes, got {value:?}", .field.label())]
    InvalidMinutes { field: TextField, value: String },

    #[error("{} must be a number, got {value:?}", .field.label())]
    InvalidNumber { field: TextField, value: String },

    #[error("{} is not a valid date/time: {value:?}", .field.label())]
    InvalidDateTime { field: TextField, value: String },

    #[error("{} is not a valid YYYY-MM-DD date: {value:?}", .field.label())]
    InvalidDate { field: TextField, value: String },
}

/// Workflow status of a submitted log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    /// Nothing further to do
    Completed,
    /// A follow-up has been scheduled
    FollowUpPending,
    /// Waiting on the site manager
    AwaitingReview,
}

/// Patient section of a stored log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSection {
    pub patient_id: Option<String>,
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub ward: Option<String>,
}

/// A finished on-call log as handed to storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallLog {
    pub id: String,
    pub time_of_call: NaiveDateTime,
    pub site: String,
    pub caller_name: String,
    pub caller_designation: String,
    pub meets_criteria: bool,
    pub request_type: String,
    pub clinic_department: Option<String>,
    /// Pharmacist who took the call
    pub pharmacist: String,
    pub priority: UrgencyLevel,
    pub status: LogStatus,

    pub inquiry_details: String,
    pub patient: Option<PatientSection>,
    pub drugs: Vec<DrugRecord>,
    pub peer_review: bool,
    pub clinical_impact: Option<String>,
    pub intervention_type: Option<String>,

    pub time_spent_minutes: u32,
    /// Only present when a hospital visit took place
    pub miles_traveled: Option<f64>,
    /// Only present when compensatory rest was taken
    pub rest_minutes: Option<u32>,
    pub notify_teams: BTreeSet<String>,
    pub call_triage: bool,
    pub site_manager_review: bool,
    /// Only present when follow-up is required
    pub follow_up_at: Option<NaiveDateTime>,
    pub resolution: String,
}

impl CallLog {
    /// Build a stored record from a completed draft.
    pub fn from_draft(
        id: String,
        pharmacist: &str,
        draft: &DraftLogEntry,
    ) -> Result<Self, RecordError> {
        let time_of_call = parse_date_time(draft, TextField::TimeOfCall)?;
        let time_spent_minutes = parse_minutes(draft, TextField::TimeSpent)?;

        let miles_traveled = if draft.hospital_visit && draft.is_filled(TextField::MilesTraveled) {
            Some(parse_number(draft, TextField::MilesTraveled)?)
        } else {
            None
        };
        let rest_minutes = if draft.compensatory_rest && draft.is_filled(TextField::RestTime) {
            Some(parse_minutes(draft, TextField::RestTime)?)
        } else {
            None
        };
        let follow_up_at = if draft.follow_up_required && draft.is_filled(TextField::FollowUpDate)
        {
            Some(parse_date_time(draft, TextField::FollowUpDate)?)
        } else {
            None
        };

        let status = if draft.site_manager_review {
            LogStatus::AwaitingReview
        } else if draft.follow_up_required {
            LogStatus::FollowUpPending
        } else {
            LogStatus::Completed
        };

        Ok(Self {
            id,
            time_of_call,
            site: draft.site.trim().to_string(),
            caller_name: draft.caller_name.trim().to_string(),
            caller_designation: draft.caller_designation.trim().to_string(),
            meets_criteria: draft.meets_criteria.trim().eq_ignore_ascii_case("yes"),
            request_type: draft.request_type.trim().to_string(),
            clinic_department: optional(draft, TextField::ClinicDepartment),
            pharmacist: pharmacist.to_string(),
            priority: draft.urgency_level,
            status,
            inquiry_details: draft.inquiry_details.trim().to_string(),
            patient: patient_section(draft)?,
            drugs: draft.selected_drugs.clone(),
            peer_review: draft.peer_review,
            clinical_impact: optional(draft, TextField::ClinicalImpact),
            intervention_type: optional(draft, TextField::InterventionType),
            time_spent_minutes,
            miles_traveled,
            rest_minutes,
            notify_teams: draft.notify_teams.clone(),
            call_triage: draft.call_triage,
            site_manager_review: draft.site_manager_review,
            follow_up_at,
            resolution: draft.resolution.trim().to_string(),
        })
    }

    /// Serialize to canonical JSON for digesting.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Acknowledgement returned once a log has been stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionReceipt {
    /// Stored log ID
    pub log_id: String,
    /// SHA-256 hex digest of the stored record
    pub digest: String,
    /// When the record was accepted
    pub submitted_at: DateTime<Utc>,
}

fn optional(draft: &DraftLogEntry, field: TextField) -> Option<String> {
    let value = draft.text(field).trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn patient_section(draft: &DraftLogEntry) -> Result<Option<PatientSection>, RecordError> {
    let section = PatientSection {
        patient_id: optional(draft, TextField::PatientId),
        name: optional(draft, TextField::PatientName),
        date_of_birth: parse_date(draft, TextField::PatientDob)?,
        ward: optional(draft, TextField::PatientWard),
    };

    if section.patient_id.is_none() && section.name.is_none() {
        Ok(None)
    } else {
        Ok(Some(section))
    }
}

/// Blank is `None`; anything else must parse.
fn parse_date(draft: &DraftLogEntry, field: TextField) -> Result<Option<NaiveDate>, RecordError> {
    let value = draft.text(field).trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, super::DOB_FORMAT)
        .map(Some)
        .map_err(|_| RecordError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

fn parse_minutes(draft: &DraftLogEntry, field: TextField) -> Result<u32, RecordError> {
    let value = draft.text(field).trim();
    value.parse().map_err(|_| RecordError::InvalidMinutes {
        field,
        value: value.to_string(),
    })
}

fn parse_number(draft: &DraftLogEntry, field: TextField) -> Result<f64, RecordError> {
    let value = draft.text(field).trim();
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(RecordError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_date_time(draft: &DraftLogEntry, field: TextField) -> Result<NaiveDateTime, RecordError> {
    let value = draft.text(field).trim();
    NaiveDateTime::parse_from_str(value, CALL_TIME_FORMAT).map_err(|_| {
        RecordError::InvalidDateTime {
            field,
            value: value.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_complete_draft() -> DraftLogEntry {
        let mut draft = DraftLogEntry::new();
        draft.time_of_call = "2025-02-10T14:30".into();
        draft.site = "central".into();
        draft.caller_name = "Dr. Smith".into();
        draft.caller_designation = "doctor".into();
        draft.meets_criteria = "yes".into();
        draft.request_type = "medicine".into();
        draft.inquiry_details = "Dose check for IV paracetamol".into();
        draft.patient_id = "P1".into();
        draft.patient_name = "John Smith".into();
        draft.patient_dob = "1980-01-01".into();
        draft.patient_ward = "Ward A".into();
        draft.time_spent = "20".into();
        draft.resolution = "Advice given".into();
        draft
    }

    #[test]
    fn test_from_draft_basic() {
        let draft = make_complete_draft();
        let log = CallLog::from_draft("log-1".into(), "Jane Doe", &draft).unwrap();

        assert_eq!(log.id, "log-1");
        assert_eq!(log.pharmacist, "Jane Doe");
        assert_eq!(log.time_spent_minutes, 20);
        assert!(log.meets_criteria);
        assert_eq!(log.status, LogStatus::Completed);
        assert_eq!(log.priority, UrgencyLevel::Normal);
        assert_eq!(log.time_of_call.format("%H:%M").to_string(), "14:30");

        let patient = log.patient.unwrap();
        assert_eq!(patient.name.as_deref(), Some("John Smith"));
        assert_eq!(patient.date_of_birth, NaiveDate::from_ymd_opt(1980, 1, 1));
    }

    #[test]
    fn test_conditional_fields_dropped_when_flag_off() {
        let mut draft = make_complete_draft();
        draft.miles_traveled = "12".into();
        draft.rest_time = "30".into();
        draft.follow_up_date = "2025-02-11T09:00".into();

        let log = CallLog::from_draft("log-1".into(), "Jane Doe", &draft).unwrap();
        assert_eq!(log.miles_traveled, None);
        assert_eq!(log.rest_minutes, None);
        assert_eq!(log.follow_up_at, None);

        draft.hospital_visit = true;
        draft.compensatory_rest = true;
        draft.follow_up_required = true;
        let log = CallLog::from_draft("log-2".into(), "Jane Doe", &draft).unwrap();
        assert_eq!(log.miles_traveled, Some(12.0));
        assert_eq!(log.rest_minutes, Some(30));
        assert!(log.follow_up_at.is_some());
        assert_eq!(log.status, LogStatus::FollowUpPending);
    }

    #[test]
    fn test_manager_review_takes_precedence() {
        let mut draft = make_complete_draft();
        draft.follow_up_required = true;
        draft.site_manager_review = true;

        let log = CallLog::from_draft("log-1".into(), "Jane Doe", &draft).unwrap();
        assert_eq!(log.status, LogStatus::AwaitingReview);
    }

    #[test]
    fn test_non_numeric_time_spent_rejected() {
        let mut draft = make_complete_draft();
        draft.time_spent = "twenty".into();

        let err = CallLog::from_draft("log-1".into(), "Jane Doe", &draft).unwrap_err();
        assert!(matches!(
            err,
            RecordError::InvalidMinutes {
                field: TextField::TimeSpent,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_time_of_call_rejected() {
        let mut draft = make_complete_draft();
        draft.time_of_call = "yesterday".into();

        let err = CallLog::from_draft("log-1".into(), "Jane Doe", &draft).unwrap_err();
        assert!(err.to_string().contains("Time of call"));
    }

    #[test]
    fn test_bad_date_of_birth_rejected() {
        let mut draft = make_complete_draft();
        draft.patient_dob = "01/01/1980".into();

        let err = CallLog::from_draft("log-1".into(), "Jane Doe", &draft).unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidDate {
                field: TextField::PatientDob,
                value: "01/01/1980".into(),
            }
        );
    }

    #[test]
    fn test_blank_date_of_birth_allowed() {
        let mut draft = make_complete_draft();
        draft.patient_dob = "  ".into();

        let log = CallLog::from_draft("log-1".into(), "Jane Doe", &draft).unwrap();
        assert_eq!(log.patient.unwrap().date_of_birth, None);
    }

    #[test]
    fn test_drug_only_log_has_no_patient() {
        let mut draft = make_complete_draft();
        draft.patient_id.clear();
        draft.patient_name.clear();

        let log = CallLog::from_draft("log-1".into(), "Jane Doe", &draft).unwrap();
        assert!(log.patient.is_none());
    }
}
