//! The in-progress log record edited by the wizard.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::drug::DrugRecord;

/// How urgent the caller's request is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    #[default]
    Normal,
    High,
    Emergency,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Normal => "normal",
            UrgencyLevel::High => "high",
            UrgencyLevel::Emergency => "emergency",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrgencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(UrgencyLevel::Low),
            "normal" => Ok(UrgencyLevel::Normal),
            "high" => Ok(UrgencyLevel::High),
            "emergency" => Ok(UrgencyLevel::Emergency),
            other => Err(format!("Unknown urgency level: {}", other)),
        }
    }
}

/// Free-text fields of a draft.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextField {
    // Call context
    TimeOfCall,
    Site,
    CallerName,
    CallerDesignation,
    MeetsCriteria,
    RequestType,
    ClinicDepartment,
    // Clinical detail
    InquiryDetails,
    PatientId,
    PatientName,
    PatientDob,
    PatientWard,
    ClinicalImpact,
    InterventionType,
    // Resolution
    TimeSpent,
    MilesTraveled,
    RestTime,
    FollowUpDate,
    Resolution,
}

impl TextField {
    /// Human-readable label, as shown next to the input.
    pub fn label(&self) -> &'static str {
        match self {
            TextField::TimeOfCall => "Time of call",
            TextField::Site => "Site",
            TextField::CallerName => "Caller name",
            TextField::CallerDesignation => "Caller designation",
            TextField::MeetsCriteria => "Meets on-call criteria",
            TextField::RequestType => "Type of request",
            TextField::ClinicDepartment => "Clinic department",
            TextField::InquiryDetails => "Inquiry details",
            TextField::PatientId => "Patient ID",
            TextField::PatientName => "Patient name",
            TextField::PatientDob => "Patient date of birth",
            TextField::PatientWard => "Patient ward",
            TextField::ClinicalImpact => "Clinical impact",
            TextField::InterventionType => "Intervention type",
            TextField::TimeSpent => "Time spent (minutes)",
            TextField::MilesTraveled => "Miles traveled",
            TextField::RestTime => "Rest time (minutes)",
            TextField::FollowUpDate => "Follow-up date",
            TextField::Resolution => "Resolution/outcome",
        }
    }
}

/// Yes/no fields of a draft.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FlagField {
    PeerReview,
    HospitalVisit,
    CompensatoryRest,
    CallTriage,
    SiteManagerReview,
    FollowUpRequired,
}

/// A single replacement of one draft field.
///
/// Drugs and teams are not here: the selection only grows through
/// [`DraftLogEntry::push_drug`] and teams change through
/// [`DraftLogEntry::toggle_team`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Text(TextField, String),
    Flag(FlagField, bool),
    Urgency(UrgencyLevel),
}

/// An on-call log entry being built up across the wizard steps.
///
/// Conditional values (miles traveled, rest time, follow-up date) are kept
/// even after their governing flag is switched off; [`crate::models::CallLog`]
/// drops them when the entry is submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftLogEntry {
    // Call context
    pub time_of_call: String,
    pub site: String,
    pub caller_name: String,
    pub caller_designation: String,
    pub meets_criteria: String,
    pub request_type: String,
    pub clinic_department: String,
    pub urgency_level: UrgencyLevel,

    // Clinical detail
    pub inquiry_details: String,
    pub patient_id: String,
    pub patient_name: String,
    #[serde(rename = "patientDOB")]
    pub patient_dob: String,
    pub patient_ward: String,
    /// Selection order is preserved; repeats are allowed.
    pub selected_drugs: Vec<DrugRecord>,
    pub peer_review: bool,
    pub clinical_impact: String,
    pub intervention_type: String,

    // Resolution
    pub time_spent: String,
    pub hospital_visit: bool,
    pub miles_traveled: String,
    pub compensatory_rest: bool,
    pub rest_time: String,
    pub notify_teams: BTreeSet<String>,
    pub call_triage: bool,
    pub site_manager_review: bool,
    pub follow_up_required: bool,
    pub follow_up_date: String,
    pub resolution: String,
}

impl DraftLogEntry {
    /// Create an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a text field.
    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::TimeOfCall => &self.time_of_call,
            TextField::Site => &self.site,
            TextField::CallerName => &self.caller_name,
            TextField::CallerDesignation => &self.caller_designation,
            TextField::MeetsCriteria => &self.meets_criteria,
            TextField::RequestType => &self.request_type,
            TextField::ClinicDepartment => &self.clinic_department,
            TextField::InquiryDetails => &self.inquiry_details,
            TextField::PatientId => &self.patient_id,
            TextField::PatientName => &self.patient_name,
            TextField::PatientDob => &self.patient_dob,
            TextField::PatientWard => &self.patient_ward,
            TextField::ClinicalImpact => &self.clinical_impact,
            TextField::InterventionType => &self.intervention_type,
            TextField::TimeSpent => &self.time_spent,
            TextField::MilesTraveled => &self.miles_traveled,
            TextField::RestTime => &self.rest_time,
            TextField::FollowUpDate => &self.follow_up_date,
            TextField::Resolution => &self.resolution,
        }
    }

    fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::TimeOfCall => &mut self.time_of_call,
            TextField::Site => &mut self.site,
            TextField::CallerName => &mut self.caller_name,
            TextField::CallerDesignation => &mut self.caller_designation,
            TextField::MeetsCriteria => &mut self.meets_criteria,
            TextField::RequestType => &mut self.request_type,
            TextField::ClinicDepartment => &mut self.clinic_department,
            TextField::InquiryDetails => &mut self.inquiry_details,
            TextField::PatientId => &mut self.patient_id,
            TextField::PatientName => &mut self.patient_name,
            TextField::PatientDob => &mut self.patient_dob,
            TextField::PatientWard => &mut self.patient_ward,
            TextField::ClinicalImpact => &mut self.clinical_impact,
            TextField::InterventionType => &mut self.intervention_type,
            TextField::TimeSpent => &mut self.time_spent,
            TextField::MilesTraveled => &mut self.miles_traveled,
            TextField::RestTime => &mut self.rest_time,
            TextField::FollowUpDate => &mut self.follow_up_date,
            TextField::Resolution => &mut self.resolution,
        }
    }

    /// Read a yes/no field.
    pub fn flag(&self, field: FlagField) -> bool {
        match field {
            FlagField::PeerReview => self.peer_review,
            FlagField::HospitalVisit => self.hospital_visit,
            FlagField::CompensatoryRest => self.compensatory_rest,
            FlagField::CallTriage => self.call_triage,
            FlagField::SiteManagerReview => self.site_manager_review,
            FlagField::FollowUpRequired => self.follow_up_required,
        }
    }

    fn flag_mut(&mut self, field: FlagField) -> &mut bool {
        match field {
            FlagField::PeerReview => &mut self.peer_review,
            FlagField::HospitalVisit => &mut self.hospital_visit,
            FlagField::CompensatoryRest => &mut self.compensatory_rest,
            FlagField::CallTriage => &mut self.call_triage,
            FlagField::SiteManagerReview => &mut self.site_manager_review,
            FlagField::FollowUpRequired => &mut self.follow_up_required,
        }
    }

    /// Whether a text field holds anything other than whitespace.
    pub fn is_filled(&self, field: TextField) -> bool {
        !self.text(field).trim().is_empty()
    }

    /// Replace one field, leaving every other field untouched.
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Text(field, value) => *self.text_mut(field) = value,
            FieldUpdate::Flag(field, value) => *self.flag_mut(field) = value,
            FieldUpdate::Urgency(level) => self.urgency_level = level,
        }
    }

    /// Append a drug to the selection.
    pub fn push_drug(&mut self, drug: DrugRecord) {
        self.selected_drugs.push(drug);
    }

    /// Add the team if absent, remove it if present.
    ///
    /// Returns whether the team is in the set afterwards.
    pub fn toggle_team(&mut self, team: &str) -> bool {
        if self.notify_teams.remove(team) {
            false
        } else {
            self.notify_teams.insert(team.to_string());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_defaults() {
        let draft = DraftLogEntry::new();
        assert_eq!(draft.urgency_level, UrgencyLevel::Normal);
        assert!(draft.selected_drugs.is_empty());
        assert!(draft.notify_teams.is_empty());
        assert!(!draft.hospital_visit);
        assert!(!draft.is_filled(TextField::CallerName));
    }

    #[test]
    fn test_apply_replaces_only_target_field() {
        let mut draft = DraftLogEntry::new();
        draft.site = "central".into();

        draft.apply(FieldUpdate::Text(TextField::CallerName, "Dr. Smith".into()));

        assert_eq!(draft.caller_name, "Dr. Smith");
        assert_eq!(draft.site, "central");
        assert_eq!(draft.text(TextField::CallerName), "Dr. Smith");
    }

    #[test]
    fn test_apply_flag_and_urgency() {
        let mut draft = DraftLogEntry::new();
        draft.apply(FieldUpdate::Flag(FlagField::HospitalVisit, true));
        draft.apply(FieldUpdate::Urgency(UrgencyLevel::Emergency));

        assert!(draft.flag(FlagField::HospitalVisit));
        assert!(!draft.flag(FlagField::CompensatoryRest));
        assert_eq!(draft.urgency_level, UrgencyLevel::Emergency);
    }

    #[test]
    fn test_conditional_value_survives_flag_off() {
        let mut draft = DraftLogEntry::new();
        draft.apply(FieldUpdate::Flag(FlagField::HospitalVisit, true));
        draft.apply(FieldUpdate::Text(TextField::MilesTraveled, "12".into()));
        draft.apply(FieldUpdate::Flag(FlagField::HospitalVisit, false));

        assert_eq!(draft.miles_traveled, "12");
    }

    #[test]
    fn test_whitespace_is_not_filled() {
        let mut draft = DraftLogEntry::new();
        draft.apply(FieldUpdate::Text(TextField::Resolution, "   ".into()));
        assert!(!draft.is_filled(TextField::Resolution));
    }

    #[test]
    fn test_toggle_team() {
        let mut draft = DraftLogEntry::new();
        assert!(draft.toggle_team("ICU"));
        assert!(draft.notify_teams.contains("ICU"));
        assert!(!draft.toggle_team("ICU"));
        assert!(draft.notify_teams.is_empty());
    }

    #[test]
    fn test_duplicate_drugs_kept_in_order() {
        let mut draft = DraftLogEntry::new();
        let para = DrugRecord::new(1, "Paracetamol", "PAR001", "BNF");
        let ibu = DrugRecord::new(2, "Ibuprofen", "IBU001", "BNF");
        draft.push_drug(para.clone());
        draft.push_drug(ibu.clone());
        draft.push_drug(para.clone());

        assert_eq!(draft.selected_drugs, vec![para.clone(), ibu, para]);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut draft = DraftLogEntry::new();
        draft.patient_dob = "1980-01-01".into();
        let json = serde_json::to_value(&draft).unwrap();

        assert_eq!(json["patientDOB"], "1980-01-01");
        assert_eq!(json["urgencyLevel"], "normal");
        assert!(json.get("timeOfCall").is_some());
    }

    #[test]
    fn test_urgency_from_str() {
        assert_eq!("High".parse::<UrgencyLevel>(), Ok(UrgencyLevel::High));
        assert!("urgent".parse::<UrgencyLevel>().is_err());
    }
}
