//! Patient demographic models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for patient dates of birth.
pub const DOB_FORMAT: &str = "%Y-%m-%d";

/// Demographic fields resolved from the patient directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientDemographics {
    /// Patient name
    pub name: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Current ward
    pub ward: String,
}

impl PatientDemographics {
    /// Create demographics with required fields.
    pub fn new(name: impl Into<String>, date_of_birth: NaiveDate, ward: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date_of_birth,
            ward: ward.into(),
        }
    }

    /// Date of birth as it is written into a draft.
    pub fn formatted_dob(&self) -> String {
        self.date_of_birth.format(DOB_FORMAT).to_string()
    }
}
