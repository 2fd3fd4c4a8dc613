//! In-memory patient directory.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::{LookupError, LookupResult, PatientDirectory};
use crate::models::PatientDemographics;

/// Patient directory backed by a map, with optional simulated latency.
#[derive(Debug, Clone, Default)]
pub struct StaticPatientDirectory {
    patients: HashMap<String, PatientDemographics>,
    latency: Option<Duration>,
    latency_overrides: HashMap<String, Duration>,
}

impl StaticPatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a patient.
    pub fn insert(&mut self, patient_id: impl Into<String>, patient: PatientDemographics) {
        self.patients.insert(patient_id.into(), patient);
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay responses for one patient ID by `latency`.
    pub fn with_latency_for(mut self, patient_id: impl Into<String>, latency: Duration) -> Self {
        self.latency_overrides.insert(patient_id.into(), latency);
        self
    }

    fn latency_for(&self, patient_id: &str) -> Option<Duration> {
        self.latency_overrides
            .get(patient_id)
            .copied()
            .or(self.latency)
    }
}

#[async_trait]
impl PatientDirectory for StaticPatientDirectory {
    async fn resolve(&self, patient_id: &str) -> LookupResult<PatientDemographics> {
        if let Some(latency) = self.latency_for(patient_id) {
            tokio::time::sleep(latency).await;
        }

        self.patients
            .get(patient_id.trim())
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("patient {}", patient_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_directory() -> StaticPatientDirectory {
        let mut directory = StaticPatientDirectory::new();
        directory.insert(
            "P1",
            PatientDemographics::new(
                "John Smith",
                NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
                "Ward A",
            ),
        );
        directory
    }

    #[tokio::test]
    async fn test_resolve_known_patient() {
        let directory = make_directory();
        let patient = directory.resolve("P1").await.unwrap();
        assert_eq!(patient.name, "John Smith");
        assert_eq!(patient.ward, "Ward A");
    }

    #[tokio::test]
    async fn test_unknown_patient_not_found() {
        let directory = make_directory();
        let err = directory.resolve("P404").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_override() {
        let directory = make_directory()
            .with_latency(Duration::from_millis(10))
            .with_latency_for("P1", Duration::from_millis(500));

        let start = tokio::time::Instant::now();
        directory.resolve("P1").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
