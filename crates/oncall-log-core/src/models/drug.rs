//! Drug reference models.

use serde::{Deserialize, Serialize};

/// A drug as returned by a drug lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DrugRecord {
    /// Lookup-local identifier
    pub id: u32,
    /// Drug name (e.g., "Paracetamol")
    pub name: String,
    /// Formulary code (e.g., "PAR001")
    pub code: String,
    /// Classification or source formulary (e.g., "BNF")
    #[serde(rename = "type")]
    pub classification: String,
}

impl DrugRecord {
    /// Create a new drug record.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        code: impl Into<String>,
        classification: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            code: code.into(),
            classification: classification.into(),
        }
    }

    /// Case-insensitive substring match on name or code.
    pub fn matches_term(&self, term_lower: &str) -> bool {
        self.name.to_lowercase().contains(term_lower)
            || self.code.to_lowercase().contains(term_lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_term() {
        let drug = DrugRecord::new(1, "Paracetamol", "PAR001", "BNF");

        assert!(drug.matches_term("para"));
        assert!(drug.matches_term("par001"));
        assert!(!drug.matches_term("ibu"));
    }

    #[test]
    fn test_classification_serialized_as_type() {
        let drug = DrugRecord::new(2, "Ibuprofen", "IBU001", "BNF");
        let json = serde_json::to_value(&drug).unwrap();
        assert_eq!(json["type"], "BNF");
    }
}
