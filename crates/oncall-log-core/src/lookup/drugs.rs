//! In-memory drug catalog.

use strsim::jaro_winkler;

use super::{DrugLookup, DrugMatches, LookupError, LookupResult};
use crate::models::DrugRecord;

/// Minimum Jaro-Winkler similarity for a misspelt name to count as a match.
const MIN_FUZZY_SIMILARITY: f64 = 0.88;

/// Drug catalog held in memory, searched in catalog order.
#[derive(Debug, Clone)]
pub struct StaticDrugCatalog {
    drugs: Vec<DrugRecord>,
}

impl StaticDrugCatalog {
    /// Create a catalog from a list of drugs.
    pub fn new(drugs: Vec<DrugRecord>) -> Self {
        Self { drugs }
    }

    /// Number of drugs in the catalog.
    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }
}

impl Default for StaticDrugCatalog {
    fn default() -> Self {
        Self::new(vec![
            DrugRecord::new(1, "Paracetamol", "PAR001", "BNF"),
            DrugRecord::new(2, "Ibuprofen", "IBU001", "BNF"),
        ])
    }
}

impl DrugLookup for StaticDrugCatalog {
    fn search<'a>(&'a self, term: &str) -> LookupResult<DrugMatches<'a>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Err(LookupError::EmptyQuery);
        }

        Ok(Box::new(
            self.drugs
                .iter()
                .filter(move |drug| is_match(drug, &term))
                .cloned(),
        ))
    }
}

fn is_match(drug: &DrugRecord, term_lower: &str) -> bool {
    if drug.matches_term(term_lower) {
        return true;
    }
    // Typo tolerance on the name only; codes are exact
    jaro_winkler(term_lower, &drug.name.to_lowercase()) >= MIN_FUZZY_SIMILARITY
}
