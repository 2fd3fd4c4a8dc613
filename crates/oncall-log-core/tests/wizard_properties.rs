//! Property tests for wizard navigation and draft edits.

use oncall_log_core::{DrugRecord, FieldUpdate, LogWizard, Step, TextField, WizardState};
use proptest::prelude::*;

fn text_field() -> impl Strategy<Value = TextField> {
    prop_oneof![
        Just(TextField::TimeOfCall),
        Just(TextField::Site),
        Just(TextField::CallerName),
        Just(TextField::CallerDesignation),
        Just(TextField::MeetsCriteria),
        Just(TextField::RequestType),
        Just(TextField::ClinicDepartment),
        Just(TextField::InquiryDetails),
        Just(TextField::PatientId),
        Just(TextField::PatientName),
        Just(TextField::ClinicalImpact),
        Just(TextField::TimeSpent),
        Just(TextField::RestTime),
        Just(TextField::Resolution),
    ]
}

#[derive(Debug, Clone)]
enum Action {
    Edit(TextField, String),
    SelectDrug(u32),
    Advance,
    Retreat,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (text_field(), "[ a-z0-9]{0,6}").prop_map(|(f, v)| Action::Edit(f, v)),
        1 => (1u32..3).prop_map(Action::SelectDrug),
        2 => Just(Action::Advance),
        1 => Just(Action::Retreat),
    ]
}

fn drug(id: u32) -> DrugRecord {
    DrugRecord::new(id, format!("Drug {}", id), format!("D{:03}", id), "BNF")
}

proptest! {
    #[test]
    fn advance_moves_only_when_gate_passes(actions in prop::collection::vec(action(), 0..40)) {
        let mut wizard = LogWizard::default();

        for action in actions {
            match action {
                Action::Edit(field, value) => {
                    wizard.update_field(FieldUpdate::Text(field, value));
                }
                Action::SelectDrug(id) => wizard.select_drug(drug(id)),
                Action::Retreat => {
                    let before = wizard.step();
                    let after = wizard.retreat();
                    prop_assert_eq!(after, before.previous().unwrap_or(before));
                }
                Action::Advance => {
                    let before = wizard.state();
                    let gate_passes = wizard.validate_step(wizard.step());
                    let result = wizard.advance();

                    prop_assert_eq!(result.is_ok(), gate_passes);
                    if !gate_passes {
                        prop_assert_eq!(wizard.state(), before);
                    }
                    if wizard.state() == WizardState::Submitting {
                        return Ok(());
                    }
                }
            }
        }
    }

    #[test]
    fn every_step_is_reachable_and_submittable(seed in "[a-z]{1,6}") {
        let mut wizard = LogWizard::default();
        for field in [
            TextField::TimeOfCall,
            TextField::Site,
            TextField::CallerName,
            TextField::CallerDesignation,
            TextField::MeetsCriteria,
            TextField::RequestType,
            TextField::InquiryDetails,
            TextField::PatientId,
            TextField::TimeSpent,
            TextField::Resolution,
        ] {
            wizard.update_field(FieldUpdate::Text(field, seed.clone()));
        }

        prop_assert!(wizard.advance().is_ok());
        prop_assert!(wizard.advance().is_ok());
        prop_assert_eq!(wizard.step(), Step::Resolution);
        prop_assert!(wizard.advance().is_ok());
        prop_assert_eq!(wizard.state(), WizardState::Submitting);
    }

    #[test]
    fn selected_drugs_only_grow(actions in prop::collection::vec(action(), 0..40)) {
        let mut wizard = LogWizard::default();
        let mut selected = 0;

        for action in actions {
            match action {
                Action::Edit(field, value) => {
                    wizard.update_field(FieldUpdate::Text(field, value));
                }
                Action::SelectDrug(id) => wizard.select_drug(drug(id)),
                Action::Advance => {
                    let _ = wizard.advance();
                }
                Action::Retreat => {
                    wizard.retreat();
                }
            }
            let now = wizard.draft().selected_drugs.len();
            prop_assert!(now >= selected);
            selected = now;
        }
    }

    #[test]
    fn toggle_team_twice_restores_selection(
        teams in prop::collection::btree_set("[A-Za-z]{1,10}", 0..5),
        team in "[A-Za-z]{1,10}",
    ) {
        let mut wizard = LogWizard::default();
        for t in &teams {
            wizard.toggle_team(t);
        }
        let before = wizard.draft().notify_teams.clone();

        let first = wizard.toggle_team(&team);
        let second = wizard.toggle_team(&team);

        prop_assert_ne!(first, second);
        prop_assert_eq!(&wizard.draft().notify_teams, &before);
    }

    #[test]
    fn repeated_update_is_idempotent(field in text_field(), value in ".{0,20}") {
        let mut wizard = LogWizard::default();
        wizard.update_field(FieldUpdate::Text(field, value.clone()));
        let once = wizard.draft().clone();

        wizard.update_field(FieldUpdate::Text(field, value.clone()));

        prop_assert_eq!(wizard.draft(), &once);
        prop_assert_eq!(wizard.draft().text(field), value.as_str());
    }

    #[test]
    fn update_leaves_other_fields_untouched(field in text_field(), value in "[a-z]{1,8}") {
        let mut wizard = LogWizard::default();
        wizard.update_field(FieldUpdate::Text(field, value));

        for other in [TextField::CallerName, TextField::Resolution, TextField::PatientId] {
            if other != field {
                prop_assert_eq!(wizard.draft().text(other), "");
            }
        }
        prop_assert_eq!(wizard.step(), Step::CallContext);
    }
}
