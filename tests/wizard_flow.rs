mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;
use common::{amount, harbour_loft, manual_clock, memory_drafts, ScriptedRepository};
use property_core::core::repository::{PropertyRepository, RecordRepository};
use property_core::core::{Catalog, ManualClock};
use property_core::domain::{BillingUnit, BookingStatus, PricingEntry};
use property_core::forms::{
    BookingField, BookingForm, Draft, DraftPersistence, FormOrchestrator, PropertyField,
    PropertyForm, StepTransition, SubmitMode, SubmitOutcome, SubmitStart, WizardPhase,
};
use property_core::storage::{KeyValueStore, MemoryStore};

const PROPERTY_DRAFT: &str = "draft:property";

fn property_wizard(
    store: &Arc<MemoryStore>,
    clock: &Arc<ManualClock>,
) -> FormOrchestrator<PropertyForm> {
    let drafts = DraftPersistence::new("property", PROPERTY_DRAFT, store.clone(), clock.clone());
    FormOrchestrator::new(PropertyForm::create(Vec::new()), SubmitMode::Create)
        .expect("property steps are valid")
        .with_drafts(drafts)
}

fn complete_values() -> BTreeMap<String, String> {
    [
        ("name", "Harbour Loft"),
        ("kind", "Apartment"),
        ("address_line", "1 Quay St"),
        ("city", "Lisbon"),
        ("postcode", "1100-001"),
        ("country", "PT"),
        ("bedrooms", "2"),
        ("max_guests", "4"),
        ("nightly_rate", "120"),
        ("cleaning_fee", "40"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// A property wizard already on its last step with every field valid.
fn ready_wizard() -> FormOrchestrator<PropertyForm> {
    let mut wizard = FormOrchestrator::new(PropertyForm::create(Vec::new()), SubmitMode::Create)
        .expect("property steps are valid");
    assert!(wizard.hydrate(Draft {
        values: complete_values(),
        step_index: 3,
    }));
    wizard
}

#[test]
fn property_wizard_walks_every_step_and_creates_the_record() {
    let store = memory_drafts();
    let clock = manual_clock();
    let catalog = Catalog::in_memory();
    let mut wizard = property_wizard(&store, &clock);

    assert_eq!(wizard.next(), StepTransition::Blocked { step: 0, errors: 1 });
    assert_eq!(wizard.errors().get(PropertyField::Name), Some("Name is required"));
    assert_eq!(wizard.current_step(), 0);

    assert!(wizard.set_field(PropertyField::Name, "Harbour Loft"));
    assert!(wizard.errors().is_empty());
    assert_eq!(wizard.next(), StepTransition::Advanced { from: 0, to: 1 });

    wizard.set_field(PropertyField::AddressLine, "1 Quay St");
    wizard.set_field(PropertyField::City, "Lisbon");
    wizard.set_field(PropertyField::Postcode, "1100-001");
    wizard.set_field(PropertyField::Country, "PT");
    assert_eq!(wizard.next(), StepTransition::Advanced { from: 1, to: 2 });

    wizard.set_field(PropertyField::MaxGuests, "4");
    assert_eq!(wizard.next(), StepTransition::Advanced { from: 2, to: 3 });
    assert_eq!(wizard.next(), StepTransition::AtBoundary);

    assert_eq!(
        wizard.submit(&catalog),
        SubmitOutcome::Blocked { step: 3, errors: 1 }
    );
    assert_eq!(
        wizard.errors().get(PropertyField::NightlyRate),
        Some("Set at least one nightly, weekly, or monthly rate")
    );

    wizard.set_field(PropertyField::NightlyRate, "120");
    wizard.set_field(PropertyField::CleaningFee, "40");
    let outcome = wizard.submit(&catalog);
    assert!(matches!(outcome, SubmitOutcome::Submitted { id: Some(_), .. }));
    assert!(matches!(wizard.phase(), WizardPhase::Submitted { .. }));
    assert!(!wizard.state().is_dirty);

    let properties = catalog.properties().unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].name, "Harbour Loft");
    assert_eq!(properties[0].max_guests, 4);
    assert_eq!(properties[0].nightly_rate(), Some(amount(120)));
    assert_eq!(properties[0].fees.len(), 1);

    clock.advance(Duration::seconds(5));
    wizard.tick();
    assert_eq!(store.get(PROPERTY_DRAFT).unwrap(), None);
}

#[test]
fn validation_only_reports_fields_of_the_current_step() {
    let store = memory_drafts();
    let clock = manual_clock();
    let mut wizard = property_wizard(&store, &clock);

    wizard.set_field(PropertyField::Name, "Harbour Loft");
    assert_eq!(wizard.next(), StepTransition::Advanced { from: 0, to: 1 });
    wizard.clear_field(PropertyField::Name);

    match wizard.next() {
        StepTransition::Blocked { step, errors } => {
            assert_eq!(step, 1);
            assert_eq!(errors, 4);
        }
        other => panic!("expected a blocked transition, got {other:?}"),
    }
    assert_eq!(wizard.errors().get(PropertyField::Name), None);
    assert!(wizard.errors().contains(PropertyField::City));
    assert_eq!(wizard.current_step(), 1);
}

#[test]
fn previous_skips_validation_and_next_returns_to_the_same_step() {
    let store = memory_drafts();
    let clock = manual_clock();
    let mut wizard = property_wizard(&store, &clock);

    assert_eq!(wizard.previous(), StepTransition::AtBoundary);
    wizard.set_field(PropertyField::Name, "Harbour Loft");
    wizard.next();
    let values = wizard.values().clone();

    assert_eq!(wizard.previous(), StepTransition::Retreated { from: 1, to: 0 });
    assert_eq!(wizard.next(), StepTransition::Advanced { from: 0, to: 1 });
    assert_eq!(wizard.values(), &values);

    // The location step is still empty, yet going back is always allowed.
    assert_eq!(wizard.previous(), StepTransition::Retreated { from: 1, to: 0 });
}

#[test]
fn submit_is_only_available_on_the_last_step() {
    let store = memory_drafts();
    let clock = manual_clock();
    let repository = ScriptedRepository::accepting();
    let mut wizard = property_wizard(&store, &clock);

    assert_eq!(wizard.submit(&repository), SubmitOutcome::NotOnLastStep);
    assert_eq!(repository.calls(), 0);
}

#[test]
fn a_second_submit_while_pending_never_reaches_the_repository() {
    let repository = ScriptedRepository::accepting();
    let mut wizard = ready_wizard();

    let request = match wizard.begin_submit() {
        SubmitStart::Ready(request) => request,
        other => panic!("expected a ready request, got {other:?}"),
    };
    assert!(wizard.is_submitting());
    assert!(matches!(wizard.begin_submit(), SubmitStart::Ignored));
    assert_eq!(wizard.submit(&repository), SubmitOutcome::Ignored);
    assert_eq!(wizard.next(), StepTransition::Ignored);
    assert_eq!(wizard.previous(), StepTransition::Ignored);
    assert!(!wizard.set_field(PropertyField::Name, "Other"));

    let outcome = wizard.complete_submit(request.dispatch(&repository));
    assert!(matches!(outcome, SubmitOutcome::Submitted { .. }));
    assert_eq!(repository.calls(), 1);
}

#[test]
fn drafts_cannot_replace_values_while_a_submit_is_pending() {
    let repository = ScriptedRepository::accepting();
    let mut wizard = ready_wizard();

    let request = match wizard.begin_submit() {
        SubmitStart::Ready(request) => request,
        other => panic!("expected a ready request, got {other:?}"),
    };
    let mut stale = complete_values();
    stale.insert("name".into(), "Stale Draft".into());
    assert!(!wizard.hydrate(Draft {
        values: stale.clone(),
        step_index: 0,
    }));
    assert_eq!(wizard.current_step(), 3);
    assert_eq!(wizard.values().get(PropertyField::Name), Some("Harbour Loft"));

    wizard.complete_submit(request.dispatch(&repository));
    assert!(!wizard.hydrate(Draft {
        values: stale,
        step_index: 0,
    }));
    assert_eq!(wizard.current_step(), 3);
}

#[test]
fn business_rejection_keeps_the_form_editable() {
    let repository = ScriptedRepository::rejecting();
    let mut wizard = ready_wizard();

    let outcome = wizard.submit(&repository);
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            message: "Property `Harbour Loft` already exists".into()
        }
    );
    assert_eq!(wizard.phase(), &WizardPhase::Failed);
    assert_eq!(wizard.root_error(), Some("Property `Harbour Loft` already exists"));
    let view = wizard.view();
    assert!(view.can_submit);
    assert_eq!(view.phase, "failed");

    assert!(wizard.set_field(PropertyField::Name, "Harbour Loft II"));
    assert_eq!(wizard.phase(), &WizardPhase::Editing);
    assert_eq!(wizard.root_error(), None);
}

#[test]
fn transport_failure_surfaces_a_message() {
    let repository = ScriptedRepository::offline();
    let mut wizard = ready_wizard();

    match wizard.submit(&repository) {
        SubmitOutcome::Rejected { message } => assert!(message.contains("connection refused")),
        other => panic!("expected a rejection, got {other:?}"),
    }
    assert_eq!(wizard.phase(), &WizardPhase::Failed);
    assert!(wizard.root_error().is_some());
}

#[test]
fn submit_jumps_back_to_the_first_invalid_step() {
    let mut values = complete_values();
    values.remove("city");
    let mut wizard = FormOrchestrator::new(PropertyForm::create(Vec::new()), SubmitMode::Create)
        .expect("property steps are valid");
    wizard.hydrate(Draft {
        values,
        step_index: 3,
    });

    let repository = ScriptedRepository::accepting();
    assert_eq!(
        wizard.submit(&repository),
        SubmitOutcome::Blocked { step: 1, errors: 1 }
    );
    assert_eq!(wizard.current_step(), 1);
    assert_eq!(wizard.errors().get(PropertyField::City), Some("City is required"));
    assert_eq!(repository.calls(), 0);
}

#[test]
fn edits_are_saved_as_one_debounced_draft() {
    let store = memory_drafts();
    let clock = manual_clock();
    let mut wizard = property_wizard(&store, &clock);

    wizard.set_field(PropertyField::Name, "H");
    clock.advance(Duration::milliseconds(200));
    wizard.set_field(PropertyField::Name, "Ha");
    clock.advance(Duration::milliseconds(200));
    wizard.set_field(PropertyField::Name, "Harbour Loft");
    assert!(!wizard.tick());
    assert_eq!(store.write_count(), 0);

    clock.advance(Duration::milliseconds(500));
    assert!(wizard.tick());
    assert_eq!(store.write_count(), 1);

    let reloaded = property_wizard(&store, &clock);
    assert_eq!(reloaded.values().get(PropertyField::Name), Some("Harbour Loft"));
    assert!(reloaded.state().is_dirty);
}

#[test]
fn cancel_discards_the_draft_and_locks_the_form() {
    let store = memory_drafts();
    let clock = manual_clock();
    let mut wizard = property_wizard(&store, &clock);

    wizard.set_field(PropertyField::Name, "Harbour Loft");
    clock.advance(Duration::seconds(1));
    wizard.tick();
    assert!(store.get(PROPERTY_DRAFT).unwrap().is_some());

    wizard.set_field(PropertyField::Description, "Pending edit");
    assert!(wizard.cancel());
    clock.advance(Duration::seconds(1));
    assert!(!wizard.tick());
    assert_eq!(store.get(PROPERTY_DRAFT).unwrap(), None);
    assert_eq!(wizard.phase(), &WizardPhase::Cancelled);
    assert_eq!(wizard.next(), StepTransition::Ignored);
    assert!(!wizard.cancel());
}

#[test]
fn late_completion_after_cancel_is_ignored() {
    let repository = ScriptedRepository::accepting();
    let mut wizard = ready_wizard();

    let SubmitStart::Ready(request) = wizard.begin_submit() else {
        panic!("expected a ready request");
    };
    assert!(wizard.cancel());
    let outcome = wizard.complete_submit(request.dispatch(&repository));
    assert_eq!(outcome, SubmitOutcome::Ignored);
    assert_eq!(wizard.phase(), &WizardPhase::Cancelled);
}

#[test]
fn hydration_drops_unknown_fields_and_rejects_out_of_range_steps() {
    let store = memory_drafts();
    let clock = manual_clock();

    let mut seed = DraftPersistence::new("property", PROPERTY_DRAFT, store.clone(), clock.clone());
    let mut values = BTreeMap::new();
    values.insert("name".to_string(), "Harbour Loft".to_string());
    values.insert("wifi_password".to_string(), "hunter2".to_string());
    seed.save_draft(values.clone(), 2);
    seed.flush();

    let wizard = property_wizard(&store, &clock);
    assert_eq!(wizard.current_step(), 2);
    assert_eq!(wizard.values().get(PropertyField::Name), Some("Harbour Loft"));
    assert_eq!(wizard.values().get(PropertyField::MaxGuests), Some("2"));
    assert!(!wizard.view().values.contains_key("wifi_password"));

    seed.save_draft(values, 9);
    seed.flush();
    let wizard = property_wizard(&store, &clock);
    assert_eq!(wizard.current_step(), 0);
    assert_eq!(wizard.values().get(PropertyField::Name), None);
    assert!(!wizard.state().is_dirty);
}

#[test]
fn booking_wizard_prices_the_stay_and_guards_the_calendar() {
    let catalog = Catalog::in_memory();
    let loft = harbour_loft();
    assert!(catalog.create(&loft).unwrap().success);

    let book = |guest: &str| {
        let mut wizard = FormOrchestrator::new(
            BookingForm::create(loft.clone(), BillingUnit::Night),
            SubmitMode::Create,
        )
        .expect("booking steps are valid");
        wizard.set_field(BookingField::GuestName, guest);
        wizard.set_field(BookingField::GuestEmail, "guest@example.com");
        assert_eq!(wizard.next(), StepTransition::Advanced { from: 0, to: 1 });

        wizard.set_field(BookingField::CheckIn, "2025-06-01");
        wizard.set_field(BookingField::CheckOut, "2025-06-08");
        wizard.set_field(BookingField::Unit, "week");
        wizard.set_field(BookingField::Guests, "3");
        let pricing = wizard.derived_pricing().cloned().expect("stay is priced");
        assert_eq!(pricing.duration, 1);
        assert_eq!(pricing.total_price, amount(740));
        assert_eq!(wizard.next(), StepTransition::Advanced { from: 1, to: 2 });

        wizard.set_field(BookingField::Status, "confirmed");
        wizard.submit(&catalog)
    };

    assert!(matches!(book("Ada Lovelace"), SubmitOutcome::Submitted { .. }));
    let bookings = property_core::core::BookingRepository::bookings(&catalog).unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].status, BookingStatus::Confirmed);
    assert_eq!(bookings[0].total_price, amount(740));

    assert_eq!(
        book("Grace Hopper"),
        SubmitOutcome::Rejected {
            message: "`Harbour Loft` is already booked from 2025-06-01 to 2025-06-08".into()
        }
    );
}

#[test]
fn booking_stay_step_rejects_a_unit_without_a_rate() {
    let mut wizard = FormOrchestrator::new(
        BookingForm::create(harbour_loft(), BillingUnit::Night),
        SubmitMode::Create,
    )
    .expect("booking steps are valid");
    wizard.set_field(BookingField::GuestName, "Ada Lovelace");
    wizard.set_field(BookingField::GuestEmail, "ada@example.com");
    wizard.next();

    wizard.set_field(BookingField::CheckIn, "2025-06-01");
    wizard.set_field(BookingField::CheckOut, "2025-07-15");
    wizard.set_field(BookingField::Unit, "month");
    assert!(wizard.derived_pricing().is_none());
    assert!(matches!(wizard.next(), StepTransition::Blocked { step: 1, .. }));
    assert_eq!(
        wizard.errors().get(BookingField::Unit),
        Some("`Harbour Loft` has no monthly rate")
    );
}

#[test]
fn oversized_rates_block_the_stay_step_instead_of_crashing() {
    let property = harbour_loft().with_rate(BillingUnit::Night, PricingEntry::new(Decimal::MAX));
    let mut wizard = FormOrchestrator::new(
        BookingForm::create(property, BillingUnit::Night),
        SubmitMode::Create,
    )
    .expect("booking steps are valid");
    wizard.set_field(BookingField::GuestName, "Ada Lovelace");
    wizard.set_field(BookingField::GuestEmail, "ada@example.com");
    wizard.next();

    wizard.set_field(BookingField::CheckIn, "2024-01-01");
    wizard.set_field(BookingField::CheckOut, "2024-01-03");
    assert!(wizard.derived_pricing().is_none());
    assert!(matches!(wizard.next(), StepTransition::Blocked { step: 1, .. }));
    assert_eq!(
        wizard.errors().get(BookingField::Unit),
        Some("Price is too large to calculate")
    );
}
