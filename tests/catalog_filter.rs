mod common;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use common::{amount, harbour_loft, temp_dir};
use property_core::core::filter::{BookingFilter, BookingSort, PropertyFilter, PropertySort};
use property_core::core::repository::{BookingRepository, PropertyRepository, RecordRepository};
use property_core::core::Catalog;
use property_core::domain::{
    Address, BillingUnit, Booking, BookingStatus, Guest, PricingEntry, Property, PropertyKind,
};
use property_core::errors::PropertyError;
use uuid::Uuid;

fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, d)
        .unwrap()
        .and_hms_opt(15, 0, 0)
        .unwrap()
}

fn garden_villa() -> Property {
    Property::new(
        "Garden Villa",
        PropertyKind::Villa,
        Address::new("8 Rose Lane", "Porto", "4000-100", "PT"),
    )
    .with_capacity(4, 8)
    .with_rate(BillingUnit::Night, PricingEntry::new(amount(260)))
}

fn booking(property: &Property, guest: &str, from: u32, to: u32, status: BookingStatus) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        property_id: property.id,
        guest: Guest {
            name: guest.to_string(),
            email: format!("{}@example.com", guest.to_lowercase()),
            phone: None,
        },
        check_in: day(from),
        check_out: day(to),
        billing_unit: BillingUnit::Night,
        guests: 2,
        duration: to - from,
        total_price: amount(120) * amount((to - from) as i64),
        status,
        notes: None,
        created_at: Utc::now(),
    }
}

#[test]
fn catalog_survives_reopening() {
    let dir = temp_dir();
    let loft = harbour_loft();
    let villa = garden_villa();
    {
        let catalog = Catalog::open_in(&dir).unwrap();
        assert!(catalog.create(&loft).unwrap().success);
        assert!(catalog.create(&villa).unwrap().success);
        let stay = booking(&loft, "Ada", 1, 4, BookingStatus::Confirmed);
        assert!(catalog.create(&stay).unwrap().success);
    }

    let reopened = Catalog::open_in(&dir).unwrap();
    assert_eq!(reopened.properties().unwrap().len(), 2);
    assert_eq!(reopened.bookings_for(loft.id).unwrap().len(), 1);
    assert_eq!(reopened.find_property("harbour loft").unwrap().id, loft.id);
    let prefix = &villa.id.to_string()[..6];
    assert_eq!(reopened.find_property(prefix).unwrap().id, villa.id);
    assert!(matches!(
        reopened.find_property("Beach Hut"),
        Err(PropertyError::NotFound(_))
    ));
}

#[test]
fn duplicate_names_are_business_rejections() {
    let catalog = Catalog::in_memory();
    assert!(catalog.create(&harbour_loft()).unwrap().success);

    let mut twin = harbour_loft();
    twin.name = "  harbour LOFT ".into();
    let response = catalog.create(&twin).unwrap();
    assert!(!response.success);
    assert_eq!(response.message, "Property `  harbour LOFT ` already exists");
    assert_eq!(catalog.properties().unwrap().len(), 1);
}

#[test]
fn update_keeps_identity_and_creation_time() {
    let catalog = Catalog::in_memory();
    let loft = harbour_loft();
    catalog.create(&loft).unwrap();

    let mut renamed = loft.clone();
    renamed.name = "Harbour Penthouse".into();
    renamed.created_at = Utc::now() + chrono::Duration::days(3);
    let response = catalog.update(&loft.id.to_string(), &renamed).unwrap();
    assert!(response.success);
    assert_eq!(response.id, Some(loft.id.to_string()));

    let stored = catalog.property(loft.id).unwrap().unwrap();
    assert_eq!(stored.name, "Harbour Penthouse");
    assert_eq!(stored.created_at, loft.created_at);

    let mut stray = harbour_loft();
    stray.name = "Nowhere House".into();
    let missing = catalog.update(&Uuid::new_v4().to_string(), &stray).unwrap();
    assert_eq!(missing.message, "Property not found");
}

#[test]
fn pending_bookings_do_not_hold_the_calendar() {
    let catalog = Catalog::in_memory();
    let loft = harbour_loft();
    catalog.create(&loft).unwrap();

    assert!(catalog.create(&booking(&loft, "Ada", 1, 5, BookingStatus::Pending)).unwrap().success);
    assert!(catalog.create(&booking(&loft, "Grace", 3, 6, BookingStatus::Confirmed)).unwrap().success);
    let clash = catalog
        .create(&booking(&loft, "Alan", 5, 8, BookingStatus::Confirmed))
        .unwrap();
    assert!(!clash.success);
    assert!(clash.message.contains("already booked"));
    // Check-out day is free for the next arrival.
    assert!(catalog.create(&booking(&loft, "Edsger", 6, 9, BookingStatus::Confirmed)).unwrap().success);
}

#[test]
fn property_listing_filters_and_sorts() {
    let mut studio = Property::new(
        "City Studio",
        PropertyKind::Studio,
        Address::new("5 Rua Augusta", "Lisbon", "1100-048", "PT"),
    )
    .with_capacity(0, 2)
    .with_rate(BillingUnit::Night, PricingEntry::new(amount(80)));
    studio.created_at = Utc::now() + chrono::Duration::seconds(10);
    let properties = vec![harbour_loft(), garden_villa(), studio];

    let lisbon: Vec<&str> = PropertyFilter::default()
        .city("lisbon")
        .apply(&properties, PropertySort::NightlyRateAsc)
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(lisbon, vec!["City Studio", "Harbour Loft"]);

    let roomy: Vec<&str> = PropertyFilter::default()
        .min_guests(4)
        .max_nightly_rate(amount(200))
        .apply(&properties, PropertySort::NameAsc)
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(roomy, vec!["Harbour Loft"]);

    let newest = PropertyFilter::default().apply(&properties, PropertySort::Newest);
    assert_eq!(newest[0].name, "City Studio");

    let typo = PropertyFilter::default()
        .search("Gardn Villa")
        .apply(&properties, PropertySort::NameAsc);
    assert_eq!(typo.len(), 1);
    assert_eq!(typo[0].name, "Garden Villa");
}

#[test]
fn booking_listing_filters_by_status_window_and_guest() {
    let loft = harbour_loft();
    let bookings = vec![
        booking(&loft, "Ada", 1, 4, BookingStatus::Confirmed),
        booking(&loft, "Grace", 10, 12, BookingStatus::Pending),
        booking(&loft, "Alan", 20, 25, BookingStatus::Confirmed),
    ];

    let confirmed = BookingFilter::default()
        .status("confirmed".parse().unwrap())
        .apply(&bookings, "latest".parse::<BookingSort>().unwrap());
    let guests: Vec<&str> = confirmed.iter().map(|b| b.guest.name.as_str()).collect();
    assert_eq!(guests, vec!["Alan", "Ada"]);

    let mid_month = BookingFilter::default()
        .between(day(9), day(21))
        .apply(&bookings, BookingSort::CheckInAsc);
    assert_eq!(mid_month.len(), 2);

    let by_email = BookingFilter::default()
        .guest("GRACE@")
        .apply(&bookings, BookingSort::TotalDesc);
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].guest.name, "Grace");
}
