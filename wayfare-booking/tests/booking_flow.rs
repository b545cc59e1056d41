use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use wayfare_booking::{
    BookingError, BookingManager, LogEmailSink, LogNotificationSink, MockQrIssuer,
};
use wayfare_catalog::{CapacityLedger, TourDirectory};
use wayfare_domain::{
    BookingStatus, Caller, CreateBookingRequest, PaymentStatus, Tour, Trip,
};

struct Harness {
    manager: Arc<BookingManager>,
    ledger: Arc<CapacityLedger>,
    trip_id: Uuid,
    owner: Caller,
}

async fn harness(max_participants: u32) -> Harness {
    let owner = Caller::new(Uuid::new_v4(), "Agent Owner");
    let tours = Arc::new(TourDirectory::new());
    let ledger = Arc::new(CapacityLedger::new());

    let tour = Tour::new(
        "Halong Bay Overnight".to_string(),
        75_00,
        "USD".to_string(),
        owner.user_id,
    );
    let tour_id = tour.id;
    tours.add(tour).await;

    let now = Utc::now();
    let trip = Trip::new(
        tour_id,
        now + Duration::days(14),
        now + Duration::days(16),
        max_participants,
    );
    let trip_id = trip.id;
    ledger.add_trip(trip).await.unwrap();

    let manager = Arc::new(BookingManager::new(
        tours,
        Arc::clone(&ledger),
        Arc::new(MockQrIssuer::default()),
        Arc::new(LogNotificationSink),
        Arc::new(LogEmailSink),
        Duration::minutes(10),
    ));

    Harness {
        manager,
        ledger,
        trip_id,
        owner,
    }
}

fn request(trip_id: Uuid, names: &[&str]) -> CreateBookingRequest {
    CreateBookingRequest {
        trip_id,
        participant_names: names.iter().map(|n| n.to_string()).collect(),
        contact_phone: "555-0199".to_string(),
        note: Some("window seats please".to_string()),
    }
}

#[tokio::test]
async fn concurrent_bookings_cannot_exceed_capacity() {
    // Trip with 2 seats, two concurrent 2-seat requests: exactly one wins.
    let hx = harness(2).await;

    let first = tokio::spawn({
        let manager = Arc::clone(&hx.manager);
        let req = request(hx.trip_id, &["A1", "A2"]);
        async move {
            let caller = Caller::new(Uuid::new_v4(), "Racer A");
            manager.create_booking(&caller, req).await
        }
    });
    let second = tokio::spawn({
        let manager = Arc::clone(&hx.manager);
        let req = request(hx.trip_id, &["B1", "B2"]);
        async move {
            let caller = Caller::new(Uuid::new_v4(), "Racer B");
            manager.create_booking(&caller, req).await
        }
    });

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let granted = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(granted, 1);

    let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        BookingError::InsufficientCapacity { .. }
    ));

    assert_eq!(
        hx.ledger.get(hx.trip_id).await.unwrap().current_participants,
        2
    );
}

#[tokio::test]
async fn expired_unpaid_booking_is_swept_and_seats_return() {
    let hx = harness(10).await;
    let caller = Caller::new(Uuid::new_v4(), "Late Payer");

    let booking = hx
        .manager
        .create_booking(&caller, request(hx.trip_id, &["P1", "P2", "P3"]))
        .await
        .unwrap();
    assert_eq!(
        hx.ledger.get(hx.trip_id).await.unwrap().current_participants,
        3
    );

    // Reconciler running 11 minutes later, with a 10 minute payment window.
    let report = hx
        .manager
        .cancel_expired(Utc::now() + Duration::minutes(11))
        .await;
    assert_eq!(report.cancelled, vec![booking.booking_code.clone()]);

    let swept = hx.manager.get_booking(booking.id).await.unwrap();
    assert_eq!(swept.status, BookingStatus::Cancelled);
    assert_eq!(swept.payment_status, PaymentStatus::Pending);
    assert_eq!(
        hx.ledger.get(hx.trip_id).await.unwrap().current_participants,
        0
    );
}

#[tokio::test]
async fn confirmed_booking_survives_later_sweeps() {
    let hx = harness(10).await;
    let caller = Caller::new(Uuid::new_v4(), "Prompt Payer");

    let booking = hx
        .manager
        .create_booking(&caller, request(hx.trip_id, &["P1"]))
        .await
        .unwrap();

    // Paid five minutes in, well before the timeout.
    hx.manager.confirm_payment(&caller, booking.id).await.unwrap();

    let report = hx
        .manager
        .cancel_expired(Utc::now() + Duration::minutes(11))
        .await;
    assert!(report.cancelled.is_empty());

    let kept = hx.manager.get_booking(booking.id).await.unwrap();
    assert_eq!(kept.status, BookingStatus::Confirmed);
    assert_eq!(kept.payment_status, PaymentStatus::Paid);
    assert_eq!(
        hx.ledger.get(hx.trip_id).await.unwrap().current_participants,
        1
    );
}

#[tokio::test]
async fn same_day_codes_are_sequential_and_distinct() {
    let hx = harness(20).await;
    let caller = Caller::new(Uuid::new_v4(), "Group Lead");

    let mut codes = Vec::new();
    for names in [&["A"][..], &["B"][..], &["C"][..]] {
        let booking = hx
            .manager
            .create_booking(&caller, request(hx.trip_id, names))
            .await
            .unwrap();
        codes.push(booking.booking_code);
    }

    let suffixes: Vec<&str> = codes.iter().map(|c| &c[c.len() - 3..]).collect();
    assert_eq!(suffixes, vec!["001", "002", "003"]);
}

#[tokio::test]
async fn concurrent_creations_get_distinct_codes() {
    let hx = harness(50).await;

    let mut handles = Vec::new();
    for i in 0..12 {
        let manager = Arc::clone(&hx.manager);
        let req = request(hx.trip_id, &["Solo"]);
        handles.push(tokio::spawn(async move {
            let caller = Caller::new(Uuid::new_v4(), format!("Caller {i}"));
            manager.create_booking(&caller, req).await
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        let booking = handle.await.unwrap().unwrap();
        codes.insert(booking.booking_code);
    }
    assert_eq!(codes.len(), 12);
    assert_eq!(
        hx.ledger.get(hx.trip_id).await.unwrap().current_participants,
        12
    );
}

#[tokio::test]
async fn seats_held_always_match_live_bookings() {
    // Conservation: occupancy equals the seat sum of non-cancelled bookings.
    let hx = harness(20).await;
    let ann = Caller::new(Uuid::new_v4(), "Ann");
    let ben = Caller::new(Uuid::new_v4(), "Ben");

    let a = hx
        .manager
        .create_booking(&ann, request(hx.trip_id, &["A1", "A2"]))
        .await
        .unwrap();
    let b = hx
        .manager
        .create_booking(&ben, request(hx.trip_id, &["B1", "B2", "B3"]))
        .await
        .unwrap();
    assert_eq!(
        hx.ledger.get(hx.trip_id).await.unwrap().current_participants,
        5
    );

    hx.manager.cancel_booking(&ann, a.id).await.unwrap();
    assert_eq!(
        hx.ledger.get(hx.trip_id).await.unwrap().current_participants,
        3
    );

    // Expire the remaining unpaid booking; occupancy drains to zero.
    let report = hx
        .manager
        .cancel_expired(Utc::now() + Duration::minutes(11))
        .await;
    assert_eq!(report.cancelled, vec![b.booking_code]);
    assert_eq!(
        hx.ledger.get(hx.trip_id).await.unwrap().current_participants,
        0
    );
}

#[tokio::test]
async fn full_lifecycle_pending_to_completed() {
    let hx = harness(10).await;
    let caller = Caller::new(Uuid::new_v4(), "Traveller");

    let booking = hx
        .manager
        .create_booking(&caller, request(hx.trip_id, &["T1", "T2"]))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    let confirmed = hx.manager.confirm_payment(&caller, booking.id).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.payment_status, PaymentStatus::Paid);

    let completed = hx
        .manager
        .check_in(&hx.owner, &booking.booking_code)
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    // Terminal: no further transitions from COMPLETED.
    assert!(hx.manager.cancel_booking(&caller, booking.id).await.is_err());
    assert!(hx
        .manager
        .check_in(&hx.owner, &booking.booking_code)
        .await
        .is_err());
}

#[tokio::test]
async fn booking_on_inactive_trip_is_rejected() {
    let hx = harness(10).await;
    let caller = Caller::new(Uuid::new_v4(), "Traveller");

    hx.ledger.set_active(hx.trip_id, false).await.unwrap();

    let err = hx
        .manager
        .create_booking(&caller, request(hx.trip_id, &["T1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::TripInactive(_)));
}
