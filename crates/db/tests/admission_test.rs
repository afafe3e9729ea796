use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use fake::{faker::name::en::FirstName, Fake};
use lessonbook_core::{
    admission::{cancel_reservation, request_admission, AdmissionOutcome, CancellationOutcome, Caller, Rejection},
    availability::{available_slots_for, is_reservable_for},
    errors::BookingError,
    generator::generate_slots,
    models::lesson_slot::{BulkSlotRequest, NewLessonSlot},
};
use lessonbook_db::memory::MemoryStore;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
}

fn open_slot(capacity: i32) -> NewLessonSlot {
    let start = now() + Duration::days(7);
    NewLessonSlot {
        title: "Calligraphy Class".to_string(),
        start_time: start,
        end_time: start + Duration::hours(1),
        capacity,
        reservation_opens_at: now() - Duration::days(1),
    }
}

fn student_name() -> String {
    FirstName().fake()
}

#[fixture]
fn store() -> MemoryStore {
    MemoryStore::new()
}

#[rstest]
#[tokio::test]
async fn guardian_gets_reservation_while_capacity_remains(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let slot = store.add_slot(open_slot(2));
    let student = store.add_student(family_id, &student_name());

    let outcome = request_admission(
        &store,
        slot.id,
        student.id,
        &Caller::Guardian { family_id },
        now(),
    )
    .await
    .unwrap();

    match outcome {
        AdmissionOutcome::Confirmed { reservation } => {
            assert_eq!(reservation.lesson_slot_id, slot.id);
            assert_eq!(reservation.student_id, student.id);
            assert_eq!(reservation.reserved_at, now());
        }
        other => panic!("expected confirmation, got {:?}", other),
    }
    assert_eq!(store.reservations_for(slot.id).len(), 1);
    assert_eq!(available_slots_for(&store, slot.id).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn guardian_is_waitlisted_when_slot_is_full(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let caller = Caller::Guardian { family_id };
    let slot = store.add_slot(open_slot(1));
    let first = store.add_student(family_id, &student_name());
    let second = store.add_student(family_id, &student_name());

    request_admission(&store, slot.id, first.id, &caller, now())
        .await
        .unwrap();
    let outcome = request_admission(&store, slot.id, second.id, &caller, now())
        .await
        .unwrap();

    match outcome {
        AdmissionOutcome::Waitlisted { entry } => assert_eq!(entry.student_id, second.id),
        other => panic!("expected waitlist entry, got {:?}", other),
    }
    assert_eq!(store.reservations_for(slot.id).len(), 1);
    assert_eq!(store.waitlist_for(slot.id).len(), 1);
    assert!(!is_reservable_for(&store, slot.id, now()).await.unwrap());
}

#[rstest]
#[tokio::test]
async fn guardian_before_opening_is_too_early(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let mut pending = open_slot(3);
    pending.reservation_opens_at = now() + Duration::hours(2);
    let slot = store.add_slot(pending);
    let student = store.add_student(family_id, &student_name());

    let outcome = request_admission(
        &store,
        slot.id,
        student.id,
        &Caller::Guardian { family_id },
        now(),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        AdmissionOutcome::Rejected {
            reason: Rejection::TooEarly
        }
    );
    assert!(store.reservations_for(slot.id).is_empty());
    assert!(store.waitlist_for(slot.id).is_empty());
}

#[rstest]
#[tokio::test]
async fn opening_instant_itself_is_open(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let mut pending = open_slot(3);
    pending.reservation_opens_at = now();
    let slot = store.add_slot(pending);
    let student = store.add_student(family_id, &student_name());

    let outcome = request_admission(
        &store,
        slot.id,
        student.id,
        &Caller::Guardian { family_id },
        now(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, AdmissionOutcome::Confirmed { .. }));
}

#[rstest]
#[tokio::test]
async fn repeated_reservation_is_rejected(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let caller = Caller::Guardian { family_id };
    let slot = store.add_slot(open_slot(5));
    let student = store.add_student(family_id, &student_name());

    request_admission(&store, slot.id, student.id, &caller, now())
        .await
        .unwrap();
    let outcome = request_admission(&store, slot.id, student.id, &caller, now())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AdmissionOutcome::Rejected {
            reason: Rejection::AlreadyReserved
        }
    );
    assert_eq!(store.reservations_for(slot.id).len(), 1);
}

#[rstest]
#[tokio::test]
async fn repeated_waitlist_request_is_rejected(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let caller = Caller::Guardian { family_id };
    let slot = store.add_slot(open_slot(1));
    let holder = store.add_student(family_id, &student_name());
    let waiting = store.add_student(family_id, &student_name());

    request_admission(&store, slot.id, holder.id, &caller, now())
        .await
        .unwrap();
    request_admission(&store, slot.id, waiting.id, &caller, now())
        .await
        .unwrap();
    let outcome = request_admission(&store, slot.id, waiting.id, &caller, now())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AdmissionOutcome::Rejected {
            reason: Rejection::AlreadyWaitlisted
        }
    );
    assert_eq!(store.waitlist_for(slot.id).len(), 1);
}

#[rstest]
#[tokio::test]
async fn administrator_skips_opening_gate_but_never_waitlists(store: MemoryStore) {
    let mut pending = open_slot(1);
    pending.reservation_opens_at = now() + Duration::days(3);
    let slot = store.add_slot(pending);
    let family_id = Uuid::new_v4();
    let first = store.add_student(family_id, &student_name());
    let second = store.add_student(family_id, &student_name());

    let admitted = request_admission(&store, slot.id, first.id, &Caller::Administrator, now())
        .await
        .unwrap();
    assert!(matches!(admitted, AdmissionOutcome::Confirmed { .. }));

    let overflow = request_admission(&store, slot.id, second.id, &Caller::Administrator, now())
        .await
        .unwrap();
    assert_eq!(
        overflow,
        AdmissionOutcome::Rejected {
            reason: Rejection::Full
        }
    );
    assert!(store.waitlist_for(slot.id).is_empty());
}

#[rstest]
#[tokio::test]
async fn guardian_cannot_admit_another_familys_student(store: MemoryStore) {
    let slot = store.add_slot(open_slot(3));
    let student = store.add_student(Uuid::new_v4(), &student_name());

    let outcome = request_admission(
        &store,
        slot.id,
        student.id,
        &Caller::Guardian {
            family_id: Uuid::new_v4(),
        },
        now(),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        AdmissionOutcome::Rejected {
            reason: Rejection::NotOwner
        }
    );
    assert!(store.reservations_for(slot.id).is_empty());
}

#[rstest]
#[tokio::test]
async fn missing_slot_or_student_is_not_found(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let caller = Caller::Guardian { family_id };
    let slot = store.add_slot(open_slot(3));
    let student = store.add_student(family_id, &student_name());

    let no_slot = request_admission(&store, Uuid::new_v4(), student.id, &caller, now()).await;
    assert!(matches!(no_slot, Err(BookingError::NotFound(_))));

    let no_student = request_admission(&store, slot.id, Uuid::new_v4(), &caller, now()).await;
    assert!(matches!(no_student, Err(BookingError::NotFound(_))));
}

#[rstest]
#[tokio::test]
async fn slot_locks_follow_existing_slots(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let caller = Caller::Guardian { family_id };
    let student = store.add_student(family_id, &student_name());

    for _ in 0..3 {
        let missing = request_admission(&store, Uuid::new_v4(), student.id, &caller, now()).await;
        assert!(matches!(missing, Err(BookingError::NotFound(_))));
    }
    assert_eq!(store.tracked_locks(), 0);

    let slot = store.add_slot(open_slot(2));
    request_admission(&store, slot.id, student.id, &caller, now())
        .await
        .unwrap();
    assert_eq!(store.tracked_locks(), 1);

    assert!(store.delete_slot(slot.id));
    assert_eq!(store.tracked_locks(), 0);
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_admissions_fill_capacity_exactly() {
    let store = Arc::new(MemoryStore::new());
    let family_id = Uuid::new_v4();
    let slot_id = store.add_slot(open_slot(3)).id;
    let students: Vec<_> = (0..12)
        .map(|_| store.add_student(family_id, &student_name()).id)
        .collect();

    let handles: Vec<_> = students
        .into_iter()
        .map(|student_id| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let caller = Caller::Guardian { family_id };
                request_admission(store.as_ref(), slot_id, student_id, &caller, now()).await
            })
        })
        .collect();

    let mut confirmed = 0;
    let mut waitlisted = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            AdmissionOutcome::Confirmed { .. } => confirmed += 1,
            AdmissionOutcome::Waitlisted { .. } => waitlisted += 1,
            AdmissionOutcome::Rejected { reason } => panic!("unexpected rejection {:?}", reason),
        }
    }

    assert_eq!(confirmed, 3);
    assert_eq!(waitlisted, 9);
    assert_eq!(store.reservations_for(slot_id).len(), 3);
    assert_eq!(store.waitlist_for(slot_id).len(), 9);
}

#[rstest]
#[tokio::test]
async fn cancellation_frees_a_place_without_promoting(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let caller = Caller::Guardian { family_id };
    let slot = store.add_slot(open_slot(1));
    let holder = store.add_student(family_id, &student_name());
    let waiting = store.add_student(family_id, &student_name());

    let reservation = match request_admission(&store, slot.id, holder.id, &caller, now())
        .await
        .unwrap()
    {
        AdmissionOutcome::Confirmed { reservation } => reservation,
        other => panic!("expected confirmation, got {:?}", other),
    };
    request_admission(&store, slot.id, waiting.id, &caller, now())
        .await
        .unwrap();

    let outcome = cancel_reservation(&store, reservation.id, &caller).await.unwrap();

    assert_eq!(
        outcome,
        CancellationOutcome::Cancelled {
            reservation: reservation.clone()
        }
    );
    assert!(store.reservations_for(slot.id).is_empty());
    assert_eq!(store.waitlist_for(slot.id).len(), 1);
    assert_eq!(available_slots_for(&store, slot.id).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn cancellation_leaves_other_bookings_untouched(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let caller = Caller::Guardian { family_id };
    let slot = store.add_slot(open_slot(2));
    let first = store.add_student(family_id, &student_name());
    let second = store.add_student(family_id, &student_name());
    let waiting = store.add_student(family_id, &student_name());

    let mut held = Vec::new();
    for student in [&first, &second] {
        match request_admission(&store, slot.id, student.id, &caller, now())
            .await
            .unwrap()
        {
            AdmissionOutcome::Confirmed { reservation } => held.push(reservation),
            other => panic!("expected confirmation, got {:?}", other),
        }
    }
    request_admission(&store, slot.id, waiting.id, &caller, now())
        .await
        .unwrap();
    let waitlist_before = store.waitlist_for(slot.id);
    assert_eq!(available_slots_for(&store, slot.id).await.unwrap(), 0);

    cancel_reservation(&store, held[0].id, &caller).await.unwrap();

    assert_eq!(store.reservations_for(slot.id), vec![held[1].clone()]);
    assert_eq!(store.waitlist_for(slot.id), waitlist_before);
    assert_eq!(available_slots_for(&store, slot.id).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn cancellation_by_another_family_is_rejected(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let slot = store.add_slot(open_slot(2));
    let student = store.add_student(family_id, &student_name());
    let reservation = match request_admission(
        &store,
        slot.id,
        student.id,
        &Caller::Guardian { family_id },
        now(),
    )
    .await
    .unwrap()
    {
        AdmissionOutcome::Confirmed { reservation } => reservation,
        other => panic!("expected confirmation, got {:?}", other),
    };

    let outcome = cancel_reservation(
        &store,
        reservation.id,
        &Caller::Guardian {
            family_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        CancellationOutcome::Rejected {
            reason: Rejection::NotOwner
        }
    );
    assert_eq!(store.reservations_for(slot.id).len(), 1);

    let removed = cancel_reservation(&store, reservation.id, &Caller::Administrator)
        .await
        .unwrap();
    assert!(matches!(removed, CancellationOutcome::Cancelled { .. }));

    let again = cancel_reservation(&store, reservation.id, &Caller::Administrator).await;
    assert!(matches!(again, Err(BookingError::NotFound(_))));
}

#[rstest]
#[tokio::test]
async fn deleting_a_student_removes_their_bookings(store: MemoryStore) {
    let family_id = Uuid::new_v4();
    let caller = Caller::Guardian { family_id };
    let slot = store.add_slot(open_slot(1));
    let holder = store.add_student(family_id, &student_name());
    let waiting = store.add_student(family_id, &student_name());
    request_admission(&store, slot.id, holder.id, &caller, now())
        .await
        .unwrap();
    request_admission(&store, slot.id, waiting.id, &caller, now())
        .await
        .unwrap();

    assert!(store.delete_student(holder.id));
    assert!(store.delete_student(waiting.id));

    assert!(store.reservations_for(slot.id).is_empty());
    assert!(store.waitlist_for(slot.id).is_empty());
    assert!(!store.delete_student(holder.id));
}

fn bulk_request(start: (i32, u32, u32), end: (i32, u32, u32), weekdays: Vec<u8>) -> BulkSlotRequest {
    BulkSlotRequest {
        title: None,
        start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
        end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        weekdays,
        time_slots: "10:00-11:00\n14:00-15:00".to_string(),
        capacity: 4,
        reservation_opens_at: now(),
    }
}

#[rstest]
#[case::single_monday((2026, 11, 2), (2026, 11, 2), vec![0], 2)]
#[case::full_week((2026, 11, 2), (2026, 11, 8), (0..7).collect(), 14)]
#[case::weekends_over_two_weeks((2026, 11, 2), (2026, 11, 15), vec![5, 6], 8)]
#[case::no_matching_day((2026, 11, 2), (2026, 11, 3), vec![4], 0)]
#[tokio::test]
async fn bulk_generation_stores_every_expanded_slot(
    store: MemoryStore,
    #[case] start: (i32, u32, u32),
    #[case] end: (i32, u32, u32),
    #[case] weekdays: Vec<u8>,
    #[case] expected: u64,
) {
    let request = bulk_request(start, end, weekdays);

    let created = generate_slots(&store, &request, chrono_tz::Asia::Tokyo)
        .await
        .unwrap();

    assert_eq!(created, expected);
    let slots = store.slots();
    assert_eq!(slots.len() as u64, expected);
    assert!(slots.iter().all(|slot| slot.capacity == 4));
    assert!(slots.iter().all(|slot| slot.title == "Calligraphy Class"));
}

#[rstest]
#[tokio::test]
async fn malformed_bulk_request_stores_nothing(store: MemoryStore) {
    let mut request = bulk_request((2026, 11, 2), (2026, 11, 8), vec![0, 2]);
    request.time_slots = "10:00-11:00\nnoon-ish".to_string();

    let result = generate_slots(&store, &request, chrono_tz::UTC).await;

    assert!(matches!(result, Err(BookingError::Validation(_))));
    assert!(store.slots().is_empty());
}

#[rstest]
#[tokio::test]
async fn oversized_bulk_request_stores_nothing(store: MemoryStore) {
    let mut request = bulk_request((2026, 1, 1), (2026, 12, 31), (0..7).collect());
    request.time_slots = (8..14)
        .map(|hour| format!("{:02}:00-{:02}:00", hour, hour + 1))
        .collect::<Vec<_>>()
        .join("\n");

    let result = generate_slots(&store, &request, chrono_tz::UTC).await;

    assert!(matches!(result, Err(BookingError::Validation(_))));
    assert!(store.slots().is_empty());
}

#[rstest]
#[tokio::test]
async fn bulk_request_spanning_centuries_stores_nothing(store: MemoryStore) {
    let request = bulk_request((2026, 1, 1), (2525, 12, 31), (0..7).collect());

    let result = generate_slots(&store, &request, chrono_tz::UTC).await;

    assert!(matches!(result, Err(BookingError::Validation(_))));
    assert!(store.slots().is_empty());
}
