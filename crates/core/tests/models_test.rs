use chrono::{TimeZone, Utc};
use lessonbook_core::{
    admission::{AdmissionOutcome, Caller, CancellationOutcome, Rejection},
    models::{
        account::SessionResponse,
        lesson_slot::{BulkSlotRequest, LessonSlot, LessonSlotSummary},
        reservation::Reservation,
        student::StudentRequest,
    },
};
use pretty_assertions::assert_eq;
use serde_json::{from_value, json, to_value};
use serde_test::{assert_tokens, Token};
use uuid::Uuid;

#[test]
fn test_rejection_wire_names() {
    assert_tokens(&Rejection::TooEarly, &[Token::UnitVariant { name: "Rejection", variant: "too_early" }]);
    assert_tokens(
        &Rejection::AlreadyWaitlisted,
        &[Token::UnitVariant { name: "Rejection", variant: "already_waitlisted" }],
    );
}

#[test]
fn test_admission_outcome_is_tagged_by_status() {
    let reservation = Reservation {
        id: Uuid::nil(),
        lesson_slot_id: Uuid::nil(),
        student_id: Uuid::nil(),
        reserved_at: Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap(),
    };

    let confirmed = to_value(AdmissionOutcome::Confirmed { reservation }).unwrap();
    assert_eq!(confirmed["status"], "confirmed");
    assert_eq!(confirmed["reservation"]["reserved_at"], "2026-11-01T12:00:00Z");

    let rejected = to_value(AdmissionOutcome::Rejected { reason: Rejection::Full }).unwrap();
    assert_eq!(rejected, json!({ "status": "rejected", "reason": "full" }));

    let not_owner = to_value(CancellationOutcome::Rejected { reason: Rejection::NotOwner }).unwrap();
    assert_eq!(not_owner, json!({ "status": "rejected", "reason": "not_owner" }));
}

#[test]
fn test_caller_serialization() {
    let family_id = Uuid::new_v4();
    let caller = to_value(Caller::Guardian { family_id }).unwrap();
    assert_eq!(caller, json!({ "role": "guardian", "family_id": family_id }));

    let admin: Caller = from_value(json!({ "role": "administrator" })).unwrap();
    assert!(admin.is_administrator());
}

#[test]
fn test_summary_flattens_slot_fields() {
    let start = Utc.with_ymd_and_hms(2026, 11, 2, 9, 0, 0).unwrap();
    let summary = LessonSlotSummary {
        slot: LessonSlot {
            id: Uuid::nil(),
            title: "Calligraphy Class".to_string(),
            start_time: start,
            end_time: start + chrono::Duration::hours(1),
            capacity: 5,
            reservation_opens_at: start - chrono::Duration::days(7),
            created_at: start - chrono::Duration::days(30),
        },
        reserved_count: 2,
        available_slots: 3,
        is_reservable: true,
    };

    let value = to_value(&summary).unwrap();
    assert_eq!(value["title"], "Calligraphy Class");
    assert_eq!(value["capacity"], 5);
    assert_eq!(value["available_slots"], 3);
}

#[test]
fn test_bulk_request_deserialization() {
    let request: BulkSlotRequest = from_value(json!({
        "start_date": "2026-11-02",
        "end_date": "2026-11-08",
        "weekdays": [0, 2, 4],
        "time_slots": "09:00-10:00\n10:30-11:30",
        "capacity": 5,
        "reservation_opens_at": "2026-10-20T00:00:00Z"
    }))
    .unwrap();

    assert_eq!(request.title, None);
    assert_eq!(request.weekdays, vec![0, 2, 4]);
    assert_eq!(request.time_slots.lines().count(), 2);
}

#[test]
fn test_student_name_validation() {
    let valid = StudentRequest { name: "  Taro Yamada ".to_string() };
    assert_eq!(valid.validated_name().unwrap(), "Taro Yamada");

    let blank = StudentRequest { name: "   ".to_string() };
    assert!(blank.validated_name().is_err());

    let long = StudentRequest { name: "x".repeat(101) };
    assert!(long.validated_name().is_err());
}

#[test]
fn test_session_landing() {
    assert_eq!(SessionResponse::landing_for(true), "/admin-dashboard");
    assert_eq!(SessionResponse::landing_for(false), "/calendar");
}
