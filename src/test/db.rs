use crate::db;
use crate::error::AppError;
use crate::models::{FahrtenUpdate, ProgressStatus};
use crate::test::utils::{create_standard_test_db, TestDbBuilder};

#[rocket::async_test]
async fn test_upsert_keeps_notes_when_absent() {
    let test_db = create_standard_test_db().await;
    let id = test_db.student_id("Erika");

    let first = db::upsert_progress(
        &test_db.pool,
        &id,
        "grundstufe",
        "pedale",
        "Pedale",
        ProgressStatus::Once,
        Some("Kupplung kommt zu schnell".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(first.notes.as_deref(), Some("Kupplung kommt zu schnell"));

    let second = db::upsert_progress(
        &test_db.pool,
        &id,
        "grundstufe",
        "pedale",
        "Pedale",
        ProgressStatus::Twice,
        None,
    )
    .await
    .unwrap();
    assert_eq!(second.status, ProgressStatus::Twice);
    assert_eq!(second.notes.as_deref(), Some("Kupplung kommt zu schnell"));

    let third = db::upsert_progress(
        &test_db.pool,
        &id,
        "grundstufe",
        "pedale",
        "Pedale",
        ProgressStatus::Thrice,
        Some("sauber".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(third.notes.as_deref(), Some("sauber"));

    let records = db::get_student_progress(&test_db.pool, &id).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[rocket::async_test]
async fn test_cascade_delete_removes_dependents() {
    let test_db = create_standard_test_db().await;
    let id = test_db.student_id("Max");

    assert!(!db::get_student_progress(&test_db.pool, &id)
        .await
        .unwrap()
        .is_empty());
    assert!(!db::get_student_notes(&test_db.pool, &id)
        .await
        .unwrap()
        .is_empty());

    db::delete_student_cascade(&test_db.pool, &id).await.unwrap();

    assert!(matches!(
        db::get_student(&test_db.pool, &id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(db::get_student_progress(&test_db.pool, &id)
        .await
        .unwrap()
        .is_empty());
    assert!(db::get_student_notes(&test_db.pool, &id)
        .await
        .unwrap()
        .is_empty());

    // Other students keep their data.
    let other = test_db.student_id("Erika");
    assert!(db::get_student(&test_db.pool, &other).await.is_ok());
}

#[rocket::async_test]
async fn test_fahrten_rejects_wrong_slot_count_without_writing() {
    let test_db = create_standard_test_db().await;
    let id = test_db.student_id("Max");

    let result = db::update_fahrten(
        &test_db.pool,
        &id,
        FahrtenUpdate {
            autobahnfahrten: Some(vec![true, true]),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let student = db::get_student(&test_db.pool, &id).await.unwrap();
    assert_eq!(student.autobahnfahrten, vec![false; 4]);
}

#[rocket::async_test]
async fn test_practice_hour_index_bounds() {
    let test_db = create_standard_test_db().await;
    let id = test_db.student_id("Max");

    let result =
        db::remove_practice_hour(&test_db.pool, &id, db::PracticeHourKind::Ganz, 0).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    db::add_practice_hour(&test_db.pool, &id, db::PracticeHourKind::Ganz)
        .await
        .unwrap();

    let result =
        db::remove_practice_hour(&test_db.pool, &id, db::PracticeHourKind::Ganz, -1).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let student = db::remove_practice_hour(&test_db.pool, &id, db::PracticeHourKind::Ganz, 0)
        .await
        .unwrap();
    assert!(student.uebungsfahrten_ganz.is_empty());
}

#[rocket::async_test]
async fn test_upsert_for_unknown_student_succeeds() {
    let test_db = TestDbBuilder::new().build().await.unwrap();

    // The store runs no referential check on upsert.
    let record = db::upsert_progress(
        &test_db.pool,
        "ghost-id",
        "grundstufe",
        "pedale",
        "Pedale",
        ProgressStatus::Once,
        None,
    )
    .await
    .unwrap();
    assert_eq!(record.student_id, "ghost-id");
}

#[rocket::async_test]
async fn test_delete_note_unknown_is_not_found() {
    let test_db = TestDbBuilder::new().build().await.unwrap();
    assert!(matches!(
        db::delete_note(&test_db.pool, "missing").await,
        Err(AppError::NotFound(_))
    ));
}
