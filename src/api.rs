use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;
use validator::Validate;

use crate::catalogue::{self, Catalogue};
use crate::db::{self, PracticeHourKind};
use crate::error::AppError;
use crate::models::{
    validate_fixed_arrays, FahrtenUpdate, Note, PracticeHour, ProgressStatus, StatusCheck, Student,
    StudentCreate, StudentPatch, TrainingProgress,
};
use crate::stats::{self, CategoryStats, OverallProgress};
use crate::validation::{AppErrorExt, JsonValidateExt, ValidationResponse};

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body for the progress upsert; the key tuple rides in the query string.
#[derive(Debug, Deserialize)]
pub struct ProgressCreate {
    pub status: ProgressStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub status: Option<ProgressStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NoteCreate {
    pub student_id: String,
    pub category: String,
    pub subcategory: String,
    pub item: String,
    #[validate(length(min = 1, message = "Note text is required"))]
    pub note_text: String,
}

#[derive(Debug, Deserialize)]
pub struct PracticeHourCreate {
    pub duration: f64,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}

#[get("/training-categories")]
pub fn training_categories() -> Json<&'static Catalogue> {
    Json(catalogue::catalogue())
}

#[get("/students")]
pub async fn list_students(pool: &State<Pool<Sqlite>>) -> Result<Json<Vec<Student>>, AppError> {
    let students = db::get_students(pool).await?;
    Ok(Json(students))
}

#[post("/students", data = "<student>")]
pub async fn create_student(
    pool: &State<Pool<Sqlite>>,
    student: Json<StudentCreate>,
) -> Result<Json<Student>, Custom<Json<ValidationResponse>>> {
    let create = student.validate_custom()?;
    validate_fixed_arrays(
        create.ueberlandfahrten.as_deref(),
        create.autobahnfahrten.as_deref(),
        create.nachtfahrten.as_deref(),
    )
    .validate_custom()?;

    let student = Student::new(create);
    db::create_student(pool, &student).await.validate_custom()?;
    Ok(Json(student))
}

#[get("/students/<id>")]
pub async fn get_student(
    pool: &State<Pool<Sqlite>>,
    id: &str,
) -> Result<Json<Student>, AppError> {
    let student = db::get_student(pool, id).await?;
    Ok(Json(student))
}

#[put("/students/<id>", data = "<patch>")]
pub async fn update_student(
    pool: &State<Pool<Sqlite>>,
    id: &str,
    patch: Json<StudentPatch>,
) -> Result<Json<Student>, AppError> {
    let student = db::update_student(pool, id, patch.into_inner()).await?;
    Ok(Json(student))
}

#[delete("/students/<id>")]
pub async fn delete_student(
    pool: &State<Pool<Sqlite>>,
    id: &str,
) -> Result<Json<DeleteResponse>, AppError> {
    db::delete_student_cascade(pool, id).await?;
    Ok(Json(DeleteResponse { deleted: true }))
}

#[put("/students/<id>/fahrten", data = "<update>")]
pub async fn update_fahrten(
    pool: &State<Pool<Sqlite>>,
    id: &str,
    update: Json<FahrtenUpdate>,
) -> Result<Json<Student>, AppError> {
    let student = db::update_fahrten(pool, id, update.into_inner()).await?;
    Ok(Json(student))
}

#[post("/students/<id>/practice-hours/<hour_type>")]
pub async fn add_practice_hour(
    pool: &State<Pool<Sqlite>>,
    id: &str,
    hour_type: &str,
) -> Result<Json<Student>, AppError> {
    let kind = PracticeHourKind::parse(hour_type)?;
    let student = db::add_practice_hour(pool, id, kind).await?;
    Ok(Json(student))
}

#[delete("/students/<id>/practice-hours/<hour_type>/<index>")]
pub async fn remove_practice_hour(
    pool: &State<Pool<Sqlite>>,
    id: &str,
    hour_type: &str,
    index: i64,
) -> Result<Json<Student>, AppError> {
    let kind = PracticeHourKind::parse(hour_type)?;
    let student = db::remove_practice_hour(pool, id, kind, index).await?;
    Ok(Json(student))
}

#[post("/students/<id>/progress?<category>&<subcategory>&<item>", data = "<progress>")]
pub async fn upsert_progress(
    pool: &State<Pool<Sqlite>>,
    id: &str,
    category: &str,
    subcategory: &str,
    item: &str,
    progress: Json<ProgressCreate>,
) -> Result<Json<TrainingProgress>, AppError> {
    let body = progress.into_inner();
    let record =
        db::upsert_progress(pool, id, category, subcategory, item, body.status, body.notes).await?;
    Ok(Json(record))
}

#[get("/students/<id>/progress")]
pub async fn list_progress(
    pool: &State<Pool<Sqlite>>,
    id: &str,
) -> Result<Json<Vec<TrainingProgress>>, AppError> {
    let records = db::get_student_progress(pool, id).await?;
    Ok(Json(records))
}

#[put("/progress/<id>", data = "<update>")]
pub async fn update_progress(
    pool: &State<Pool<Sqlite>>,
    id: &str,
    update: Json<ProgressUpdate>,
) -> Result<Json<TrainingProgress>, AppError> {
    let body = update.into_inner();
    let record = db::update_progress(pool, id, body.status, body.notes).await?;
    Ok(Json(record))
}

#[get("/students/<id>/overall-progress")]
pub async fn overall_progress(
    pool: &State<Pool<Sqlite>>,
    id: &str,
) -> Result<Json<OverallProgress>, AppError> {
    let records = db::get_student_progress(pool, id).await?;
    Ok(Json(stats::overall_progress(catalogue::catalogue(), &records)))
}

#[get("/students/<id>/progress-stats")]
pub async fn progress_stats(
    pool: &State<Pool<Sqlite>>,
    id: &str,
) -> Result<Json<IndexMap<String, CategoryStats>>, AppError> {
    let records = db::get_student_progress(pool, id).await?;
    Ok(Json(stats::progress_stats(catalogue::catalogue(), &records)))
}

#[post("/notes", data = "<note>")]
pub async fn create_note(
    pool: &State<Pool<Sqlite>>,
    note: Json<NoteCreate>,
) -> Result<Json<Note>, Custom<Json<ValidationResponse>>> {
    let create = note.validate_custom()?;
    let note = Note {
        id: Uuid::new_v4().to_string(),
        student_id: create.student_id,
        category: create.category,
        subcategory: create.subcategory,
        item: create.item,
        note_text: create.note_text,
        created_at: Utc::now(),
    };
    db::create_note(pool, &note).await.validate_custom()?;
    Ok(Json(note))
}

#[get("/students/<id>/notes")]
pub async fn list_notes(
    pool: &State<Pool<Sqlite>>,
    id: &str,
) -> Result<Json<Vec<Note>>, AppError> {
    let notes = db::get_student_notes(pool, id).await?;
    Ok(Json(notes))
}

#[delete("/notes/<id>")]
pub async fn delete_note(
    pool: &State<Pool<Sqlite>>,
    id: &str,
) -> Result<Json<MessageResponse>, AppError> {
    db::delete_note(pool, id).await?;
    Ok(Json(MessageResponse {
        message: "Note deleted".to_string(),
    }))
}

#[get("/practice-hours")]
pub async fn list_practice_hours(
    pool: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<PracticeHour>>, AppError> {
    let hours = db::get_practice_hours(pool).await?;
    Ok(Json(hours))
}

#[post("/practice-hours", data = "<hour>")]
pub async fn create_practice_hour(
    pool: &State<Pool<Sqlite>>,
    hour: Json<PracticeHourCreate>,
) -> Result<Json<PracticeHour>, AppError> {
    let create = hour.into_inner();
    if create.duration != 0.5 && create.duration != 1.0 {
        return Err(AppError::Validation(format!(
            "Duration must be 0.5 or 1.0, got {}",
            create.duration
        )));
    }

    let hour = PracticeHour {
        id: Uuid::new_v4().to_string(),
        duration: create.duration,
        date: create.date.unwrap_or_else(Utc::now),
        created_at: Utc::now(),
    };
    db::create_practice_hour(pool, &hour).await?;
    Ok(Json(hour))
}

#[delete("/practice-hours/<id>")]
pub async fn delete_practice_hour(
    pool: &State<Pool<Sqlite>>,
    id: &str,
) -> Result<Json<MessageResponse>, AppError> {
    db::delete_practice_hour(pool, id).await?;
    Ok(Json(MessageResponse {
        message: "Practice hour deleted".to_string(),
    }))
}

#[post("/status", data = "<check>")]
pub async fn create_status_check(
    pool: &State<Pool<Sqlite>>,
    check: Json<StatusCheckCreate>,
) -> Result<Json<StatusCheck>, AppError> {
    let check = StatusCheck {
        id: Uuid::new_v4().to_string(),
        client_name: check.into_inner().client_name,
        timestamp: Utc::now(),
    };
    db::create_status_check(pool, &check).await?;
    Ok(Json(check))
}

#[get("/status")]
pub async fn list_status_checks(
    pool: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<StatusCheck>>, AppError> {
    let checks = db::get_status_checks(pool).await?;
    Ok(Json(checks))
}
