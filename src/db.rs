use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    validate_fixed_arrays, DbNote, DbPracticeHour, DbStatusCheck, DbStudent, DbTrainingProgress,
    FahrtenUpdate, Note, PracticeHour, ProgressStatus, StatusCheck, Student, StudentPatch,
    TrainingProgress,
};

/// Fixed upper fetch bound per query. Not pagination; deployments beyond
/// this silently truncate, as the original backend did.
pub const FETCH_LIMIT: i64 = 1000;

/// The two unbounded practice-session arrays on a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeHourKind {
    Ganz,
    Halb,
}

impl PracticeHourKind {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "ganz" => Ok(PracticeHourKind::Ganz),
            "halb" => Ok(PracticeHourKind::Halb),
            other => Err(AppError::Validation(format!(
                "Unknown practice hour type '{}', expected 'ganz' or 'halb'",
                other
            ))),
        }
    }

    fn column(&self) -> &'static str {
        match self {
            PracticeHourKind::Ganz => "uebungsfahrten_ganz",
            PracticeHourKind::Halb => "uebungsfahrten_halb",
        }
    }
}

fn encode_bool_array(array: &[bool]) -> String {
    serde_json::to_string(array).unwrap_or_else(|_| "[]".to_string())
}

const STUDENT_COLUMNS: &str = "id, name, surname, date_of_birth, address, phone, wears_glasses, \
     theory_exam_passed, theory_exam_date, practical_exam_passed, practical_exam_date, \
     license_number, instructor_notes, start_date, created_at, ueberlandfahrten, \
     autobahnfahrten, nachtfahrten, uebungsfahrten_ganz, uebungsfahrten_halb";

#[instrument(skip(pool))]
pub async fn get_students(pool: &Pool<Sqlite>) -> Result<Vec<Student>, AppError> {
    info!("Fetching all students");
    let rows = sqlx::query_as::<_, DbStudent>(&format!(
        "SELECT {} FROM students ORDER BY created_at DESC LIMIT ?",
        STUDENT_COLUMNS
    ))
    .bind(FETCH_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Student::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_student(pool: &Pool<Sqlite>, id: &str) -> Result<Student, AppError> {
    info!("Fetching student by ID");
    let row = sqlx::query_as::<_, DbStudent>(&format!(
        "SELECT {} FROM students WHERE id = ?",
        STUDENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(student) => Ok(Student::from(student)),
        _ => Err(AppError::NotFound(format!("Student {} not found", id))),
    }
}

#[instrument(skip(pool, student))]
pub async fn create_student(pool: &Pool<Sqlite>, student: &Student) -> Result<(), AppError> {
    info!("Creating student");
    sqlx::query(&format!(
        "INSERT INTO students ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        STUDENT_COLUMNS
    ))
    .bind(&student.id)
    .bind(&student.name)
    .bind(&student.surname)
    .bind(&student.date_of_birth)
    .bind(&student.address)
    .bind(&student.phone)
    .bind(student.wears_glasses)
    .bind(student.theory_exam_passed)
    .bind(&student.theory_exam_date)
    .bind(student.practical_exam_passed)
    .bind(&student.practical_exam_date)
    .bind(&student.license_number)
    .bind(&student.instructor_notes)
    .bind(&student.start_date)
    .bind(student.created_at)
    .bind(encode_bool_array(&student.ueberlandfahrten))
    .bind(encode_bool_array(&student.autobahnfahrten))
    .bind(encode_bool_array(&student.nachtfahrten))
    .bind(encode_bool_array(&student.uebungsfahrten_ganz))
    .bind(encode_bool_array(&student.uebungsfahrten_halb))
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool, patch))]
pub async fn update_student(
    pool: &Pool<Sqlite>,
    id: &str,
    patch: StudentPatch,
) -> Result<Student, AppError> {
    info!("Updating student");
    let mut student = get_student(pool, id).await?;
    student.apply_patch(patch);

    sqlx::query(
        "UPDATE students SET name = ?, surname = ?, date_of_birth = ?, address = ?, phone = ?, \
         wears_glasses = ?, theory_exam_passed = ?, theory_exam_date = ?, \
         practical_exam_passed = ?, practical_exam_date = ?, license_number = ?, \
         instructor_notes = ? WHERE id = ?",
    )
    .bind(&student.name)
    .bind(&student.surname)
    .bind(&student.date_of_birth)
    .bind(&student.address)
    .bind(&student.phone)
    .bind(student.wears_glasses)
    .bind(student.theory_exam_passed)
    .bind(&student.theory_exam_date)
    .bind(student.practical_exam_passed)
    .bind(&student.practical_exam_date)
    .bind(&student.license_number)
    .bind(&student.instructor_notes)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(student)
}

#[instrument(skip(pool, update))]
pub async fn update_fahrten(
    pool: &Pool<Sqlite>,
    id: &str,
    update: FahrtenUpdate,
) -> Result<Student, AppError> {
    info!("Updating lesson arrays");
    validate_fixed_arrays(
        update.ueberlandfahrten.as_deref(),
        update.autobahnfahrten.as_deref(),
        update.nachtfahrten.as_deref(),
    )?;

    let mut student = get_student(pool, id).await?;
    if let Some(ueberlandfahrten) = update.ueberlandfahrten {
        student.ueberlandfahrten = ueberlandfahrten;
    }
    if let Some(autobahnfahrten) = update.autobahnfahrten {
        student.autobahnfahrten = autobahnfahrten;
    }
    if let Some(nachtfahrten) = update.nachtfahrten {
        student.nachtfahrten = nachtfahrten;
    }
    if let Some(uebungsfahrten_ganz) = update.uebungsfahrten_ganz {
        student.uebungsfahrten_ganz = uebungsfahrten_ganz;
    }
    if let Some(uebungsfahrten_halb) = update.uebungsfahrten_halb {
        student.uebungsfahrten_halb = uebungsfahrten_halb;
    }

    write_lesson_arrays(pool, &student).await?;
    Ok(student)
}

async fn write_lesson_arrays(pool: &Pool<Sqlite>, student: &Student) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE students SET ueberlandfahrten = ?, autobahnfahrten = ?, nachtfahrten = ?, \
         uebungsfahrten_ganz = ?, uebungsfahrten_halb = ? WHERE id = ?",
    )
    .bind(encode_bool_array(&student.ueberlandfahrten))
    .bind(encode_bool_array(&student.autobahnfahrten))
    .bind(encode_bool_array(&student.nachtfahrten))
    .bind(encode_bool_array(&student.uebungsfahrten_ganz))
    .bind(encode_bool_array(&student.uebungsfahrten_halb))
    .bind(&student.id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Appends one completed practice session. Whole-array read-modify-write;
/// concurrent edits of the same student's array are last-writer-wins.
#[instrument(skip(pool))]
pub async fn add_practice_hour(
    pool: &Pool<Sqlite>,
    id: &str,
    kind: PracticeHourKind,
) -> Result<Student, AppError> {
    info!("Adding practice hour");
    let mut student = get_student(pool, id).await?;
    let array = match kind {
        PracticeHourKind::Ganz => &mut student.uebungsfahrten_ganz,
        PracticeHourKind::Halb => &mut student.uebungsfahrten_halb,
    };
    array.push(true);
    let encoded = encode_bool_array(array);

    sqlx::query(&format!(
        "UPDATE students SET {} = ? WHERE id = ?",
        kind.column()
    ))
    .bind(encoded)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(student)
}

/// Order-preserving removal at `index`. Out-of-range indexes are rejected
/// before any write, leaving the array unchanged.
#[instrument(skip(pool))]
pub async fn remove_practice_hour(
    pool: &Pool<Sqlite>,
    id: &str,
    kind: PracticeHourKind,
    index: i64,
) -> Result<Student, AppError> {
    info!("Removing practice hour");
    let mut student = get_student(pool, id).await?;
    let array = match kind {
        PracticeHourKind::Ganz => &mut student.uebungsfahrten_ganz,
        PracticeHourKind::Halb => &mut student.uebungsfahrten_halb,
    };

    if index < 0 || index as usize >= array.len() {
        return Err(AppError::Validation(format!(
            "Practice hour index {} out of range for array of length {}",
            index,
            array.len()
        )));
    }

    array.remove(index as usize);
    let encoded = encode_bool_array(array);

    sqlx::query(&format!(
        "UPDATE students SET {} = ? WHERE id = ?",
        kind.column()
    ))
    .bind(encoded)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(student)
}

/// Deletes a student and every progress record and note referencing it, in
/// one transaction, dependents first. No orphan survives a successful
/// deletion; a mid-flight failure rolls the whole cascade back.
#[instrument(skip(pool))]
pub async fn delete_student_cascade(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting student with cascade");
    let mut tx = pool.begin().await?;

    let exists = sqlx::query("SELECT id FROM students WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("Student {} not found", id)));
    }

    sqlx::query("DELETE FROM training_progress WHERE student_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM notes WHERE student_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_student_progress(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<TrainingProgress>, AppError> {
    info!("Fetching student progress");
    let rows = sqlx::query_as::<_, DbTrainingProgress>(
        "SELECT id, student_id, category, subcategory, item, status, notes, last_updated \
         FROM training_progress WHERE student_id = ? ORDER BY last_updated LIMIT ?",
    )
    .bind(student_id)
    .bind(FETCH_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TrainingProgress::from).collect())
}

/// Atomic upsert on the key tuple: status always overwrites, notes only when
/// supplied, `last_updated` refreshed. The unique index makes this safe
/// under concurrent writers.
#[instrument(skip(pool, notes))]
pub async fn upsert_progress(
    pool: &Pool<Sqlite>,
    student_id: &str,
    category: &str,
    subcategory: &str,
    item: &str,
    status: ProgressStatus,
    notes: Option<String>,
) -> Result<TrainingProgress, AppError> {
    info!("Upserting progress record");
    let row = sqlx::query_as::<_, DbTrainingProgress>(
        "INSERT INTO training_progress \
         (id, student_id, category, subcategory, item, status, notes, last_updated) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (student_id, category, subcategory, item) DO UPDATE SET \
             status = excluded.status, \
             notes = COALESCE(excluded.notes, training_progress.notes), \
             last_updated = excluded.last_updated \
         RETURNING id, student_id, category, subcategory, item, status, notes, last_updated",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(student_id)
    .bind(category)
    .bind(subcategory)
    .bind(item)
    .bind(status.as_str())
    .bind(notes)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(TrainingProgress::from(row))
}

/// Direct update by record id, bypassing the key-tuple lookup.
#[instrument(skip(pool, notes))]
pub async fn update_progress(
    pool: &Pool<Sqlite>,
    id: &str,
    status: Option<ProgressStatus>,
    notes: Option<String>,
) -> Result<TrainingProgress, AppError> {
    info!("Updating progress record by ID");
    let row = sqlx::query_as::<_, DbTrainingProgress>(
        "SELECT id, student_id, category, subcategory, item, status, notes, last_updated \
         FROM training_progress WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let mut progress = match row {
        Some(row) => TrainingProgress::from(row),
        _ => {
            return Err(AppError::NotFound(format!(
                "Progress record {} not found",
                id
            )));
        }
    };

    if let Some(status) = status {
        progress.status = status;
    }
    if let Some(notes) = notes {
        progress.notes = Some(notes);
    }
    progress.last_updated = Utc::now();

    sqlx::query("UPDATE training_progress SET status = ?, notes = ?, last_updated = ? WHERE id = ?")
        .bind(progress.status.as_str())
        .bind(&progress.notes)
        .bind(progress.last_updated)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(progress)
}

#[instrument(skip(pool))]
pub async fn get_student_notes(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<Note>, AppError> {
    info!("Fetching student notes");
    let rows = sqlx::query_as::<_, DbNote>(
        "SELECT id, student_id, category, subcategory, item, note_text, created_at \
         FROM notes WHERE student_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(student_id)
    .bind(FETCH_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Note::from).collect())
}

#[instrument(skip(pool, note))]
pub async fn create_note(pool: &Pool<Sqlite>, note: &Note) -> Result<(), AppError> {
    info!("Creating note");
    sqlx::query(
        "INSERT INTO notes (id, student_id, category, subcategory, item, note_text, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&note.id)
    .bind(&note.student_id)
    .bind(&note.category)
    .bind(&note.subcategory)
    .bind(&note.item)
    .bind(&note.note_text)
    .bind(note.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_note(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting note");
    let result = sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Note {} not found", id)));
    }
    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_practice_hours(pool: &Pool<Sqlite>) -> Result<Vec<PracticeHour>, AppError> {
    info!("Fetching practice hour log");
    let rows = sqlx::query_as::<_, DbPracticeHour>(
        "SELECT id, duration, date, created_at FROM practice_hours ORDER BY date DESC LIMIT ?",
    )
    .bind(FETCH_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PracticeHour::from).collect())
}

#[instrument(skip(pool, hour))]
pub async fn create_practice_hour(
    pool: &Pool<Sqlite>,
    hour: &PracticeHour,
) -> Result<(), AppError> {
    info!("Logging practice hour");
    sqlx::query("INSERT INTO practice_hours (id, duration, date, created_at) VALUES (?, ?, ?, ?)")
        .bind(&hour.id)
        .bind(hour.duration)
        .bind(hour.date)
        .bind(hour.created_at)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_practice_hour(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting practice hour");
    let result = sqlx::query("DELETE FROM practice_hours WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Practice hour {} not found", id)));
    }
    Ok(())
}

#[instrument(skip(pool, check))]
pub async fn create_status_check(pool: &Pool<Sqlite>, check: &StatusCheck) -> Result<(), AppError> {
    info!("Recording status check");
    sqlx::query("INSERT INTO status_checks (id, client_name, timestamp) VALUES (?, ?, ?)")
        .bind(&check.id)
        .bind(&check.client_name)
        .bind(check.timestamp)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_status_checks(pool: &Pool<Sqlite>) -> Result<Vec<StatusCheck>, AppError> {
    info!("Fetching status checks");
    let rows = sqlx::query_as::<_, DbStatusCheck>(
        "SELECT id, client_name, timestamp FROM status_checks ORDER BY timestamp DESC LIMIT ?",
    )
    .bind(FETCH_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StatusCheck::from).collect())
}
