use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;

/// Declarative schema, applied idempotently at startup. The unique index on
/// the progress key tuple is what makes the upsert atomic under concurrent
/// writers.
pub const CURRENT_SCHEMA: &str = r#"
PRAGMA foreign_keys = 1;

CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    surname TEXT NOT NULL,
    date_of_birth TEXT,
    address TEXT,
    phone TEXT,
    wears_glasses BOOLEAN NOT NULL DEFAULT FALSE,
    theory_exam_passed BOOLEAN NOT NULL DEFAULT FALSE,
    theory_exam_date TEXT,
    practical_exam_passed BOOLEAN NOT NULL DEFAULT FALSE,
    practical_exam_date TEXT,
    license_number TEXT,
    instructor_notes TEXT,
    start_date TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    ueberlandfahrten TEXT NOT NULL DEFAULT '[]',
    autobahnfahrten TEXT NOT NULL DEFAULT '[]',
    nachtfahrten TEXT NOT NULL DEFAULT '[]',
    uebungsfahrten_ganz TEXT NOT NULL DEFAULT '[]',
    uebungsfahrten_halb TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS training_progress (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL,
    category TEXT NOT NULL,
    subcategory TEXT NOT NULL,
    item TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'not_started',
    notes TEXT,
    last_updated TIMESTAMP NOT NULL,
    UNIQUE (student_id, category, subcategory, item)
);

CREATE INDEX IF NOT EXISTS idx_training_progress_student
    ON training_progress (student_id);

CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL,
    category TEXT NOT NULL,
    subcategory TEXT NOT NULL,
    item TEXT NOT NULL,
    note_text TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_student
    ON notes (student_id);

CREATE TABLE IF NOT EXISTS practice_hours (
    id TEXT PRIMARY KEY,
    duration REAL NOT NULL,
    date TIMESTAMP NOT NULL,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS status_checks (
    id TEXT PRIMARY KEY,
    client_name TEXT NOT NULL,
    timestamp TIMESTAMP NOT NULL
);
"#;

#[instrument(skip(pool))]
pub async fn apply_schema(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    info!("Applying database schema");
    sqlx::raw_sql(CURRENT_SCHEMA).execute(pool).await?;
    Ok(())
}
