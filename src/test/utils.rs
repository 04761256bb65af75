use std::collections::HashMap;
use std::sync::Once;

use rocket::local::asynchronous::Client;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use crate::db;
use crate::error::AppError;
use crate::models::{Note, ProgressStatus, Student, StudentCreate};
use crate::schema::apply_schema;

static INIT: Once = Once::new();

struct TestStudent {
    name: String,
    surname: String,
}

struct TestProgress {
    student_name: String,
    category: String,
    subcategory: String,
    item: String,
    status: ProgressStatus,
    notes: Option<String>,
}

struct TestNote {
    student_name: String,
    category: String,
    subcategory: String,
    item: String,
    note_text: String,
}

#[derive(Default)]
pub struct TestDbBuilder {
    students: Vec<TestStudent>,
    progress: Vec<TestProgress>,
    notes: Vec<TestNote>,
}

impl TestDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn student(mut self, name: &str, surname: &str) -> Self {
        self.students.push(TestStudent {
            name: name.to_string(),
            surname: surname.to_string(),
        });
        self
    }

    pub fn progress(
        mut self,
        student_name: &str,
        category: &str,
        subcategory: &str,
        item: &str,
        status: ProgressStatus,
    ) -> Self {
        self.progress.push(TestProgress {
            student_name: student_name.to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            item: item.to_string(),
            status,
            notes: None,
        });
        self
    }

    pub fn progress_with_notes(
        mut self,
        student_name: &str,
        category: &str,
        subcategory: &str,
        item: &str,
        status: ProgressStatus,
        notes: &str,
    ) -> Self {
        self.progress.push(TestProgress {
            student_name: student_name.to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            item: item.to_string(),
            status,
            notes: Some(notes.to_string()),
        });
        self
    }

    pub fn note(
        mut self,
        student_name: &str,
        category: &str,
        subcategory: &str,
        item: &str,
        note_text: &str,
    ) -> Self {
        self.notes.push(TestNote {
            student_name: student_name.to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            item: item.to_string(),
            note_text: note_text.to_string(),
        });
        self
    }

    pub async fn build(self) -> Result<TestDb, AppError> {
        INIT.call_once(|| {
            let _ = env_logger::builder().is_test(true).try_init();
        });

        // One connection only, so every query sees the same in-memory db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        apply_schema(&pool).await?;

        let mut student_id_map: HashMap<String, String> = HashMap::new();

        for entry in &self.students {
            let student = Student::new(StudentCreate {
                name: entry.name.clone(),
                surname: entry.surname.clone(),
                date_of_birth: None,
                address: None,
                phone: None,
                wears_glasses: false,
                theory_exam_passed: false,
                theory_exam_date: None,
                practical_exam_passed: false,
                practical_exam_date: None,
                license_number: None,
                instructor_notes: None,
                ueberlandfahrten: None,
                autobahnfahrten: None,
                nachtfahrten: None,
                uebungsfahrten_ganz: None,
                uebungsfahrten_halb: None,
            });
            db::create_student(&pool, &student).await?;
            student_id_map.insert(entry.name.clone(), student.id);
        }

        for entry in &self.progress {
            let student_id = student_id_map
                .get(&entry.student_name)
                .cloned()
                .unwrap_or_else(|| entry.student_name.clone());
            db::upsert_progress(
                &pool,
                &student_id,
                &entry.category,
                &entry.subcategory,
                &entry.item,
                entry.status,
                entry.notes.clone(),
            )
            .await?;
        }

        for entry in &self.notes {
            let student_id = student_id_map
                .get(&entry.student_name)
                .cloned()
                .unwrap_or_else(|| entry.student_name.clone());
            let note = Note {
                id: uuid::Uuid::new_v4().to_string(),
                student_id,
                category: entry.category.clone(),
                subcategory: entry.subcategory.clone(),
                item: entry.item.clone(),
                note_text: entry.note_text.clone(),
                created_at: chrono::Utc::now(),
            };
            db::create_note(&pool, &note).await?;
        }

        Ok(TestDb {
            pool,
            student_id_map,
        })
    }
}

pub struct TestDb {
    pub pool: Pool<Sqlite>,
    pub student_id_map: HashMap<String, String>,
}

impl TestDb {
    pub fn student_id(&self, name: &str) -> String {
        self.student_id_map
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("No test student named {}", name))
    }
}

pub async fn create_standard_test_db() -> TestDb {
    TestDbBuilder::new()
        .student("Max", "Mustermann")
        .student("Erika", "Musterfrau")
        .progress(
            "Max",
            "grundstufe",
            "einstellen",
            "Sitz",
            ProgressStatus::Once,
        )
        .progress(
            "Max",
            "grundstufe",
            "anfahren",
            "Anfahren/Anhalteübungen",
            ProgressStatus::Twice,
        )
        .note(
            "Max",
            "grundstufe",
            "einstellen",
            "Sitz",
            "Sitzposition noch zu tief",
        )
        .build()
        .await
        .expect("Failed to build test database")
}

pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
    let client = Client::tracked(crate::init_rocket(test_db.pool.clone()))
        .await
        .expect("Failed to build test client");
    (client, test_db)
}
