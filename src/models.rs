use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Fixed slot counts for the mandatory special-drive arrays. Positions are
/// meaningful (one checkbox per legally required drive), so patches must
/// supply the full array.
pub const UEBERLANDFAHRTEN_SLOTS: usize = 5;
pub const AUTOBAHNFAHRTEN_SLOTS: usize = 4;
pub const NACHTFAHRTEN_SLOTS: usize = 3;

/// Ordinal completion marker for a training item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    Once,
    Twice,
    Thrice,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::Once => "once",
            ProgressStatus::Twice => "twice",
            ProgressStatus::Thrice => "thrice",
        }
    }

    /// Parses the persisted form. Unknown text maps to the default rather
    /// than failing the whole row; only this crate writes the column.
    pub fn parse(s: &str) -> Self {
        match s {
            "once" => ProgressStatus::Once,
            "twice" => ProgressStatus::Twice,
            "thrice" => ProgressStatus::Thrice,
            _ => ProgressStatus::NotStarted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub wears_glasses: bool,
    pub theory_exam_passed: bool,
    pub theory_exam_date: Option<String>,
    pub practical_exam_passed: bool,
    pub practical_exam_date: Option<String>,
    pub license_number: Option<String>,
    pub instructor_notes: Option<String>,
    pub start_date: String,
    pub created_at: DateTime<Utc>,
    pub ueberlandfahrten: Vec<bool>,
    pub autobahnfahrten: Vec<bool>,
    pub nachtfahrten: Vec<bool>,
    pub uebungsfahrten_ganz: Vec<bool>,
    pub uebungsfahrten_halb: Vec<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StudentCreate {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Surname is required"))]
    pub surname: String,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub wears_glasses: bool,
    #[serde(default)]
    pub theory_exam_passed: bool,
    pub theory_exam_date: Option<String>,
    #[serde(default)]
    pub practical_exam_passed: bool,
    pub practical_exam_date: Option<String>,
    pub license_number: Option<String>,
    pub instructor_notes: Option<String>,
    pub ueberlandfahrten: Option<Vec<bool>>,
    pub autobahnfahrten: Option<Vec<bool>>,
    pub nachtfahrten: Option<Vec<bool>>,
    pub uebungsfahrten_ganz: Option<Vec<bool>>,
    pub uebungsfahrten_halb: Option<Vec<bool>>,
}

/// Explicit per-field patch for `PUT /students/<id>`. Only supplied fields
/// overwrite; the lesson arrays have their own endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub wears_glasses: Option<bool>,
    pub theory_exam_passed: Option<bool>,
    pub theory_exam_date: Option<String>,
    pub practical_exam_passed: Option<bool>,
    pub practical_exam_date: Option<String>,
    pub license_number: Option<String>,
    pub instructor_notes: Option<String>,
}

/// Patch for `PUT /students/<id>/fahrten`. Any subset of the five lesson
/// arrays; the three fixed arrays must keep their slot counts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FahrtenUpdate {
    pub ueberlandfahrten: Option<Vec<bool>>,
    pub autobahnfahrten: Option<Vec<bool>>,
    pub nachtfahrten: Option<Vec<bool>>,
    pub uebungsfahrten_ganz: Option<Vec<bool>>,
    pub uebungsfahrten_halb: Option<Vec<bool>>,
}

impl Student {
    pub fn new(create: StudentCreate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: create.name,
            surname: create.surname,
            date_of_birth: create.date_of_birth,
            address: create.address,
            phone: create.phone,
            wears_glasses: create.wears_glasses,
            theory_exam_passed: create.theory_exam_passed,
            theory_exam_date: create.theory_exam_date,
            practical_exam_passed: create.practical_exam_passed,
            practical_exam_date: create.practical_exam_date,
            license_number: create.license_number,
            instructor_notes: create.instructor_notes,
            start_date: now.date_naive().to_string(),
            created_at: now,
            ueberlandfahrten: create
                .ueberlandfahrten
                .unwrap_or_else(|| vec![false; UEBERLANDFAHRTEN_SLOTS]),
            autobahnfahrten: create
                .autobahnfahrten
                .unwrap_or_else(|| vec![false; AUTOBAHNFAHRTEN_SLOTS]),
            nachtfahrten: create
                .nachtfahrten
                .unwrap_or_else(|| vec![false; NACHTFAHRTEN_SLOTS]),
            uebungsfahrten_ganz: create.uebungsfahrten_ganz.unwrap_or_default(),
            uebungsfahrten_halb: create.uebungsfahrten_halb.unwrap_or_default(),
        }
    }

    pub fn apply_patch(&mut self, patch: StudentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(surname) = patch.surname {
            self.surname = surname;
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            self.date_of_birth = Some(date_of_birth);
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(wears_glasses) = patch.wears_glasses {
            self.wears_glasses = wears_glasses;
        }
        if let Some(theory_exam_passed) = patch.theory_exam_passed {
            self.theory_exam_passed = theory_exam_passed;
        }
        if let Some(theory_exam_date) = patch.theory_exam_date {
            self.theory_exam_date = Some(theory_exam_date);
        }
        if let Some(practical_exam_passed) = patch.practical_exam_passed {
            self.practical_exam_passed = practical_exam_passed;
        }
        if let Some(practical_exam_date) = patch.practical_exam_date {
            self.practical_exam_date = Some(practical_exam_date);
        }
        if let Some(license_number) = patch.license_number {
            self.license_number = Some(license_number);
        }
        if let Some(instructor_notes) = patch.instructor_notes {
            self.instructor_notes = Some(instructor_notes);
        }
    }
}

/// Checks the fixed-length arrays against their slot counts.
pub fn validate_fixed_arrays(
    ueberlandfahrten: Option<&[bool]>,
    autobahnfahrten: Option<&[bool]>,
    nachtfahrten: Option<&[bool]>,
) -> Result<(), AppError> {
    let checks = [
        ("ueberlandfahrten", ueberlandfahrten, UEBERLANDFAHRTEN_SLOTS),
        ("autobahnfahrten", autobahnfahrten, AUTOBAHNFAHRTEN_SLOTS),
        ("nachtfahrten", nachtfahrten, NACHTFAHRTEN_SLOTS),
    ];
    for (field, value, expected) in checks {
        if let Some(value) = value {
            if value.len() != expected {
                return Err(AppError::Validation(format!(
                    "{} must have exactly {} entries, got {}",
                    field,
                    expected,
                    value.len()
                )));
            }
        }
    }
    Ok(())
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct DbStudent {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub wears_glasses: bool,
    pub theory_exam_passed: bool,
    pub theory_exam_date: Option<String>,
    pub practical_exam_passed: bool,
    pub practical_exam_date: Option<String>,
    pub license_number: Option<String>,
    pub instructor_notes: Option<String>,
    pub start_date: String,
    pub created_at: DateTime<Utc>,
    pub ueberlandfahrten: String,
    pub autobahnfahrten: String,
    pub nachtfahrten: String,
    pub uebungsfahrten_ganz: String,
    pub uebungsfahrten_halb: String,
}

fn parse_bool_array(raw: &str) -> Vec<bool> {
    serde_json::from_str(raw).unwrap_or_default()
}

impl From<DbStudent> for Student {
    fn from(db: DbStudent) -> Self {
        Self {
            id: db.id,
            name: db.name,
            surname: db.surname,
            date_of_birth: db.date_of_birth,
            address: db.address,
            phone: db.phone,
            wears_glasses: db.wears_glasses,
            theory_exam_passed: db.theory_exam_passed,
            theory_exam_date: db.theory_exam_date,
            practical_exam_passed: db.practical_exam_passed,
            practical_exam_date: db.practical_exam_date,
            license_number: db.license_number,
            instructor_notes: db.instructor_notes,
            start_date: db.start_date,
            created_at: db.created_at,
            ueberlandfahrten: parse_bool_array(&db.ueberlandfahrten),
            autobahnfahrten: parse_bool_array(&db.autobahnfahrten),
            nachtfahrten: parse_bool_array(&db.nachtfahrten),
            uebungsfahrten_ganz: parse_bool_array(&db.uebungsfahrten_ganz),
            uebungsfahrten_halb: parse_bool_array(&db.uebungsfahrten_halb),
        }
    }
}

/// One row per distinct training item a student has touched. Logical
/// identity is the (student_id, category, subcategory, item) key tuple,
/// which the schema enforces with a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingProgress {
    pub id: String,
    pub student_id: String,
    pub category: String,
    pub subcategory: String,
    pub item: String,
    pub status: ProgressStatus,
    pub notes: Option<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct DbTrainingProgress {
    pub id: String,
    pub student_id: String,
    pub category: String,
    pub subcategory: String,
    pub item: String,
    pub status: String,
    pub notes: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl From<DbTrainingProgress> for TrainingProgress {
    fn from(db: DbTrainingProgress) -> Self {
        Self {
            id: db.id,
            student_id: db.student_id,
            category: db.category,
            subcategory: db.subcategory,
            item: db.item,
            status: ProgressStatus::parse(&db.status),
            notes: db.notes,
            last_updated: db.last_updated,
        }
    }
}

/// Free-text annotation on a training item. Pure append, many per key tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub student_id: String,
    pub category: String,
    pub subcategory: String,
    pub item: String,
    pub note_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct DbNote {
    pub id: String,
    pub student_id: String,
    pub category: String,
    pub subcategory: String,
    pub item: String,
    pub note_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbNote> for Note {
    fn from(db: DbNote) -> Self {
        Self {
            id: db.id,
            student_id: db.student_id,
            category: db.category,
            subcategory: db.subcategory,
            item: db.item,
            note_text: db.note_text,
            created_at: db.created_at,
        }
    }
}

/// Entry in the school-wide practice-hour log (half or full hours).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeHour {
    pub id: String,
    pub duration: f64,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct DbPracticeHour {
    pub id: String,
    pub duration: f64,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<DbPracticeHour> for PracticeHour {
    fn from(db: DbPracticeHour) -> Self {
        Self {
            id: db.id,
            duration: db.duration,
            date: db.date,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct DbStatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

impl From<DbStatusCheck> for StatusCheck {
    fn from(db: DbStatusCheck) -> Self {
        Self {
            id: db.id,
            client_name: db.client_name,
            timestamp: db.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_persisted_form() {
        for status in [
            ProgressStatus::NotStarted,
            ProgressStatus::Once,
            ProgressStatus::Twice,
            ProgressStatus::Thrice,
        ] {
            assert_eq!(ProgressStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_status_text_falls_back_to_not_started() {
        assert_eq!(ProgressStatus::parse("garbage"), ProgressStatus::NotStarted);
    }

    #[test]
    fn fixed_array_validation_rejects_wrong_lengths() {
        assert!(validate_fixed_arrays(Some(&[false; 5]), None, None).is_ok());
        assert!(validate_fixed_arrays(Some(&[false; 4]), None, None).is_err());
        assert!(validate_fixed_arrays(None, Some(&[false; 4]), Some(&[false; 3])).is_ok());
        assert!(validate_fixed_arrays(None, None, Some(&[false; 4])).is_err());
    }

    #[test]
    fn patch_only_overwrites_supplied_fields() {
        let mut student = Student::new(StudentCreate {
            name: "Max".to_string(),
            surname: "Mustermann".to_string(),
            date_of_birth: Some("1995-06-15".to_string()),
            address: None,
            phone: Some("+49 30 12345678".to_string()),
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

        student.apply_patch(StudentPatch {
            name: Some("Max Updated".to_string()),
            phone: Some("+49 30 87654321".to_string()),
            ..Default::default()
        });

        assert_eq!(student.name, "Max Updated");
        assert_eq!(student.surname, "Mustermann");
        assert_eq!(student.phone.as_deref(), Some("+49 30 87654321"));
        assert_eq!(student.date_of_birth.as_deref(), Some("1995-06-15"));
        assert_eq!(student.ueberlandfahrten.len(), UEBERLANDFAHRTEN_SLOTS);
        assert!(student.uebungsfahrten_ganz.is_empty());
    }
}
