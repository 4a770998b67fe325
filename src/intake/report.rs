//! Report submission payload and its flattening into a directory row.

use crate::table::Row;
use serde::{Deserialize, Serialize};

/// A single submitted value. The form sends strings, but scores may arrive
/// as JSON numbers and optional fields as `null` or not at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    #[default]
    Empty,
}

impl FieldValue {
    /// The value as a directory field: text is uppercased, numbers and flags
    /// are written as-is, and empty values become an empty field.
    ///
    /// Line breaks inside text are replaced with spaces so a value can never
    /// split its row in two.
    pub fn to_field(&self) -> String {
        match self {
            Self::Text(s) => s.to_uppercase().replace(['\r', '\n'], " "),
            Self::Number(n) => n.to_string(),
            Self::Flag(b) => b.to_string(),
            Self::Empty => String::new(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Scores for one subject. Contributes six columns to the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectScore {
    pub subject: FieldValue,
    pub test: FieldValue,
    pub exam: FieldValue,
    pub total: FieldValue,
    pub grade: FieldValue,
    pub remark: FieldValue,
}

impl SubjectScore {
    pub const COLUMNS: usize = 6;

    fn fields(&self) -> [&FieldValue; Self::COLUMNS] {
        [
            &self.subject,
            &self.test,
            &self.exam,
            &self.total,
            &self.grade,
            &self.remark,
        ]
    }
}

/// A full report card as submitted by the entry form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSubmission {
    pub session: FieldValue,
    pub term: FieldValue,
    pub next_term: FieldValue,
    pub name: FieldValue,
    pub class: FieldValue,
    pub student_id: FieldValue,
    pub attendance: FieldValue,
    pub days_absent: FieldValue,
    pub sex: FieldValue,
    pub no_of_subjects: FieldValue,
    pub total_score: FieldValue,
    pub students_average: FieldValue,
    pub class_average: FieldValue,
    pub position_in_class: FieldValue,
    pub out_of: FieldValue,
    pub neatness: FieldValue,
    pub punctuality: FieldValue,
    pub sense_of_responsibility: FieldValue,
    pub teamwork: FieldValue,
    // The entry form has always sent this key misspelled.
    #[serde(rename = "initiatiave")]
    pub initiative: FieldValue,
    pub communication_skills: FieldValue,
    pub musical_skills: FieldValue,
    pub sports: FieldValue,
    pub craft: FieldValue,
    pub hardworking: FieldValue,
    pub teachers_remark: FieldValue,
    pub head_remark: FieldValue,
    pub subjects: Vec<SubjectScore>,
}

impl ReportSubmission {
    /// Number of fixed columns before the per-subject columns.
    pub const FIXED_COLUMNS: usize = 27;

    fn fixed_fields(&self) -> [&FieldValue; Self::FIXED_COLUMNS] {
        [
            &self.session,
            &self.term,
            &self.next_term,
            &self.name,
            &self.class,
            &self.student_id,
            &self.attendance,
            &self.days_absent,
            &self.sex,
            &self.no_of_subjects,
            &self.total_score,
            &self.students_average,
            &self.class_average,
            &self.position_in_class,
            &self.out_of,
            &self.neatness,
            &self.punctuality,
            &self.sense_of_responsibility,
            &self.teamwork,
            &self.initiative,
            &self.communication_skills,
            &self.musical_skills,
            &self.sports,
            &self.craft,
            &self.hardworking,
            &self.teachers_remark,
            &self.head_remark,
        ]
    }

    /// Flatten into one directory row: fixed fields, then six columns per subject.
    pub fn to_row(&self) -> Row {
        self.fixed_fields()
            .into_iter()
            .chain(self.subjects.iter().flat_map(SubjectScore::fields))
            .map(FieldValue::to_field)
            .collect()
    }

    /// Uppercased student name as stored in the name index.
    pub fn index_name(&self) -> String {
        self.name.to_field().trim().to_owned()
    }
}
