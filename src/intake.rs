//! Report intake
//!
//! Accepts a full report card, flattens it into one directory row, appends
//! that row to the directory file, and records the student's name in the
//! name index if it is not there yet.
//!
//! ## Row layout
//!
//! ```text
//! session,term,next_term,name,class,student_id,... (27 fixed columns)
//!   ,subject,test,exam,total,grade,remark          (6 per subject)
//! ```
//!
//! Text is uppercased. Values are written without quoting, so a comma inside
//! a value shifts every later column of that row.
//!
//! ## Failure
//!
//! The directory append happens first. If the name index then fails, the
//! submission is reported as failed although its row is already stored;
//! resubmitting appends a second row.

pub mod name_index;
pub mod report;

pub use name_index::NameIndex;
pub use report::{FieldValue, ReportSubmission, SubjectScore};

use crate::error::{PortalError, Result, ResultExt as _};
use crate::table::codec;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Result of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Row stored and the name newly indexed.
    Saved,
    /// Row stored; the name was already in the index.
    NameAlreadyIndexed,
}

impl SubmitOutcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::Saved => "Data saved successfully",
            Self::NameAlreadyIndexed => "Data saved successfully, but name already exists.",
        }
    }
}

/// Appends reports to the directory and keeps the name index current.
#[derive(Debug)]
pub struct ReportIntake {
    directory_path: PathBuf,
    names: NameIndex,
    write_lock: Mutex<()>,
}

impl ReportIntake {
    pub fn new(directory_path: PathBuf, names_path: PathBuf) -> Self {
        Self {
            directory_path,
            names: NameIndex::new(names_path),
            write_lock: Mutex::new(()),
        }
    }

    pub fn directory_path(&self) -> &Path {
        &self.directory_path
    }

    pub fn names(&self) -> &NameIndex {
        &self.names
    }

    /// Store `report`.
    ///
    /// # Errors
    ///
    /// [`PortalError::StorageUnavailable`] if either file cannot be written.
    pub fn submit(&self, report: &ReportSubmission) -> Result<SubmitOutcome> {
        let row = report.to_row();
        let name = report.index_name();
        tracing::info!(
            "Submitting report for {name:?} ({} subjects, {} columns)",
            report.subjects.len(),
            row.len()
        );

        let _guard = self.write_lock.lock().map_err(|_poisoned| {
            PortalError::StorageUnavailable("intake lock poisoned".to_owned())
        })?;

        codec::append_row(&self.directory_path, &row).storage_unavailable(format!(
            "Failed to append report to {}",
            self.directory_path.display()
        ))?;

        if name.is_empty() {
            tracing::warn!("Report has no student name; name index not updated");
            return Ok(SubmitOutcome::Saved);
        }

        let added = self.names.insert(&name).storage_unavailable(format!(
            "Failed to update name index {}",
            self.names.path().display()
        ))?;

        if added {
            tracing::info!("Indexed new name {name:?}");
            Ok(SubmitOutcome::Saved)
        } else {
            tracing::info!("Name {name:?} already indexed");
            Ok(SubmitOutcome::NameAlreadyIndexed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn report(name: &str) -> ReportSubmission {
        ReportSubmission {
            session: "2023".into(),
            term: "1".into(),
            name: name.into(),
            class: "5a".into(),
            subjects: vec![SubjectScore {
                subject: "maths".into(),
                grade: "a".into(),
                ..SubjectScore::default()
            }],
            ..ReportSubmission::default()
        }
    }

    #[test]
    fn test_submit_twice_indexes_name_once() -> Result<()> {
        let dir = tempdir()?;
        let intake = ReportIntake::new(
            dir.path().join("public/data.csv"),
            dir.path().join("public/names.csv"),
        );

        assert_eq!(intake.submit(&report("john"))?, SubmitOutcome::Saved);
        assert_eq!(
            intake.submit(&report("John"))?,
            SubmitOutcome::NameAlreadyIndexed
        );

        let rows = codec::read_rows(intake.directory_path())?;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r[3] == "JOHN" && r[4] == "5A"));
        assert_eq!(intake.names().names()?, vec!["JOHN"]);
        Ok(())
    }

    #[test]
    fn test_submitted_row_is_uppercased() -> Result<()> {
        let dir = tempdir()?;
        let intake = ReportIntake::new(dir.path().join("data.csv"), dir.path().join("names.csv"));
        intake.submit(&report("ada"))?;

        let text = fs::read_to_string(intake.directory_path())?;
        assert!(text.starts_with("2023,1,,ADA,5A,"));
        assert!(text.trim_end().ends_with("MATHS,,,,A,"));
        Ok(())
    }

    #[test]
    fn test_unwritable_directory_is_storage_error() -> Result<()> {
        let dir = tempdir()?;
        // A directory where the data file should be makes the append fail.
        let blocked = dir.path().join("data.csv");
        fs::create_dir(&blocked)?;
        let intake = ReportIntake::new(blocked, dir.path().join("names.csv"));

        let err = intake.submit(&report("ada")).expect_err("append must fail");
        assert!(matches!(err, PortalError::StorageUnavailable(_)));
        Ok(())
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(SubmitOutcome::Saved.message(), "Data saved successfully");
        assert_eq!(
            SubmitOutcome::NameAlreadyIndexed.message(),
            "Data saved successfully, but name already exists."
        );
    }
}
