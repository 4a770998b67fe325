//! The two portal flows over the configured files.
//!
//! ```text
//! validate: allow-list ─> usage ledger ─> directory lookup ─> row
//! submit:   report ─> directory append ─> name index
//! ```

use crate::config::PortalConfig;
use crate::error::{PortalError, Result};
use crate::intake::{ReportIntake, ReportSubmission, SubmitOutcome};
use crate::ledger::{Identity, UsageLedger};
use crate::table::{DirectorySnapshot, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Body of a validation request. Missing fields read as empty strings,
/// which validation rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateRequest {
    pub pin: String,
    pub name: String,
    pub class: String,
    pub session: String,
    pub term: String,
}

impl ValidateRequest {
    pub fn identity(&self) -> Identity {
        Identity::new(&self.name, &self.class, &self.session, &self.term)
    }
}

#[derive(Debug)]
pub struct Portal {
    ledger: UsageLedger,
    intake: ReportIntake,
    directory_path: PathBuf,
}

impl Portal {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            ledger: UsageLedger::new(
                config.ledger_path(),
                config.allow_list_path(),
                config.usage_cap,
            ),
            intake: ReportIntake::new(config.directory_path(), config.names_path()),
            directory_path: config.directory_path(),
        }
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub fn intake(&self) -> &ReportIntake {
        &self.intake
    }

    pub fn directory_path(&self) -> &Path {
        &self.directory_path
    }

    /// Fresh snapshot of the directory file.
    pub fn directory(&self) -> Result<DirectorySnapshot> {
        DirectorySnapshot::load(&self.directory_path)
    }

    /// Validate a PIN, count the use, and return the student's row.
    ///
    /// The use is counted before the lookup, so [`PortalError::RecordNotFound`]
    /// still consumes one.
    pub fn validate(&self, request: &ValidateRequest) -> Result<Row> {
        let identity = request.identity();
        self.ledger.validate_and_record(&request.pin, &identity)?;

        let directory = self.directory()?;
        match directory.find(&identity.lookup_key()) {
            Some(row) => Ok(row.clone()),
            None => {
                tracing::info!(
                    "No directory row for {} / {} / {} / {} among {} rows",
                    identity.name(),
                    identity.class(),
                    identity.session(),
                    identity.term(),
                    directory.len()
                );
                Err(PortalError::RecordNotFound)
            }
        }
    }

    /// Search the directory without touching the ledger.
    pub fn lookup(&self, identity: &Identity) -> Result<Vec<Row>> {
        Ok(self.directory()?.find_all(&identity.lookup_key()).to_vec())
    }

    pub fn submit(&self, report: &ReportSubmission) -> Result<SubmitOutcome> {
        self.intake.submit(report)
    }
}
