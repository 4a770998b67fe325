//! File-backed usage ledger.

use super::allow_list::PinAllowList;
use super::entry::{Accepted, Identity, LedgerEntry, LedgerTable, PinStatus};
use super::mask_pin;
use crate::error::{PortalError, Result, ResultExt as _};
use crate::table::codec;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// The PIN ledger and allow-list on disk, with a single-writer region
/// around every update.
#[derive(Debug)]
pub struct UsageLedger {
    ledger_path: PathBuf,
    allow_list_path: PathBuf,
    cap: u32,
    write_lock: Mutex<()>,
}

impl UsageLedger {
    pub fn new(ledger_path: PathBuf, allow_list_path: PathBuf, cap: u32) -> Self {
        Self {
            ledger_path,
            allow_list_path,
            cap,
            write_lock: Mutex::new(()),
        }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    /// Check `pin` against the allow-list, then count one use by `identity`.
    ///
    /// # Errors
    ///
    /// - [`PortalError::InvalidPin`] if the PIN is not allowed
    /// - [`PortalError::InvalidIdentity`] if an identity field is blank or
    ///   contains the delimiter or a line break
    /// - [`PortalError::PinAlreadyUsedByOther`] if the PIN is bound to another identity
    /// - [`PortalError::UsageLimitExceeded`] if the cap is reached
    /// - [`PortalError::LedgerUnavailable`] on any read or write failure
    ///
    /// The ledger file is only written when the use is accepted.
    pub fn validate_and_record(&self, pin: &str, identity: &Identity) -> Result<Accepted> {
        let pin = pin.trim();
        tracing::info!(
            "Validating PIN {} for {} / {} / {} / {}",
            mask_pin(pin),
            identity.name(),
            identity.class(),
            identity.session(),
            identity.term()
        );

        if !codec::is_plain_field(pin) {
            tracing::info!("PIN {} contains a separator", mask_pin(pin));
            return Err(PortalError::InvalidPin);
        }

        let allow_list = PinAllowList::load(&self.allow_list_path)?;
        if !allow_list.contains(pin) {
            tracing::info!("PIN {} is not on the allow-list", mask_pin(pin));
            return Err(PortalError::InvalidPin);
        }

        if let Err(err) = identity.check() {
            tracing::info!("PIN {} rejected: {err}", mask_pin(pin));
            return Err(err);
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_poisoned| PortalError::LedgerUnavailable("ledger lock poisoned".to_owned()))?;

        let mut table = self.load_table()?;
        match table.record_use(pin, identity, self.cap) {
            Ok(accepted) => {
                self.persist(&table)?;
                tracing::info!(
                    "PIN {} accepted, usage count {}{}",
                    mask_pin(pin),
                    accepted.count,
                    if accepted.created { " (new entry)" } else { "" }
                );
                Ok(accepted)
            }
            Err(err) => {
                tracing::info!("PIN {} rejected: {err}", mask_pin(pin));
                Err(err)
            }
        }
    }

    /// Where `pin` stands for `identity`, without recording a use.
    pub fn status(&self, pin: &str, identity: &Identity) -> Result<PinStatus> {
        Ok(self.load_table()?.status(pin.trim(), identity, self.cap))
    }

    /// All parsed ledger entries in file order.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.load_table()?.entries().cloned().collect())
    }

    fn load_table(&self) -> Result<LedgerTable> {
        let rows = codec::read_rows(&self.ledger_path).ledger_unavailable(format!(
            "Failed to read ledger {}",
            self.ledger_path.display()
        ))?;
        tracing::debug!("Loaded {} ledger rows", rows.len());
        Ok(LedgerTable::from_rows(rows))
    }

    /// Replace the ledger file through a temp file in the same directory.
    fn persist(&self, table: &LedgerTable) -> Result<()> {
        let context = || format!("Failed to write ledger {}", self.ledger_path.display());

        let text = codec::serialize(&table.to_rows(), codec::DELIMITER)
            .ledger_unavailable(context())?;

        let dir = match self.ledger_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).ledger_unavailable(context())?;

        let mut tmp = NamedTempFile::new_in(&dir).ledger_unavailable(context())?;
        tmp.write_all(text.as_bytes()).ledger_unavailable(context())?;
        tmp.as_file().sync_all().ledger_unavailable(context())?;
        tmp.persist(&self.ledger_path).ledger_unavailable(context())?;

        tracing::debug!("Ledger rewritten with {} rows", table.len());
        Ok(())
    }
}
