//! Ledger rows and the in-memory usage state machine.

use crate::error::{PortalError, Result};
use crate::table::codec;
use crate::table::key::normalize;
use crate::table::{CompositeKey, Row};
use serde::Serialize;

/// The student context a PIN is bound to: `(name, class, session, term)`.
///
/// Fields are trimmed and uppercased on construction, so `john` and `JOHN`
/// are the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identity {
    name: String,
    class: String,
    session: String,
    term: String,
}

impl Identity {
    pub fn new(
        name: impl AsRef<str>,
        class: impl AsRef<str>,
        session: impl AsRef<str>,
        term: impl AsRef<str>,
    ) -> Self {
        Self {
            name: normalize(name.as_ref()),
            class: normalize(class.as_ref()),
            session: normalize(session.as_ref()),
            term: normalize(term.as_ref()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Check that every field is present and can be written to a ledger row.
    ///
    /// # Errors
    ///
    /// [`PortalError::InvalidIdentity`] if a field is blank or contains the
    /// delimiter or a line break.
    pub fn check(&self) -> Result<()> {
        let fields = [&self.name, &self.class, &self.session, &self.term];
        if fields.iter().any(|f| f.is_empty()) {
            return Err(PortalError::InvalidIdentity(
                "Please provide all four inputs.".to_owned(),
            ));
        }
        if !fields.iter().all(|f| codec::is_plain_field(f)) {
            return Err(PortalError::InvalidIdentity(
                "Name, class, session and term must not contain commas or line breaks."
                    .to_owned(),
            ));
        }
        Ok(())
    }

    /// Directory search key for this identity.
    pub fn lookup_key(&self) -> CompositeKey {
        CompositeKey::new(&self.name, &self.class, &self.session, &self.term)
    }
}

/// One parsed ledger row: `pin,name,class,session,term,count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub pin: String,
    pub identity: Identity,
    pub count: u32,
}

impl LedgerEntry {
    /// Parse a ledger row. Rows without exactly six fields or with a
    /// non-numeric count are not entries.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let [pin, name, class, session, term, count] = row else {
            return None;
        };
        Some(Self {
            pin: pin.trim().to_owned(),
            identity: Identity::new(name, class, session, term),
            count: count.trim().parse().ok()?,
        })
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.pin.clone(),
            self.identity.name.clone(),
            self.identity.class.clone(),
            self.identity.session.clone(),
            self.identity.term.clone(),
            self.count.to_string(),
        ]
    }
}

/// A ledger line: a parsed entry, or a row kept verbatim because it did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LedgerRecord {
    Entry(LedgerEntry),
    Unparsed(Row),
}

/// Where a PIN stands for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PinStatus {
    /// No entry uses this PIN.
    Unknown,
    /// Bound to this identity with uses left.
    BoundUnderCap { count: u32 },
    /// Bound to this identity with no uses left.
    BoundAtCap { count: u32 },
    /// Bound to a different identity.
    BoundElsewhere,
}

/// A successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Accepted {
    /// Usage count after this validation.
    pub count: u32,
    /// Whether this validation created the ledger entry.
    pub created: bool,
}

/// The whole ledger file held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerTable {
    records: Vec<LedgerRecord>,
}

impl LedgerTable {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let records = rows
            .into_iter()
            .map(|row| match LedgerEntry::from_row(&row) {
                Some(entry) => LedgerRecord::Entry(entry),
                None => {
                    tracing::warn!("Keeping unparseable ledger row verbatim: {}", row.join(","));
                    LedgerRecord::Unparsed(row)
                }
            })
            .collect();
        Self { records }
    }

    pub fn to_rows(&self) -> Vec<Row> {
        self.records
            .iter()
            .map(|record| match record {
                LedgerRecord::Entry(entry) => entry.to_row(),
                LedgerRecord::Unparsed(row) => row.clone(),
            })
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.records.iter().filter_map(|record| match record {
            LedgerRecord::Entry(entry) => Some(entry),
            LedgerRecord::Unparsed(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, pin: &str, identity: &Identity) -> Option<usize> {
        self.records.iter().position(|record| {
            matches!(record, LedgerRecord::Entry(e) if e.pin == pin && e.identity == *identity)
        })
    }

    /// Classify `pin` for `identity`. An exact `(pin, identity)` entry wins
    /// over entries binding the PIN elsewhere. An unparsed row that starts
    /// with the PIN counts as a binding to someone else.
    pub fn status(&self, pin: &str, identity: &Identity, cap: u32) -> PinStatus {
        if let Some(LedgerRecord::Entry(entry)) = self
            .position(pin, identity)
            .and_then(|i| self.records.get(i))
        {
            return if entry.count < cap {
                PinStatus::BoundUnderCap { count: entry.count }
            } else {
                PinStatus::BoundAtCap { count: entry.count }
            };
        }

        let bound = self.records.iter().any(|record| match record {
            LedgerRecord::Entry(e) => e.pin == pin,
            LedgerRecord::Unparsed(row) => row.first().is_some_and(|first| first.trim() == pin),
        });
        if bound {
            PinStatus::BoundElsewhere
        } else {
            PinStatus::Unknown
        }
    }

    /// Apply one use of `pin` by `identity`. On rejection the table is unchanged.
    pub fn record_use(&mut self, pin: &str, identity: &Identity, cap: u32) -> Result<Accepted> {
        match self.status(pin, identity, cap) {
            PinStatus::Unknown => {
                self.records.push(LedgerRecord::Entry(LedgerEntry {
                    pin: pin.to_owned(),
                    identity: identity.clone(),
                    count: 1,
                }));
                Ok(Accepted {
                    count: 1,
                    created: true,
                })
            }
            PinStatus::BoundUnderCap { .. } => {
                let Some(LedgerRecord::Entry(entry)) = self
                    .position(pin, identity)
                    .and_then(|i| self.records.get_mut(i))
                else {
                    return Err(PortalError::LedgerUnavailable(
                        "ledger entry vanished during update".to_owned(),
                    ));
                };
                entry.count += 1;
                Ok(Accepted {
                    count: entry.count,
                    created: false,
                })
            }
            PinStatus::BoundAtCap { .. } => Err(PortalError::UsageLimitExceeded { cap }),
            PinStatus::BoundElsewhere => Err(PortalError::PinAlreadyUsedByOther),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::codec;

    fn john() -> Identity {
        Identity::new("JOHN", "5A", "2023", "1")
    }

    fn mary() -> Identity {
        Identity::new("MARY", "5B", "2023", "1")
    }

    #[test]
    fn test_identity_is_normalized() {
        assert_eq!(Identity::new(" john", "5a ", "2023", "1"), john());
        assert_eq!(
            john().lookup_key(),
            CompositeKey::new("JOHN", "5A", "2023", "1")
        );
    }

    #[test]
    fn test_entry_row_round_trip() {
        let row = codec::parse("1234,JOHN,5A,2023,1,3", codec::DELIMITER)
            .expect("row parses")
            .remove(0);
        let entry = LedgerEntry::from_row(&row).expect("six-field row is an entry");
        assert_eq!(entry.count, 3);
        assert_eq!(entry.to_row(), row);
    }

    #[test]
    fn test_malformed_rows_are_not_entries() {
        let short = vec!["1234".to_owned(), "JOHN".to_owned()];
        assert!(LedgerEntry::from_row(&short).is_none());

        let bad_count: Row = ["1234", "JOHN", "5A", "2023", "1", "NaN"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        assert!(LedgerEntry::from_row(&bad_count).is_none());
    }

    #[test]
    fn test_first_use_creates_entry() {
        let mut table = LedgerTable::default();
        let accepted = table.record_use("1234", &john(), 5).expect("fresh PIN is accepted");
        assert_eq!(
            accepted,
            Accepted {
                count: 1,
                created: true
            }
        );
        assert_eq!(table.to_rows(), vec![vec!["1234", "JOHN", "5A", "2023", "1", "1"]]);
    }

    #[test]
    fn test_counts_up_to_cap_then_rejects() {
        let mut table = LedgerTable::default();
        for expected in 1..=5 {
            let accepted = table.record_use("1234", &john(), 5).expect("under cap");
            assert_eq!(accepted.count, expected);
        }
        assert_eq!(table.status("1234", &john(), 5), PinStatus::BoundAtCap { count: 5 });

        let before = table.clone();
        let err = table.record_use("1234", &john(), 5).expect_err("sixth use is rejected");
        assert!(matches!(err, PortalError::UsageLimitExceeded { cap: 5 }));
        assert_eq!(table, before);
    }

    #[test]
    fn test_pin_bound_elsewhere_is_rejected() {
        let mut table = LedgerTable::default();
        table.record_use("1234", &john(), 5).expect("first use");
        assert_eq!(table.status("1234", &mary(), 5), PinStatus::BoundElsewhere);

        let before = table.clone();
        let err = table.record_use("1234", &mary(), 5).expect_err("other identity");
        assert!(matches!(err, PortalError::PinAlreadyUsedByOther));
        assert_eq!(table, before);
    }

    #[test]
    fn test_exact_match_wins_over_other_bindings() {
        let rows = codec::parse(
            "1234,MARY,5B,2023,1,1\n1234,JOHN,5A,2023,1,2\n",
            codec::DELIMITER,
        )
        .expect("rows parse");
        let mut table = LedgerTable::from_rows(rows);
        let accepted = table.record_use("1234", &john(), 5).expect("exact match");
        assert_eq!(accepted.count, 3);
        assert_eq!(table.entries().count(), 2);
    }

    #[test]
    fn test_unparsed_rows_survive_rewrite() {
        let rows = codec::parse("garbage\n1234,JOHN,5A,2023,1,1\n", codec::DELIMITER)
            .expect("rows parse");
        let mut table = LedgerTable::from_rows(rows);
        table.record_use("5678", &mary(), 5).expect("new PIN");

        let out = table.to_rows();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], vec!["garbage"]);
        assert_eq!(table.status("5678", &mary(), 5), PinStatus::BoundUnderCap { count: 1 });
    }

    #[test]
    fn test_unparsed_row_with_pin_binds_it() {
        // A name that once smuggled a comma into the ledger leaves a seven-field row.
        let rows = codec::parse("1234,DOE,JOHN,5A,2023,1,1\n", codec::DELIMITER)
            .expect("rows parse");
        let mut table = LedgerTable::from_rows(rows);
        assert_eq!(table.entries().count(), 0);

        assert_eq!(table.status("1234", &john(), 5), PinStatus::BoundElsewhere);
        let before = table.clone();
        let err = table.record_use("1234", &mary(), 5).expect_err("PIN is taken");
        assert!(matches!(err, PortalError::PinAlreadyUsedByOther));
        assert_eq!(table, before);

        assert_eq!(table.status("5678", &john(), 5), PinStatus::Unknown);
    }

    #[test]
    fn test_identity_check() {
        assert!(john().check().is_ok());
        assert!(matches!(
            Identity::new("", "5A", "2023", "1").check(),
            Err(PortalError::InvalidIdentity(_))
        ));
        assert!(matches!(
            Identity::new("JOHN", "5A", "  ", "1").check(),
            Err(PortalError::InvalidIdentity(_))
        ));
        assert!(matches!(
            Identity::new("DOE, JOHN", "5A", "2023", "1").check(),
            Err(PortalError::InvalidIdentity(_))
        ));
        assert!(matches!(
            Identity::new("JOHN\nDOE", "5A", "2023", "1").check(),
            Err(PortalError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_cap_of_one() {
        let mut table = LedgerTable::default();
        table.record_use("1234", &john(), 1).expect("first use");
        assert!(matches!(
            table.record_use("1234", &john(), 1),
            Err(PortalError::UsageLimitExceeded { cap: 1 })
        ));
    }
}
