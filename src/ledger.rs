//! PIN usage ledger
//!
//! Access to a report is gated by a PIN. Valid PINs come from an allow-list
//! file; every successful use is counted in the ledger file, one row per
//! `(pin, identity)` pair:
//!
//! ```text
//! pin,name,class,session,term,count
//! 1234,JOHN,5A,2023,1,2
//! ```
//!
//! ## Rules
//!
//! - A PIN that is not on the allow-list is rejected.
//! - An identity with a blank field, or a field holding a comma or line
//!   break, is rejected before the ledger is read.
//! - The first use of a PIN binds it to the presenting identity (count 1).
//! - Later uses by the same identity increment the count, up to the cap.
//! - A PIN bound to one identity is rejected for every other identity.
//!   A ledger row that no longer parses still binds the PIN in its first field.
//!
//! ## State machine
//!
//! ```text
//!             first use                 use (count+1 < cap)
//!   Unknown ───────────► BoundUnderCap ◄──────────────────┐
//!                             │  └──────────────────────────┘
//!                             │ use (count+1 == cap)
//!                             ▼
//!                         BoundAtCap ──► UsageLimitExceeded
//!
//!   any other identity ──► BoundElsewhere ──► PinAlreadyUsedByOther
//! ```
//!
//! ## Concurrency
//!
//! [`UsageLedger`] serializes its read-modify-write cycle behind a mutex and
//! replaces the ledger file by atomic rename, so in-process callers never
//! lose an increment and readers never see a half-written file. Separate
//! processes sharing one ledger file are still last-writer-wins.

pub mod allow_list;
pub mod entry;
pub mod store;

pub use allow_list::PinAllowList;
pub use entry::{Accepted, Identity, LedgerEntry, LedgerTable, PinStatus};
pub use store::UsageLedger;

/// Default number of uses a PIN grants its bound identity.
pub const DEFAULT_USAGE_CAP: u32 = 5;

/// Mask all but the last two characters of a PIN for logging.
pub fn mask_pin(pin: &str) -> String {
    let count = pin.chars().count();
    pin.chars()
        .enumerate()
        .map(|(i, c)| if i + 2 < count { '*' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_pin() {
        assert_eq!(mask_pin("123456"), "****56");
        assert_eq!(mask_pin("12"), "12");
        assert_eq!(mask_pin(""), "");
    }
}
