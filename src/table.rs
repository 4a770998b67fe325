//! Flat-file tables: CSV rows, composite keys, and keyed lookup.
//!
//! Every file the portal persists is a "table" of positional string rows with
//! no header enforcement and no quoting. This module groups the three pieces
//! that operate on such rows:
//!
//! - [`codec`]: text ⇄ rows, plus appending a single row to a file
//! - [`key`]: the four-field composite key and its comparator
//! - [`lookup`]: sort-then-binary-search over rows, and the
//!   [`DirectorySnapshot`] that owns a loaded, sorted directory
//!
//! ## Example
//!
//! ```
//! use reportcard::table::{CompositeKey, KeyLayout, codec, lookup};
//!
//! let mut rows = codec::parse("2023,1,2,MARY,5B\n2023,1,2,JOHN,5A\n", b',')?;
//! let key = CompositeKey::new("mary", "5b", "2023", "1");
//! let row = lookup::find(&mut rows, KeyLayout::DIRECTORY, &key).expect("MARY is on the roster");
//! assert_eq!(row[3], "MARY");
//! # Ok::<(), reportcard::error::PortalError>(())
//! ```

pub mod codec;
pub mod key;
pub mod lookup;

pub use codec::Row;
pub use key::{CompositeKey, KeyLayout, compare};
pub use lookup::DirectorySnapshot;
