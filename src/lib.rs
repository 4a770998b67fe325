//! # reportcard - School report-card portal
//!
//! Teachers submit report cards, which are stored as rows in a flat
//! directory file. Students retrieve their own row by presenting a PIN from
//! an allow-list; each PIN is bound to the first student who uses it and
//! works a limited number of times.
//!
//! ## Quick Start
//!
//! ```no_run
//! use reportcard::config::PortalConfig;
//! use reportcard::portal::{Portal, ValidateRequest};
//!
//! # fn example() -> reportcard::error::Result<()> {
//! let portal = Portal::new(&PortalConfig::default());
//! let row = portal.validate(&ValidateRequest {
//!     pin: "1234".into(),
//!     name: "john".into(),
//!     class: "5a".into(),
//!     session: "2023".into(),
//!     term: "1".into(),
//! })?;
//! println!("{}", row.join(","));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`table`]: CSV codec, composite-key comparator, sorted lookup
//! - [`ledger`]: PIN allow-list and usage ledger
//! - [`intake`]: report submission and name index
//! - [`portal`]: the validate and submit flows over the configured files
//! - [`server`]: HTTP surface
//! - [`config`], [`logging`], [`error`]: ambient plumbing
//!
//! ## Files
//!
//! All state lives in plain text files under the data directory:
//!
//! ```text
//! pins.csv          allowed PINs, one per line
//! records.csv       pin,name,class,session,term,count
//! public/data.csv   one row per submitted report
//! public/names.csv  one name per line
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod intake;
pub mod ledger;
pub mod logging;
pub mod portal;
pub mod server;
pub mod table;
