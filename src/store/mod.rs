//! Record store for the station roster
//!
//! The roster lives in a `;`-separated text file grouped into sections.
//! [`RecordStore`] loads it once and persists every worker's result through
//! a locked read-merge-write transaction.

mod codec;
mod error;
mod record_store;
mod roster;

pub use codec::{parse_roster, write_roster, write_roster_where};
pub use error::{StoreError, StoreResult};
pub use record_store::{RecordStore, SectionStats};
pub use roster::{normalize_email, EntityRecord, Roster, Section};
