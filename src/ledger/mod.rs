pub mod migrations;
pub mod seed;
pub mod sqlite;

use crate::error::PersistError;
use crate::models::{Booking, NewBooking, Platform, Property};
use chrono::NaiveDate;
use std::collections::HashSet;

pub use seed::{apply_seed, SeedFile};
pub use sqlite::SqliteLedger;

/// Storage the reconciliation engine reads from and appends to.
///
/// Property and platform configuration is read-only here.
pub trait BookingLedger: Send + Sync {
    fn properties(&self) -> Result<Vec<Property>, PersistError>;

    fn platforms(&self) -> Result<Vec<Platform>, PersistError>;

    /// Feed UIDs already present in the ledger
    fn existing_uids(&self) -> Result<HashSet<String>, PersistError>;

    /// Bookings whose checkout is on or after `day`
    fn bookings_checking_out_from(&self, day: NaiveDate) -> Result<Vec<Booking>, PersistError>;

    /// Insert a batch; rows whose feed UID is already stored are ignored.
    /// Returns the number of rows written.
    fn insert_bookings(&self, batch: &[NewBooking]) -> Result<usize, PersistError>;
}
