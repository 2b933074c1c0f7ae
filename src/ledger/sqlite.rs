use crate::error::PersistError;
use crate::ledger::{migrations, BookingLedger};
use crate::models::{Booking, NewBooking, Platform, PlatformRole, Property};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const BOOKING_COLUMNS: &str = "id, property_id, platform_id, check_in, check_out, nights, \
     gross_price, commission, net_price, adr, request_date, lead_time_days, ical_uid, note";

pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        info!("Opening booking ledger at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, PersistError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, PersistError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, PersistError> {
        self.conn.lock().map_err(|_| PersistError::LockPoisoned)
    }

    /// Create or update a property by name, returning its id
    pub fn upsert_property(
        &self,
        name: &str,
        airbnb_ical: Option<&str>,
        booking_ical: Option<&str>,
    ) -> Result<i64, PersistError> {
        let conn = self.conn()?;
        let id = conn.query_row(
            "INSERT INTO properties (name, airbnb_ical, booking_ical) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                airbnb_ical = excluded.airbnb_ical,
                booking_ical = excluded.booking_ical
             RETURNING id",
            params![name, airbnb_ical, booking_ical],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Create or update a platform by name. Without an explicit role the
    /// role is inferred from the name once, here.
    pub fn upsert_platform(
        &self,
        name: &str,
        commission_percentage: f64,
        role: Option<PlatformRole>,
    ) -> Result<i64, PersistError> {
        let role = role.unwrap_or_else(|| PlatformRole::infer_from_name(name));
        let conn = self.conn()?;
        let id = conn.query_row(
            "INSERT INTO platforms (name, commission_percentage, role) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                commission_percentage = excluded.commission_percentage,
                role = excluded.role
             RETURNING id",
            params![name, commission_percentage, role.as_str()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Insert a single booking, returning its id
    pub fn insert_booking(&self, booking: &NewBooking) -> Result<i64, PersistError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO bookings (property_id, platform_id, check_in, check_out, nights,
                gross_price, commission, net_price, adr, request_date, lead_time_days, ical_uid, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                booking.property_id,
                booking.platform_id,
                booking.check_in,
                booking.check_out,
                booking.nights,
                booking.gross_price,
                booking.commission,
                booking.net_price,
                booking.adr,
                booking.request_date,
                booking.lead_time_days,
                booking.ical_uid,
                booking.note,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Overwrite a booking with manually edited values. The feed UID is kept.
    ///
    /// Returns false when no booking has that id.
    pub fn update_booking(&self, id: i64, booking: &NewBooking) -> Result<bool, PersistError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE bookings SET property_id = ?2, platform_id = ?3, check_in = ?4, check_out = ?5,
                nights = ?6, gross_price = ?7, commission = ?8, net_price = ?9, adr = ?10,
                request_date = ?11, lead_time_days = ?12, note = ?13
             WHERE id = ?1",
            params![
                id,
                booking.property_id,
                booking.platform_id,
                booking.check_in,
                booking.check_out,
                booking.nights,
                booking.gross_price,
                booking.commission,
                booking.net_price,
                booking.adr,
                booking.request_date,
                booking.lead_time_days,
                booking.note,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_booking(&self, id: i64) -> Result<bool, PersistError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM bookings WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn booking(&self, id: i64) -> Result<Option<Booking>, PersistError> {
        let conn = self.conn()?;
        let booking = conn
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
                [id],
                row_to_booking,
            )
            .optional()?;
        Ok(booking)
    }

    pub fn bookings(&self) -> Result<Vec<Booking>, PersistError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY check_in, id"
        ))?;
        let rows = stmt.query_map([], row_to_booking)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl BookingLedger for SqliteLedger {
    fn properties(&self) -> Result<Vec<Property>, PersistError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, airbnb_ical, booking_ical FROM properties ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Property {
                id: row.get(0)?,
                name: row.get(1)?,
                airbnb_ical: row.get(2)?,
                booking_ical: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn platforms(&self) -> Result<Vec<Platform>, PersistError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, commission_percentage, role FROM platforms ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let role: String = row.get(3)?;
            let role = PlatformRole::parse(&role).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    Type::Text,
                    format!("unknown platform role '{role}'").into(),
                )
            })?;
            Ok(Platform {
                id: row.get(0)?,
                name: row.get(1)?,
                commission_percentage: row.get(2)?,
                role,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn existing_uids(&self) -> Result<HashSet<String>, PersistError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT ical_uid FROM bookings WHERE ical_uid IS NOT NULL")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<HashSet<_>, _>>()?)
    }

    fn bookings_checking_out_from(&self, day: NaiveDate) -> Result<Vec<Booking>, PersistError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE check_out >= ?1 ORDER BY check_in, id"
        ))?;
        let rows = stmt.query_map([day], row_to_booking)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_bookings(&self, batch: &[NewBooking]) -> Result<usize, PersistError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO bookings (property_id, platform_id, check_in, check_out,
                    nights, gross_price, commission, net_price, adr, request_date, lead_time_days,
                    ical_uid, note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for booking in batch {
                written += stmt.execute(params![
                    booking.property_id,
                    booking.platform_id,
                    booking.check_in,
                    booking.check_out,
                    booking.nights,
                    booking.gross_price,
                    booking.commission,
                    booking.net_price,
                    booking.adr,
                    booking.request_date,
                    booking.lead_time_days,
                    booking.ical_uid,
                    booking.note,
                ])?;
            }
        }
        tx.commit()?;

        debug!("Inserted {} of {} ledger rows", written, batch.len());
        Ok(written)
    }
}

fn row_to_booking(row: &rusqlite::Row) -> Result<Booking, rusqlite::Error> {
    Ok(Booking {
        id: row.get(0)?,
        property_id: row.get(1)?,
        platform_id: row.get(2)?,
        check_in: row.get(3)?,
        check_out: row.get(4)?,
        nights: row.get(5)?,
        gross_price: row.get(6)?,
        commission: row.get(7)?,
        net_price: row.get(8)?,
        adr: row.get(9)?,
        request_date: row.get(10)?,
        lead_time_days: row.get(11)?,
        ical_uid: row.get(12)?,
        note: row.get(13)?,
    })
}
