use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

pub const SCHEMA_VERSION: i32 = 2;

pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )?;

    let current = schema_version(conn);
    if current < 1 {
        migrate_v1(conn)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
    }
    debug!("Ledger schema at version {}", SCHEMA_VERSION);
    Ok(())
}

/// Returns 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!("Failed to read schema_version: {}", e);
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: properties, platforms and the booking ledger.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS properties (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            airbnb_ical TEXT,
            booking_ical TEXT
        );
        CREATE TABLE IF NOT EXISTS platforms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            commission_percentage REAL NOT NULL DEFAULT 0,
            role TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS bookings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
            platform_id INTEGER NOT NULL REFERENCES platforms(id),
            check_in TEXT NOT NULL,
            check_out TEXT NOT NULL,
            nights INTEGER NOT NULL DEFAULT 0,
            gross_price REAL NOT NULL DEFAULT 0,
            commission REAL NOT NULL DEFAULT 0,
            net_price REAL NOT NULL DEFAULT 0,
            adr REAL NOT NULL DEFAULT 0,
            request_date TEXT,
            lead_time_days INTEGER,
            ical_uid TEXT,
            note TEXT
        );",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// v2: feed UIDs are unique across the ledger; checkout lookups are indexed.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_ical_uid
            ON bookings(ical_uid) WHERE ical_uid IS NOT NULL;
         CREATE INDEX IF NOT EXISTS idx_bookings_check_out ON bookings(check_out);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}
