use crate::error::PersistError;
use crate::ledger::BookingLedger;
use crate::models::{Booking, Occupancy, Platform, PlatformRole, Property, Provenance};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Non-external bookings for `properties` that check out on or after `today`.
pub fn load_manual_bookings(
    ledger: &dyn BookingLedger,
    properties: &[Property],
    platforms: &[Platform],
    today: NaiveDate,
) -> Result<Vec<Booking>, PersistError> {
    let roles: HashMap<i64, PlatformRole> = platforms.iter().map(|p| (p.id, p.role)).collect();

    let bookings = ledger
        .bookings_checking_out_from(today)?
        .into_iter()
        .filter(|b| properties.iter().any(|p| p.id == b.property_id))
        .filter(|b| matches!(roles.get(&b.platform_id), Some(role) if !role.is_external()))
        .collect();

    Ok(bookings)
}

/// Occupancies for manual bookings; empty or inverted stays are dropped.
pub fn manual_occupancies(
    bookings: &[Booking],
    properties: &[Property],
    platforms: &[Platform],
) -> Vec<Occupancy> {
    let names: HashMap<i64, &str> = properties.iter().map(|p| (p.id, p.name.as_str())).collect();
    let roles: HashMap<i64, PlatformRole> = platforms.iter().map(|p| (p.id, p.role)).collect();

    bookings
        .iter()
        .filter(|b| b.check_in < b.check_out)
        .map(|b| {
            let property_name = names.get(&b.property_id).copied().unwrap_or("Unknown");
            let marks_free = roles.get(&b.platform_id) == Some(&PlatformRole::Free);
            let title = if marks_free {
                format!("Available: {}", property_name)
            } else {
                format!("Manual booking ({})", property_name)
            };

            Occupancy {
                id: format!("booking-{}", b.id),
                property_id: b.property_id,
                property_name: property_name.to_string(),
                start: b.check_in,
                end: b.check_out,
                provenance: Provenance::Manual,
                title,
                platform_id: Some(b.platform_id),
                uid: None,
                marks_free,
                net_price: Some(b.net_price),
            }
        })
        .collect()
}
