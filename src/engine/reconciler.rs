use crate::engine::log::SyncLog;
use crate::error::ConfigResolutionError;
use crate::ledger::BookingLedger;
use crate::models::{ExternalOccupancy, ExternalPlatform, NewBooking, Platform, Property};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Outcome of the ledger write for one run
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PersistenceReport {
    /// Rows handed to the ledger
    pub candidates: usize,
    /// Rows actually written
    pub inserted: usize,
    /// Occurrences skipped because their UID was already stored
    pub already_ingested: usize,
    /// Occurrences skipped because their property or platform is unknown
    pub unresolved: usize,
    /// Set when the ledger read or write failed
    pub error: Option<String>,
}

impl PersistenceReport {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Rows to insert, decided before touching the ledger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestPlan {
    pub candidates: Vec<NewBooking>,
    pub already_ingested: usize,
    pub unresolved: Vec<(String, ConfigResolutionError)>,
}

/// Platform id for each external role: the first platform carrying it.
pub fn external_platform_ids(platforms: &[Platform]) -> HashMap<ExternalPlatform, i64> {
    let mut ids = HashMap::new();
    for platform in platforms {
        if let Some(external) = platform.role.external() {
            ids.entry(external).or_insert(platform.id);
        }
    }
    ids
}

/// Select the occurrences not yet in the ledger and build their rows.
pub fn plan_ingestion(
    occurrences: &[ExternalOccupancy],
    existing_uids: &HashSet<String>,
    platform_ids: &HashMap<ExternalPlatform, i64>,
    property_ids: &HashMap<String, i64>,
) -> IngestPlan {
    let mut plan = IngestPlan::default();
    let mut planned: HashSet<&str> = HashSet::new();

    for occ in occurrences {
        if existing_uids.contains(&occ.uid) || planned.contains(occ.uid.as_str()) {
            plan.already_ingested += 1;
            continue;
        }

        let Some(&property_id) = property_ids.get(&occ.property_name) else {
            plan.unresolved.push((
                occ.uid.clone(),
                ConfigResolutionError::UnknownProperty(occ.property_name.clone()),
            ));
            continue;
        };
        let Some(&platform_id) = platform_ids.get(&occ.platform) else {
            plan.unresolved.push((
                occ.uid.clone(),
                ConfigResolutionError::UnknownPlatform(occ.platform.as_str().to_string()),
            ));
            continue;
        };

        planned.insert(occ.uid.as_str());
        plan.candidates.push(to_ledger_row(occ, property_id, platform_id));
    }

    plan
}

fn to_ledger_row(occ: &ExternalOccupancy, property_id: i64, platform_id: i64) -> NewBooking {
    let nights = (occ.end - occ.start).num_days().max(0);
    let request_date = occ.created.map(|created| created.date_naive());

    NewBooking {
        property_id,
        platform_id,
        check_in: occ.start,
        check_out: occ.end,
        nights,
        gross_price: 0.0,
        commission: 0.0,
        net_price: 0.0,
        adr: 0.0,
        request_date,
        lead_time_days: request_date.map(|requested| (occ.start - requested).num_days()),
        ical_uid: Some(occ.uid.clone()),
        note: None,
    }
}

/// Persist the run's new feed occurrences as one batch.
///
/// Ledger failures are logged and reported, never returned: the caller
/// still publishes its timeline.
pub fn ingest(
    ledger: &dyn BookingLedger,
    occurrences: &[ExternalOccupancy],
    properties: &[Property],
    platforms: &[Platform],
    log: &mut SyncLog,
) -> PersistenceReport {
    let mut report = PersistenceReport::default();
    if occurrences.is_empty() {
        return report;
    }

    let existing = match ledger.existing_uids() {
        Ok(uids) => uids,
        Err(e) => {
            log.warn(format!("Could not read ingested feed UIDs: {}", e));
            report.error = Some(e.to_string());
            return report;
        }
    };

    let property_ids: HashMap<String, i64> =
        properties.iter().map(|p| (p.name.clone(), p.id)).collect();
    let plan = plan_ingestion(
        occurrences,
        &existing,
        &external_platform_ids(platforms),
        &property_ids,
    );

    for (uid, reason) in &plan.unresolved {
        log.warn(format!("Skipping feed event {}: {}", uid, reason));
    }

    report.candidates = plan.candidates.len();
    report.already_ingested = plan.already_ingested;
    report.unresolved = plan.unresolved.len();

    if plan.candidates.is_empty() {
        log.info(format!(
            "No new feed bookings ({} already in ledger)",
            plan.already_ingested
        ));
        return report;
    }

    log.info(format!(
        "Syncing {} new bookings to the ledger...",
        plan.candidates.len()
    ));
    match ledger.insert_bookings(&plan.candidates) {
        Ok(inserted) => {
            report.inserted = inserted;
            log.info(format!("Successfully synced {} new bookings.", inserted));
        }
        Err(e) => {
            log.warn(format!("Error writing new bookings to the ledger: {}", e));
            report.error = Some(e.to_string());
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SqliteLedger;
    use crate::models::PlatformRole;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn occurrence(uid: &str, property: &str, platform: ExternalPlatform) -> ExternalOccupancy {
        ExternalOccupancy {
            property_id: 0,
            property_name: property.into(),
            platform,
            uid: uid.into(),
            start: day("2024-07-10"),
            end: day("2024-07-14"),
            created: Some(Utc.with_ymd_and_hms(2024, 6, 30, 18, 0, 0).unwrap()),
            title: "Reserved".into(),
        }
    }

    fn lookups() -> (HashMap<ExternalPlatform, i64>, HashMap<String, i64>) {
        let platforms = HashMap::from([(ExternalPlatform::Airbnb, 1)]);
        let properties = HashMap::from([("Casa Sol".to_string(), 7)]);
        (platforms, properties)
    }

    #[test]
    fn builds_zero_priced_rows_with_nights_and_lead_time() {
        let (platforms, properties) = lookups();
        let plan = plan_ingestion(
            &[occurrence("a", "Casa Sol", ExternalPlatform::Airbnb)],
            &HashSet::new(),
            &platforms,
            &properties,
        );

        assert_eq!(plan.candidates.len(), 1);
        let row = &plan.candidates[0];
        assert_eq!(row.property_id, 7);
        assert_eq!(row.platform_id, 1);
        assert_eq!(row.nights, 4);
        assert_eq!(row.request_date, Some(day("2024-06-30")));
        assert_eq!(row.lead_time_days, Some(10));
        assert_eq!(row.ical_uid.as_deref(), Some("a"));
        assert_eq!((row.gross_price, row.net_price, row.adr), (0.0, 0.0, 0.0));
    }

    #[test]
    fn lead_time_is_absent_without_created() {
        let (platforms, properties) = lookups();
        let mut occ = occurrence("a", "Casa Sol", ExternalPlatform::Airbnb);
        occ.created = None;
        let plan = plan_ingestion(&[occ], &HashSet::new(), &platforms, &properties);
        assert_eq!(plan.candidates[0].request_date, None);
        assert_eq!(plan.candidates[0].lead_time_days, None);
    }

    #[test]
    fn skips_known_and_repeated_uids() {
        let (platforms, properties) = lookups();
        let existing = HashSet::from(["seen".to_string()]);
        let plan = plan_ingestion(
            &[
                occurrence("seen", "Casa Sol", ExternalPlatform::Airbnb),
                occurrence("new", "Casa Sol", ExternalPlatform::Airbnb),
                occurrence("new", "Casa Sol", ExternalPlatform::Airbnb),
            ],
            &existing,
            &platforms,
            &properties,
        );
        assert_eq!(plan.candidates.len(), 1);
        assert_eq!(plan.already_ingested, 2);
    }

    #[test]
    fn unresolved_property_or_platform_is_skipped() {
        let (platforms, properties) = lookups();
        let plan = plan_ingestion(
            &[
                occurrence("x", "Casa Perdida", ExternalPlatform::Airbnb),
                occurrence("y", "Casa Sol", ExternalPlatform::Booking),
            ],
            &HashSet::new(),
            &platforms,
            &properties,
        );
        assert!(plan.candidates.is_empty());
        assert_eq!(
            plan.unresolved,
            vec![
                (
                    "x".to_string(),
                    ConfigResolutionError::UnknownProperty("Casa Perdida".into())
                ),
                (
                    "y".to_string(),
                    ConfigResolutionError::UnknownPlatform("booking".into())
                ),
            ]
        );
    }

    #[test]
    fn first_platform_per_role_wins() {
        let platforms = vec![
            Platform {
                id: 4,
                name: "Directo".into(),
                commission_percentage: 0.0,
                role: PlatformRole::Manual,
            },
            Platform {
                id: 5,
                name: "Airbnb".into(),
                commission_percentage: 15.0,
                role: PlatformRole::Airbnb,
            },
            Platform {
                id: 6,
                name: "Airbnb Plus".into(),
                commission_percentage: 18.0,
                role: PlatformRole::Airbnb,
            },
        ];
        let ids = external_platform_ids(&platforms);
        assert_eq!(ids.get(&ExternalPlatform::Airbnb), Some(&5));
        assert_eq!(ids.get(&ExternalPlatform::Booking), None);
    }

    #[test]
    fn ingest_twice_writes_once() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        ledger.upsert_property("Casa Sol", None, None).unwrap();
        ledger.upsert_platform("Airbnb", 15.0, None).unwrap();
        let properties = ledger.properties().unwrap();
        let platforms = ledger.platforms().unwrap();
        let occurrences = vec![
            occurrence("a", "Casa Sol", ExternalPlatform::Airbnb),
            occurrence("b", "Casa Sol", ExternalPlatform::Airbnb),
        ];

        let mut log = SyncLog::new();
        let first = ingest(&ledger, &occurrences, &properties, &platforms, &mut log);
        assert_eq!(first.inserted, 2);
        assert!(!first.failed());

        let second = ingest(&ledger, &occurrences, &properties, &platforms, &mut log);
        assert_eq!(second.candidates, 0);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.already_ingested, 2);
        assert_eq!(ledger.bookings().unwrap().len(), 2);
    }
}
