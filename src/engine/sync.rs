use crate::engine::log::SyncLog;
use crate::engine::manual::{load_manual_bookings, manual_occupancies};
use crate::engine::reconciler::{external_platform_ids, ingest, PersistenceReport};
use crate::engine::timeline::Timeline;
use crate::error::SyncError;
use crate::feeds::{fetch_and_parse, normalize, FeedSource};
use crate::ledger::BookingLedger;
use crate::models::{ExternalOccupancy, ExternalPlatform, Occupancy, Property};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Reconciled occupancy view returned by one run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub occupancies: Vec<Occupancy>,
    pub logs: Vec<String>,
    pub properties: Vec<Property>,
    pub persistence: PersistenceReport,
}

pub struct SyncEngine {
    ledger: Arc<dyn BookingLedger>,
    source: Arc<dyn FeedSource>,
    lookback_days: i64,
    // one run at a time, so the UID snapshot each run reads stays current
    run_lock: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        ledger: Arc<dyn BookingLedger>,
        source: Arc<dyn FeedSource>,
        lookback_days: i64,
    ) -> Self {
        Self {
            ledger,
            source,
            lookback_days,
            run_lock: Mutex::new(()),
        }
    }

    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        self.run_at(Utc::now()).await
    }

    /// Run a sync as if the current time were `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<SyncReport, SyncError> {
        let _guard = self.run_lock.lock().await;
        let mut log = SyncLog::new();
        log.info(format!("--- Sync started (feed source: {}) ---", self.source.source_name()));

        let properties = self.ledger.properties().map_err(|e| {
            error!("Cannot read property configuration: {}", e);
            SyncError::Configuration(e)
        })?;
        log.info(format!("Loaded {} properties", properties.len()));

        let platforms = match self.ledger.platforms() {
            Ok(platforms) => platforms,
            Err(e) => {
                log.warn(format!("Error reading platforms: {}", e));
                Vec::new()
            }
        };

        let external = self.fetch_all(&properties, now, &mut log).await;

        let today = now.date_naive();
        let manual = match load_manual_bookings(self.ledger.as_ref(), &properties, &platforms, today)
        {
            Ok(bookings) => manual_occupancies(&bookings, &properties, &platforms),
            Err(e) => {
                log.warn(format!("Error loading manual bookings: {}", e));
                Vec::new()
            }
        };
        log.info(format!("Manual event count: {}", manual.len()));

        let platform_ids = external_platform_ids(&platforms);
        let timeline = Timeline::merge(
            manual,
            external
                .iter()
                .map(|occ| occ.to_occupancy(platform_ids.get(&occ.platform).copied()))
                .collect(),
        );
        for (first, second) in timeline.conflicts() {
            log.warn(format!(
                "Overlapping stays on {}: {} ({} to {}) and {} ({} to {})",
                first.property_name,
                first.title,
                first.start,
                first.end,
                second.title,
                second.start,
                second.end
            ));
        }
        log.info(format!("Total events to return: {}", timeline.len()));

        let persistence = ingest(
            self.ledger.as_ref(),
            &external,
            &properties,
            &platforms,
            &mut log,
        );

        info!(
            "Sync finished: {} occupancies, {} new bookings",
            timeline.len(),
            persistence.inserted
        );
        Ok(SyncReport {
            occupancies: timeline.into_occupancies(),
            logs: log.into_entries(),
            properties,
            persistence,
        })
    }

    /// Fetch every configured feed concurrently. Each feed's log lines
    /// are appended in property order once all fetches are done.
    async fn fetch_all(
        &self,
        properties: &[Property],
        now: DateTime<Utc>,
        log: &mut SyncLog,
    ) -> Vec<ExternalOccupancy> {
        let mut tasks = Vec::new();

        for property in properties {
            let configured = |platform: ExternalPlatform| {
                if property.feed_url(platform).is_some() {
                    "YES"
                } else {
                    "NO"
                }
            };
            log.info(format!(
                "Checking property: {} (Airbnb: {}, Booking: {})",
                property.name,
                configured(ExternalPlatform::Airbnb),
                configured(ExternalPlatform::Booking)
            ));

            for platform in ExternalPlatform::ALL {
                let Some(url) = property.feed_url(platform) else {
                    continue;
                };
                let url = url.to_string();
                let owned = property.clone();
                let source = Arc::clone(&self.source);
                let lookback_days = self.lookback_days;

                let handle = tokio::spawn(async move {
                    sync_feed(source.as_ref(), &owned, platform, &url, now, lookback_days).await
                });
                tasks.push((property.name.clone(), platform, handle));
            }
        }

        let mut occurrences = Vec::new();
        for (property_name, platform, handle) in tasks {
            match handle.await {
                Ok((found, feed_log)) => {
                    log.append(feed_log);
                    occurrences.extend(found);
                }
                Err(e) => log.warn(format!(
                    "Error fetching {} iCal for {}: feed task aborted: {}",
                    platform.display_name(),
                    property_name,
                    e
                )),
            }
        }
        occurrences
    }
}

/// Fetch, decode and normalize one property/platform feed. Failures are
/// logged and yield no occurrences.
async fn sync_feed(
    source: &dyn FeedSource,
    property: &Property,
    platform: ExternalPlatform,
    url: &str,
    now: DateTime<Utc>,
    lookback_days: i64,
) -> (Vec<ExternalOccupancy>, SyncLog) {
    let mut log = SyncLog::new();
    log.info(format!(
        "Fetching {} iCal for {}...",
        platform.display_name(),
        property.name
    ));

    match fetch_and_parse(source, url, now, lookback_days).await {
        Ok(parsed) => {
            log.info(format!(
                "Parsed {} total events from {} feed, {} passed filter ({} invalid).",
                parsed.total,
                platform.display_name(),
                parsed.occurrences.len(),
                parsed.invalid
            ));
            let found: Vec<_> = parsed
                .occurrences
                .into_iter()
                .map(|raw| normalize(raw, property, platform))
                .collect();
            log.info(format!(
                "Found {} upcoming events for {}/{}",
                found.len(),
                platform.display_name(),
                property.name
            ));
            (found, log)
        }
        Err(e) => {
            log.warn(format!(
                "Error fetching {} iCal for {}: {}",
                platform.display_name(),
                property.name,
                e
            ));
            (Vec::new(), log)
        }
    }
}
