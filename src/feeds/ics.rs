use crate::error::FeedError;
use crate::feeds::traits::FeedSource;
use crate::feeds::types::{ParsedFeed, RawOccurrence};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use tracing::debug;

/// Fetch a feed through `source` and decode it.
pub async fn fetch_and_parse(
    source: &dyn FeedSource,
    url: &str,
    now: DateTime<Utc>,
    lookback_days: i64,
) -> Result<ParsedFeed, FeedError> {
    let body = source.fetch(url).await?;
    parse_feed(&body, now, lookback_days)
}

/// Decode a feed body, keeping events that ended no earlier than
/// `lookback_days` before `now`.
pub fn parse_feed(
    body: &str,
    now: DateTime<Utc>,
    lookback_days: i64,
) -> Result<ParsedFeed, FeedError> {
    if !body.to_ascii_uppercase().contains("BEGIN:VCALENDAR") {
        return Err(FeedError::Parse("body is not a VCALENDAR document".into()));
    }

    let cutoff = TimeDelta::try_days(lookback_days)
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .ok_or_else(|| {
            FeedError::Parse(format!("look-back of {} days is out of range", lookback_days))
        })?
        .date_naive();
    let mut parsed = ParsedFeed::default();
    let mut calendars = 0;

    for calendar in ical::IcalParser::new(body.as_bytes()) {
        let calendar = calendar.map_err(|e| FeedError::Parse(e.to_string()))?;
        calendars += 1;

        for event in &calendar.events {
            parsed.total += 1;
            match read_event(event) {
                Some(occurrence) if occurrence.end >= cutoff => {
                    parsed.occurrences.push(occurrence)
                }
                Some(_) => {}
                None => parsed.invalid += 1,
            }
        }
    }

    if calendars == 0 {
        return Err(FeedError::Parse("no calendar found in body".into()));
    }

    debug!(
        "Decoded {} events, {} kept, {} invalid",
        parsed.total,
        parsed.occurrences.len(),
        parsed.invalid
    );
    Ok(parsed)
}

/// One `VEVENT` as a `[start, end)` day range.
///
/// A present but unreadable `DTEND` or `DURATION` makes the event invalid.
/// Without either, only an all-day start gets the implicit one-day stay.
fn read_event(event: &IcalEvent) -> Option<RawOccurrence> {
    let mut uid = None;
    let mut start = None;
    let mut all_day = false;
    let mut end: Option<Option<NaiveDate>> = None;
    let mut duration: Option<Option<i64>> = None;
    let mut created = None;
    let mut dtstamp = None;
    let mut summary = None;

    for property in &event.properties {
        let Some(value) = property.value.as_deref().map(str::trim) else {
            continue;
        };
        match property.name.to_ascii_uppercase().as_str() {
            "UID" if !value.is_empty() => uid = Some(value.to_string()),
            "DTSTART" => {
                start = parse_day(value);
                all_day = is_date_value(property, value);
            }
            "DTEND" => end = Some(parse_day(value)),
            "DURATION" => duration = Some(parse_duration_days(value)),
            "CREATED" => created = parse_timestamp(value),
            "DTSTAMP" => dtstamp = parse_timestamp(value),
            "SUMMARY" if !value.is_empty() => summary = Some(value.to_string()),
            _ => {}
        }
    }

    let start = start?;
    let end = match (end, duration) {
        (Some(end), _) => end?,
        (None, Some(days)) => start.checked_add_signed(TimeDelta::try_days(days?)?)?,
        (None, None) if all_day => start.succ_opt()?,
        (None, None) => return None,
    };

    if start >= end {
        return None;
    }

    Some(RawOccurrence {
        uid,
        start,
        end,
        created: created.or(dtstamp),
        summary,
    })
}

fn is_date_value(property: &Property, value: &str) -> bool {
    let typed_date = property.params.iter().flatten().any(|(name, values)| {
        name.eq_ignore_ascii_case("VALUE")
            && values.iter().any(|v| v.eq_ignore_ascii_case("DATE"))
    });
    typed_date || value.len() == 8
}

/// `DATE` or `DATE-TIME` value to its calendar day.
///
/// UTC times use the UTC date, floating and `TZID` times their local date.
fn parse_day(value: &str) -> Option<NaiveDate> {
    if value.len() == 8 {
        return NaiveDate::parse_from_str(value, "%Y%m%d").ok();
    }
    let local = value.strip_suffix('Z').unwrap_or(value);
    NaiveDateTime::parse_from_str(local, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| dt.date())
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.len() == 8 {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }
    let local = value.strip_suffix('Z').unwrap_or(value);
    NaiveDateTime::parse_from_str(local, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Whole days of an RFC 5545 duration such as `P3D`, `P1W` or `P2DT12H`.
fn parse_duration_days(value: &str) -> Option<i64> {
    let body = value.strip_prefix('+').unwrap_or(value).strip_prefix('P')?;
    let date_part = body.split('T').next().unwrap_or("");
    if date_part.is_empty() {
        return Some(0);
    }
    if let Some(weeks) = date_part.strip_suffix('W') {
        return weeks.parse::<i64>().ok()?.checked_mul(7);
    }
    date_part.strip_suffix('D')?.parse().ok()
}
