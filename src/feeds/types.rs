use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One VEVENT as read from a feed, before it is tied to a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawOccurrence {
    pub uid: Option<String>,
    pub start: NaiveDate,
    /// Exclusive
    pub end: NaiveDate,
    /// `CREATED`, falling back to `DTSTAMP`
    pub created: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

/// Result of decoding one feed body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    /// Occurrences that passed the look-back filter
    pub occurrences: Vec<RawOccurrence>,
    /// VEVENTs seen in the body
    pub total: usize,
    /// VEVENTs without usable dates or with `start >= end`
    pub invalid: usize,
}
