pub mod booking;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use booking::{Booking, BookingDraft, NewBooking, Pricing};

/// One of the two platforms whose calendars are synced from ICS feeds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ExternalPlatform {
    Airbnb,
    Booking,
}

impl ExternalPlatform {
    pub const ALL: [ExternalPlatform; 2] = [ExternalPlatform::Airbnb, ExternalPlatform::Booking];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalPlatform::Airbnb => "airbnb",
            ExternalPlatform::Booking => "booking",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExternalPlatform::Airbnb => "Airbnb",
            ExternalPlatform::Booking => "Booking",
        }
    }

    pub fn role(&self) -> PlatformRole {
        match self {
            ExternalPlatform::Airbnb => PlatformRole::Airbnb,
            ExternalPlatform::Booking => PlatformRole::Booking,
        }
    }
}

/// What a platform row means to the engine. Assigned when the platform is created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlatformRole {
    Airbnb,
    Booking,
    /// Direct bookings, owner stays, blocked dates
    Manual,
    /// Manual entries marking the property explicitly available
    Free,
}

impl PlatformRole {
    /// Legacy name rule, only applied when a platform is created without a role.
    pub fn infer_from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("airbnb") {
            PlatformRole::Airbnb
        } else if lower.contains("booking") {
            PlatformRole::Booking
        } else if lower.contains("libre") || lower.contains("free") {
            PlatformRole::Free
        } else {
            PlatformRole::Manual
        }
    }

    pub fn external(&self) -> Option<ExternalPlatform> {
        match self {
            PlatformRole::Airbnb => Some(ExternalPlatform::Airbnb),
            PlatformRole::Booking => Some(ExternalPlatform::Booking),
            PlatformRole::Manual | PlatformRole::Free => None,
        }
    }

    pub fn is_external(&self) -> bool {
        self.external().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformRole::Airbnb => "airbnb",
            PlatformRole::Booking => "booking",
            PlatformRole::Manual => "manual",
            PlatformRole::Free => "free",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "airbnb" => Some(PlatformRole::Airbnb),
            "booking" => Some(PlatformRole::Booking),
            "manual" => Some(PlatformRole::Manual),
            "free" => Some(PlatformRole::Free),
            _ => None,
        }
    }
}

/// A rental unit with its optional feed URLs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub airbnb_ical: Option<String>,
    pub booking_ical: Option<String>,
}

impl Property {
    /// Configured feed URL for a platform; blank values count as unset.
    pub fn feed_url(&self, platform: ExternalPlatform) -> Option<&str> {
        let url = match platform {
            ExternalPlatform::Airbnb => self.airbnb_ical.as_deref(),
            ExternalPlatform::Booking => self.booking_ical.as_deref(),
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Booking channel with its commission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Platform {
    pub id: i64,
    pub name: String,
    pub commission_percentage: f64,
    pub role: PlatformRole,
}

/// Where an occupancy came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Manual,
    Airbnb,
    Booking,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Manual => "manual",
            Provenance::Airbnb => "airbnb",
            Provenance::Booking => "booking",
        }
    }
}

impl From<ExternalPlatform> for Provenance {
    fn from(platform: ExternalPlatform) -> Self {
        match platform {
            ExternalPlatform::Airbnb => Provenance::Airbnb,
            ExternalPlatform::Booking => Provenance::Booking,
        }
    }
}

/// Half-open `[start, end)` day interval on a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Occupancy {
    pub id: String,
    pub property_id: i64,
    pub property_name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub provenance: Provenance,
    pub title: String,
    pub platform_id: Option<i64>,
    /// Set for external occupancies
    pub uid: Option<String>,
    /// Manual entry on a `Free` platform: the days are bookable, not taken
    pub marks_free: bool,
    pub net_price: Option<f64>,
}

impl Occupancy {
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    pub fn overlaps(&self, other: &Occupancy) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A normalized feed event for one property and platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalOccupancy {
    pub property_id: i64,
    pub property_name: String,
    pub platform: ExternalPlatform,
    pub uid: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub created: Option<DateTime<Utc>>,
    pub title: String,
}

impl ExternalOccupancy {
    /// Timeline entry for this event. `platform_id` is the ledger platform
    /// carrying this event's role, when one is configured.
    pub fn to_occupancy(&self, platform_id: Option<i64>) -> Occupancy {
        Occupancy {
            id: self.uid.clone(),
            property_id: self.property_id,
            property_name: self.property_name.clone(),
            start: self.start,
            end: self.end,
            provenance: self.platform.into(),
            title: self.title.clone(),
            platform_id,
            uid: Some(self.uid.clone()),
            marks_free: false,
            net_price: None,
        }
    }
}
