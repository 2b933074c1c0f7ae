use crate::feeds::types::RawOccurrence;
use crate::models::{ExternalOccupancy, ExternalPlatform, Property};
use sha2::{Digest, Sha256};

/// Tie a raw feed occurrence to its property and platform.
pub fn normalize(
    raw: RawOccurrence,
    property: &Property,
    platform: ExternalPlatform,
) -> ExternalOccupancy {
    let uid = raw
        .uid
        .unwrap_or_else(|| derived_uid(property.id, platform, raw.start, raw.end));
    let title = raw
        .summary
        .unwrap_or_else(|| format!("Reservation ({})", platform.display_name()));

    ExternalOccupancy {
        property_id: property.id,
        property_name: property.name.clone(),
        platform,
        uid,
        start: raw.start,
        end: raw.end,
        created: raw.created,
        title,
    }
}

/// Stable identity for feed events that carry no UID.
fn derived_uid(
    property_id: i64,
    platform: ExternalPlatform,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}|{}|{}", property_id, platform.as_str(), start, end));
    let digest = hex::encode(hasher.finalize());
    format!("derived-{}@{}", &digest[..32], platform.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn property(id: i64) -> Property {
        Property {
            id,
            name: format!("Casa {id}"),
            airbnb_ical: None,
            booking_ical: None,
        }
    }

    fn raw(uid: Option<&str>) -> RawOccurrence {
        RawOccurrence {
            uid: uid.map(String::from),
            start: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
            created: None,
            summary: None,
        }
    }

    #[test]
    fn keeps_feed_uid_and_tags_source() {
        let occ = normalize(raw(Some("feed-uid")), &property(1), ExternalPlatform::Booking);
        assert_eq!(occ.uid, "feed-uid");
        assert_eq!(occ.property_id, 1);
        assert_eq!(occ.property_name, "Casa 1");
        assert_eq!(occ.platform, ExternalPlatform::Booking);
        assert_eq!(occ.title, "Reservation (Booking)");
    }

    #[test]
    fn derived_uid_is_deterministic() {
        let first = normalize(raw(None), &property(1), ExternalPlatform::Airbnb);
        let second = normalize(raw(None), &property(1), ExternalPlatform::Airbnb);
        assert_eq!(first.uid, second.uid);
        assert!(first.uid.starts_with("derived-"));
    }

    #[test]
    fn derived_uid_differs_per_property_and_platform() {
        let a = normalize(raw(None), &property(1), ExternalPlatform::Airbnb);
        let b = normalize(raw(None), &property(2), ExternalPlatform::Airbnb);
        let c = normalize(raw(None), &property(1), ExternalPlatform::Booking);
        assert_ne!(a.uid, b.uid);
        assert_ne!(a.uid, c.uid);
    }
}
