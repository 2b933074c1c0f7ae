use super::Platform;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted booking ledger row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub property_id: i64,
    pub platform_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub gross_price: f64,
    pub commission: f64,
    pub net_price: f64,
    pub adr: f64,
    pub request_date: Option<NaiveDate>,
    pub lead_time_days: Option<i64>,
    /// Feed UID; `None` for manual entries
    pub ical_uid: Option<String>,
    pub note: Option<String>,
}

/// Ledger row waiting to be inserted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBooking {
    pub property_id: i64,
    pub platform_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub gross_price: f64,
    pub commission: f64,
    pub net_price: f64,
    pub adr: f64,
    pub request_date: Option<NaiveDate>,
    pub lead_time_days: Option<i64>,
    pub ical_uid: Option<String>,
    pub note: Option<String>,
}

/// Gross price and commission of a booking being edited.
///
/// The commission follows the platform percentage until a caller pins it.
/// A pinned commission only resets when the platform changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    gross: f64,
    commission: f64,
    commission_pinned: bool,
}

impl Pricing {
    pub fn for_platform(gross: f64, platform: &Platform) -> Self {
        Self {
            gross,
            commission: default_commission(gross, platform),
            commission_pinned: false,
        }
    }

    /// Restore pricing from stored values; the commission is treated as pinned.
    pub fn stored(gross: f64, commission: f64) -> Self {
        Self {
            gross,
            commission,
            commission_pinned: true,
        }
    }

    pub fn set_gross(&mut self, gross: f64, platform: &Platform) {
        self.gross = gross;
        if !self.commission_pinned {
            self.commission = default_commission(gross, platform);
        }
    }

    pub fn pin_commission(&mut self, commission: f64) {
        self.commission = commission;
        self.commission_pinned = true;
    }

    pub fn change_platform(&mut self, platform: &Platform) {
        self.commission_pinned = false;
        self.commission = default_commission(self.gross, platform);
    }

    pub fn gross(&self) -> f64 {
        self.gross
    }

    pub fn commission(&self) -> f64 {
        self.commission
    }

    pub fn net(&self) -> f64 {
        self.gross - self.commission
    }

    pub fn is_commission_pinned(&self) -> bool {
        self.commission_pinned
    }
}

fn default_commission(gross: f64, platform: &Platform) -> f64 {
    gross * platform.commission_percentage / 100.0
}

/// Manually entered booking before its derived fields are computed
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub property_id: i64,
    pub platform_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub pricing: Pricing,
    pub request_date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl BookingDraft {
    /// Compute nights, net, ADR and lead time.
    pub fn derive(&self) -> NewBooking {
        let nights = (self.check_out - self.check_in).num_days().max(0);
        let gross = self.pricing.gross();
        let adr = if nights > 0 { gross / nights as f64 } else { 0.0 };

        NewBooking {
            property_id: self.property_id,
            platform_id: self.platform_id,
            check_in: self.check_in,
            check_out: self.check_out,
            nights,
            gross_price: gross,
            commission: self.pricing.commission(),
            net_price: self.pricing.net(),
            adr,
            request_date: self.request_date,
            lead_time_days: self
                .request_date
                .map(|requested| (self.check_in - requested).num_days()),
            ical_uid: None,
            note: self.note.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlatformRole;

    fn platform(pct: f64) -> Platform {
        Platform {
            id: 3,
            name: "Directo".into(),
            commission_percentage: pct,
            role: PlatformRole::Manual,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn default_commission_follows_platform_percentage() {
        let pricing = Pricing::for_platform(200.0, &platform(15.0));
        assert_eq!(pricing.commission(), 30.0);
        assert_eq!(pricing.net(), 170.0);
    }

    #[test]
    fn pinned_commission_survives_gross_change() {
        let p = platform(15.0);
        let mut pricing = Pricing::for_platform(200.0, &p);
        pricing.pin_commission(25.0);
        pricing.set_gross(300.0, &p);
        assert_eq!(pricing.commission(), 25.0);
        assert_eq!(pricing.net(), 275.0);
    }

    #[test]
    fn unpinned_commission_tracks_gross() {
        let p = platform(15.0);
        let mut pricing = Pricing::for_platform(200.0, &p);
        pricing.set_gross(400.0, &p);
        assert_eq!(pricing.commission(), 60.0);
    }

    #[test]
    fn platform_change_recomputes_pinned_commission() {
        let mut pricing = Pricing::for_platform(200.0, &platform(15.0));
        pricing.pin_commission(10.0);
        pricing.change_platform(&platform(20.0));
        assert_eq!(pricing.commission(), 40.0);
        assert!(!pricing.is_commission_pinned());
    }

    #[test]
    fn derive_fills_nights_adr_and_lead_time() {
        let draft = BookingDraft {
            property_id: 1,
            platform_id: 3,
            check_in: day("2024-06-01"),
            check_out: day("2024-06-05"),
            pricing: Pricing::for_platform(200.0, &platform(15.0)),
            request_date: Some(day("2024-05-20")),
            note: None,
        };
        let row = draft.derive();
        assert_eq!(row.nights, 4);
        assert_eq!(row.adr, 50.0);
        assert_eq!(row.net_price, 170.0);
        assert_eq!(row.lead_time_days, Some(12));
        assert_eq!(row.ical_uid, None);
    }

    #[test]
    fn zero_nights_gives_zero_adr() {
        let draft = BookingDraft {
            property_id: 1,
            platform_id: 3,
            check_in: day("2024-06-01"),
            check_out: day("2024-06-01"),
            pricing: Pricing::for_platform(100.0, &platform(0.0)),
            request_date: None,
            note: None,
        };
        let row = draft.derive();
        assert_eq!(row.nights, 0);
        assert_eq!(row.adr, 0.0);
        assert_eq!(row.lead_time_days, None);
    }
}
