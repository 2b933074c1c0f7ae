use crate::models::Occupancy;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Manual and feed occupancies for all properties, sorted by start day
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    occupancies: Vec<Occupancy>,
}

impl Timeline {
    /// Combine both provenance classes. Empty intervals and repeated
    /// identities are dropped; nothing is merged across provenance.
    pub fn merge(manual: Vec<Occupancy>, external: Vec<Occupancy>) -> Self {
        let mut seen = HashSet::new();
        let mut occupancies: Vec<Occupancy> = manual
            .into_iter()
            .chain(external)
            .filter(Occupancy::is_valid)
            .filter(|o| seen.insert((o.provenance, o.id.clone())))
            .collect();

        occupancies.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(a.property_id.cmp(&b.property_id))
                .then(a.end.cmp(&b.end))
                .then(a.id.cmp(&b.id))
        });

        Self { occupancies }
    }

    pub fn occupancies(&self) -> &[Occupancy] {
        &self.occupancies
    }

    pub fn into_occupancies(self) -> Vec<Occupancy> {
        self.occupancies
    }

    pub fn len(&self) -> usize {
        self.occupancies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupancies.is_empty()
    }

    /// Entries covering `day`, in timeline order
    pub fn on_day(&self, day: NaiveDate) -> impl Iterator<Item = &Occupancy> {
        self.occupancies.iter().filter(move |o| o.contains(day))
    }

    /// Whether a booking or block covers `day`. Free markers do not count.
    pub fn is_occupied(&self, property_id: i64, day: NaiveDate) -> bool {
        self.on_day(day)
            .any(|o| o.property_id == property_id && !o.marks_free)
    }

    /// Whether a manual free marker covers `day`.
    ///
    /// Unlike `!is_occupied`, only explicitly marked days count as bookable.
    pub fn is_marked_free(&self, property_id: i64, day: NaiveDate) -> bool {
        self.on_day(day)
            .any(|o| o.property_id == property_id && o.marks_free)
    }

    /// Properties explicitly marked free on `day`, ascending by id
    pub fn free_properties_on(&self, day: NaiveDate) -> Vec<i64> {
        self.on_day(day)
            .filter(|o| o.marks_free)
            .map(|o| o.property_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Pairs of overlapping bookings on the same property.
    pub fn conflicts(&self) -> Vec<(&Occupancy, &Occupancy)> {
        let mut by_property: BTreeMap<i64, Vec<&Occupancy>> = BTreeMap::new();
        for occ in self.occupancies.iter().filter(|o| !o.marks_free) {
            by_property.entry(occ.property_id).or_default().push(occ);
        }

        let mut conflicts = Vec::new();
        for stays in by_property.values() {
            // already sorted by start
            for (i, first) in stays.iter().enumerate() {
                for second in &stays[i + 1..] {
                    if second.start >= first.end {
                        break;
                    }
                    conflicts.push((*first, *second));
                }
            }
        }
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn occ(id: &str, property_id: i64, start: &str, end: &str, provenance: Provenance) -> Occupancy {
        Occupancy {
            id: id.into(),
            property_id,
            property_name: format!("Casa {property_id}"),
            start: day(start),
            end: day(end),
            provenance,
            title: id.into(),
            platform_id: None,
            uid: None,
            marks_free: false,
            net_price: None,
        }
    }

    fn free(id: &str, property_id: i64, start: &str, end: &str) -> Occupancy {
        Occupancy {
            marks_free: true,
            ..occ(id, property_id, start, end, Provenance::Manual)
        }
    }

    #[test]
    fn merges_manual_and_external_sorted_by_start() {
        let timeline = Timeline::merge(
            vec![occ("m", 1, "2024-06-10", "2024-06-12", Provenance::Manual)],
            vec![occ("e", 1, "2024-06-01", "2024-06-05", Provenance::Airbnb)],
        );

        let tags: Vec<_> = timeline
            .occupancies()
            .iter()
            .map(|o| o.provenance.as_str())
            .collect();
        assert_eq!(tags, vec!["airbnb", "manual"]);
        assert!(timeline.conflicts().is_empty());
    }

    #[test]
    fn occupancy_end_is_exclusive() {
        let timeline = Timeline::merge(
            vec![],
            vec![occ("e", 1, "2024-06-01", "2024-06-05", Provenance::Booking)],
        );
        for d in ["2024-06-01", "2024-06-02", "2024-06-03", "2024-06-04"] {
            assert!(timeline.is_occupied(1, day(d)));
        }
        assert!(!timeline.is_occupied(1, day("2024-06-05")));
        assert!(!timeline.is_occupied(2, day("2024-06-02")));
    }

    #[test]
    fn drops_empty_intervals_and_repeated_ids() {
        let timeline = Timeline::merge(
            vec![occ("m", 1, "2024-06-10", "2024-06-10", Provenance::Manual)],
            vec![
                occ("e", 1, "2024-06-01", "2024-06-05", Provenance::Airbnb),
                occ("e", 1, "2024-06-01", "2024-06-05", Provenance::Airbnb),
            ],
        );
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn free_markers_are_distinct_from_unoccupied_days() {
        let timeline = Timeline::merge(
            vec![
                free("f", 2, "2024-06-03", "2024-06-06"),
                occ("m", 1, "2024-06-01", "2024-06-04", Provenance::Manual),
            ],
            vec![],
        );

        assert!(timeline.is_marked_free(2, day("2024-06-04")));
        assert!(!timeline.is_occupied(2, day("2024-06-04")));
        // property 3 has nothing at all: unoccupied but not bookable
        assert!(!timeline.is_occupied(3, day("2024-06-04")));
        assert!(!timeline.is_marked_free(3, day("2024-06-04")));
        assert_eq!(timeline.free_properties_on(day("2024-06-03")), vec![2]);
        assert!(timeline.free_properties_on(day("2024-06-06")).is_empty());
    }

    #[test]
    fn reports_overlaps_per_property() {
        let timeline = Timeline::merge(
            vec![occ("m", 1, "2024-06-03", "2024-06-06", Provenance::Manual)],
            vec![
                occ("a", 1, "2024-06-01", "2024-06-04", Provenance::Airbnb),
                occ("b", 1, "2024-06-06", "2024-06-08", Provenance::Booking),
                occ("c", 2, "2024-06-01", "2024-06-08", Provenance::Booking),
            ],
        );

        let pairs: Vec<_> = timeline
            .conflicts()
            .iter()
            .map(|(x, y)| (x.id.as_str(), y.id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "m")]);
    }
}
