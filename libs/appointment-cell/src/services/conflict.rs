// libs/appointment-cell/src/services/conflict.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Two half-open intervals overlap if start1 < end2 AND start2 < end1.
pub fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && start2 < end1
}

#[derive(Debug, Clone, Copy)]
struct IndexedInterval {
    slot_id: Uuid,
    end: DateTime<Utc>,
}

/// One doctor's slots keyed by start time.
///
/// Entries never overlap, so ordering by start also orders by end. That lets
/// both lookups below walk backwards from the upper bound and stop at the
/// first interval that ends at or before the lower bound.
#[derive(Debug, Default, Clone)]
pub struct ScheduleIndex {
    entries: BTreeMap<DateTime<Utc>, IndexedInterval>,
}

impl ScheduleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The slot already occupying any part of `[start, end)`, if one exists.
    pub fn find_overlap(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Uuid> {
        self.entries
            .range(..end)
            .next_back()
            .filter(|(existing_start, interval)| intervals_overlap(**existing_start, interval.end, start, end))
            .map(|(_, interval)| interval.slot_id)
    }

    /// Callers must check `find_overlap` first.
    pub fn insert(&mut self, slot_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.entries.insert(start, IndexedInterval { slot_id, end });
    }

    /// Identifiers of the slots intersecting `[from, to)`, ascending by start.
    pub fn intersecting(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .entries
            .range(..to)
            .rev()
            .take_while(|(_, interval)| interval.end > from)
            .map(|(_, interval)| interval.slot_id)
            .collect();
        ids.reverse();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 15, hour, minute, 0).unwrap()
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        assert!(!intervals_overlap(at(10, 0), at(10, 30), at(10, 30), at(11, 0)));
        assert!(intervals_overlap(at(10, 0), at(10, 30), at(10, 29), at(11, 0)));
        assert!(intervals_overlap(at(10, 0), at(12, 0), at(10, 30), at(11, 0)));
    }

    #[test]
    fn finds_the_interval_in_the_way() {
        let mut index = ScheduleIndex::new();
        let morning = Uuid::new_v4();
        let noon = Uuid::new_v4();
        index.insert(morning, at(9, 0), at(9, 30));
        index.insert(noon, at(12, 0), at(12, 30));

        assert_eq!(index.find_overlap(at(9, 15), at(9, 45)), Some(morning));
        assert_eq!(index.find_overlap(at(11, 0), at(13, 0)), Some(noon));
        assert_eq!(index.find_overlap(at(8, 0), at(9, 0)), None);
        assert_eq!(index.find_overlap(at(9, 30), at(12, 0)), None);
    }

    #[test]
    fn lists_intersections_in_start_order() {
        let mut index = ScheduleIndex::new();
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for (offset, id) in ids.iter().enumerate() {
            let start = at(9, 0) + Duration::hours(offset as i64);
            index.insert(*id, start, start + Duration::minutes(30));
        }

        assert_eq!(index.len(), 4);
        assert_eq!(index.intersecting(at(9, 15), at(11, 1)), ids[0..3].to_vec());
        assert_eq!(index.intersecting(at(9, 30), at(10, 0)), Vec::<Uuid>::new());
        assert_eq!(index.intersecting(at(0, 0), at(23, 0)), ids);
    }
}
