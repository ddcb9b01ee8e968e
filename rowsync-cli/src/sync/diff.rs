//! Change detection against the stored fingerprint baseline

use std::collections::HashMap;

use super::fingerprint::Fingerprint;
use super::record::{NaturalKey, SyncRecord};

/// Stored fingerprints at the destination, loaded once at run start
pub type FingerprintMap = HashMap<NaturalKey, Fingerprint>;

/// Records that need to be written, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    records: Vec<SyncRecord>,
    /// Source rows inspected to build this change set
    inspected: usize,
    /// Rows dropped because a later row carried the same key
    duplicates: usize,
}

impl ChangeSet {
    pub fn records(&self) -> &[SyncRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn inspected(&self) -> usize {
        self.inspected
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn keys(&self) -> impl Iterator<Item = &NaturalKey> {
        self.records.iter().map(|r| &r.key)
    }
}

/// Whether `record` must be written given the stored baseline
pub fn is_changed(record: &SyncRecord, stored: &FingerprintMap) -> bool {
    stored
        .get(&record.key)
        .is_none_or(|fingerprint| *fingerprint != record.fingerprint)
}

/// Compute the change set: every record whose key is absent from `stored` or
/// whose fingerprint differs from the stored one.
///
/// Keys missing from the source are left alone at the destination. When the
/// source yields the same key twice, the later row replaces the earlier one
/// at the earlier one's position.
pub fn detect_changes(records: Vec<SyncRecord>, stored: &FingerprintMap) -> ChangeSet {
    let inspected = records.len();
    let mut unique: Vec<SyncRecord> = Vec::with_capacity(records.len());
    let mut positions: HashMap<NaturalKey, usize> = HashMap::with_capacity(records.len());
    let mut duplicates = 0;

    for record in records {
        match positions.get(&record.key) {
            Some(&at) => {
                log::warn!("Duplicate natural key '{}' in source, keeping the later row", record.key);
                duplicates += 1;
                unique[at] = record;
            }
            None => {
                positions.insert(record.key.clone(), unique.len());
                unique.push(record);
            }
        }
    }

    let records: Vec<SyncRecord> = unique
        .into_iter()
        .filter(|record| {
            let changed = is_changed(record, stored);
            if changed {
                log::debug!(
                    "{} {}",
                    if stored.contains_key(&record.key) { "modified" } else { "new" },
                    record.key
                );
            }
            changed
        })
        .collect();

    ChangeSet {
        records,
        inspected,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PRODUCTS;
    use crate::source::RawRecord;
    use crate::sync::normalize::normalize;
    use std::collections::HashSet;

    fn product(code: &str, qty: &str) -> SyncRecord {
        SyncRecord::new(normalize(
            &PRODUCTS,
            &RawRecord::from_pairs([("CODE_PRODUIT", code), ("QTE_STOCK", qty)]),
        ))
    }

    fn baseline(records: &[SyncRecord]) -> FingerprintMap {
        records
            .iter()
            .map(|r| (r.key.clone(), r.fingerprint.clone()))
            .collect()
    }

    #[test]
    fn test_unchanged_modified_new() {
        let a = product("A", "1");
        let b_old = product("B", "2");
        let stored = baseline(&[a.clone(), b_old]);

        let b_new = product("B", "3");
        let c = product("C", "4");
        let changes = detect_changes(vec![a, b_new.clone(), c.clone()], &stored);

        assert_eq!(changes.inspected(), 3);
        assert_eq!(changes.records(), &[b_new, c]);
    }

    #[test]
    fn test_empty_baseline_marks_everything_new() {
        let records = vec![product("A", "1"), product("B", "2")];
        let changes = detect_changes(records.clone(), &FingerprintMap::new());
        assert_eq!(changes.records(), records.as_slice());
    }

    #[test]
    fn test_matching_baseline_yields_empty_change_set() {
        let records = vec![product("A", "1"), product("B", "2")];
        let stored = baseline(&records);
        let changes = detect_changes(records, &stored);
        assert!(changes.is_empty());
        assert_eq!(changes.inspected(), 2);
    }

    #[test]
    fn test_keys_missing_from_source_are_ignored() {
        let stored = baseline(&[product("GONE", "1")]);
        let changes = detect_changes(vec![product("A", "1")], &stored);
        let keys: Vec<_> = changes.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["A"]);
    }

    #[test]
    fn test_duplicate_keys_keep_later_row_in_first_position() {
        let changes = detect_changes(
            vec![product("A", "1"), product("B", "1"), product("A", "9")],
            &FingerprintMap::new(),
        );
        assert_eq!(changes.duplicates(), 1);
        assert_eq!(changes.inspected(), 3);
        assert_eq!(changes.records(), &[product("A", "9"), product("B", "1")]);
    }

    #[test]
    fn test_change_set_is_exact_set_difference() {
        let current: Vec<SyncRecord> = (0..50)
            .map(|i| product(&format!("P{i}"), &i.to_string()))
            .collect();
        // baseline: even keys stored with their current value, every third with a stale one
        let mut stored = FingerprintMap::new();
        for (i, r) in current.iter().enumerate() {
            if i % 2 == 0 {
                stored.insert(r.key.clone(), r.fingerprint.clone());
            }
            if i % 3 == 0 {
                stored.insert(r.key.clone(), product(&format!("P{i}"), "stale").fingerprint);
            }
        }

        let expected: HashSet<NaturalKey> = current
            .iter()
            .filter(|r| stored.get(&r.key) != Some(&r.fingerprint))
            .map(|r| r.key.clone())
            .collect();
        let actual: HashSet<NaturalKey> =
            detect_changes(current, &stored).keys().cloned().collect();
        assert_eq!(actual, expected);
    }
}
