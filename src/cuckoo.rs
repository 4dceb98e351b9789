//! Cuckoo filter engine backing each named filter of the reference server.
//!
//! Layout:
//!    * A power-of-two array of buckets, each holding `ENTRIES_PER_BUCKET`
//!      16-bit fingerprints. Fingerprint `0` marks an empty slot.
//!    * Every item has two candidate buckets. The alternate bucket is derived
//!      from the current one and the fingerprint alone (`i ^ hash(fp)`), so a
//!      relocated fingerprint can always find its way back.
//!
//! Insertion:
//!     * Place the fingerprint in either candidate bucket if one has room.
//!     * Otherwise evict a random resident, move it to its alternate bucket
//!       and repeat, up to `MAX_KICKS` times.
//!     * A fingerprint still homeless after that is parked in a single victim
//!       slot. While the victim slot is taken the filter reports `Full`.
//!
//! Nothing that was accepted is ever dropped, so lookups have no false
//! negatives; false positives are bounded by fingerprint width and bucket size.
use fnv::FnvHasher;
use murmur3::murmur3_32;
use rand::Rng;
use std::hash::Hasher;
use std::io::Cursor;
use thiserror::Error;

pub const ENTRIES_PER_BUCKET: usize = 4;
pub const MAX_KICKS: usize = 500;
/// Fraction of slots we expect to fill before inserts start failing.
const TARGET_LOAD_FACTOR: f64 = 0.95;

type Fingerprint = u16;
type Bucket = [Fingerprint; ENTRIES_PER_BUCKET];

const EMPTY: Fingerprint = 0;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CuckooError {
    #[error("Capacity must be greater than 0")]
    ZeroCapacity,

    #[error("Capacity {0} needs more memory than can be allocated")]
    TooLarge(usize),

    #[error("Filter is full")]
    Full,
}

pub(crate) fn hash_murmur32(key: &[u8]) -> u32 {
    let mut cursor = Cursor::new(key);
    murmur3_32(&mut cursor, 0).expect("reading an in-memory cursor cannot fail")
}

pub(crate) fn hash_fnv32(key: &[u8]) -> u32 {
    let mut hasher = FnvHasher::default();
    hasher.write(key);
    hasher.finish() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Victim {
    index: usize,
    fingerprint: Fingerprint,
}

#[derive(Debug, Clone)]
pub struct CuckooFilter {
    buckets: Vec<Bucket>,
    mask: usize,
    capacity: usize,
    len: usize,
    victim: Option<Victim>,
}

impl CuckooFilter {
    pub fn new(capacity: usize) -> Result<Self, CuckooError> {
        if capacity == 0 {
            return Err(CuckooError::ZeroCapacity);
        }
        let wanted = (capacity as f64
            / ENTRIES_PER_BUCKET as f64
            / TARGET_LOAD_FACTOR)
            .ceil() as usize;
        let num_buckets = wanted
            .max(1)
            .checked_next_power_of_two()
            .ok_or(CuckooError::TooLarge(capacity))?;

        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(num_buckets)
            .map_err(|_| CuckooError::TooLarge(capacity))?;
        buckets.resize(num_buckets, [EMPTY; ENTRIES_PER_BUCKET]);

        Ok(Self {
            buckets,
            mask: num_buckets - 1,
            capacity,
            len: 0,
            victim: None,
        })
    }

    pub fn insert(&mut self, item: &[u8]) -> Result<(), CuckooError> {
        if self.victim.is_some() {
            return Err(CuckooError::Full);
        }
        let (index, fingerprint) = self.index_and_fingerprint(item);
        self.insert_at(index, fingerprint);
        Ok(())
    }

    pub fn contains(&self, item: &[u8]) -> bool {
        let (i1, fingerprint) = self.index_and_fingerprint(item);
        let i2 = self.alt_index(i1, fingerprint);

        if self.buckets[i1].contains(&fingerprint)
            || self.buckets[i2].contains(&fingerprint)
        {
            return true;
        }
        matches!(
            self.victim,
            Some(v) if v.fingerprint == fingerprint && (v.index == i1 || v.index == i2)
        )
    }

    /// Remove one occurrence of `item`. Returns false if it was not present.
    pub fn remove(&mut self, item: &[u8]) -> bool {
        let (i1, fingerprint) = self.index_and_fingerprint(item);
        let i2 = self.alt_index(i1, fingerprint);

        if self.remove_from(i1, fingerprint) || self.remove_from(i2, fingerprint) {
            self.len -= 1;
            // a slot just opened up, give the parked fingerprint another try
            if let Some(victim) = self.victim.take() {
                self.len -= 1;
                self.insert_at(victim.index, victim.fingerprint);
            }
            return true;
        }

        match self.victim {
            Some(v)
                if v.fingerprint == fingerprint
                    && (v.index == i1 || v.index == i2) =>
            {
                self.victim = None;
                self.len -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.buckets.fill([EMPTY; ENTRIES_PER_BUCKET]);
        self.len = 0;
        self.victim = None;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity the filter was sized for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / (self.buckets.len() * ENTRIES_PER_BUCKET) as f64
    }

    fn index_and_fingerprint(&self, item: &[u8]) -> (usize, Fingerprint) {
        let index = hash_murmur32(item) as usize & self.mask;
        // 1..=u16::MAX, leaving 0 free as the empty marker
        let fingerprint =
            (hash_fnv32(item) % u32::from(Fingerprint::MAX)) as Fingerprint + 1;
        (index, fingerprint)
    }

    fn alt_index(&self, index: usize, fingerprint: Fingerprint) -> usize {
        (index ^ hash_murmur32(&fingerprint.to_le_bytes()) as usize) & self.mask
    }

    fn try_place(&mut self, index: usize, fingerprint: Fingerprint) -> bool {
        match self.buckets[index].iter_mut().find(|slot| **slot == EMPTY) {
            Some(slot) => {
                *slot = fingerprint;
                true
            }
            None => false,
        }
    }

    fn remove_from(&mut self, index: usize, fingerprint: Fingerprint) -> bool {
        match self.buckets[index].iter_mut().find(|slot| **slot == fingerprint) {
            Some(slot) => {
                *slot = EMPTY;
                true
            }
            None => false,
        }
    }

    /// Store `fingerprint` starting from bucket `index`, kicking residents
    /// around if needed. Always accounts for one more stored fingerprint.
    fn insert_at(&mut self, index: usize, fingerprint: Fingerprint) {
        self.len += 1;
        let alt = self.alt_index(index, fingerprint);
        if self.try_place(index, fingerprint) || self.try_place(alt, fingerprint) {
            return;
        }

        let mut rng = rand::rng();
        let mut index = if rng.random_bool(0.5) { index } else { alt };
        let mut fingerprint = fingerprint;
        for _ in 0..MAX_KICKS {
            let slot = rng.random_range(0..ENTRIES_PER_BUCKET);
            std::mem::swap(&mut fingerprint, &mut self.buckets[index][slot]);
            index = self.alt_index(index, fingerprint);
            if self.try_place(index, fingerprint) {
                return;
            }
        }

        self.victim = Some(Victim { index, fingerprint });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(prefix: &str, count: usize) -> Vec<Vec<u8>> {
        (0..count)
            .map(|i| format!("{prefix}_{i:06}").into_bytes())
            .collect()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(CuckooFilter::new(0).unwrap_err(), CuckooError::ZeroCapacity);
    }

    #[test]
    fn oversized_capacity_is_an_error() {
        for capacity in [usize::MAX, usize::MAX / 3] {
            assert_eq!(
                CuckooFilter::new(capacity).unwrap_err(),
                CuckooError::TooLarge(capacity)
            );
        }
    }

    #[test]
    fn bucket_count_is_power_of_two() {
        let filter = CuckooFilter::new(1_000_000).unwrap();
        assert!(filter.num_buckets().is_power_of_two());
        assert!(filter.num_buckets() * ENTRIES_PER_BUCKET >= 1_000_000);
        assert_eq!(filter.capacity(), 1_000_000);
    }

    #[test]
    fn alternate_index_is_symmetric() {
        let filter = CuckooFilter::new(1024).unwrap();
        for item in items("alt", 200) {
            let (i1, fp) = filter.index_and_fingerprint(&item);
            let i2 = filter.alt_index(i1, fp);
            assert_eq!(filter.alt_index(i2, fp), i1);
            assert_ne!(fp, EMPTY);
        }
    }

    #[test]
    fn no_false_negatives_at_capacity() {
        let mut filter = CuckooFilter::new(10_000).unwrap();
        let inserted = items("member", 10_000);
        for item in &inserted {
            filter.insert(item).expect("insert within capacity");
        }
        assert_eq!(filter.len(), inserted.len());
        for item in &inserted {
            assert!(filter.contains(item), "false negative for {:?}", item);
        }
    }

    #[test]
    fn false_positive_rate_is_bounded() {
        let mut filter = CuckooFilter::new(10_000).unwrap();
        for item in items("member", 10_000) {
            filter.insert(&item).unwrap();
        }
        let probes = items("stranger", 10_000);
        let false_positives = probes.iter().filter(|p| filter.contains(p)).count();
        let rate = false_positives as f64 / probes.len() as f64;
        assert!(rate < 0.01, "false positive rate too high: {rate}");
    }

    #[test]
    fn remove_deletes_single_occurrence() {
        let mut filter = CuckooFilter::new(100).unwrap();
        filter.insert(b"twice").unwrap();
        filter.insert(b"twice").unwrap();
        assert_eq!(filter.len(), 2);

        assert!(filter.remove(b"twice"));
        assert!(filter.contains(b"twice"));
        assert!(filter.remove(b"twice"));
        assert!(!filter.contains(b"twice"));
        assert!(!filter.remove(b"twice"));
        assert!(filter.is_empty());
    }

    #[test]
    fn full_filter_keeps_accepted_items() {
        let mut filter = CuckooFilter::new(8).unwrap();
        let mut accepted = Vec::new();
        let mut saw_full = false;

        for item in items("crowd", 200) {
            match filter.insert(&item) {
                Ok(()) => accepted.push(item),
                Err(CuckooError::Full) => {
                    saw_full = true;
                    break;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert!(saw_full, "tiny filter never reported full");
        assert_eq!(filter.len(), accepted.len());
        for item in &accepted {
            assert!(filter.contains(item));
        }
    }

    #[test]
    fn removing_frees_room_for_victim() {
        let mut filter = CuckooFilter::new(8).unwrap();
        let mut accepted = Vec::new();
        for item in items("crowd", 200) {
            if filter.insert(&item).is_err() {
                break;
            }
            accepted.push(item);
        }

        let first = accepted.remove(0);
        assert!(filter.remove(&first));
        assert_eq!(filter.len(), accepted.len());
        for item in &accepted {
            assert!(filter.contains(item));
        }
    }

    #[test]
    fn reset_clears_everything() {
        let mut filter = CuckooFilter::new(100).unwrap();
        for item in items("reset", 50) {
            filter.insert(&item).unwrap();
        }
        filter.reset();
        assert!(filter.is_empty());
        assert_eq!(filter.load_factor(), 0.0);
        assert!(!filter.contains(b"reset_000001"));
        filter.insert(b"after").unwrap();
        assert!(filter.contains(b"after"));
    }
}
