//! Memoized transition instants.
//!
//! Converting many timestamps in the same zone resolves the same two rules for the same year over
//! and over. [`TransitionCache`] remembers each `(rule, year)` the first time it is resolved.
//!
//! The cache key deliberately leaves out the offset: once a `(rule, year)` pair is stored, later
//! lookups return the stored instant even when asked with a different `base_offset`. Zones only
//! share a cache entry when they share the exact rule, so in practice this only matters when one
//! cache serves zones with identical rules but different offsets.

use std::collections::HashMap;
use std::num::NonZeroU32;
use parking_lot::RwLock;
use super::{compute, TransitionRule, TransitionSource};

/// A thread safe, memoizing [`TransitionSource`].
///
/// The first writer for a key wins. If two threads miss on the same key at once, both compute the
/// instant but only one value is stored, and both return the stored value.
///
/// # Examples
///
/// ```
/// # use posix_tz::tz::{TransitionCache, TransitionRule};
/// let cache = TransitionCache::new();
/// let rule: TransitionRule = "M3.5.0".parse().unwrap();
///
/// assert_eq!(cache.get_or_compute(&rule, 2025, 3600), 1743296400);
/// assert_eq!(cache.len(), 1);
///
/// // The offset is not part of the key
/// assert_eq!(cache.get_or_compute(&rule, 2025, 0), 1743296400);
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct TransitionCache {
	entries: RwLock<HashMap<(TransitionRule, i32), i64>>,
	retention: Option<NonZeroU32>
}

impl TransitionCache {
	/// Create an empty cache that never evicts.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an empty cache that only keeps years close to the most recently stored one.
	///
	/// Whenever a new entry for year `Y` is stored, entries for years further than `years` away
	/// from `Y` are dropped. A long running clock then holds a handful of entries no matter how
	/// long it runs.
	pub fn with_retention(years: NonZeroU32) -> Self {
		TransitionCache { entries: RwLock::default(), retention: Some(years) }
	}

	/// Look up `(rule, year)`, computing and storing the instant on a miss.
	pub fn get_or_compute(&self, rule: &TransitionRule, year: i32, base_offset: i32) -> i64 {
		if let Some(&t) = self.entries.read().get(&(*rule, year)) {
			return t;
		}

		let computed = compute(rule, year, base_offset);
		let mut entries = self.entries.write();
		let before = entries.len();
		let t = *entries.entry((*rule, year)).or_insert(computed);
		if entries.len() != before {
			log::trace!("Cached {} for {}", rule, year);
			if let Some(years) = self.retention {
				let years = years.get() as u64;
				entries.retain(|&(_, y), _| (y as i64 - year as i64).unsigned_abs() <= years);
			}
		}
		t
	}

	/// The number of stored entries.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Whether nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Drop every stored entry.
	pub fn clear(&self) {
		self.entries.write().clear();
	}
}

impl TransitionSource for TransitionCache {
	fn transition(&self, rule: &TransitionRule, year: i32, base_offset: i32) -> i64 {
		self.get_or_compute(rule, year, base_offset)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::vec::Vec;
	use crate::tz::{localtime, parse, Calculator};

	fn rule(s: &str) -> TransitionRule {
		s.parse().unwrap()
	}

	#[test]
	fn hit_ignores_offset() {
		let cache = TransitionCache::new();
		let start = rule("M3.5.0");
		assert!(cache.is_empty());
		assert_eq!(cache.get_or_compute(&start, 2025, 3600), 1743296400);
		assert_eq!(cache.get_or_compute(&start, 2025, -18000), 1743296400);
		assert_eq!(cache.len(), 1);

		// A different year is a different entry
		assert_eq!(cache.get_or_compute(&start, 2024, 3600), compute(&start, 2024, 3600));
		assert_eq!(cache.len(), 2);

		cache.clear();
		assert!(cache.is_empty());
		assert_eq!(cache.get_or_compute(&start, 2025, -18000), compute(&start, 2025, -18000));
	}

	#[test]
	fn matches_calculator() {
		let cache = TransitionCache::new();
		let zone = parse("EST5EDT,M3.2.0,M11.1.0").unwrap();
		for t in [1704067200, 1710054000, 1710054001, 1723433665, 1730613599, 1730613600, 1735689600] {
			assert_eq!(localtime(t, Some(&zone), &cache), localtime(t, Some(&zone), &Calculator));
		}
		// Start and end rules for 2024 and 2025
		assert_eq!(cache.len(), 4);
	}

	#[test]
	fn retention_evicts_distant_years() {
		let cache = TransitionCache::with_retention(NonZeroU32::new(1).unwrap());
		let start = rule("M3.5.0");
		let end = rule("M10.5.0/3");
		for year in 2020..=2025 {
			cache.get_or_compute(&start, year, 3600);
			cache.get_or_compute(&end, year, 7200);
		}
		// 2024 and 2025 survive
		assert_eq!(cache.len(), 4);

		// Going back in time evicts the future
		cache.get_or_compute(&start, 2000, 3600);
		assert_eq!(cache.len(), 1);
		assert_eq!(cache.get_or_compute(&start, 2000, 3600), compute(&start, 2000, 3600));
	}

	#[test]
	fn shared_between_threads() {
		let cache = TransitionCache::new();
		let start = rule("M3.2.0");
		let expected: Vec<i64> = (2000..2050).map(|y| compute(&start, y, -18000)).collect();
		std::thread::scope(|s| {
			for _ in 0..4 {
				s.spawn(|| {
					for (year, &t) in (2000..2050).zip(&expected) {
						assert_eq!(cache.get_or_compute(&start, year, -18000), t);
					}
				});
			}
		});
		assert_eq!(cache.len(), 50);
	}
}
