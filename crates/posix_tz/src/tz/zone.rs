//! The process-wide active timezone.
//!
//! [`ActiveZone`] holds the zone used for conversions and can be replaced at any time, from any
//! thread. Readers always see either the previous zone or the new one, never a mix. A failed
//! replacement leaves the previous zone in place.
//!
//! [`Clock`] pairs an [`ActiveZone`] with a [`TransitionCache`] for the common case of a single
//! long running converter.

use std::num::NonZeroU32;
use std::sync::Arc;
use parking_lot::RwLock;
use super::{localtime, parse, LocalTime, ParseError, RangeError, TimeZoneRule, TransitionCache};

/// Years around the most recently converted one that a [`Clock`] keeps cached.
const CLOCK_RETENTION_YEARS: NonZeroU32 = match NonZeroU32::new(2) {
	Some(years) => years,
	None => unreachable!()
};

/// A replaceable, shared timezone rule. `None` means UTC.
///
/// # Examples
///
/// ```
/// # use posix_tz::tz::ActiveZone;
/// let active = ActiveZone::new();
/// assert!(active.current().is_none());
///
/// active.set_zone("EST5EDT,M3.2.0,M11.1.0").unwrap();
/// assert_eq!(active.current().unwrap().standard_name, "EST");
///
/// // Invalid zones are rejected and the active zone is unchanged
/// assert!(active.set_zone("EST5EDT").is_err());
/// assert_eq!(active.current().unwrap().standard_name, "EST");
/// ```
#[derive(Debug, Default)]
pub struct ActiveZone {
	current: RwLock<Option<Arc<TimeZoneRule>>>
}

impl ActiveZone {
	/// Create an active zone set to UTC.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse `spec` and make it the active zone.
	///
	/// # Errors
	///
	/// Returns the [`ParseError`] if `spec` is not a valid TZ string, in which case the active
	/// zone is not modified.
	pub fn set_zone(&self, spec: &str) -> Result<Arc<TimeZoneRule>, ParseError> {
		match parse(spec) {
			Ok(zone) => {
				let zone = Arc::new(zone);
				*self.current.write() = Some(zone.clone());
				log::debug!("Active timezone set to {}", zone);
				Ok(zone)
			}
			Err(e) => {
				log::warn!("Ignoring timezone {:?}: {}", spec, e);
				Err(e)
			}
		}
	}

	/// Make an already parsed rule the active zone.
	pub fn replace(&self, zone: TimeZoneRule) -> Arc<TimeZoneRule> {
		let zone = Arc::new(zone);
		*self.current.write() = Some(zone.clone());
		log::debug!("Active timezone set to {}", zone);
		zone
	}

	/// The active zone, or `None` for UTC.
	pub fn current(&self) -> Option<Arc<TimeZoneRule>> {
		self.current.read().clone()
	}

	/// Reset the active zone to UTC.
	pub fn clear(&self) {
		*self.current.write() = None;
		log::debug!("Active timezone cleared, using UTC");
	}
}

/// Converts timestamps to local time in a replaceable zone, caching transitions.
///
/// `Clock` is `Send + Sync`; share it with an [`Arc`] to change the zone from one thread while
/// another converts.
///
/// # Examples
///
/// ```
/// # use posix_tz::tz::Clock;
/// let clock = Clock::new();
/// assert_eq!(clock.localtime(1723433665).unwrap().tm.hour, 3);
///
/// clock.set_zone("EST5EDT,M3.2.0,M11.1.0").unwrap();
/// let local = clock.localtime(1723433665).unwrap();
/// assert_eq!((local.tm.day, local.tm.hour, local.tm.minute), (11, 23, 34));
/// assert!(local.is_dst());
/// ```
#[derive(Debug)]
pub struct Clock {
	zone: ActiveZone,
	cache: TransitionCache
}

impl Default for Clock {
	fn default() -> Self {
		Self::new()
	}
}

impl Clock {
	/// Create a clock in UTC.
	pub fn new() -> Self {
		Clock { zone: ActiveZone::new(), cache: TransitionCache::with_retention(CLOCK_RETENTION_YEARS) }
	}

	/// Parse `spec` and make it the clock's zone. See [`ActiveZone::set_zone`].
	pub fn set_zone(&self, spec: &str) -> Result<Arc<TimeZoneRule>, ParseError> {
		self.zone.set_zone(spec)
	}

	/// Make an already parsed rule the clock's zone.
	pub fn replace_zone(&self, zone: TimeZoneRule) -> Arc<TimeZoneRule> {
		self.zone.replace(zone)
	}

	/// The clock's zone, or `None` for UTC.
	pub fn zone(&self) -> Option<Arc<TimeZoneRule>> {
		self.zone.current()
	}

	/// Switch the clock back to UTC.
	pub fn clear_zone(&self) {
		self.zone.clear()
	}

	/// Convert `time` to local time in the clock's current zone.
	pub fn localtime(&self, time: i64) -> Result<LocalTime, RangeError> {
		self.localtime_with_zone(time).map(|(local, _)| local)
	}

	/// Like [`Clock::localtime`], also returning the zone that was used.
	///
	/// The zone may be replaced concurrently, so use this rather than a separate [`Clock::zone`]
	/// call when the zone's names are needed alongside the result.
	pub fn localtime_with_zone(&self, time: i64)
		-> Result<(LocalTime, Option<Arc<TimeZoneRule>>), RangeError>
	{
		let zone = self.zone.current();
		let local = localtime(time, zone.as_deref(), &self.cache)?;
		Ok((local, zone))
	}

	/// The DST start and end instants in `year` for the clock's current zone.
	///
	/// Returns `None` in UTC and in fixed-offset zones.
	pub fn transitions(&self, year: i32) -> Option<(i64, i64)> {
		let zone = self.zone.current()?;
		let dst = zone.dst.as_ref()?;
		Some((
			self.cache.get_or_compute(&dst.start, year, zone.standard_offset),
			self.cache.get_or_compute(&dst.end, year, dst.offset)
		))
	}
}
