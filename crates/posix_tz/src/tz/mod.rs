//! Parsing TZ strings and converting UTC timestamps to local time.
//!
//! This module covers fixed-offset zones and zones with two seasons (standard time and daylight
//! savings time), where the switch between seasons is given by month/week/day rules. See
//! [`tzstring`] for the accepted grammar.
//!
//! Key unsupported features are:
//! - **Leap seconds**. Unix timestamps don't count them and neither does this module.
//! - **Historical rule changes**. A TZ string describes the current rules only, so dates from
//!   before a zone last changed its rules will be converted with today's rules.
//! - **Julian day rules**. Only `Mm.n.d` transition rules are accepted.
//!
//! Conversion is done by [`localtime`], which takes the zone and a [`TransitionSource`] that
//! resolves DST transitions. With the `std` feature, [`Clock`] bundles the active zone and a
//! [`TransitionCache`] behind a handle that can be shared between threads.
//!
//! # Examples
//!
//! ```
//! # use posix_tz::tz::{parse, localtime, Calculator, TzInfo};
//! let zone = parse("CET-1CEST,M3.5.0,M10.5.0/3").unwrap();
//!
//! // 2025-07-01 12:00:00 UTC is 14:00 CEST
//! let local = localtime(1751371200, Some(&zone), &Calculator).unwrap();
//! assert_eq!((local.tm.month, local.tm.day, local.tm.hour), (7, 1, 14));
//! assert_eq!(local.info, TzInfo { utoff: 7200, is_dst: true });
//!
//! // Without a zone, local time is UTC
//! let utc = localtime(1751371200, None, &Calculator).unwrap();
//! assert_eq!(utc.tm.hour, 12);
//! ```

use thiserror::Error;
use crate::time::Tm;

pub mod tzstring;
pub use tzstring::*;

pub mod transition;
pub use transition::*;

#[cfg(feature = "std")]
pub mod cache;
#[cfg(feature = "std")]
pub use cache::*;

#[cfg(feature = "std")]
pub mod zone;
#[cfg(feature = "std")]
pub use zone::*;

/// Timezone information at a moment in time.
///
/// UTC offsets are added to UTC to determine the local time. For example, New York during
/// standard time has a UTC offset of `-5 hours` (or `-18000 seconds`), so `16:00 UTC` becomes
/// `11:00 EST`.
///
/// The default value for this type is `{ utoff: 0, is_dst: false }`, i.e. UTC.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct TzInfo {
	/// The UTC offset in seconds
	pub utoff: i32,
	/// Whether standard time (`false`) or daylight savings time (`true`) is in effect
	pub is_dst: bool
}

/// Calendar time in the local timezone, with the timezone information used to get there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalTime {
	/// The calendar time (in local timezone)
	pub tm: Tm,
	/// The timezone information for that time
	pub info: TzInfo
}

impl LocalTime {
	/// Whether daylight savings time is in effect.
	#[inline(always)]
	pub fn is_dst(&self) -> bool {
		self.info.is_dst
	}
}

/// The error type for instants that have no calendar representation.
///
/// Returned when the instant, or the instant shifted by the zone's UTC offset, falls outside of
/// the range of years representable by [`Tm`]. The payload is the offending instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("Time {0} is outside of the supported calendar range")]
pub struct RangeError(pub i64);

/// Get timezone info for `time` in `zone`.
///
/// For zones with DST, the year's transitions are resolved through `source` and DST applies
/// strictly between them: an instant exactly on either transition is standard time. The window
/// never wraps around the end of the year, so a zone whose DST start comes after its end in the
/// calendar year (southern hemisphere rules) is always on standard time.
///
/// # Errors
///
/// Returns [`RangeError`] if the UTC year of `time` cannot be represented.
///
/// # Examples
///
/// ```
/// # use posix_tz::tz::{info, parse, Calculator, TzInfo};
/// let zone = parse("EST5EDT,M3.2.0,M11.1.0").unwrap();
/// let est = TzInfo { utoff: -18000, is_dst: false };
/// let edt = TzInfo { utoff: -14400, is_dst: true };
/// assert_eq!(info(1710054000, Some(&zone), &Calculator), Ok(est));
/// assert_eq!(info(1710054001, Some(&zone), &Calculator), Ok(edt));
/// ```
pub fn info(time: i64, zone: Option<&TimeZoneRule>, source: &impl TransitionSource)
	-> Result<TzInfo, RangeError>
{
	let Some(zone) = zone else {
		return Ok(TzInfo::default());
	};
	let Some(dst) = &zone.dst else {
		return Ok(TzInfo { utoff: zone.standard_offset, is_dst: false });
	};

	let year = Tm::new(time).ok_or(RangeError(time))?.year;
	let start = source.transition(&dst.start, year, zone.standard_offset);
	let end = source.transition(&dst.end, year, dst.offset);

	let is_dst = start < time && time < end;

	Ok(if is_dst {
		TzInfo { utoff: dst.offset, is_dst: true }
	} else {
		TzInfo { utoff: zone.standard_offset, is_dst: false }
	})
}

/// Get the local calendar time for `time` in `zone`, or in UTC when `zone` is `None`.
///
/// # Errors
///
/// Returns [`RangeError`] if `time`, or `time` shifted by the selected UTC offset, cannot be
/// represented as a calendar date. Out of range values are never wrapped or clamped.
///
/// # Examples
///
/// ```
/// # use posix_tz::tz::{localtime, parse, Calculator, RangeError};
/// let zone = parse("PST8PDT,M3.2.0,M11.1.0").unwrap();
/// let local = localtime(1723433665, Some(&zone), &Calculator).unwrap();
/// assert_eq!((local.tm.day, local.tm.hour, local.tm.minute), (11, 20, 34));
///
/// assert_eq!(localtime(i64::MAX, Some(&zone), &Calculator), Err(RangeError(i64::MAX)));
/// ```
pub fn localtime(time: i64, zone: Option<&TimeZoneRule>, source: &impl TransitionSource)
	-> Result<LocalTime, RangeError>
{
	let info = info(time, zone, source)?;
	let local = time.checked_add(info.utoff as i64).ok_or(RangeError(time))?;
	let tm = Tm::new(local).ok_or(RangeError(time))?;
	Ok(LocalTime { tm, info })
}

impl TimeZoneRule {
	/// Get timezone info for `time`, computing transitions directly.
	///
	/// See [`info`] for details.
	pub fn info(&self, time: i64) -> Result<TzInfo, RangeError> {
		info(time, Some(self), &Calculator)
	}

	/// Get the local calendar time for `time`, computing transitions directly.
	///
	/// See [`localtime`] for details.
	pub fn localtime(&self, time: i64) -> Result<LocalTime, RangeError> {
		localtime(time, Some(self), &Calculator)
	}

	/// The DST start and end instants in `year`, or `None` for fixed-offset zones.
	///
	/// # Examples
	///
	/// ```
	/// # use posix_tz::tz::parse;
	/// let zone = parse("CET-1CEST,M3.5.0,M10.5.0/3").unwrap();
	/// assert_eq!(zone.transitions(2025), Some((1743296400, 1761440400)));
	/// assert_eq!(parse("UTC0").unwrap().transitions(2025), None);
	/// ```
	pub fn transitions(&self, year: i32) -> Option<(i64, i64)> {
		self.dst.as_ref().map(|dst| (
			compute(&dst.start, year, self.standard_offset),
			compute(&dst.end, year, dst.offset)
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::iter::from_fn;

	fn cet() -> TimeZoneRule {
		parse("CET-1CEST,M3.5.0,M10.5.0/3").unwrap()
	}

	fn tm(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> (i32, u8, u8, u8, u8, u8) {
		(year, month, day, hour, minute, second)
	}

	fn fields(local: &LocalTime) -> (i32, u8, u8, u8, u8, u8) {
		let t = &local.tm;
		(t.year, t.month, t.day, t.hour, t.minute, t.second)
	}

	#[test]
	fn utc_without_zone() {
		let local = localtime(1718617807, None, &Calculator).unwrap();
		assert_eq!(local.tm, Tm::new(1718617807).unwrap());
		assert_eq!(local.info, TzInfo { utoff: 0, is_dst: false });
	}

	#[test]
	fn fixed_offset_zone() {
		let zone = parse("IST-5:30").unwrap();
		for t in [0, 1718617807, 1743296400, 1761440400] {
			let local = zone.localtime(t).unwrap();
			assert_eq!(local.info, TzInfo { utoff: 19800, is_dst: false });
			assert_eq!(local.tm, Tm::new(t + 19800).unwrap());
		}
	}

	#[test]
	fn dst_boundaries_are_standard_time() {
		let zone = cet();
		let (start, end) = zone.transitions(2025).unwrap();
		assert_eq!((start, end), (1743296400, 1761440400));

		let local = zone.localtime(start).unwrap();
		assert_eq!(fields(&local), tm(2025, 3, 30, 2, 0, 0));
		assert!(!local.is_dst());

		let local = zone.localtime(start + 1).unwrap();
		assert_eq!(fields(&local), tm(2025, 3, 30, 3, 0, 1));
		assert!(local.is_dst());

		let local = zone.localtime(end - 1).unwrap();
		assert_eq!(fields(&local), tm(2025, 10, 26, 2, 59, 59));
		assert!(local.is_dst());

		let local = zone.localtime(end).unwrap();
		assert_eq!(fields(&local), tm(2025, 10, 26, 2, 0, 0));
		assert!(!local.is_dst());
	}

	#[test]
	fn resolved_transitions_in_local_time() {
		// 2am local standard time in March, 2am local DST in October
		let zone = parse("CET-1CEST,M3.5.0,M10.5.0").unwrap();
		let (start, end) = zone.transitions(2025).unwrap();
		assert_eq!(Tm::new(start + 3600).map(|t| (t.month, t.day, t.hour)), Some((3, 30, 2)));
		assert_eq!(Tm::new(end + 7200).map(|t| (t.month, t.day, t.hour)), Some((10, 26, 2)));

		let zone = parse("CET-1CEST,M3.2.0/2:00:00,M11.1.0/2:00:00").unwrap();
		assert_eq!(zone.transitions(2025), Some((1741482000, 1762041600)));
	}

	#[test]
	fn us_eastern_over_a_year() {
		let zone = parse("EST5EDT,M3.2.0,M11.1.0").unwrap();
		// Every day of 2024 at 23:00 UTC
		let mut time = 1704063600;
		let days = from_fn(move || {
			time += 86400;
			(time <= 1735686000).then_some(time)
		});
		for t in days {
			let expected = if 1710054000 < t && t < 1730613600 {
				TzInfo { utoff: -14400, is_dst: true }
			} else {
				TzInfo { utoff: -18000, is_dst: false }
			};
			assert_eq!(zone.info(t), Ok(expected), "time: {}", t);
		}

		assert_eq!(zone.info(1710054000), Ok(TzInfo { utoff: -18000, is_dst: false }));
		assert_eq!(zone.info(1710054001), Ok(TzInfo { utoff: -14400, is_dst: true }));
		assert_eq!(zone.info(1730613599), Ok(TzInfo { utoff: -14400, is_dst: true }));
		assert_eq!(zone.info(1730613600), Ok(TzInfo { utoff: -18000, is_dst: false }));
	}

	#[test]
	fn start_after_end_is_never_dst() {
		let zone = parse("AEST-10AEDT,M10.1.0,M4.1.0/3").unwrap();
		let (start, end) = zone.transitions(2025).unwrap();
		assert_eq!((start, end), (1759593600, 1743868800));

		let standard = Ok(TzInfo { utoff: 36000, is_dst: false });
		// Mid January, mid July and mid December
		assert_eq!(zone.info(1736942400), standard);
		assert_eq!(zone.info(1752580800), standard);
		assert_eq!(zone.info(1765800000), standard);

		for t in [end - 1, end, end + 1, start - 1, start, start + 1] {
			assert_eq!(zone.info(t), standard, "time: {}", t);
		}
		let local = zone.localtime(1736942400).unwrap();
		assert_eq!((local.tm.day, local.tm.hour), (15, 22));
	}

	#[test]
	fn out_of_range() {
		let zone = cet();
		assert_eq!(localtime(i64::MAX, None, &Calculator), Err(RangeError(i64::MAX)));
		assert_eq!(localtime(i64::MIN, Some(&zone), &Calculator), Err(RangeError(i64::MIN)));
		assert_eq!(zone.info(i64::MAX), Err(RangeError(i64::MAX)));

		// The last representable second cannot be shifted east
		let last = crate::time::timestamp_from_ymd(i32::MAX, 12, 31) + 86399;
		assert_eq!(localtime(last, None, &Calculator).map(|l| l.tm.year), Ok(i32::MAX));
		assert_eq!(parse("XXX-1").unwrap().localtime(last), Err(RangeError(last)));
	}
}
