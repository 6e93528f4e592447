//! Utilities for dealing with time (UTC and Unix timestamps), unaware of timezone.
//!
//! This module provides the calendar arithmetic used by the rest of the crate: breaking a Unix
//! timestamp down into a Gregorian calendar date ([`Tm`]), and building timestamps back up from
//! calendar fields ([`timestamp_from_ymd`], [`timestamp_from_civil`]). None of these functions
//! rely on libc's `mktime` or `gmtime`, so they are thread safe and work on timestamps before the
//! Unix epoch (the proleptic Gregorian calendar is used throughout).
//!
//! # Examples
//!
//! ```
//! # use posix_tz::time::{Tm, timestamp_from_ymd};
//! let date = Tm::new(-1).unwrap();
//! assert_eq!((date.year, date.month, date.day), (1969, 12, 31));
//! assert_eq!((date.hour, date.minute, date.second), (23, 59, 59));
//!
//! assert_eq!(timestamp_from_ymd(1970, 1, 1), 0);
//! ```

#[cfg(feature = "now")]
use core::mem::MaybeUninit;
#[cfg(feature = "now")]
use libc::{timespec, clock_gettime, CLOCK_REALTIME};

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: i64 = 60;
/// Seconds per hour.
pub const SECONDS_PER_HOUR: i64 = SECONDS_PER_MINUTE * 60;
/// Seconds per day.
pub const SECONDS_PER_DAY: i64 = SECONDS_PER_HOUR * 24;
/// Days in one 400 year cycle of the Gregorian calendar, after which it repeats.
const DAYS_PER_ERA: i64 = 146097;
/// Years in one cycle.
const YEARS_PER_ERA: i64 = 400;
/// Day number of 1970-01-01 when days are counted from 0000-03-01.
const EPOCH_DAY: i64 = 719468;

/// Get the current time as a Unix timestamp in whole seconds.
///
/// This function will return `None` if `libc::clock_gettime` fails.
///
/// # Examples
///
/// ```
/// # use posix_tz::time::now;
/// let t = now().expect("Failed to get current time");
/// assert!(t > 0);
/// ```
#[cfg(feature = "now")]
pub fn now() -> Option<i64> {
	let mut time = MaybeUninit::<timespec>::uninit();
	// Safety:
	// - clock_gettime does not read time, only writes
	// - if clock_gettime returns zero, time is successfully initialized
	unsafe {
		match clock_gettime(CLOCK_REALTIME, time.as_mut_ptr()) {
			0 => Some(i64::from(time.assume_init().tv_sec)),
			_ => None
		}
	}
}

/// Check whether a given `year` is a leap year.
///
/// Year must be the absolute (proleptic) Gregorian calendar year: divisible by 4 and not by 100,
/// unless also divisible by 400.
///
/// # Examples
///
/// ```
/// # use posix_tz::time::isleapyear;
/// assert_eq!(isleapyear(1900), false);
/// assert_eq!(isleapyear(2000), true);
/// assert_eq!(isleapyear(2023), false);
/// assert_eq!(isleapyear(2024), true);
/// assert_eq!(isleapyear(-400), true);
/// ```
#[inline(always)]
pub fn isleapyear(year: i32) -> bool {
	year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// The number of days in a given month.
///
/// `y` must be the absolute Gregorian calendar year, and `m` the 1-indexed month starting at
/// January.
pub fn days_per_month(y: i32, m: u8) -> u8 {
	// Details: https://www.youtube.com/watch?v=J9KijLyP-yg&t=1470s
	if m == 2 {
		if isleapyear(y) { 29 } else { 28 }
	} else {
		30 | (m ^ (m >> 3))
	}
}

/// Gregorian calendar date in UTC.
///
/// Unlike `libc::tm`, `month` is [1, 12], `yearday` is [1, 366] and `year` is the absolute
/// calendar year rather than an offset from 1900.
///
/// # Examples
///
/// ```
/// # use posix_tz::time::Tm;
/// let date = Tm::new(1718617807).unwrap();
/// assert_eq!(date, Tm {
/// 	second: 7,
/// 	minute: 50,
/// 	hour: 9,
/// 	day: 17,
/// 	month: 6,
/// 	year: 2024,
/// 	weekday: 1,
/// 	yearday: 169
/// });
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tm {
	/// Seconds, ranged [0, 59]
	pub second: u8,
	/// Minutes, ranged [0, 59]
	pub minute: u8,
	/// Hours, ranged [0, 23]
	pub hour: u8,
	/// Day of the month, ranged [1, 31]
	pub day: u8,
	/// Month of the year, ranged [1, 12]
	pub month: u8,
	/// Absolute Gregorian calendar year
	pub year: i32,
	/// Day of the week, ranged [0, 6] => [Sunday, Saturday]
	pub weekday: u8,
	/// Day of the year, ranged [1, 366]
	pub yearday: u16
}

impl Tm {
	/// Convert a Unix timestamp into a calendar date.
	///
	/// Returns `None` if the resulting year does not fit in an `i32`.
	pub fn new(unixtimestamp: i64) -> Option<Tm> {
		let days = unixtimestamp.div_euclid(SECONDS_PER_DAY);
		let secs = unixtimestamp.rem_euclid(SECONDS_PER_DAY);
		let (y, m, d) = civil_from_days(days);
		let year = i32::try_from(y).ok()?;

		Some(Tm {
			second: (secs % SECONDS_PER_MINUTE) as u8,
			minute: (secs % SECONDS_PER_HOUR / SECONDS_PER_MINUTE) as u8,
			hour: (secs / SECONDS_PER_HOUR) as u8,
			day: d as u8,
			month: m as u8,
			year,
			// 1970-01-01 was a Thursday
			weekday: (days + 4).rem_euclid(7) as u8,
			yearday: (days - days_from_civil(y, 1, 1) + 1) as u16
		})
	}

	/// Check whether `self` is in a leap year.
	#[inline(always)]
	pub fn isleapyear(&self) -> bool {
		isleapyear(self.year)
	}
}

/// Split a day count since 1970-01-01 into year, month and day.
///
/// Counting years from March puts February 29 at the very end of the year, so month and day
/// fall out of a linear equation on the day of that shifted year.
/// See http://howardhinnant.github.io/date_algorithms.html#civil_from_days
fn civil_from_days(days: i64) -> (i64, i64, i64) {
	let z = days + EPOCH_DAY;
	let era = z.div_euclid(DAYS_PER_ERA);
	let doe = z.rem_euclid(DAYS_PER_ERA);
	let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
	let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
	let mp = (5 * doy + 2) / 153;
	let d = doy - (153 * mp + 2) / 5 + 1;
	let m = if mp < 10 { mp + 3 } else { mp - 9 };
	let y = yoe + era * YEARS_PER_ERA + (m <= 2) as i64;
	(y, m, d)
}

/// Days since 1970-01-01 for a civil date, in the proleptic Gregorian calendar.
fn days_from_civil(y: i64, m: i64, d: i64) -> i64 {
	// Inverse of civil_from_days
	let y = if m <= 2 { y - 1 } else { y };
	let era = y.div_euclid(YEARS_PER_ERA);
	let yoe = y.rem_euclid(YEARS_PER_ERA);
	let mp = (m + 9) % 12;
	let doy = (153 * mp + 2) / 5 + d - 1;
	let doe = 365 * yoe + yoe / 4 - yoe / 100 + doy;
	era * DAYS_PER_ERA + doe - EPOCH_DAY
}

/// Get the Unix timestamp for 00:00:00 UTC on a given year, month, and day.
///
/// `y` must be the absolute Gregorian calendar year, `m` the 1-indexed month starting at January,
/// and `d` the day of the month.
///
/// # Examples
///
/// ```
/// # use posix_tz::time::timestamp_from_ymd;
/// assert_eq!(timestamp_from_ymd(2024, 2, 28), 1709078400);
/// assert_eq!(timestamp_from_ymd(2024, 2, 29), 1709164800);
/// assert_eq!(timestamp_from_ymd(2024, 3, 1), 1709251200);
/// ```
pub fn timestamp_from_ymd(y: i32, m: u8, d: u8) -> i64 {
	SECONDS_PER_DAY * days_from_civil(y as i64, m as i64, d as i64)
}

/// Get the Unix timestamp for a civil date and time of day, treating the fields as UTC.
///
/// The time of day does not need to be normalized: negative or oversized `hour`, `minute` and
/// `second` values simply move the result backwards or forwards, the way `mktime` does.
///
/// # Examples
///
/// ```
/// # use posix_tz::time::timestamp_from_civil;
/// assert_eq!(timestamp_from_civil(2025, 1, 1, 12, 30, 0), 1735734600);
/// // 00:-30 on Jan 1 is 23:30 on Dec 31
/// assert_eq!(timestamp_from_civil(2025, 1, 1, 0, -30, 0), 1735687800);
/// ```
pub fn timestamp_from_civil(y: i32, m: u8, d: u8, hour: i64, minute: i64, second: i64) -> i64 {
	timestamp_from_ymd(y, m, d)
		+ hour * SECONDS_PER_HOUR
		+ minute * SECONDS_PER_MINUTE
		+ second
}
