//! Resolving transition rules to instants.
//!
//! A [`TransitionRule`] like `M3.2.0/2:00:00` ("second Sunday of March at 2am") names a different
//! calendar day every year. [`compute`] resolves it to a Unix timestamp for one year using closed
//! form weekday arithmetic; [`TransitionSource`] abstracts over computing directly ([`Calculator`])
//! and memoizing ([`TransitionCache`](super::TransitionCache)).

use crate::time::{days_per_month, timestamp_from_civil};
use super::TransitionRule;

/// Something that can resolve a [`TransitionRule`] to an instant in a given year.
///
/// Implementations must return the same value as [`compute`] would for the first request of a
/// given `(rule, year)`.
pub trait TransitionSource {
	/// Resolve `rule` in `year`, adjusting the rule's wall clock time by `base_offset` seconds.
	fn transition(&self, rule: &TransitionRule, year: i32, base_offset: i32) -> i64;
}

/// Computes every transition from scratch.
#[derive(Clone, Copy, Debug, Default)]
pub struct Calculator;

impl TransitionSource for Calculator {
	fn transition(&self, rule: &TransitionRule, year: i32, base_offset: i32) -> i64 {
		compute(rule, year, base_offset)
	}
}

/// Weekday (0-6 => Sunday-Saturday) of the first day of `month` in `year`.
///
/// Uses the Gauss congruence, treating January and February as months 13 and 14 of the previous
/// year. Floor division keeps the result correct for proleptic years before year 0.
///
/// # Examples
///
/// ```
/// # use posix_tz::tz::first_weekday;
/// assert_eq!(first_weekday(1970, 1), 4); // Thursday
/// assert_eq!(first_weekday(2025, 3), 6); // Saturday
/// ```
pub fn first_weekday(year: i32, month: u8) -> u8 {
	let month = month as i64;
	let a = (14 - month).div_euclid(12);
	let x = year as i64 - a;
	let y = x + x.div_euclid(4) - x.div_euclid(100) + x.div_euclid(400);
	let z = month + 12 * a - 2;
	(1 + y + (31 * z).div_euclid(12)).rem_euclid(7) as u8
}

/// Day of the month selected by `rule` in `year`.
///
/// The `n`th occurrence of a weekday is `1 + 7(n - 1)` days into the month, plus the distance from
/// the first day's weekday to the target weekday. When that runs past the end of the month a week
/// is taken off, which is how occurrence 5 becomes "last". Occurrences outside of [1, 5], which
/// the parser never produces, are clamped into that range.
///
/// # Examples
///
/// ```
/// # use posix_tz::tz::{day_of_month, TransitionRule};
/// let last_sunday_of_february = TransitionRule {
/// 	month: 2, occurrence: 5, weekday: 0, hour: 2, minute: 0, second: 0
/// };
/// assert_eq!(day_of_month(&last_sunday_of_february, 2004), 29);
/// assert_eq!(day_of_month(&last_sunday_of_february, 2015), 22);
/// ```
pub fn day_of_month(rule: &TransitionRule, year: i32) -> u8 {
	let first = first_weekday(year, rule.month);
	let distance = (rule.weekday as i16 - first as i16).rem_euclid(7) as u8;
	let day = 1 + (rule.occurrence.clamp(1, 5) - 1) * 7 + distance;
	if day > days_per_month(year, rule.month) { day - 7 } else { day }
}

/// Resolve `rule` to a Unix timestamp in `year`.
///
/// The rule's hour and minute are moved back by `base_offset` (whole minutes, floored) before the
/// calendar fields are converted as if they were UTC. With the zone's standard offset for the DST
/// start and its DST offset for the DST end, the result is the UTC instant of each edge.
///
/// This function is pure: identical inputs always give identical outputs.
///
/// # Examples
///
/// ```
/// # use posix_tz::tz::{compute, TransitionRule};
/// // Last Sunday of March 2025 at 02:00 CET (UTC+1) is 01:00 UTC
/// let rule = TransitionRule {
/// 	month: 3, occurrence: 5, weekday: 0, hour: 2, minute: 0, second: 0
/// };
/// assert_eq!(compute(&rule, 2025, 3600), 1743296400);
/// ```
pub fn compute(rule: &TransitionRule, year: i32, base_offset: i32) -> i64 {
	let day = day_of_month(rule, year);

	let offset_minutes = (base_offset as i64).div_euclid(60);
	let hour = rule.hour as i64 - offset_minutes.div_euclid(60);
	let minute = rule.minute as i64 - offset_minutes.rem_euclid(60);

	let t = timestamp_from_civil(year, rule.month, day, hour, minute, rule.second as i64);
	log::trace!("{} in {} with offset {} resolved to {}", rule, year, base_offset, t);
	t
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::time::{timestamp_from_ymd, Tm};

	fn rule(month: u8, occurrence: u8, weekday: u8, hour: u8) -> TransitionRule {
		TransitionRule { month, occurrence, weekday, hour, minute: 0, second: 0 }
	}

	#[test]
	fn first_weekday_test() {
		assert_eq!(first_weekday(1970, 1), 4);
		assert_eq!(first_weekday(2000, 1), 6);
		assert_eq!(first_weekday(2024, 1), 1);
		assert_eq!(first_weekday(2024, 2), 4);
		assert_eq!(first_weekday(2025, 3), 6);
		assert_eq!(first_weekday(2025, 10), 3);
		assert_eq!(first_weekday(2025, 11), 6);
	}

	#[test]
	fn first_weekday_matches_calendar() {
		for year in [-401, -1, 0, 1, 1600, 1899, 1900, 1970, 2000, 2024, 2025, 2100, 9999] {
			for month in 1..=12 {
				let tm = Tm::new(timestamp_from_ymd(year, month, 1)).unwrap();
				assert_eq!(first_weekday(year, month), tm.weekday, "{}-{}", year, month);
			}
		}
	}

	#[test]
	fn day_of_month_test() {
		// Second Sunday of March, first Sunday of November
		assert_eq!(day_of_month(&rule(3, 2, 0, 2), 2024), 10);
		assert_eq!(day_of_month(&rule(11, 1, 0, 2), 2024), 3);
		assert_eq!(day_of_month(&rule(3, 2, 0, 2), 2025), 9);
		assert_eq!(day_of_month(&rule(11, 1, 0, 2), 2025), 2);

		// Last Sunday of March and October
		assert_eq!(day_of_month(&rule(3, 5, 0, 2), 2025), 30);
		assert_eq!(day_of_month(&rule(10, 5, 0, 2), 2025), 26);

		// Fifth occurrence exists: September 2024 has five Mondays
		assert_eq!(day_of_month(&rule(9, 5, 1, 2), 2024), 30);
		assert_eq!(day_of_month(&rule(9, 4, 1, 2), 2024), 23);

		// First day of the month
		assert_eq!(day_of_month(&rule(1, 1, 1, 2), 2024), 1);
	}

	#[test]
	fn day_of_month_leap_years() {
		// February starts on a Sunday in each of these years
		let last_sunday = rule(2, 5, 0, 2);
		assert_eq!(day_of_month(&last_sunday, 2004), 29);
		assert_eq!(day_of_month(&last_sunday, 2015), 22);
		assert_eq!(day_of_month(&last_sunday, 2026), 22);
		assert_eq!(day_of_month(&last_sunday, 2024), 25);
		assert_eq!(day_of_month(&rule(2, 4, 0, 2), 2004), 22);
	}

	#[test]
	fn compute_test() {
		// US Eastern: 2am local in EST (UTC-5) / EDT (UTC-4)
		assert_eq!(compute(&rule(3, 2, 0, 2), 2024, -18000), 1710054000);
		assert_eq!(compute(&rule(11, 1, 0, 2), 2024, -14400), 1730613600);

		// Central Europe: 2am CET / 3am CEST both happen at 01:00 UTC
		assert_eq!(compute(&rule(3, 5, 0, 2), 2025, 3600), 1743296400);
		assert_eq!(compute(&rule(10, 5, 0, 3), 2025, 7200), 1761440400);

		// Without an offset the rule is read as UTC
		assert_eq!(compute(&rule(3, 5, 0, 2), 2025, 0), timestamp_from_ymd(2025, 3, 30) + 7200);

		// Half hour offsets move the minute, and may cross midnight
		assert_eq!(compute(&rule(3, 2, 0, 2), 2025, -12600), timestamp_from_ymd(2025, 3, 9) + 5 * 3600 + 1800);
		assert_eq!(compute(&rule(10, 1, 0, 0), 2025, 34200), timestamp_from_ymd(2025, 10, 5) - 34200);

		// Hours beyond one day carry into the following days
		assert_eq!(compute(&rule(3, 4, 4, 26), 2024, 0), timestamp_from_ymd(2024, 3, 29) + 2 * 3600);
	}

	#[test]
	fn compute_is_deterministic() {
		let r = rule(3, 2, 0, 2);
		let first = compute(&r, 2025, 3600);
		for _ in 0..3 {
			assert_eq!(compute(&r, 2025, 3600), first);
			assert_eq!(Calculator.transition(&r, 2025, 3600), first);
		}
	}

	#[test]
	fn compute_extreme_years() {
		// Make sure extreme inputs cannot panic
		compute(&rule(12, 5, 6, 167), i32::MAX, i32::MAX);
		compute(&rule(1, 1, 0, 0), i32::MIN, i32::MIN);
	}

	#[test]
	fn hand_built_rules_out_of_range() {
		// Occurrences are clamped to [1, 5]
		assert_eq!(day_of_month(&rule(3, 0, 0, 2), 2025), day_of_month(&rule(3, 1, 0, 2), 2025));
		assert_eq!(day_of_month(&rule(3, 38, 0, 2), 2025), 30);
		assert_eq!(day_of_month(&rule(3, u8::MAX, 0, 2), 2025), 30);

		// Nonsense fields must not panic
		let rules = [
			rule(0, 0, 0, 0),
			rule(13, 2, 9, 200),
			rule(2, 5, 128, 2),
			rule(u8::MAX, u8::MAX, u8::MAX, u8::MAX)
		];
		for r in rules {
			compute(&r, 2025, 3600);
		}
	}
}
