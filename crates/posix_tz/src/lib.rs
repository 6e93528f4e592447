//! POSIX TZ rules and local time.
//!
//! This crate is divided into two halves: [`time`] deals with converting between Unix timestamps
//! and UTC calendar time, with no understanding of timezones; [`tz`] deals with parsing [TZ
//! strings], computing daylight savings time transitions and converting Unix timestamps to local
//! calendar time.
//!
//! The parser, transition calculator and converter are `no_std` (they need `alloc` for timezone
//! names). With the `std` feature (enabled by default) the [`tz`] module adds a shared
//! [`TransitionCache`](tz::TransitionCache) and the [`Clock`](tz::Clock) handle that owns the
//! active timezone. If the `now` feature is enabled, [`time::now`] reads the current time.
//!
//! [TZ strings]: https://www.gnu.org/software/libc/manual/html_node/TZ-Variable.html
//!
//! # Examples
//!
//! Basic conversion from Unix time to UTC calendar time.
//! ```
//! # use posix_tz::time::Tm;
//! let date = Tm::new(1718617807).unwrap();
//! assert_eq!(date, Tm {
//! 	second: 7,
//! 	minute: 50,
//! 	hour: 9,
//! 	day: 17,
//! 	month: 6,
//! 	year: 2024,
//! 	weekday: 1,
//! 	yearday: 169
//! });
//! ```
//!
//! Conversion from Unix time to US Eastern calendar time.
//! ```
//! # use posix_tz::tz::TimeZoneRule;
//! let zone: TimeZoneRule = "EST5EDT,M3.2.0,M11.1.0".parse().unwrap();
//! let local = zone.localtime(1723433665).unwrap();
//! assert_eq!((local.tm.year, local.tm.month, local.tm.day), (2024, 8, 11));
//! assert_eq!((local.tm.hour, local.tm.minute, local.tm.second), (23, 34, 25));
//! assert!(local.is_dst());
//! ```

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod time;
pub mod tz;

pub use time::*;
