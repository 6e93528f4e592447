//! Print the local time in a POSIX TZ zone, following zone changes while running.
//!
//! `tzclock` converts the current time (or a given start time) to local time once per tick,
//! using a TZ string such as `EST5EDT,M3.2.0,M11.1.0` to decide the UTC offset and whether
//! daylight savings time is in effect. See [`posix_tz::tz`] for the conversion rules.
//!
//! While ticking, every line read from standard input is taken as a new TZ string. Valid zones take
//! effect from the next tick; invalid ones are reported and the previous zone is kept.
//!
//! # Command Line Arguments
//!
//! General form: `tzclock [options...]`
//!
//! | Short form | Long form    | Argument         | Default          | Description                          |
//! | ---------- | ------------ | ---------------- | ---------------- | ------------------------------------ |
//! | `-z`       | `--timezone` | [TZ string]      | `$TZ`, else UTC  | The zone to convert to               |
//! | `-t`       | `--time`     | Unix timestamp   | Current time     | The time of the first tick           |
//! | `-n`, `-c` | `--count`    | Integer > 0      | Unlimited        | The number of ticks to print         |
//! | `-i`       | `--interval` | Milliseconds > 0 | 1000             | The delay between ticks              |
//! | `-y`       | `--year`     | Year             | None             | Print that year's DST changes & exit |
//!
//! When `-t` is given, each tick advances the time by the interval instead of reading the system
//! clock. Timestamps are whole seconds, so the fraction of a second left over by an interval
//! such as `-i 1500` is carried to the next tick: the time then advances by 1 and 2 seconds in
//! turn. Log output is controlled with `RUST_LOG`, e.g. `RUST_LOG=debug`.
//!
//! [TZ string]: posix_tz::tz::tzstring
//!
//! # Examples
//!
//! Print the time in US Eastern five times
//! ```sh
//! tzclock -n 5 -z "EST5EDT,M3.2.0,M11.1.0"
//! ```
//!
//! Show when DST starts and ends in central Europe in 2025
//! ```sh
//! tzclock -z "CET-1CEST,M3.5.0,M10.5.0/3" -y 2025
//! ```
//!
//! Step through the 2025 spring forward, one second per tick
//! ```sh
//! tzclock -z "CET-1CEST,M3.5.0,M10.5.0/3" -t 1743296398 -n 4 -i 1000
//! ```

use std::error::Error;
use std::io::BufRead;
use std::process::ExitCode;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use posix_tz::time::Tm;
use posix_tz::tz::{Clock, LocalTime, TimeZoneRule};

use args::{Arguments, ArgumentsError};

mod args;

/// Format a UTC offset in seconds as `+hh:mm`, with `:ss` only when needed.
fn format_offset(utoff: i32) -> String {
	let sign = if utoff < 0 { '-' } else { '+' };
	let abs = utoff.unsigned_abs();
	let (h, m, s) = (abs / 3600, abs % 3600 / 60, abs % 60);
	if s == 0 {
		format!("{}{:02}:{:02}", sign, h, m)
	} else {
		format!("{}{:02}:{:02}:{:02}", sign, h, m, s)
	}
}

/// Format calendar fields as `YYYY-MM-DD hh:mm:ss`.
fn format_tm(tm: &Tm) -> String {
	format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
		tm.year, tm.month, tm.day, tm.hour, tm.minute, tm.second)
}

/// Render one tick: local time, zone abbreviation and UTC offset.
///
/// # Examples
///
/// ```
/// let zone = tz::parse("EST5EDT,M3.2.0,M11.1.0").unwrap();
/// let local = zone.localtime(1723433665).unwrap();
/// assert_eq!(render(&local, Some(&zone)), "2024-08-11 23:34:25 EDT (UTC-04:00)");
/// ```
fn render(local: &LocalTime, zone: Option<&TimeZoneRule>) -> String {
	let name: &str = match zone {
		Some(z) if local.is_dst() => z.dst_name().unwrap_or(&z.standard_name),
		Some(z) => &z.standard_name,
		None => "UTC"
	};
	format!("{} {} (UTC{})", format_tm(&local.tm), name, format_offset(local.info.utoff))
}

/// Print the DST transitions of `year` in the clock's zone.
fn print_transitions(clock: &Clock, year: i32) -> Result<(), Box<dyn Error>> {
	let Some(zone) = clock.zone() else {
		println!("UTC does not observe daylight savings time");
		return Ok(());
	};
	let Some((start, end)) = clock.transitions(year) else {
		println!("{} does not observe daylight savings time", zone);
		return Ok(());
	};
	let name = zone.dst_name().unwrap_or("DST");
	for (label, t) in [("starts", start), ("ends", end)] {
		let utc = Tm::new(t).ok_or("Transition outside of the supported calendar range")?;
		let before = clock.localtime(t - 1)?;
		let after = clock.localtime(t + 1)?;
		println!("{} {} at {} UTC: {} -> {}", name, label, format_tm(&utc),
			render(&before, Some(&*zone)), render(&after, Some(&*zone)));
	}
	Ok(())
}

/// Read TZ strings from standard input on a separate thread, one per line.
///
/// Returns the receiving end of the channel the lines are sent on. The reader thread exits at end
/// of input or when the receiver is dropped.
fn spawn_zone_reader() -> Receiver<String> {
	let (tx, rx) = channel::<String>();
	thread::spawn(move || {
		for line in std::io::stdin().lock().lines() {
			let line = match line {
				Ok(l) => l,
				Err(e) => {
					log::warn!("Failed to read standard input: {}", e);
					break;
				}
			};
			let spec = line.trim();
			if spec.is_empty() {
				continue;
			}
			if tx.send(spec.to_string()).is_err() {
				break;
			}
		}
		log::debug!("Stopped reading timezone changes");
	});
	rx
}

/// Where each tick gets its time from.
enum TimeSource {
	/// Read the system clock on every tick.
	System,
	/// Start at `time` and advance by the interval on every tick. `carry` holds the part of a
	/// second that has elapsed but not yet moved `time`.
	Simulated { time: i64, carry: Duration }
}

impl TimeSource {
	/// The time for the current tick, then advance.
	fn tick(&mut self, interval: Duration) -> Result<i64, Box<dyn Error>> {
		match self {
			TimeSource::System => Ok(posix_tz::time::now().ok_or("Failed to get current system time")?),
			TimeSource::Simulated { time, carry } => {
				let now = *time;
				let elapsed = *carry + interval;
				let step = i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX);
				*time = time.saturating_add(step);
				*carry = Duration::from_nanos(elapsed.subsec_nanos() as u64);
				Ok(now)
			}
		}
	}
}

/// Print local time every `args.interval`, applying zone changes read from standard input.
///
/// Runs `args.count` ticks, or forever when no count is given.
///
/// # Errors
///
/// This function can generate a variety of errors, all wrapped in `Box<dyn Error>`:
/// - `&str` if the system time cannot be read.
/// - [`posix_tz::tz::RangeError`] if a tick falls outside of the supported calendar range.
fn run(args: Arguments) -> Result<ExitCode, Box<dyn Error>> {
	let clock = Clock::new();

	match args.timezone {
		Some(zone) => { clock.replace_zone(zone); },
		None => match std::env::var("TZ") {
			Ok(spec) if !spec.is_empty() => {
				if let Err(e) = clock.set_zone(&spec) {
					eprintln!("Ignoring TZ environment variable: {}", e);
				}
			},
			_ => log::debug!("No timezone configured, using UTC")
		}
	}

	if let Some(year) = args.year {
		print_transitions(&clock, year)?;
		return Ok(ExitCode::SUCCESS);
	}

	let mut source = match args.time {
		Some(time) => TimeSource::Simulated { time, carry: Duration::ZERO },
		None => TimeSource::System
	};
	let changes = spawn_zone_reader();
	let mut reading = true;
	let mut ticks = 0usize;

	loop {
		let t = source.tick(args.interval)?;
		let (local, zone) = clock.localtime_with_zone(t)?;
		println!("{}", render(&local, zone.as_deref()));

		ticks += 1;
		if args.count.is_some_and(|c| ticks >= c.get()) {
			break;
		}

		// Sleep until the next tick, applying zone changes as they arrive
		let deadline = std::time::Instant::now() + args.interval;
		loop {
			let remaining = deadline.saturating_duration_since(std::time::Instant::now());
			if !reading {
				thread::sleep(remaining);
				break;
			}
			match changes.recv_timeout(remaining) {
				Ok(spec) => match clock.set_zone(&spec) {
					Ok(zone) => eprintln!("Timezone set to {}", zone),
					Err(e) => eprintln!("Keeping previous timezone: {}", e)
				},
				Err(RecvTimeoutError::Timeout) => break,
				Err(RecvTimeoutError::Disconnected) => reading = false
			}
		}
	}

	Ok(ExitCode::SUCCESS)
}

/// Main program entry point.
///
/// Parses input arguments and prints local time. See [`crate`] documentation for details.
fn main() -> ExitCode {
	env_logger::init();

	let args = match Arguments::parse(std::env::args_os().skip(1)) {
		Ok(a) => a,
		Err(e) => {
			return if let ArgumentsError::Help = e {
				println!("\
Print the local time in a POSIX TZ zone.

Usage: tzclock [OPTIONS]

Options:
  -z, --timezone <TZ>       the TZ string to use, defaults to $TZ or UTC
  -t, --time <SECONDS>      the Unix time of the first tick, defaults to now
  -n, -c, --count <COUNT>   the number of ticks to print, default unlimited
  -i, --interval <MS>       the delay between ticks in milliseconds, default 1000
  -y, --year <YEAR>         print the DST transitions of YEAR and exit
  -h, --help                print this help

While running, each line on standard input is applied as a new TZ string.

Examples:
  tzclock -n 5 -z \"EST5EDT,M3.2.0,M11.1.0\"
  tzclock -z \"CET-1CEST,M3.5.0,M10.5.0/3\" -y 2025
  tzclock -z \"CET-1CEST,M3.5.0,M10.5.0/3\" -t 1743296398 -n 4 -i 1000\n");
				ExitCode::SUCCESS
			} else {
				eprintln!("{}", e);
				ExitCode::FAILURE
			}
		}
	};

	run(args)
		.inspect_err(|e| eprintln!("{}", e))
		.unwrap_or(ExitCode::FAILURE)
}

#[cfg(test)]
mod tests {
	use super::*;
	use posix_tz::tz;

	#[test]
	fn format_offset_test() {
		assert_eq!(format_offset(0), "+00:00");
		assert_eq!(format_offset(-14400), "-04:00");
		assert_eq!(format_offset(19800), "+05:30");
		assert_eq!(format_offset(-16215), "-04:30:15");
	}

	#[test]
	fn render_test() {
		let zone = tz::parse("EST5EDT,M3.2.0,M11.1.0").unwrap();
		let local = zone.localtime(1723433665).unwrap();
		assert_eq!(render(&local, Some(&zone)), "2024-08-11 23:34:25 EDT (UTC-04:00)");

		let local = zone.localtime(1735689600).unwrap();
		assert_eq!(render(&local, Some(&zone)), "2024-12-31 19:00:00 EST (UTC-05:00)");

		let local = tz::localtime(1735689600, None, &tz::Calculator).unwrap();
		assert_eq!(render(&local, None), "2025-01-01 00:00:00 UTC (UTC+00:00)");
	}

	#[test]
	fn simulated_time_advances() {
		let simulated = |time| TimeSource::Simulated { time, carry: Duration::ZERO };
		let ticks = |source: &mut TimeSource, ms: u64, n: usize| -> Vec<i64> {
			(0..n).map(|_| source.tick(Duration::from_millis(ms)).unwrap()).collect()
		};

		let mut source = simulated(1743296398);
		assert_eq!(ticks(&mut source, 1000, 3), [1743296398, 1743296399, 1743296400]);

		// Leftover milliseconds are carried to the next tick
		let mut source = simulated(0);
		assert_eq!(ticks(&mut source, 1500, 5), [0, 1, 3, 4, 6]);
		let mut source = simulated(0);
		assert_eq!(ticks(&mut source, 250, 6), [0, 0, 0, 0, 1, 1]);

		// A thousand 1ms ticks make one second
		let mut source = simulated(0);
		assert!(ticks(&mut source, 1, 1000).iter().all(|&t| t == 0));
		assert_eq!(source.tick(Duration::from_millis(1)).unwrap(), 1);

		// Huge intervals saturate instead of overflowing
		let mut source = simulated(i64::MAX - 1);
		assert_eq!(ticks(&mut source, u64::MAX, 3), [i64::MAX - 1, i64::MAX, i64::MAX]);
	}
}
