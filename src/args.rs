//! Support for command line argument parsing.
//!
//! See [crate] documentation for details on command line arguments and examples.

use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Debug};
use std::num::NonZero;
use std::time::Duration;
use posix_tz::tz::{self, ParseError, TimeZoneRule};

/// Default delay between two ticks, in milliseconds.
const DEFAULT_INTERVAL_MS: u64 = 1000;

/// The error type for parsing command line arguments.
#[cfg_attr(test, derive(PartialEq))]
pub enum ArgumentsError {
	/// The option was unrecognized. The option is returned as the payload of this variant.
	UnrecognizedOption(String),
	/// A positional argument was supplied. This application only takes options. The argument is
	/// returned as the payload of this variant.
	UnexpectedArgument(String),
	/// Error converting an option or parameter to UTF-8. The argument index and original
	/// [`OsString`] that could not be converted are returned as the payload of this variant.
	InvalidUTF8(usize, OsString),
	/// The provided tick count was invalid. The supplied count argument is returned as the payload
	/// of this variant.
	InvalidCount(String),
	/// The provided tick interval was invalid. The supplied interval argument is returned as the
	/// payload of this variant.
	InvalidInterval(String),
	/// The provided start time was not an integer Unix timestamp. The supplied time argument is
	/// returned as the payload of this variant.
	InvalidTime(String),
	/// The provided year was invalid. The supplied year argument is returned as the payload of
	/// this variant.
	InvalidYear(String),
	/// The parameter for an option was not supplied. The option is returned as the payload for this
	/// variant.
	MissingParameter(String),
	/// An error occured while parsing the provided TZ string. The underlying parse error is
	/// returned as the payload for this variant.
	TimezoneError(ParseError),
	/// Help option (-h) was included, so print help details and exit.
	Help
}

impl Display for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ArgumentsError::UnrecognizedOption(s) => write!(f, "Unrecognized option: {}", s),
			ArgumentsError::UnexpectedArgument(s) => write!(f, "Unexpected argument: {}", s),
			ArgumentsError::InvalidUTF8(i, v) => write!(f, "Invalid UTF-8 in argument {}: {:?}", i, v),
			ArgumentsError::InvalidCount(s) => write!(f, "Invalid count: {}", s),
			ArgumentsError::InvalidInterval(s) => write!(f, "Invalid interval: {}", s),
			ArgumentsError::InvalidTime(s) => write!(f, "Invalid time: {}", s),
			ArgumentsError::InvalidYear(s) => write!(f, "Invalid year: {}", s),
			ArgumentsError::MissingParameter(s) => write!(f, "Missing parameter for option {}", s),
			ArgumentsError::TimezoneError(e) => write!(f, "Timezone error: {}", e),
			ArgumentsError::Help => write!(f, "Help requested")
		}
	}
}

impl Debug for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self, f)
	}
}

impl Error for ArgumentsError {}

/// Convert an argument to [`&str`].
///
/// The function takes the argument index `i`, optional argument name `a`, and the argument `s`.
///
/// # Errors
///
/// Returns [`ArgumentsError::InvalidUTF8`] if the argument could not be converted to UTF-8 or
/// [`ArgumentsError::MissingParameter`] if the argument is `None`.
fn arg_to_str<'a, 'b>(i: usize, a: Option<&'a str>, s: Option<&'b OsString>)
	-> Result<&'b str, ArgumentsError>
{
	match s {
		Some(v) => v.to_str().ok_or_else(|| ArgumentsError::InvalidUTF8(i, v.clone())),
		None => Err(ArgumentsError::MissingParameter(a.map(String::from).unwrap_or_default()))
	}
}

/// Parsed command line arguments.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Arguments {
	/// The configured timezone (if provided).
	pub timezone: Option<TimeZoneRule>,
	/// The configured start time as a Unix timestamp (if provided).
	pub time: Option<i64>,
	/// The number of ticks to print, or `None` to run until interrupted.
	pub count: Option<NonZero<usize>>,
	/// The delay between two ticks.
	pub interval: Duration,
	/// Print the DST transitions of this year and exit (if provided).
	pub year: Option<i32>
}

impl Arguments {
	/// Parse command line arguments.
	///
	/// The input can be any type that implements [`Iterator`] that yields [`OsString`], though
	/// typically this would be [`std::env::args_os`]. This function assumes that the application
	/// name is **not** supplied as the first item yielded by `args`, see examples for common use.
	///
	/// # Errors
	///
	/// This function can return any of the variants in [`ArgumentsError`]. See that documentation
	/// for more details.
	///
	/// # Examples
	///
	/// ```
	/// let args = match Arguments::parse(std::env::args_os().skip(1)) {
	/// 	Ok(a) => a,
	/// 	Err(e) => {
	/// 		// Handle error
	/// 		panic!("{}", e);
	/// 	}
	/// };
	/// ```
	pub fn parse(args: impl Iterator<Item = OsString>) -> Result<Arguments, ArgumentsError>
	{
		let mut parsed = Arguments {
			timezone: None,
			time: None,
			count: None,
			interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
			year: None
		};
		let mut args = args.enumerate();
		while let Some((i, arg)) = args.next() {
			let option = arg_to_str(i, None, Some(&arg))?;
			// Every option but -h takes exactly one parameter
			let mut param = || {
				let next = args.next();
				arg_to_str(i + 1, Some(option), next.as_ref().map(|(_, v)| v)).map(String::from)
			};
			match option {
				"-n" | "-c" | "--count" => {
					let v = param()?;
					parsed.count = Some(v.parse().map_err(|_| ArgumentsError::InvalidCount(v))?);
				},
				"-z" | "--timezone" => {
					parsed.timezone = Some(tz::parse(&param()?).map_err(ArgumentsError::TimezoneError)?);
				},
				"-t" | "--time" => {
					let v = param()?;
					parsed.time = Some(v.parse().map_err(|_| ArgumentsError::InvalidTime(v))?);
				},
				"-i" | "--interval" => {
					let v = param()?;
					let ms: NonZero<u64> = v.parse().map_err(|_| ArgumentsError::InvalidInterval(v))?;
					parsed.interval = Duration::from_millis(ms.get());
				},
				"-y" | "--year" => {
					let v = param()?;
					parsed.year = Some(v.parse().map_err(|_| ArgumentsError::InvalidYear(v))?);
				},
				"-h" | "--help" => return Err(ArgumentsError::Help),
				v if v.starts_with('-') => return Err(ArgumentsError::UnrecognizedOption(v.to_string())),
				v => return Err(ArgumentsError::UnexpectedArgument(v.to_string()))
			}
		}

		Ok(parsed)
	}
}
