//! Support for parsing TZ strings.
//!
//! This module parses the subset of [TZ strings] used by fixed-offset and two-season zones:
//!
//! ```text
//! NAME[+-]H[:M[:S]]                       fixed offset, e.g. "EST5"
//! NAME[+-]H[:M[:S]]DSTNAME,START,END      daylight savings time, e.g. "CET-1CEST,M3.5.0,M10.5.0/3"
//! ```
//!
//! `START` and `END` must use the month/week/day form `Mm.n.d[/h[:m[:s]]]`. The offset written in
//! a TZ string is *west*-positive (`EST5` is five hours behind UTC); the parsed
//! [`TimeZoneRule`] stores the negation so that adding it to UTC yields local time.
//!
//! Not supported:
//! - **Julian day rules** (`Jn` and `n`). These are rejected with
//!   [`ParseErrorKind::UnsupportedRuleFormat`] rather than being read as something else.
//! - **Explicit DST offsets** (`PST8PDT7,...`). DST is always one hour ahead of standard time.
//! - **Special TZ names** enclosed in `<...>`.
//! - **Names without an offset**. The hour is required, so UTC is written `UTC0`. A bare `UTC`
//!   fails with [`ParseErrorKind::MalformedOffset`].
//!
//! [TZ strings]: https://www.gnu.org/software/libc/manual/html_node/TZ-Variable.html
//!
//! # Examples
//!
//! ```
//! # use posix_tz::tz::{parse, TransitionRule};
//! let zone = parse("CET-1CEST,M3.5.0,M10.5.0/3").unwrap();
//! assert_eq!(zone.standard_name, "CET");
//! assert_eq!(zone.standard_offset, 3600);
//! assert_eq!(zone.dst_offset(), Some(7200));
//!
//! let dst = zone.dst.unwrap();
//! assert_eq!(dst.name, "CEST");
//! assert_eq!(dst.start, "M3.5.0/2".parse::<TransitionRule>().unwrap());
//! assert_eq!(dst.end, TransitionRule {
//! 	month: 10, occurrence: 5, weekday: 0, hour: 3, minute: 0, second: 0
//! });
//! ```

use alloc::{format, string::{String, ToString}};
use core::{fmt, str::FromStr};
use thiserror::Error;

/// The category of a [`ParseError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
	/// The overall shape of the TZ string is wrong: empty input, a missing name, or a number of
	/// comma separated fields other than one or three.
	MalformedSpec,
	/// The UTC offset is missing, not an integer, or out of range.
	MalformedOffset,
	/// A transition rule does not start with `M` (e.g. a Julian day rule).
	UnsupportedRuleFormat,
	/// A month/week/day transition rule or its time of day is malformed or out of range.
	MalformedRule
}

impl fmt::Display for ParseErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ParseErrorKind::MalformedSpec => f.write_str("Malformed TZ string"),
			ParseErrorKind::MalformedOffset => f.write_str("Malformed UTC offset"),
			ParseErrorKind::UnsupportedRuleFormat => f.write_str("Unsupported transition rule format"),
			ParseErrorKind::MalformedRule => f.write_str("Malformed transition rule")
		}
	}
}

/// The error type for parsing TZ strings.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct ParseError {
	/// What went wrong.
	pub kind: ParseErrorKind,
	/// The offending part of the input.
	pub detail: String
}

impl ParseError {
	fn new(kind: ParseErrorKind, detail: impl Into<String>) -> Self {
		ParseError { kind, detail: detail.into() }
	}
}

/// Largest hour allowed in a UTC offset.
const MAX_OFFSET_HOURS: u32 = 24;
/// Largest hour allowed in a transition time (extended POSIX allows times beyond one day).
const MAX_RULE_HOURS: u32 = 167;
/// Transition time used when a rule doesn't specify one: 02:00:00.
const DEFAULT_RULE_TIME: [u32; 3] = [2, 0, 0];
/// DST is one hour ahead of standard time.
pub const DST_ADVANCE: i32 = 3600;

/// Read decimal digits from the start of `bytes`.
///
/// Returns the parsed integer and the number of digits consumed, or `None` if there are no digits
/// or the value overflows a `u32`.
fn parse_num(bytes: &[u8]) -> Option<(u32, usize)> {
	let len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
	if len == 0 {
		return None;
	}
	let mut r: u32 = 0;
	for &b in &bytes[..len] {
		r = r.checked_mul(10)?.checked_add((b - b'0') as u32)?;
	}
	Some((r, len))
}

/// Parse a whole field as an unsigned integer. Signs, spaces and empty input are rejected.
fn parse_field(s: &str) -> Option<u32> {
	match parse_num(s.as_bytes()) {
		Some((v, len)) if len == s.len() => Some(v),
		_ => None
	}
}

/// Read `h[:m[:s]]` from the start of `bytes`.
///
/// Returns `[h, m, s]` and the number of bytes consumed. A `:` that isn't followed by digits
/// makes the whole time invalid. Ranges are left to the caller.
fn parse_hms(bytes: &[u8]) -> Option<([u32; 3], usize)> {
	let (h, mut used) = parse_num(bytes)?;
	let mut hms = [h, 0, 0];
	for part in hms.iter_mut().skip(1) {
		if bytes.get(used) != Some(&b':') {
			break;
		}
		let (v, len) = parse_num(&bytes[used + 1..])?;
		*part = v;
		used += len + 1;
	}
	Some((hms, used))
}

/// Count the leading ASCII letters of `bytes`, i.e. the length of a timezone name.
fn match_name(bytes: &[u8]) -> usize {
	bytes.iter().take_while(|b| b.is_ascii_alphabetic()).count()
}

/// Parse a signed `[+-]h[:m[:s]]` UTC offset as written in a TZ string (west-positive seconds).
fn parse_offset(bytes: &[u8]) -> Result<(i32, usize), ParseError> {
	let (sign, skip) = match bytes.first() {
		Some(b'-') => (-1, 1),
		Some(b'+') => (1, 1),
		_ => (1, 0)
	};
	let ([h, m, s], used) = parse_hms(&bytes[skip..]).ok_or_else(|| {
		ParseError::new(ParseErrorKind::MalformedOffset,
			format!("expected [+-]hh[:mm[:ss]], found {:?}", String::from_utf8_lossy(bytes)))
	})?;
	if h > MAX_OFFSET_HOURS || m > 59 || s > 59 {
		return Err(ParseError::new(ParseErrorKind::MalformedOffset,
			format!("offset {:?} out of range", String::from_utf8_lossy(&bytes[..skip + used]))));
	}
	Ok((sign * (h * 3600 + m * 60 + s) as i32, skip + used))
}

/// A month/week/day transition rule (`Mm.n.d[/h[:m[:s]]]`).
///
/// Selects the `occurrence`th `weekday` of `month` at a wall clock time of day. An occurrence of
/// 5 means the last such weekday of the month, which may be the 4th or the 5th.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransitionRule {
	/// Month of the year, ranged [1, 12]
	pub month: u8,
	/// Week of the month, ranged [1, 5] where 5 is the last week
	pub occurrence: u8,
	/// Day of the week, ranged [0, 6] => [Sunday, Saturday]
	pub weekday: u8,
	/// Hour of the transition, ranged [0, 167]
	pub hour: u8,
	/// Minute of the transition, ranged [0, 59]
	pub minute: u8,
	/// Second of the transition, ranged [0, 59]
	pub second: u8
}

impl TransitionRule {
	/// Parse a single `Mm.n.d[/h[:m[:s]]]` rule. The time of day defaults to `02:00:00`.
	///
	/// # Errors
	///
	/// - [`ParseErrorKind::UnsupportedRuleFormat`] if the rule doesn't start with `M`
	/// - [`ParseErrorKind::MalformedRule`] if the rule is empty, a component is not an integer, or a
	///   component is out of range
	///
	/// # Examples
	///
	/// ```
	/// # use posix_tz::tz::{TransitionRule, ParseErrorKind};
	/// assert_eq!(TransitionRule::parse("M3.2.0"), Ok(TransitionRule {
	/// 	month: 3, occurrence: 2, weekday: 0, hour: 2, minute: 0, second: 0
	/// }));
	/// assert_eq!(TransitionRule::parse("M10.5.0/3:30").map(|r| (r.hour, r.minute)), Ok((3, 30)));
	/// let kind = |s| TransitionRule::parse(s).unwrap_err().kind;
	/// assert_eq!(kind("J60"), ParseErrorKind::UnsupportedRuleFormat);
	/// assert_eq!(kind("M13.1.0"), ParseErrorKind::MalformedRule);
	/// ```
	pub fn parse(s: &str) -> Result<TransitionRule, ParseError> {
		let malformed = || ParseError::new(ParseErrorKind::MalformedRule, format!("{:?}", s));

		let body = match s.strip_prefix('M') {
			Some(body) => body,
			None if s.is_empty() => {
				return Err(ParseError::new(ParseErrorKind::MalformedRule, "empty transition rule"));
			}
			None => {
				return Err(ParseError::new(ParseErrorKind::UnsupportedRuleFormat,
					format!("{:?}, only Mm.n.d rules are supported", s)));
			}
		};

		let (date, time) = match body.split_once('/') {
			Some((date, time)) => (date, Some(time)),
			None => (body, None)
		};

		let mut parts = date.split('.');
		let mut next = || parts.next().and_then(parse_field).ok_or_else(malformed);
		let (month, occurrence, weekday) = (next()?, next()?, next()?);
		if parts.next().is_some() {
			return Err(malformed());
		}
		if !(1..=12).contains(&month) || !(1..=5).contains(&occurrence) || weekday > 6 {
			return Err(malformed());
		}

		let [hour, minute, second] = match time {
			None => DEFAULT_RULE_TIME,
			Some(t) => match parse_hms(t.as_bytes()) {
				Some((hms, used)) if used == t.len() => hms,
				_ => return Err(malformed())
			}
		};
		if hour > MAX_RULE_HOURS || minute > 59 || second > 59 {
			return Err(malformed());
		}

		Ok(TransitionRule {
			month: month as u8,
			occurrence: occurrence as u8,
			weekday: weekday as u8,
			hour: hour as u8,
			minute: minute as u8,
			second: second as u8
		})
	}
}

impl FromStr for TransitionRule {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		TransitionRule::parse(s)
	}
}

impl fmt::Display for TransitionRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "M{}.{}.{}/{}:{:02}:{:02}",
			self.month, self.occurrence, self.weekday, self.hour, self.minute, self.second)
	}
}

/// Daylight savings time half of a [`TimeZoneRule`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DstRule {
	/// DST abbreviation, e.g. "CEST"
	pub name: String,
	/// UTC offset during DST in seconds, always one hour ahead of standard time
	pub offset: i32,
	/// Transition from standard time to DST
	pub start: TransitionRule,
	/// Transition from DST back to standard time
	pub end: TransitionRule
}

/// A parsed TZ string.
///
/// Offsets are seconds east of UTC, so local time is UTC plus the offset. A zone either observes
/// DST, in which case every DST field is present in [`DstRule`], or it doesn't.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimeZoneRule {
	/// Standard time abbreviation, e.g. "CET"
	pub standard_name: String,
	/// UTC offset during standard time in seconds
	pub standard_offset: i32,
	/// Optional DST configuration
	pub dst: Option<DstRule>
}

impl TimeZoneRule {
	/// UTC offset during DST, if this zone observes DST.
	pub fn dst_offset(&self) -> Option<i32> {
		self.dst.as_ref().map(|dst| dst.offset)
	}

	/// DST abbreviation, if this zone observes DST.
	pub fn dst_name(&self) -> Option<&str> {
		self.dst.as_ref().map(|dst| dst.name.as_str())
	}
}

/// Split the first field of a TZ string into standard name, stored offset and DST name.
fn parse_head(field: &str) -> Result<(String, i32, Option<String>), ParseError> {
	let bytes = field.as_bytes();

	let stdlen = match_name(bytes);
	if stdlen == 0 {
		return Err(ParseError::new(ParseErrorKind::MalformedSpec,
			format!("missing standard time name in {:?}", field)));
	}

	let (offset, used) = parse_offset(&bytes[stdlen..])?;
	let rest = &field[stdlen + used..];

	let dstlen = match_name(rest.as_bytes());
	if dstlen < rest.len() {
		let detail = if dstlen == 0 {
			format!("unexpected input {:?} after UTC offset", rest)
		} else {
			format!("unexpected input {:?} after DST name, DST offsets are not supported", &rest[dstlen..])
		};
		return Err(ParseError::new(ParseErrorKind::MalformedSpec, detail));
	}

	// Invert the offset: TZ strings subtract it from local time to get UTC, we add it to UTC
	let dstname = (dstlen > 0).then(|| rest.to_string());
	Ok((field[..stdlen].to_string(), -offset, dstname))
}

/// Parse a TZ string into a [`TimeZoneRule`].
///
/// Parsing is pure: the same input always gives an equal result.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first problem found. See [`ParseErrorKind`] for the
/// categories.
///
/// # Examples
///
/// ```
/// # use posix_tz::tz::{parse, ParseErrorKind};
/// let zone = parse("EST5").unwrap();
/// assert_eq!(zone.standard_offset, -18000);
/// assert!(zone.dst.is_none());
///
/// let zone = parse("PST8PDT,M3.2.0,M11.1.0").unwrap();
/// assert_eq!(zone.dst_offset(), Some(-25200));
///
/// assert_eq!(parse("EST5EDT,M3.2.0").unwrap_err().kind, ParseErrorKind::MalformedSpec);
/// assert_eq!(parse("EST5EDT,J60,J300").unwrap_err().kind, ParseErrorKind::UnsupportedRuleFormat);
/// ```
pub fn parse(spec: &str) -> Result<TimeZoneRule, ParseError> {
	if spec.is_empty() {
		return Err(ParseError::new(ParseErrorKind::MalformedSpec, "empty TZ string"));
	}

	let fields = spec.split(',').count();
	if fields != 1 && fields != 3 {
		return Err(ParseError::new(ParseErrorKind::MalformedSpec,
			format!("expected 1 or 3 comma separated fields, found {}", fields)));
	}

	let mut parts = spec.split(',');
	let (standard_name, standard_offset, dstname) = parse_head(parts.next().unwrap_or_default())?;

	let dst = match (dstname, parts.next(), parts.next()) {
		(None, None, None) => None,
		(Some(name), Some(start), Some(end)) => Some(DstRule {
			name,
			offset: standard_offset + DST_ADVANCE,
			start: TransitionRule::parse(start)?,
			end: TransitionRule::parse(end)?
		}),
		(Some(name), None, _) => {
			return Err(ParseError::new(ParseErrorKind::MalformedSpec,
				format!("DST name {:?} without transition rules", name)));
		}
		_ => {
			return Err(ParseError::new(ParseErrorKind::MalformedSpec,
				"transition rules without a DST name"));
		}
	};

	Ok(TimeZoneRule { standard_name, standard_offset, dst })
}

impl FromStr for TimeZoneRule {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse(s)
	}
}

/// Write a stored (east-positive) offset the way TZ strings spell it (west-positive).
fn write_offset(f: &mut fmt::Formatter<'_>, offset: i32) -> fmt::Result {
	let posix = -(offset as i64);
	if posix < 0 {
		f.write_str("-")?;
	}
	let posix = posix.unsigned_abs();
	let (h, m, s) = (posix / 3600, posix % 3600 / 60, posix % 60);
	write!(f, "{}", h)?;
	if m != 0 || s != 0 {
		write!(f, ":{:02}", m)?;
	}
	if s != 0 {
		write!(f, ":{:02}", s)?;
	}
	Ok(())
}

impl fmt::Display for TimeZoneRule {
	/// Write the canonical TZ string for this rule, which parses back to an equal value.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.standard_name)?;
		write_offset(f, self.standard_offset)?;
		if let Some(dst) = &self.dst {
			write!(f, "{},{},{}", dst.name, dst.start, dst.end)?;
		}
		Ok(())
	}
}
