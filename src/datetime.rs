//! Calendar values, time spans and the time register block.
//!
//! [`DateTime`] is a plain calendar value restricted to 2000-01-01 through
//! 2099-12-31, the range the chips' two-digit year register can hold. Inside
//! that range every year divisible by four is a leap year, which is what keeps
//! the day-count arithmetic below so small.
//!
//! # Conversions
//!
//! - calendar fields ↔ days since 2000-01-01 ↔ Unix seconds
//! - [`DateTime`] ± [`TimeSpan`], [`DateTime`] − [`DateTime`]
//! - compiler-style `"Dec 26 2009"` / `"12:34:56"` literals
//! - chrono's `NaiveDateTime`, both ways
//!
//! # Register Model
//!
//! All three chips store the time in 7 consecutive BCD registers starting at
//! 0x00: seconds, minutes, hours, day of week, date, month, year.

use core::fmt;
use core::ops::{Add, Neg, Sub};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::bcd;
use crate::registers::{Hours, Month, Seconds, TimeRepresentation};

/// Seconds in one day.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Unix time of 2000-01-01T00:00:00.
pub const SECONDS_FROM_1970_TO_2000: u32 = 946_684_800;

/// Unix time of 2099-12-31T23:59:59, the last representable second.
pub const MAX_UNIX_TIMESTAMP: u32 = 4_102_444_799;

// January to November. December's length is never needed: a date in December
// only ever adds the lengths of the eleven months before it.
const DAYS_IN_MONTH: [u8; 11] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30];

const DAY_NAMES: &[u8; 21] = b"SunMonTueWedThuFriSat";
const MONTH_NAMES: &[u8; 36] = b"JanFebMarAprMayJunJulAugSepOctNovDec";

/// Errors that can occur while building or decoding a calendar value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// A field is out of range, or the date does not exist
    InvalidDateTime,
    /// The year is outside 2000-2099
    YearOutOfRange,
}

impl fmt::Display for DateTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateTimeError::InvalidDateTime => f.write_str("invalid date or time"),
            DateTimeError::YearOutOfRange => f.write_str("year outside 2000-2099"),
        }
    }
}

/// Number of days in `month` (1-12) of year `2000 + year_offset`.
///
/// Returns 0 for a month outside 1-12.
#[must_use]
pub const fn days_in_month(year_offset: u8, month: u8) -> u8 {
    match month {
        2 if year_offset % 4 == 0 => 29,
        12 => 31,
        1..=11 => DAYS_IN_MONTH[month as usize - 1],
        _ => 0,
    }
}

/// Days from 2000-01-01 to the given date. 2000-01-01 itself is day 0.
///
/// Only meaningful for valid dates with `year_offset` 0-99.
#[must_use]
pub fn days_since_2000(year_offset: u8, month: u8, day: u8) -> u16 {
    let y = u16::from(year_offset);
    let mut days = u16::from(day);
    for &length in DAYS_IN_MONTH.iter().take(usize::from(month.saturating_sub(1))) {
        days += u16::from(length);
    }
    if month > 2 && y % 4 == 0 {
        days += 1;
    }
    days + 365 * y + (y + 3) / 4 - 1
}

/// A calendar date and time between 2000-01-01 and 2099-12-31, no time zone.
///
/// Equality and ordering compare the instant (the Unix projection), not the
/// stored fields.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    year_offset: u8,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Default for DateTime {
    /// 2000-01-01T00:00:00
    fn default() -> Self {
        DateTime {
            year_offset: 0,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTime {
    /// Builds a calendar value from its fields.
    ///
    /// `year` may be a full year (2000-2099) or an offset from 2000 (0-99).
    ///
    /// # Errors
    ///
    /// [`DateTimeError::YearOutOfRange`] for any other year and
    /// [`DateTimeError::InvalidDateTime`] for a field out of range or a day
    /// past the end of the month.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, DateTimeError> {
        let year_offset = match year {
            0..=99 => year,
            2000..=2099 => year - 2000,
            _ => {
                error!("Year {} is outside 2000-2099", year);
                return Err(DateTimeError::YearOutOfRange);
            }
        };
        let year_offset =
            u8::try_from(year_offset).map_err(|_| DateTimeError::YearOutOfRange)?;
        if day == 0 || day > days_in_month(year_offset, month) {
            return Err(DateTimeError::InvalidDateTime);
        }
        if hour > 23 || minute > 59 || second > 59 {
            return Err(DateTimeError::InvalidDateTime);
        }
        Ok(DateTime {
            year_offset,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Builds a calendar value from seconds since 1970-01-01T00:00:00.
    ///
    /// # Errors
    ///
    /// [`DateTimeError::YearOutOfRange`] if `t` falls before 2000 or after 2099.
    pub fn from_unix_timestamp(t: u32) -> Result<Self, DateTimeError> {
        if !(SECONDS_FROM_1970_TO_2000..=MAX_UNIX_TIMESTAMP).contains(&t) {
            return Err(DateTimeError::YearOutOfRange);
        }
        let mut t = t - SECONDS_FROM_1970_TO_2000;

        let second = (t % 60) as u8;
        t /= 60;
        let minute = (t % 60) as u8;
        t /= 60;
        let hour = (t % 24) as u8;
        let mut days = t / 24;

        let mut year_offset = 0u8;
        loop {
            let year_length = if year_offset % 4 == 0 { 366 } else { 365 };
            if days < year_length {
                break;
            }
            days -= year_length;
            year_offset += 1;
        }

        let mut month = 1u8;
        while month < 12 {
            let month_length = u32::from(days_in_month(year_offset, month));
            if days < month_length {
                break;
            }
            days -= month_length;
            month += 1;
        }

        Ok(DateTime {
            year_offset,
            month,
            day: days as u8 + 1,
            hour,
            minute,
            second,
        })
    }

    /// Parses the compiler's build date and time, e.g. `"Dec 26 2009"` and
    /// `"12:34:56"`. A single-digit day may be space padded (`"Jan  5 2024"`).
    ///
    /// Only the last two digits of the year are used.
    ///
    /// # Errors
    ///
    /// [`DateTimeError::InvalidDateTime`] if either string is malformed or
    /// names an impossible date.
    pub fn from_compiler_strings(date: &str, time: &str) -> Result<Self, DateTimeError> {
        let date = date.as_bytes();
        let time = time.as_bytes();
        if date.len() < 11 || time.len() < 8 {
            return Err(DateTimeError::InvalidDateTime);
        }
        let month = MONTH_NAMES
            .chunks(3)
            .position(|name| name == &date[0..3])
            .ok_or(DateTimeError::InvalidDateTime)?;
        let year = two_digits(&date[9..11])?;
        let day = two_digits(&date[4..6])?;
        let hour = two_digits(&time[0..2])?;
        let minute = two_digits(&time[3..5])?;
        let second = two_digits(&time[6..8])?;
        Self::new(
            u16::from(year),
            month as u8 + 1,
            day,
            hour,
            minute,
            second,
        )
    }

    /// Full year, 2000-2099.
    #[must_use]
    pub fn year(&self) -> u16 {
        2000 + u16::from(self.year_offset)
    }

    /// Year as an offset from 2000 (0-99), the value the chip stores.
    #[must_use]
    pub fn year_offset(&self) -> u8 {
        self.year_offset
    }

    /// Month, 1-12.
    #[must_use]
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Day of the month, 1-31.
    #[must_use]
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Hour, 0-23.
    #[must_use]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute, 0-59.
    #[must_use]
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Second, 0-59.
    #[must_use]
    pub fn second(&self) -> u8 {
        self.second
    }

    /// Day of the week, 0 = Sunday through 6 = Saturday.
    #[must_use]
    pub fn day_of_week(&self) -> u8 {
        // 2000-01-01 was a Saturday
        ((self.days_since_2000() + 6) % 7) as u8
    }

    /// Days since 2000-01-01.
    #[must_use]
    pub fn days_since_2000(&self) -> u16 {
        days_since_2000(self.year_offset, self.month, self.day)
    }

    /// Seconds since 2000-01-01T00:00:00.
    #[must_use]
    pub fn seconds_since_2000(&self) -> u32 {
        u32::from(self.days_since_2000()) * SECONDS_PER_DAY
            + u32::from(self.hour) * 3600
            + u32::from(self.minute) * 60
            + u32::from(self.second)
    }

    /// Seconds since 1970-01-01T00:00:00.
    #[must_use]
    pub fn unix_timestamp(&self) -> u32 {
        self.seconds_since_2000() + SECONDS_FROM_1970_TO_2000
    }

    /// `self + span`, or `None` if the result leaves 2000-2099.
    #[must_use]
    pub fn checked_add(&self, span: TimeSpan) -> Option<DateTime> {
        let t = i64::from(self.unix_timestamp()) + span.total_seconds();
        let t = u32::try_from(t).ok()?;
        DateTime::from_unix_timestamp(t).ok()
    }

    /// `self - span`, or `None` if the result leaves 2000-2099.
    #[must_use]
    pub fn checked_sub(&self, span: TimeSpan) -> Option<DateTime> {
        self.checked_add(-span)
    }

    /// Rewrites date/time tokens in `pattern` in place and returns it.
    ///
    /// Tokens: `hh`, `mm`, `ss`, `DD` (day), `DDD` (weekday name), `MM`
    /// (month), `MMM` (month name), `YY`, `YYYY`. Everything else is left
    /// alone, so `b"YYYY-MM-DD hh:mm:ss"` becomes `b"2024-03-15 13:45:30"`.
    pub fn format_into<'a>(&self, pattern: &'a mut [u8]) -> &'a [u8] {
        let len = pattern.len();
        for i in 0..len.saturating_sub(1) {
            if token_at(pattern, i, b"hh") {
                pattern[i..i + 2].copy_from_slice(&digits(self.hour));
            }
            if token_at(pattern, i, b"mm") {
                pattern[i..i + 2].copy_from_slice(&digits(self.minute));
            }
            if token_at(pattern, i, b"ss") {
                pattern[i..i + 2].copy_from_slice(&digits(self.second));
            }
            if token_at(pattern, i, b"DDD") {
                let name = 3 * usize::from(self.day_of_week());
                pattern[i..i + 3].copy_from_slice(&DAY_NAMES[name..name + 3]);
            } else if token_at(pattern, i, b"DD") {
                pattern[i..i + 2].copy_from_slice(&digits(self.day));
            }
            if token_at(pattern, i, b"MMM") {
                let name = 3 * usize::from(self.month - 1);
                pattern[i..i + 3].copy_from_slice(&MONTH_NAMES[name..name + 3]);
            } else if token_at(pattern, i, b"MM") {
                pattern[i..i + 2].copy_from_slice(&digits(self.month));
            }
            if token_at(pattern, i, b"YYYY") {
                pattern[i..i + 2].copy_from_slice(b"20");
                pattern[i + 2..i + 4].copy_from_slice(&digits(self.year_offset));
            } else if token_at(pattern, i, b"YY") {
                pattern[i..i + 2].copy_from_slice(&digits(self.year_offset));
            }
        }
        pattern
    }

    /// ISO 8601 rendering of the whole value, the date or the time.
    #[must_use]
    pub fn timestamp(&self, format: TimestampFormat) -> Timestamp {
        Timestamp {
            datetime: *self,
            format,
        }
    }

    fn fields(&self) -> (u8, u8, u8, u8, u8, u8) {
        (
            self.year_offset,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        )
    }
}

fn token_at(buffer: &[u8], i: usize, token: &[u8]) -> bool {
    buffer.get(i..i + token.len()) == Some(token)
}

fn digits(value: u8) -> [u8; 2] {
    [b'0' + (value / 10) % 10, b'0' + value % 10]
}

// "09" -> 9, " 9" -> 9
fn two_digits(text: &[u8]) -> Result<u8, DateTimeError> {
    let tens = match text[0] {
        b' ' => 0,
        c @ b'0'..=b'9' => c - b'0',
        _ => return Err(DateTimeError::InvalidDateTime),
    };
    match text[1] {
        c @ b'0'..=b'9' => Ok(10 * tens + c - b'0'),
        _ => Err(DateTimeError::InvalidDateTime),
    }
}

impl PartialEq for DateTime {
    fn eq(&self, other: &Self) -> bool {
        self.unix_timestamp() == other.unix_timestamp()
    }
}

impl Eq for DateTime {}

impl PartialOrd for DateTime {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateTime {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.unix_timestamp().cmp(&other.unix_timestamp())
    }
}

impl fmt::Display for DateTime {
    /// Formats as `YYYY-MM-DDTHH:MM:SS`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.timestamp(TimestampFormat::Full).fmt(f)
    }
}

impl Add<TimeSpan> for DateTime {
    type Output = DateTime;

    /// # Panics
    /// Panics if the result is outside 2000-2099; see [`DateTime::checked_add`].
    fn add(self, span: TimeSpan) -> DateTime {
        self.checked_add(span)
            .expect("`DateTime + TimeSpan` out of range")
    }
}

impl Sub<TimeSpan> for DateTime {
    type Output = DateTime;

    /// # Panics
    /// Panics if the result is outside 2000-2099; see [`DateTime::checked_sub`].
    fn sub(self, span: TimeSpan) -> DateTime {
        self.checked_sub(span)
            .expect("`DateTime - TimeSpan` out of range")
    }
}

impl Sub<DateTime> for DateTime {
    type Output = TimeSpan;

    fn sub(self, other: DateTime) -> TimeSpan {
        TimeSpan::new(i64::from(self.unix_timestamp()) - i64::from(other.unix_timestamp()))
    }
}

impl From<DateTime> for NaiveDateTime {
    fn from(dt: DateTime) -> Self {
        NaiveDate::from_ymd_opt(i32::from(dt.year()), u32::from(dt.month), u32::from(dt.day))
            .and_then(|date| {
                date.and_hms_opt(
                    u32::from(dt.hour),
                    u32::from(dt.minute),
                    u32::from(dt.second),
                )
            })
            .unwrap_or_default()
    }
}

impl TryFrom<NaiveDateTime> for DateTime {
    type Error = DateTimeError;

    fn try_from(ndt: NaiveDateTime) -> Result<Self, Self::Error> {
        let year = u16::try_from(ndt.year()).map_err(|_| DateTimeError::YearOutOfRange)?;
        if !(2000..=2099).contains(&year) {
            return Err(DateTimeError::YearOutOfRange);
        }
        DateTime::new(
            year,
            ndt.month() as u8,
            ndt.day() as u8,
            ndt.hour() as u8,
            ndt.minute() as u8,
            ndt.second() as u8,
        )
    }
}

/// Which part of a [`DateTime`] a [`Timestamp`] renders.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimestampFormat {
    /// `YYYY-MM-DDTHH:MM:SS`
    Full,
    /// `HH:MM:SS`
    Time,
    /// `YYYY-MM-DD`
    Date,
}

/// ISO 8601 view of a [`DateTime`], see [`DateTime::timestamp`].
#[derive(Copy, Clone, Debug)]
pub struct Timestamp {
    datetime: DateTime,
    format: TimestampFormat,
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = &self.datetime;
        match self.format {
            TimestampFormat::Time => {
                write!(f, "{:02}:{:02}:{:02}", dt.hour, dt.minute, dt.second)
            }
            TimestampFormat::Date => {
                write!(f, "{}-{:02}-{:02}", dt.year(), dt.month, dt.day)
            }
            TimestampFormat::Full => write!(
                f,
                "{}-{:02}-{:02}T{:02}:{:02}:{:02}",
                dt.year(),
                dt.month,
                dt.day,
                dt.hour,
                dt.minute,
                dt.second
            ),
        }
    }
}

/// A signed span of time with one second resolution.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeSpan {
    seconds: i64,
}

impl TimeSpan {
    /// A span of `seconds` seconds.
    #[must_use]
    pub const fn new(seconds: i64) -> Self {
        TimeSpan { seconds }
    }

    /// A span of days, hours, minutes and seconds, e.g. `(0, 3, 45, 0)` for
    /// three hours and three quarters. Components may be negative.
    #[must_use]
    pub const fn from_dhms(days: i32, hours: i32, minutes: i32, seconds: i32) -> Self {
        TimeSpan {
            seconds: days as i64 * SECONDS_PER_DAY as i64
                + hours as i64 * 3600
                + minutes as i64 * 60
                + seconds as i64,
        }
    }

    /// Whole days in the span.
    #[must_use]
    pub const fn days(&self) -> i64 {
        self.seconds / SECONDS_PER_DAY as i64
    }

    /// Hours left over after the whole days, not the total hours.
    #[must_use]
    pub const fn hours(&self) -> i8 {
        (self.seconds / 3600 % 24) as i8
    }

    /// Minutes left over after the whole hours.
    #[must_use]
    pub const fn minutes(&self) -> i8 {
        (self.seconds / 60 % 60) as i8
    }

    /// Seconds left over after the whole minutes.
    #[must_use]
    pub const fn seconds(&self) -> i8 {
        (self.seconds % 60) as i8
    }

    /// The whole span in seconds.
    #[must_use]
    pub const fn total_seconds(&self) -> i64 {
        self.seconds
    }
}

impl Add for TimeSpan {
    type Output = TimeSpan;

    fn add(self, other: TimeSpan) -> TimeSpan {
        TimeSpan::new(self.seconds + other.seconds)
    }
}

impl Sub for TimeSpan {
    type Output = TimeSpan;

    fn sub(self, other: TimeSpan) -> TimeSpan {
        TimeSpan::new(self.seconds - other.seconds)
    }
}

impl Neg for TimeSpan {
    type Output = TimeSpan;

    fn neg(self) -> TimeSpan {
        TimeSpan::new(-self.seconds)
    }
}

/// The 7 time registers as they sit on the wire.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct RawDateTime {
    seconds: Seconds,
    minutes: u8,
    hours: Hours,
    day: u8,
    date: u8,
    month: Month,
    year: u8,
}

impl RawDateTime {
    /// Encodes a calendar value in 24-hour format. The weekday register is
    /// always written as 0; nothing reads it back.
    pub(crate) fn from_datetime(datetime: &DateTime) -> Self {
        let (year, month, date, hour, minute, second) = datetime.fields();

        let mut seconds = Seconds::default();
        seconds.set_bcd(bcd::to_bcd(second));
        let mut hours = Hours::default();
        hours.set_time_representation(TimeRepresentation::TwentyFourHour);
        hours.set_bcd24(bcd::to_bcd(hour));
        let mut month_reg = Month::default();
        month_reg.set_bcd(bcd::to_bcd(month));

        let raw = RawDateTime {
            seconds,
            minutes: bcd::to_bcd(minute),
            hours,
            day: 0,
            date: bcd::to_bcd(date),
            month: month_reg,
            year: bcd::to_bcd(year),
        };
        debug!("raw time registers: {:?}", <[u8; 7]>::from(&raw));
        raw
    }

    /// Decodes the registers, accepting either hour format. The DS1307 clock
    /// halt bit and the DS323x century bit are ignored.
    pub(crate) fn into_datetime(self) -> Result<DateTime, DateTimeError> {
        let second = decode(self.seconds.bcd(), 59)?;
        let minute = decode(self.minutes & 0x7F, 59)?;
        let hour = match self.hours.time_representation() {
            TimeRepresentation::TwentyFourHour => decode(self.hours.bcd24(), 23)?,
            TimeRepresentation::TwelveHour => {
                let hour12 = decode(self.hours.bcd12(), 12)?;
                match (hour12, self.hours.pm()) {
                    (0, _) => return Err(DateTimeError::InvalidDateTime),
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, false) => h,
                    (h, true) => h + 12,
                }
            }
        };
        let date = decode(self.date & 0x3F, 31)?;
        let month = decode(self.month.bcd(), 12)?;
        let year = decode(self.year, 99)?;
        DateTime::new(u16::from(year), month, date, hour, minute, second)
    }
}

fn decode(value: u8, max: u8) -> Result<u8, DateTimeError> {
    if value & 0x0F > 9 {
        return Err(DateTimeError::InvalidDateTime);
    }
    let value = bcd::to_binary(value);
    if value > max {
        return Err(DateTimeError::InvalidDateTime);
    }
    Ok(value)
}

impl From<[u8; 7]> for RawDateTime {
    fn from(data: [u8; 7]) -> Self {
        RawDateTime {
            seconds: Seconds::from(data[0]),
            minutes: data[1],
            hours: Hours::from(data[2]),
            day: data[3],
            date: data[4],
            month: Month::from(data[5]),
            year: data[6],
        }
    }
}

impl From<&RawDateTime> for [u8; 7] {
    fn from(raw: &RawDateTime) -> [u8; 7] {
        [
            u8::from(raw.seconds),
            raw.minutes,
            u8::from(raw.hours),
            raw.day,
            raw.date,
            u8::from(raw.month),
            raw.year,
        ]
    }
}
