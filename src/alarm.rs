//! Alarm modes and the alarm register blocks of the DS3231/DS3232.
//!
//! Each alarm mode is identified by a one byte code. Its bits describe the
//! hardware configuration directly:
//!
//! | bit | meaning                                   |
//! |-----|-------------------------------------------|
//! | 0-3 | mask bits M1-M4 (1 = ignore the field)     |
//! | 4   | DY/DT (1 = match weekday, 0 = match date)  |
//! | 5   | alarm enabled                             |
//! | 7   | alarm slot (0 = alarm 1, 1 = alarm 2)      |
//!
//! # Alarm 1 Modes
//! - `EverySecond` - Triggers every second
//! - `FixedSecond` - Triggers when seconds match
//! - `FixedMinuteSecond` - Triggers when minutes:seconds match
//! - `FixedHourMinuteSecond` - Triggers when hours:minutes:seconds match (daily)
//! - `FixedDayHourMinuteSecond` - Triggers at a time on a date of the month
//! - `FixedWeekdayHourMinuteSecond` - Triggers at a time on a day of the week
//!
//! # Alarm 2 Modes
//! Alarm 2 has no seconds register and always fires at 00 seconds.
//! - `EveryMinute` - Triggers every minute
//! - `FixedMinute` - Triggers when minutes match
//! - `FixedHourMinute` - Triggers when hours:minutes match (daily)
//! - `FixedDayHourMinute` - Triggers at a time on a date of the month
//! - `FixedWeekdayHourMinute` - Triggers at a time on a day of the week

use core::fmt;

use crate::bcd;
use crate::registers::{
    AlarmDayDate, AlarmHours, AlarmMinutes, AlarmSeconds, DayDateSelect, InvalidCode,
};

const MASK1: u8 = 0x01;
const MASK2: u8 = 0x02;
const MASK3: u8 = 0x04;
const MASK4: u8 = 0x08;
const DAY_SELECT: u8 = 0x10;
const ENABLED: u8 = 0x20;
const SLOT_TWO: u8 = 0x80;

/// Error type for alarm configuration operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmError {
    /// Invalid time component value
    InvalidTime(&'static str),
    /// Invalid day of week (must be 1-7)
    InvalidDayOfWeek,
    /// Invalid date of month (must be 1-31)
    InvalidDateOfMonth,
    /// Mask bits that do not form a documented alarm mode
    InvalidMode,
}

impl fmt::Display for AlarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmError::InvalidTime(reason) => f.write_str(reason),
            AlarmError::InvalidDayOfWeek => f.write_str("day of week must be 1-7"),
            AlarmError::InvalidDateOfMonth => f.write_str("date of month must be 1-31"),
            AlarmError::InvalidMode => f.write_str("invalid alarm mode"),
        }
    }
}

impl From<InvalidCode> for AlarmError {
    fn from(_: InvalidCode) -> Self {
        AlarmError::InvalidMode
    }
}

/// One of the two alarm slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm {
    /// Alarm 1, second resolution
    One,
    /// Alarm 2, minute resolution
    Two,
}

impl Alarm {
    /// The A?IE bit in the control register and the A?F bit in the status
    /// register; both use bit 0 for alarm 1 and bit 1 for alarm 2.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Alarm::One => 0x01,
            Alarm::Two => 0x02,
        }
    }
}

/// Trigger modes of alarm 1.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm1Mode {
    /// Not armed
    #[default]
    Disabled,
    /// Every second
    EverySecond,
    /// When the seconds match
    FixedSecond,
    /// When minutes and seconds match
    FixedMinuteSecond,
    /// When hours, minutes and seconds match
    FixedHourMinuteSecond,
    /// When date, hours, minutes and seconds match
    FixedDayHourMinuteSecond,
    /// When weekday, hours, minutes and seconds match
    FixedWeekdayHourMinuteSecond,
}

impl Alarm1Mode {
    /// The mode's code byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Alarm1Mode::Disabled => 0x00,
            Alarm1Mode::EverySecond => 0x2F,
            Alarm1Mode::FixedSecond => 0x2E,
            Alarm1Mode::FixedMinuteSecond => 0x2C,
            Alarm1Mode::FixedHourMinuteSecond => 0x28,
            Alarm1Mode::FixedDayHourMinuteSecond => 0x20,
            Alarm1Mode::FixedWeekdayHourMinuteSecond => 0x30,
        }
    }

    /// True for every mode except [`Alarm1Mode::Disabled`].
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.code() & ENABLED != 0
    }
}

impl TryFrom<u8> for Alarm1Mode {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(Alarm1Mode::Disabled),
            0x2F => Ok(Alarm1Mode::EverySecond),
            0x2E => Ok(Alarm1Mode::FixedSecond),
            0x2C => Ok(Alarm1Mode::FixedMinuteSecond),
            0x28 => Ok(Alarm1Mode::FixedHourMinuteSecond),
            0x20 => Ok(Alarm1Mode::FixedDayHourMinuteSecond),
            0x30 => Ok(Alarm1Mode::FixedWeekdayHourMinuteSecond),
            _ => Err(InvalidCode(code)),
        }
    }
}

/// Trigger modes of alarm 2.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm2Mode {
    /// Not armed
    #[default]
    Disabled,
    /// Every minute
    EveryMinute,
    /// When the minutes match
    FixedMinute,
    /// When hours and minutes match
    FixedHourMinute,
    /// When date, hours and minutes match
    FixedDayHourMinute,
    /// When weekday, hours and minutes match
    FixedWeekdayHourMinute,
}

impl Alarm2Mode {
    /// The mode's code byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Alarm2Mode::Disabled => 0x80,
            Alarm2Mode::EveryMinute => 0xAE,
            Alarm2Mode::FixedMinute => 0xAC,
            Alarm2Mode::FixedHourMinute => 0xA8,
            Alarm2Mode::FixedDayHourMinute => 0xA0,
            Alarm2Mode::FixedWeekdayHourMinute => 0xB0,
        }
    }

    /// True for every mode except [`Alarm2Mode::Disabled`].
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.code() & ENABLED != 0
    }
}

impl TryFrom<u8> for Alarm2Mode {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x80 => Ok(Alarm2Mode::Disabled),
            0xAE => Ok(Alarm2Mode::EveryMinute),
            0xAC => Ok(Alarm2Mode::FixedMinute),
            0xA8 => Ok(Alarm2Mode::FixedHourMinute),
            0xA0 => Ok(Alarm2Mode::FixedDayHourMinute),
            0xB0 => Ok(Alarm2Mode::FixedWeekdayHourMinute),
            _ => Err(InvalidCode(code)),
        }
    }
}

/// A mode of either slot, as returned by a per-slot query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmMode {
    /// A mode of alarm 1
    One(Alarm1Mode),
    /// A mode of alarm 2
    Two(Alarm2Mode),
}

impl AlarmMode {
    /// Decodes a code byte of either slot; bit 7 picks the slot.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCode`] for a byte that names no mode.
    pub fn from_code(code: u8) -> Result<Self, InvalidCode> {
        if code & SLOT_TWO == 0 {
            Alarm1Mode::try_from(code).map(AlarmMode::One)
        } else {
            Alarm2Mode::try_from(code).map(AlarmMode::Two)
        }
    }

    /// The mode's code byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            AlarmMode::One(mode) => mode.code(),
            AlarmMode::Two(mode) => mode.code(),
        }
    }

    /// The slot this mode belongs to.
    #[must_use]
    pub const fn slot(self) -> Alarm {
        match self {
            AlarmMode::One(_) => Alarm::One,
            AlarmMode::Two(_) => Alarm::Two,
        }
    }

    /// True unless the mode is one of the `Disabled` variants.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.code() & ENABLED != 0
    }
}

// Day field range depends on what the mode matches against.
fn validate_day(code: u8, day: u8) -> Result<(), AlarmError> {
    let matches_day = code & ENABLED != 0 && code & MASK4 == 0;
    if matches_day && code & DAY_SELECT != 0 {
        if !(1..=7).contains(&day) {
            return Err(AlarmError::InvalidDayOfWeek);
        }
    } else if matches_day {
        if !(1..=31).contains(&day) {
            return Err(AlarmError::InvalidDateOfMonth);
        }
    } else if day > 31 {
        return Err(AlarmError::InvalidDateOfMonth);
    }
    Ok(())
}

fn validate_hour_minute(hour: u8, minute: u8) -> Result<(), AlarmError> {
    if minute > 59 {
        return Err(AlarmError::InvalidTime("minutes must be 0-59"));
    }
    if hour > 23 {
        return Err(AlarmError::InvalidTime("hours must be 0-23"));
    }
    Ok(())
}

fn minutes_register(minute: u8, code: u8) -> AlarmMinutes {
    let mut minutes = AlarmMinutes::default();
    minutes.set_bcd(bcd::to_bcd(minute) & 0x7F);
    minutes.set_alarm_mask2(code & MASK2 != 0);
    minutes
}

fn hours_register(hour: u8, code: u8) -> AlarmHours {
    let mut hours = AlarmHours::default();
    hours.set_bcd(bcd::to_bcd(hour) & 0x3F);
    hours.set_alarm_mask3(code & MASK3 != 0);
    hours
}

fn day_date_register(day: u8, code: u8) -> AlarmDayDate {
    let mut day_date = AlarmDayDate::default();
    day_date.set_bcd(bcd::to_bcd(day) & 0x3F);
    day_date.set_alarm_mask4(code & MASK4 != 0);
    day_date.set_day_date_select(if code & DAY_SELECT != 0 {
        DayDateSelect::Day
    } else {
        DayDateSelect::Date
    });
    day_date
}

// Mode bits shared by both slots, from the minutes/hours/day registers.
fn shared_bits(minutes: AlarmMinutes, hours: AlarmHours, day_date: AlarmDayDate) -> u8 {
    let mut code = 0;
    if minutes.alarm_mask2() {
        code |= MASK2;
    }
    if hours.alarm_mask3() {
        code |= MASK3;
    }
    if day_date.alarm_mask4() {
        code |= MASK4;
    }
    // DY/DT is don't-care while the day field is masked
    if day_date.day_date_select() == DayDateSelect::Day && !day_date.alarm_mask4() {
        code |= DAY_SELECT;
    }
    code
}

/// Alarm 1 configuration: mode plus the fields the mode matches against.
///
/// Fields the mode ignores are still written to the chip but have no effect.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alarm1 {
    /// Trigger mode
    pub mode: Alarm1Mode,
    /// Second, 0-59
    pub second: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Hour, 0-23
    pub hour: u8,
    /// Date (1-31) or weekday (1-7), depending on the mode
    pub day: u8,
}

impl Alarm1 {
    /// Validates the alarm configuration and returns any errors.
    ///
    /// # Errors
    ///
    /// Returns an error if any component is out of its valid range.
    pub fn validate(&self) -> Result<(), AlarmError> {
        if self.second > 59 {
            return Err(AlarmError::InvalidTime("seconds must be 0-59"));
        }
        validate_hour_minute(self.hour, self.minute)?;
        validate_day(self.mode.code(), self.day)
    }

    /// The four register bytes starting at 0x07.
    #[must_use]
    pub fn registers(&self) -> [u8; 4] {
        let code = self.mode.code();
        let mut seconds = AlarmSeconds::default();
        seconds.set_bcd(bcd::to_bcd(self.second) & 0x7F);
        seconds.set_alarm_mask1(code & MASK1 != 0);
        [
            seconds.into(),
            minutes_register(self.minute, code).into(),
            hours_register(self.hour, code).into(),
            day_date_register(self.day, code).into(),
        ]
    }

    /// Decodes the four register bytes starting at 0x07. `enabled` is the
    /// A1IE bit; without it the mode is [`Alarm1Mode::Disabled`].
    ///
    /// # Errors
    ///
    /// [`AlarmError::InvalidMode`] if the mask bits name no mode.
    pub fn from_registers(data: [u8; 4], enabled: bool) -> Result<Self, AlarmError> {
        let seconds = AlarmSeconds::from(data[0]);
        let minutes = AlarmMinutes::from(data[1]);
        let hours = AlarmHours::from(data[2]);
        let day_date = AlarmDayDate::from(data[3]);

        let mode = if enabled {
            let mut code = ENABLED | shared_bits(minutes, hours, day_date);
            if seconds.alarm_mask1() {
                code |= MASK1;
            }
            Alarm1Mode::try_from(code)?
        } else {
            Alarm1Mode::Disabled
        };

        Ok(Alarm1 {
            mode,
            second: bcd::to_binary(seconds.bcd()),
            minute: bcd::to_binary(minutes.bcd()),
            hour: bcd::to_binary(hours.bcd()),
            day: bcd::to_binary(day_date.bcd()),
        })
    }
}

/// Alarm 2 configuration: mode plus the fields the mode matches against.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alarm2 {
    /// Trigger mode
    pub mode: Alarm2Mode,
    /// Minute, 0-59
    pub minute: u8,
    /// Hour, 0-23
    pub hour: u8,
    /// Date (1-31) or weekday (1-7), depending on the mode
    pub day: u8,
}

impl Alarm2 {
    /// Validates the alarm configuration and returns any errors.
    ///
    /// # Errors
    ///
    /// Returns an error if any component is out of its valid range.
    pub fn validate(&self) -> Result<(), AlarmError> {
        validate_hour_minute(self.hour, self.minute)?;
        validate_day(self.mode.code(), self.day)
    }

    /// The three register bytes starting at 0x0B.
    #[must_use]
    pub fn registers(&self) -> [u8; 3] {
        let code = self.mode.code();
        [
            minutes_register(self.minute, code).into(),
            hours_register(self.hour, code).into(),
            day_date_register(self.day, code).into(),
        ]
    }

    /// Decodes the three register bytes starting at 0x0B. `enabled` is the
    /// A2IE bit.
    ///
    /// # Errors
    ///
    /// [`AlarmError::InvalidMode`] if the mask bits name no mode.
    pub fn from_registers(data: [u8; 3], enabled: bool) -> Result<Self, AlarmError> {
        let minutes = AlarmMinutes::from(data[0]);
        let hours = AlarmHours::from(data[1]);
        let day_date = AlarmDayDate::from(data[2]);

        let mode = if enabled {
            Alarm2Mode::try_from(SLOT_TWO | ENABLED | shared_bits(minutes, hours, day_date))?
        } else {
            Alarm2Mode::Disabled
        };

        Ok(Alarm2 {
            mode,
            minute: bcd::to_binary(minutes.bcd()),
            hour: bcd::to_binary(hours.bcd()),
            day: bcd::to_binary(day_date.bcd()),
        })
    }
}
