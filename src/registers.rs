//! Register definitions and bitfield structures for the DS1307/DS3231/DS3232.
//!
//! The three chips share the calendar block at 0x00-0x06. The DS3231 and
//! DS3232 add two alarms, a control and a status register and a temperature
//! sensor; the DS1307 instead has a single control byte at 0x07 and battery
//! backed RAM right after it.

use bitfield::bitfield;

/// Register addresses shared by the DS3231 and DS3232 (the calendar block is
/// also valid on the DS1307).
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (0-59)
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (0-23)
    Hours = 0x02,
    /// Day of week register, unused by this driver
    Day = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register (1-12)
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Alarm 1 seconds register
    Alarm1Seconds = 0x07,
    /// Alarm 1 minutes register
    Alarm1Minutes = 0x08,
    /// Alarm 1 hours register
    Alarm1Hours = 0x09,
    /// Alarm 1 day/date register
    Alarm1DayDate = 0x0A,
    /// Alarm 2 minutes register
    Alarm2Minutes = 0x0B,
    /// Alarm 2 hours register
    Alarm2Hours = 0x0C,
    /// Alarm 2 day/date register
    Alarm2DayDate = 0x0D,
    /// Control register
    Control = 0x0E,
    /// Control/Status register
    ControlStatus = 0x0F,
    /// Temperature MSB register
    MSBTemp = 0x11,
    /// Temperature LSB register
    LSBTemp = 0x12,
}

/// DS1307 control register. It sits where the DS323x alarm 1 block starts.
pub const DS1307_CONTROL: u8 = 0x07;

/// Hour format flag of the hours registers.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 24-hour format (0-23)
    TwentyFourHour = 0,
    /// 12-hour format (1-12 + AM/PM)
    TwelveHour = 1,
}
impl From<u8> for TimeRepresentation {
    /// Creates a `TimeRepresentation` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => TimeRepresentation::TwentyFourHour,
            1 => TimeRepresentation::TwelveHour,
            _ => panic!("Invalid value for TimeRepresentation: {}", v),
        }
    }
}
impl From<TimeRepresentation> for u8 {
    fn from(v: TimeRepresentation) -> Self {
        v as u8
    }
}

/// INTCN: what drives the DS323x INT/SQW pin.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptControl {
    /// Output square wave on INT/SQW pin
    SquareWave = 0,
    /// Output interrupt signal on INT/SQW pin
    Interrupt = 1,
}
impl From<u8> for InterruptControl {
    /// Creates an `InterruptControl` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => InterruptControl::SquareWave,
            1 => InterruptControl::Interrupt,
            _ => panic!("Invalid value for InterruptControl: {}", v),
        }
    }
}
impl From<InterruptControl> for u8 {
    fn from(v: InterruptControl) -> Self {
        v as u8
    }
}

/// Day/Date select for alarm registers (DY/DT bit).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DayDateSelect {
    /// Match against date of the month (1-31)
    Date = 0,
    /// Match against day of the week (1-7)
    Day = 1,
}
impl From<u8> for DayDateSelect {
    /// Creates a `DayDateSelect` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => DayDateSelect::Date,
            1 => DayDateSelect::Day,
            _ => panic!("Invalid value for DayDateSelect: {}", v),
        }
    }
}
impl From<DayDateSelect> for u8 {
    fn from(v: DayDateSelect) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Seconds register. Bit 7 is CH (clock halt) on the DS1307 and unused
    /// on the DS323x.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    /// Clock halt (DS1307 only)
    pub clock_halt, set_clock_halt: 7;
    /// BCD seconds (0x00-0x59)
    pub bcd, set_bcd: 6, 0;
}
from_register_u8!(Seconds);

bitfield! {
    /// Hours register with format selection.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    /// Time representation format (12/24 hour)
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    /// PM flag in 12-hour mode
    pub pm, set_pm: 5;
    /// BCD hours in 24-hour mode (0x00-0x23)
    pub bcd24, set_bcd24: 5, 0;
    /// BCD hours in 12-hour mode (0x01-0x12)
    pub bcd12, set_bcd12: 4, 0;
}
from_register_u8!(Hours);

bitfield! {
    /// Month register with the DS323x century flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Month(u8);
    impl Debug;
    /// Century flag, toggled by the chip when the year wraps 99 -> 00
    pub century, set_century: 7;
    /// BCD month (0x01-0x12)
    pub bcd, set_bcd: 4, 0;
}
from_register_u8!(Month);

bitfield! {
    /// DS3231/DS3232 control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// EOSC, set to stop the oscillator on battery power
    pub oscillator_disabled, set_oscillator_disabled: 7;
    /// Enable square wave output on battery power
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// Force temperature conversion
    pub convert_temperature, set_convert_temperature: 5;
    /// RS2..RS1 rate select
    pub rate_select, set_rate_select: 4, 3;
    /// INT/SQW pin function control
    pub from into InterruptControl, interrupt_control, set_interrupt_control: 2, 2;
    /// Enable alarm 2 interrupt
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    /// Enable alarm 1 interrupt
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}
from_register_u8!(Control);

bitfield! {
    /// DS3231/DS3232 status register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Status(u8);
    impl Debug;
    /// Oscillator stop flag, the lost-power indicator
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    /// Enable 32kHz output
    pub enable_32khz_output, set_enable_32khz_output: 3;
    /// Device busy flag
    pub busy, set_busy: 2;
    /// Alarm 2 triggered flag
    pub alarm2_flag, set_alarm2_flag: 1;
    /// Alarm 1 triggered flag
    pub alarm1_flag, set_alarm1_flag: 0;
}
from_register_u8!(Status);

bitfield! {
    /// DS1307 control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Ds1307Control(u8);
    impl Debug;
    /// Output level while the square wave is disabled
    pub out, set_out: 7;
    /// Square wave enable
    pub square_wave_enable, set_square_wave_enable: 4;
    /// RS1..RS0 rate select
    pub rate_select, set_rate_select: 1, 0;
}
from_register_u8!(Ds1307Control);

bitfield! {
    /// Temperature register (integer part).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Temperature(u8);
    impl Debug;
    /// Temperature value (-128 to +127)
    pub i8, temperature, set_temperature: 7, 0;
}
from_register_u8!(Temperature);

bitfield! {
    /// Temperature fraction register (quarter degrees in bits 7-6).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct TemperatureFraction(u8);
    impl Debug;
    /// Number of quarter degrees (0-3)
    pub temperature_fraction, set_temperature_fraction: 7, 6;
}
from_register_u8!(TemperatureFraction);

bitfield! {
    /// Alarm seconds register with mask bit (only used by Alarm 1).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmSeconds(u8);
    impl Debug;
    /// Alarm mask bit 1 (A1M1)
    pub alarm_mask1, set_alarm_mask1: 7;
    /// BCD seconds
    pub bcd, set_bcd: 6, 0;
}
from_register_u8!(AlarmSeconds);

bitfield! {
    /// Alarm minutes register with mask bit (used by both alarms).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmMinutes(u8);
    impl Debug;
    /// Alarm mask bit 2 (A1M2/A2M2)
    pub alarm_mask2, set_alarm_mask2: 7;
    /// BCD minutes
    pub bcd, set_bcd: 6, 0;
}
from_register_u8!(AlarmMinutes);

bitfield! {
    /// Alarm hours register with mask bit (used by both alarms).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmHours(u8);
    impl Debug;
    /// Alarm mask bit 3 (A1M3/A2M3)
    pub alarm_mask3, set_alarm_mask3: 7;
    /// BCD hours, 24-hour format
    pub bcd, set_bcd: 5, 0;
}
from_register_u8!(AlarmHours);

bitfield! {
    /// Alarm day/date register with mask bit and DY/DT select.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmDayDate(u8);
    impl Debug;
    /// Alarm mask bit 4 (A1M4/A2M4)
    pub alarm_mask4, set_alarm_mask4: 7;
    /// Day/Date select (1=day of week, 0=date of month)
    pub from into DayDateSelect, day_date_select, set_day_date_select: 6, 6;
    /// BCD day of week (1-7) or date (1-31)
    pub bcd, set_bcd: 5, 0;
}
from_register_u8!(AlarmDayDate);

/// A read-modify-write of one register: `new = (old & and) | or`.
///
/// Every stateful operation on the control and status registers is one of
/// these, so bits an operation does not own survive it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterUpdate {
    /// Bits to keep
    pub and: u8,
    /// Bits to force on
    pub or: u8,
}

impl RegisterUpdate {
    /// An update that changes nothing and signals "not applicable".
    pub const NONE: Self = Self { and: 0, or: 0 };

    /// Sets `bits`, keeps everything else.
    #[must_use]
    pub const fn set(bits: u8) -> Self {
        Self { and: 0xFF, or: bits }
    }

    /// Clears `bits`, keeps everything else.
    #[must_use]
    pub const fn clear(bits: u8) -> Self {
        Self { and: !bits, or: 0 }
    }

    /// Applies the update to a register value.
    #[must_use]
    pub const fn apply(self, value: u8) -> u8 {
        (value & self.and) | self.or
    }

    /// True for the all-zero row used to mark an unsupported request.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.and == 0 && self.or == 0
    }
}

/// A mode byte that names no alarm or square-wave mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidCode(pub u8);

/// Control bits for "alarm interrupt on INT/SQW" with the given enables.
pub(crate) fn interrupt_bits(alarm1: bool, alarm2: bool) -> u8 {
    let mut control = Control::default();
    control.set_interrupt_control(InterruptControl::Interrupt);
    control.set_alarm1_interrupt_enable(alarm1);
    control.set_alarm2_interrupt_enable(alarm2);
    control.into()
}
